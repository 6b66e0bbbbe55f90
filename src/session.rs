use std::fmt;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::cookie::{self, Cookie, SameSite};

pub const SESSION_COOKIE: &str = "l360_stats_sid";
/// One year, in seconds.
pub const SESSION_MAX_AGE: i64 = 60 * 60 * 24 * 365;

/// Opaque session identifier carried in the `l360_stats_sid` cookie.
///
/// Independent of authentication: it survives login and logout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    value: String,
    minted: bool,
}

impl SessionId {
    /// Return the id from the request cookie, or mint a fresh v4 uuid.
    pub fn resolve(headers: &HeaderMap) -> Self {
        match cookie::find(headers, SESSION_COOKIE) {
            Some(c) if !c.value.trim().is_empty() => Self {
                value: c.value,
                minted: false,
            },
            _ => Self::mint(),
        }
    }

    pub fn mint() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            minted: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// True when the id was created for this request rather than read back.
    pub fn is_new(&self) -> bool {
        self.minted
    }

    /// Cookie that persists (or refreshes) this id in the browser.
    pub fn cookie(&self, secure: bool) -> Cookie {
        Cookie::new(SESSION_COOKIE, self.value.clone())
            .path("/")
            .max_age(SESSION_MAX_AGE)
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
