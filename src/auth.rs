use axum::http::HeaderMap;

use crate::cookie::{self, Cookie, SameSite};

/// Token and any cookies the auth layer wants forwarded to the browser.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub token: Option<String>,
    pub set_cookies: HeaderMap,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

pub trait AuthResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> AuthContext;
}

/// Reads the access token from a cookie.
///
/// If a refresh cookie carries a different token, that token is used and
/// the access cookie is re-issued with it.
#[derive(Debug, Clone)]
pub struct CookieAuth {
    access_cookie: String,
    refresh_cookie: String,
    secure: bool,
}

impl CookieAuth {
    pub fn new(access_cookie: impl Into<String>, refresh_cookie: impl Into<String>) -> Self {
        Self {
            access_cookie: access_cookie.into(),
            refresh_cookie: refresh_cookie.into(),
            secure: false,
        }
    }

    pub fn secure(mut self, on: bool) -> Self {
        self.secure = on;
        self
    }
}

impl AuthResolver for CookieAuth {
    fn resolve(&self, headers: &HeaderMap) -> AuthContext {
        let access = cookie::find(headers, &self.access_cookie)
            .map(|c| c.value)
            .filter(|v| !v.is_empty());
        let refreshed = cookie::find(headers, &self.refresh_cookie)
            .map(|c| c.value)
            .filter(|v| !v.is_empty());

        match (access, refreshed) {
            (access, Some(fresh)) if access.as_deref() != Some(fresh.as_str()) => {
                let mut set_cookies = HeaderMap::new();
                let reissued = Cookie::new(self.access_cookie.clone(), fresh.clone())
                    .path("/")
                    .http_only(true)
                    .secure(self.secure)
                    .same_site(SameSite::Lax);
                cookie::append_set_cookie(&mut set_cookies, &reissued);
                AuthContext {
                    token: Some(fresh),
                    set_cookies,
                }
            }
            (access, _) => AuthContext {
                token: access,
                set_cookies: HeaderMap::new(),
            },
        }
    }
}

/// Resolver that never finds a token. Useful for anonymous-only deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthResolver for NoAuth {
    fn resolve(&self, _headers: &HeaderMap) -> AuthContext {
        AuthContext::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::http::HeaderValue;

    fn request(cookie: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(cookie));
        headers
    }

    #[test]
    fn test_reads_access_token() {
        let auth = CookieAuth::new("tok", "rtok");
        let ctx = auth.resolve(&request("tok=abc"));
        assert_eq!(ctx.token.as_deref(), Some("abc"));
        assert!(ctx.set_cookies.is_empty());
    }

    #[test]
    fn test_missing_token_is_anonymous() {
        let auth = CookieAuth::new("tok", "rtok");
        let ctx = auth.resolve(&request("l360_stats_sid=1"));
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn test_rotated_token_is_forwarded() {
        let auth = CookieAuth::new("tok", "rtok");
        let ctx = auth.resolve(&request("tok=old; rtok=new"));
        assert_eq!(ctx.token.as_deref(), Some("new"));
        let set = ctx.set_cookies.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set.starts_with("tok=new"));
    }

    #[test]
    fn test_same_refresh_token_is_not_reissued() {
        let auth = CookieAuth::new("tok", "rtok");
        let ctx = auth.resolve(&request("tok=same; rtok=same"));
        assert_eq!(ctx.token.as_deref(), Some("same"));
        assert!(ctx.set_cookies.is_empty());
    }
}
