use std::fmt;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: Option<String>,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes: CookieAttributes::default(),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.attributes.path = Some(path.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.attributes.max_age = Some(seconds);
        self
    }

    pub fn http_only(mut self, on: bool) -> Self {
        self.attributes.http_only = on;
        self
    }

    pub fn secure(mut self, on: bool) -> Self {
        self.attributes.secure = on;
        self
    }

    pub fn same_site(mut self, policy: SameSite) -> Self {
        self.attributes.same_site = Some(policy);
        self
    }

    /// Render as a `Set-Cookie` header value.
    ///
    /// Returns `None` if the name or value contain bytes a header can't carry.
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.to_string()).ok()
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        let attrs = &self.attributes;
        if let Some(path) = &attrs.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(max_age) = attrs.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if attrs.http_only {
            f.write_str("; HttpOnly")?;
        }
        if attrs.secure {
            f.write_str("; Secure")?;
        }
        if let Some(same_site) = attrs.same_site {
            write!(f, "; SameSite={}", same_site)?;
        }
        Ok(())
    }
}

/// Parse one `Cookie` request header (`a=1; b=2`).
///
/// Segments without `=` or with an empty name are skipped. Values keep any
/// embedded `=` and lose surrounding double quotes.
pub fn parse_cookie_header(raw: &str) -> Vec<Cookie> {
    raw.split(';')
        .filter_map(|segment| {
            let (name, value) = segment.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some(Cookie::new(name, value))
        })
        .collect()
}

/// Find a cookie by name across every `Cookie` header of a request.
/// The first occurrence wins.
pub fn find(headers: &HeaderMap, name: &str) -> Option<Cookie> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(parse_cookie_header)
        .find(|c| c.name == name)
}

/// Append a `Set-Cookie` header for `cookie`, skipping unrepresentable values.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &Cookie) {
    if let Some(value) = cookie.to_header_value() {
        headers.append(SET_COOKIE, value);
    }
}

fn set_cookie_name(value: &HeaderValue) -> Option<&str> {
    let raw = value.to_str().ok()?;
    let (name, _) = raw.split_once('=')?;
    Some(name.trim())
}

/// Copy `Set-Cookie` values from `from` into `into`. A cookie whose name is
/// already set in `into` is skipped, so the first value for a name wins.
pub fn merge_set_cookies(into: &mut HeaderMap, from: &HeaderMap) {
    for value in from.get_all(SET_COOKIE) {
        let taken = set_cookie_name(value).is_some_and(|name| {
            into.get_all(SET_COOKIE)
                .iter()
                .any(|existing| set_cookie_name(existing) == Some(name))
        });
        if !taken {
            into.append(SET_COOKIE, value.clone());
        }
    }
}
