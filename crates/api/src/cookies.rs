//! Per-visitor backend cookie jar.
//!
//! The backend authenticates browser-style: a session cookie plus an
//! `XSRF-TOKEN` cookie whose value must be echoed back in the
//! `X-XSRF-TOKEN` header. Each visitor of the storefront or admin console
//! gets their own jar, serialized into their session.
//!
//! Only one backend host is ever contacted, so domain and path attributes
//! are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the CSRF token.
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// Backend cookies for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    /// Whether the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Look up a cookie value (still URL-encoded).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Store a cookie value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Forget every cookie (used on logout).
    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Value for the `Cookie` request header, if any cookies are held.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// The CSRF token, URL-decoded, ready for the `X-XSRF-TOKEN` header.
    #[must_use]
    pub fn xsrf_token(&self) -> Option<String> {
        let raw = self.get(XSRF_COOKIE)?;
        let decoded = urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned());
        (!decoded.is_empty()).then_some(decoded)
    }

    /// Apply every `Set-Cookie` header of a response.
    pub fn absorb(&mut self, headers: &HeaderMap) {
        self.absorb_at(headers, Utc::now());
    }

    fn absorb_at(&mut self, headers: &HeaderMap, now: DateTime<Utc>) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else {
                tracing::debug!("Ignoring non-ASCII Set-Cookie header");
                continue;
            };
            match parse_set_cookie(raw, now) {
                Some(SetCookie::Store(name, value)) => {
                    self.cookies.insert(name, value);
                }
                Some(SetCookie::Remove(name)) => {
                    self.cookies.remove(&name);
                }
                None => tracing::debug!(header = %raw, "Ignoring malformed Set-Cookie header"),
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SetCookie {
    Store(String, String),
    Remove(String),
}

/// Interpret one `Set-Cookie` header value.
///
/// A cookie is removed when its value is empty or `deleted`, when
/// `Max-Age` is zero or negative, or when `Expires` lies in the past.
fn parse_set_cookie(raw: &str, now: DateTime<Utc>) -> Option<SetCookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"');

    let mut expired = value.is_empty() || value == "deleted";
    for attr in parts {
        let (key, attr_value) = attr.split_once('=').unwrap_or((attr, ""));
        let key = key.trim();
        let attr_value = attr_value.trim();
        if key.eq_ignore_ascii_case("max-age") {
            if attr_value.parse::<i64>().is_ok_and(|secs| secs <= 0) {
                expired = true;
            }
        } else if key.eq_ignore_ascii_case("expires")
            && DateTime::parse_from_rfc2822(attr_value)
                .is_ok_and(|at| at.with_timezone(&Utc) <= now)
        {
            expired = true;
        }
    }

    Some(if expired {
        SetCookie::Remove(name.to_string())
    } else {
        SetCookie::Store(name.to_string(), value.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(SET_COOKIE, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn test_absorb_stores_cookies() {
        let mut jar = CookieJar::default();
        jar.absorb_at(
            &headers(&[
                "XSRF-TOKEN=abc%3D%3D; expires=Sun, 01 Mar 2026 14:00:00 GMT; Max-Age=7200; path=/; samesite=lax",
                "shop_session=s3cr3t; path=/; httponly; samesite=lax",
            ]),
            now(),
        );

        assert_eq!(jar.get("XSRF-TOKEN"), Some("abc%3D%3D"));
        assert_eq!(jar.get("shop_session"), Some("s3cr3t"));
        assert_eq!(
            jar.header_value().as_deref(),
            Some("XSRF-TOKEN=abc%3D%3D; shop_session=s3cr3t")
        );
    }

    #[test]
    fn test_xsrf_token_is_url_decoded() {
        let mut jar = CookieJar::default();
        jar.insert(XSRF_COOKIE, "eyJpdiI6%2Bxyz%3D");
        assert_eq!(jar.xsrf_token().as_deref(), Some("eyJpdiI6+xyz="));
    }

    #[test]
    fn test_absorb_removes_expired_cookies() {
        let mut jar = CookieJar::default();
        jar.insert("shop_session", "old");
        jar.insert("XSRF-TOKEN", "old");
        jar.insert("remember", "old");
        jar.absorb_at(
            &headers(&[
                "shop_session=deleted; expires=Thu, 01 Jan 1970 00:00:01 GMT",
                "XSRF-TOKEN=gone; Max-Age=0",
                "remember=x; expires=Sat, 28 Feb 2026 12:00:00 GMT",
            ]),
            now(),
        );
        assert!(jar.is_empty());
        assert_eq!(jar.header_value(), None);
    }

    #[test]
    fn test_absorb_ignores_malformed_headers() {
        let mut jar = CookieJar::default();
        jar.absorb_at(&headers(&["no-equals-sign", "=value"]), now());
        assert!(jar.is_empty());
    }

    #[test]
    fn test_jar_survives_session_serialization() {
        let mut jar = CookieJar::default();
        jar.insert("shop_session", "abc");
        let json = serde_json::to_string(&jar).unwrap();
        let back: CookieJar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, jar);
    }
}
