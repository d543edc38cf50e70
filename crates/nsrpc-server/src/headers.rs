//! Response headers
//!
//! Content type, CORS and cache headers derived from the response TTL, kept
//! in an [`http::HeaderMap`] so transports can copy them straight onto a
//! response.

use chrono::{DateTime, Duration, Utc};
use http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE, EXPIRES, HeaderName, HeaderValue, PRAGMA,
};
use http::HeaderMap;
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("invalid header name '{0}'")]
    InvalidName(String),

    #[error("invalid value for header '{0}'")]
    InvalidValue(String),
}

/// HTTP date as used by `Expires`, always in GMT
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[derive(Debug, Clone)]
pub struct ResponseHeaders {
    headers: HeaderMap,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHeaders {
    /// JSON content type and permissive CORS
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        Self { headers }
    }

    pub fn for_ttl(ttl: u32, now: DateTime<Utc>) -> Self {
        let mut headers = Self::new();
        headers.set_cache_ttl(ttl, now);
        headers
    }

    /// Replace the cache headers. A TTL of 0 forbids caching and dates
    /// `Expires` one second in the past.
    pub fn set_cache_ttl(&mut self, ttl: u32, now: DateTime<Utc>) {
        if ttl == 0 {
            self.headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
            self.headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
            self.set_expires(now - Duration::seconds(1));
        } else {
            if let Ok(value) = HeaderValue::try_from(format!("max-age={}", ttl)) {
                self.headers.insert(CACHE_CONTROL, value);
            }
            self.headers.remove(PRAGMA);
            self.set_expires(now + Duration::seconds(i64::from(ttl)));
        }
    }

    fn set_expires(&mut self, at: DateTime<Utc>) {
        if let Ok(value) = HeaderValue::try_from(http_date(at)) {
            self.headers.insert(EXPIRES, value);
        }
    }

    /// Add or replace a header
    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let header_name =
            HeaderName::try_from(name).map_err(|_| HeaderError::InvalidName(name.to_string()))?;
        let header_value =
            HeaderValue::try_from(value).map_err(|_| HeaderError::InvalidValue(name.to_string()))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Remove a header, returning whether it was present
    pub fn remove(&mut self, name: &str) -> bool {
        self.headers.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.headers.clear();
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
    }

    pub fn as_header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_header_map(self) -> HeaderMap {
        self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_default_headers() {
        let headers = ResponseHeaders::new();
        assert_eq!(headers.get("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(headers.get("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_cacheable_response() {
        let headers = ResponseHeaders::for_ttl(60, now());
        assert_eq!(headers.get("Cache-Control"), Some("max-age=60"));
        assert_eq!(headers.get("Expires"), Some("Tue, 05 Mar 2024 14:31:00 GMT"));
        assert_eq!(headers.get("Pragma"), None);
    }

    #[test]
    fn test_uncacheable_response() {
        let headers = ResponseHeaders::for_ttl(0, now());
        assert_eq!(headers.get("Cache-Control"), Some("no-cache, no-store, must-revalidate"));
        assert_eq!(headers.get("Pragma"), Some("no-cache"));
        assert_eq!(headers.get("Expires"), Some("Tue, 05 Mar 2024 14:29:59 GMT"));
    }

    #[test]
    fn test_enabling_cache_drops_pragma() {
        let mut headers = ResponseHeaders::for_ttl(0, now());
        headers.set_cache_ttl(300, now());
        assert_eq!(headers.get("Pragma"), None);
        assert_eq!(headers.get("Cache-Control"), Some("max-age=300"));
    }

    #[test]
    fn test_insert_remove_clear() {
        let mut headers = ResponseHeaders::new();
        headers.insert("X-Request-Namespace", "math").unwrap();
        assert_eq!(headers.get("x-request-namespace"), Some("math"));

        headers.insert("X-Request-Namespace", "system").unwrap();
        assert_eq!(headers.get("X-Request-Namespace"), Some("system"));

        assert!(headers.insert("bad header", "x").is_err());
        assert!(headers.insert("X-Bad", "line\nbreak").is_err());

        assert!(headers.remove("X-Request-Namespace"));
        assert!(!headers.remove("X-Request-Namespace"));

        headers.clear();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_iter_yields_all_headers() {
        let headers = ResponseHeaders::for_ttl(10, now());
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert!(names.contains(&"content-type"));
        assert!(names.contains(&"cache-control"));
        assert!(names.contains(&"expires"));
    }
}
