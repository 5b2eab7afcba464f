//! Outgoing request model handed to the offline layer.

use crate::cache::CacheKey;
use crate::session::{SessionToken, credential_scope};
use serde::{Deserialize, Serialize};
use url::Url;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Top-level page load.
    Navigate,
    #[default]
    Other,
}

impl RequestMode {
    /// Derive the mode from `Sec-Fetch-Mode` and `Accept`.
    ///
    /// Browsers that send fetch metadata are trusted as-is. Without it, a GET
    /// that accepts HTML is treated as a page load.
    pub fn detect(method: &str, sec_fetch_mode: Option<&str>, accept: Option<&str>) -> Self {
        match sec_fetch_mode {
            Some(mode) if mode.eq_ignore_ascii_case("navigate") => RequestMode::Navigate,
            Some(_) => RequestMode::Other,
            None => {
                let accepts_html = accept.is_some_and(|a| a.contains("text/html"));
                if method.eq_ignore_ascii_case("GET") && accepts_html {
                    RequestMode::Navigate
                } else {
                    RequestMode::Other
                }
            }
        }
    }
}

/// A request as seen by the fetch interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Session the request was made under, if any.
    pub session: Option<SessionToken>,
}

impl FetchRequest {
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url,
            mode: RequestMode::Other,
            headers: Vec::new(),
            body: Vec::new(),
            session: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// A GET page load of `url`.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_mode(RequestMode::Navigate)
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_session(mut self, session: Option<SessionToken>) -> Self {
        self.session = session;
        self
    }

    /// Case-insensitive header lookup (first match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Credential scope for cached responses: the session, else an
    /// `Authorization` header. `None` for anonymous requests.
    pub fn cache_scope(&self) -> Option<String> {
        if let Some(session) = &self.session {
            return Some(session.scope());
        }
        self.header("authorization")
            .filter(|value| !value.trim().is_empty())
            .map(credential_scope)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.method, &self.url).with_scope(self.cache_scope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_fetch_metadata() {
        assert_eq!(
            RequestMode::detect("GET", Some("navigate"), None),
            RequestMode::Navigate
        );
        assert_eq!(
            RequestMode::detect("GET", Some("no-cors"), Some("text/html")),
            RequestMode::Other
        );
    }

    #[test]
    fn test_mode_from_accept_header() {
        let html = Some("text/html,application/xhtml+xml;q=0.9");
        assert_eq!(RequestMode::detect("GET", None, html), RequestMode::Navigate);
        assert_eq!(RequestMode::detect("POST", None, html), RequestMode::Other);
        assert_eq!(
            RequestMode::detect("GET", None, Some("image/png")),
            RequestMode::Other
        );
    }

    #[test]
    fn test_cache_key_uses_method_and_url() {
        let url = Url::parse("https://portal.example/logo.png").unwrap();
        let request = FetchRequest::new("post", url.clone());
        assert_eq!(request.method, "POST");
        assert!(!request.is_get());
        assert_eq!(request.cache_key().method, "POST");
        assert_eq!(FetchRequest::get(url).cache_key().method, "GET");
    }

    #[test]
    fn test_cache_key_is_scoped_by_credential() {
        let url = Url::parse("https://portal.example/dashboard/citizen").unwrap();
        let anonymous = FetchRequest::get(url.clone());
        let ana = FetchRequest::get(url.clone())
            .with_session(SessionToken::from_cookie_value("ana-token"));
        let bob = FetchRequest::get(url.clone())
            .with_session(SessionToken::from_cookie_value("bob-token"));
        let bearer = FetchRequest::get(url).with_header("Authorization", "Bearer ana-token");

        assert_eq!(anonymous.cache_key().scope, None);
        assert_ne!(ana.cache_key(), bob.cache_key());
        assert_eq!(ana.cache_key().public(), anonymous.cache_key());
        assert!(bearer.cache_key().is_scoped());
    }
}
