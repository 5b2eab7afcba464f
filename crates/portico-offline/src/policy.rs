//! Which requests the offline layer may touch.

use portico_core::classify::{BypassReason, RequestClassification};
use portico_core::request::FetchRequest;
use portico_core::Result;
use url::Url;

/// Classification rules for the fetch interceptor.
#[derive(Debug, Clone)]
pub struct InterceptPolicy {
    origin: Url,
    api_prefix: String,
    auth_markers: Vec<String>,
}

impl InterceptPolicy {
    /// Policy for the application served at `origin`, with the portal's
    /// default API prefix (`/api/`) and auth-flow marker (`/login`).
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            api_prefix: "/api/".to_string(),
            auth_markers: vec!["/login".to_string()],
        }
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Paths containing any of these markers are auth flow and bypass the cache.
    pub fn with_auth_markers(mut self, markers: Vec<String>) -> Self {
        self.auth_markers = markers;
        self
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Absolute URL of a same-origin path.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.origin.join(path)?)
    }

    /// URL of the root document served as the offline landing page.
    pub fn root_url(&self) -> Url {
        let mut root = self.origin.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        root
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    pub fn classify(&self, request: &FetchRequest) -> RequestClassification {
        if !self.is_same_origin(&request.url) {
            return RequestClassification::Bypass(BypassReason::CrossOrigin);
        }

        let path = request.url.path();
        if path.starts_with(&self.api_prefix) {
            return RequestClassification::Bypass(BypassReason::ApiRoute);
        }
        if self.auth_markers.iter().any(|m| path.contains(m.as_str())) {
            return RequestClassification::Bypass(BypassReason::AuthFlow);
        }

        if request.is_navigation() {
            RequestClassification::Navigable
        } else {
            RequestClassification::CacheableAsset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn policy() -> InterceptPolicy {
        InterceptPolicy::new(Url::parse("https://portal.example").unwrap())
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_cross_origin_is_bypassed() {
        let request = FetchRequest::get(url("https://cdn.example/font.woff2"));
        assert_eq!(
            policy().classify(&request),
            RequestClassification::Bypass(BypassReason::CrossOrigin)
        );

        // Same host, different scheme is a different origin.
        let request = FetchRequest::get(url("http://portal.example/"));
        assert!(policy().classify(&request).is_bypass());
    }

    #[test]
    fn test_api_and_auth_paths_are_bypassed() {
        let api = FetchRequest::get(url("https://portal.example/api/cedula"));
        assert_eq!(
            policy().classify(&api),
            RequestClassification::Bypass(BypassReason::ApiRoute)
        );

        for path in ["/login", "/admin/login", "/login/callback"] {
            let request = FetchRequest::navigate(url(&format!("https://portal.example{}", path)));
            assert_eq!(
                policy().classify(&request),
                RequestClassification::Bypass(BypassReason::AuthFlow),
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_navigation_and_assets() {
        let page = FetchRequest::navigate(url("https://portal.example/news"));
        assert_eq!(policy().classify(&page), RequestClassification::Navigable);

        let asset = FetchRequest::get(url("https://portal.example/logo.png"));
        assert_eq!(policy().classify(&asset), RequestClassification::CacheableAsset);

        // The bare API root is not under the `/api/` prefix.
        let api_root = FetchRequest::get(url("https://portal.example/api"));
        assert_eq!(policy().classify(&api_root), RequestClassification::CacheableAsset);
    }

    #[test]
    fn test_custom_markers() {
        let policy = policy().with_auth_markers(vec!["/login".into(), "/register".into()]);
        let request = FetchRequest::navigate(url("https://portal.example/register"));
        assert_eq!(
            policy.classify(&request),
            RequestClassification::Bypass(BypassReason::AuthFlow)
        );
    }

    #[test]
    fn test_root_url_strips_path_and_query() {
        let policy = InterceptPolicy::new(url("https://portal.example/base?x=1"));
        assert_eq!(policy.root_url().as_str(), "https://portal.example/");
        assert_eq!(
            policy.resolve("/manifest.json").unwrap().as_str(),
            "https://portal.example/manifest.json"
        );
    }
}
