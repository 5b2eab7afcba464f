//! Client for the REST backend behind `/api/*`.

use portico_core::session::SessionToken;
use portico_core::{Error, Result};
use reqwest::{Client, Method, redirect};
use std::time::Duration;
use url::Url;

/// A backend reply, passed back to the page as-is.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Incoming request pieces the backend cares about.
#[derive(Debug, Clone, Default)]
pub struct BackendRequest {
    pub method: String,
    /// Path and query, starting with `/api/`.
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().redirect(redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Network(format!("Failed to build backend client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self, path_and_query: &str) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            path_and_query
        )
    }

    /// Forward a request. An explicit `Authorization` header wins over the
    /// session cookie.
    pub async fn forward(
        &self,
        request: BackendRequest,
        session: Option<&SessionToken>,
    ) -> Result<BackendResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::Network(format!("Invalid method {}: {}", request.method, e)))?;
        let url = self.endpoint(&request.path_and_query);

        let mut req = self
            .client
            .request(method, &url)
            .header("Accept", "application/json");

        if let Some(content_type) = &request.content_type {
            req = req.header("Content-Type", content_type.as_str());
        }
        match (&request.authorization, session) {
            (Some(authorization), _) => req = req.header("Authorization", authorization.as_str()),
            (None, Some(token)) => {
                req = req.header("Authorization", format!("Bearer {}", token.expose()))
            }
            (None, None) => {}
        }
        if !request.body.is_empty() {
            req = req.body(request.body);
        }

        let res = req
            .send()
            .await
            .map_err(|e| Error::Network(format!("Backend request {} failed: {}", url, e)))?;

        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read backend response: {}", e)))?;

        Ok(BackendResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(Url::parse(&server.uri()).unwrap(), None).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_path() {
        let client =
            BackendClient::new(Url::parse("http://backend:8000/v2/").unwrap(), None).unwrap();
        assert_eq!(
            client.endpoint("/api/services?q=tax"),
            "http://backend:8000/v2/api/services?q=tax"
        );
    }

    #[tokio::test]
    async fn test_session_becomes_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/me"))
            .and(header("authorization", "Bearer abc"))
            .and(header("accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"name":"Ana"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = SessionToken::from_cookie_value("abc").unwrap();
        let request = BackendRequest {
            method: "GET".to_string(),
            path_and_query: "/api/me".to_string(),
            ..Default::default()
        };
        let response = client_for(&server)
            .forward(request, Some(&token))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert_eq!(response.body, br#"{"name":"Ana"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_explicit_authorization_wins() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/applications"))
            .and(query_param("draft", "1"))
            .and(header("authorization", "Bearer explicit"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"service":"permit"}"#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let token = SessionToken::from_cookie_value("cookie-token").unwrap();
        let request = BackendRequest {
            method: "POST".to_string(),
            path_and_query: "/api/applications?draft=1".to_string(),
            content_type: Some("application/json".to_string()),
            authorization: Some("Bearer explicit".to_string()),
            body: br#"{"service":"permit"}"#.to_vec(),
        };
        let response = client_for(&server)
            .forward(request, Some(&token))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_error_status_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/me"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"detail":"expired"}"#))
            .mount(&server)
            .await;

        let request = BackendRequest {
            method: "GET".to_string(),
            path_and_query: "/api/me".to_string(),
            ..Default::default()
        };
        let response = client_for(&server).forward(request, None).await.unwrap();
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            BackendClient::new(Url::parse(&format!("http://{}", addr)).unwrap(), None).unwrap();
        let request = BackendRequest {
            method: "GET".to_string(),
            path_and_query: "/api/me".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            client.forward(request, None).await,
            Err(Error::Network(_))
        ));
    }
}
