//! HTTP client fixture for the CRUD service under test.
//!
//! The CRUD service (users over a relational store) is an external
//! collaborator; this client wraps its handful of endpoints and the
//! status codes the harness cares about. Anything beyond that contract
//! is deliberately out of scope.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Maximum length for error bodies carried in error messages.
const MAX_ERROR_BODY_LEN: usize = 256;

/// Truncate an error response body for diagnostics.
fn truncate_error_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LEN {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX_ERROR_BODY_LEN)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...[truncated]", &body[..cut])
    } else {
        body.to_string()
    }
}

/// CRUD client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },
}

/// Request body for creating a user.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    /// Display name.
    pub name: String,

    /// Email; unique across the store.
    pub email: String,

    /// Active flag.
    pub is_active: bool,
}

/// A persisted user entity.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Email.
    pub email: String,

    /// Active flag.
    pub is_active: bool,
}

/// Client for the CRUD service under test.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: Client,
}

impl ApiClient {
    /// Create a new client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::HttpError` if the underlying HTTP client
    /// cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    /// Base URL of the service.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client, for custom requests.
    #[must_use]
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Check the `/health` endpoint.
    ///
    /// Returns `Ok(())` on 200, `Err` on any other status or transport
    /// failure.
    pub async fn health_check(&self) -> Result<(), ApiError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        Ok(())
    }

    /// Create a user; expects 201.
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User, ApiError> {
        let response = self.raw_create_user(request).await?;
        let status = response.status();

        if status.as_u16() != 201 {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        Ok(response.json().await?)
    }

    /// Issue a create request and return the raw response.
    ///
    /// Useful for asserting error statuses, e.g. the 400 on a duplicate
    /// email.
    pub async fn raw_create_user(
        &self,
        request: &CreateUserRequest,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/users/", self.base_url);
        Ok(self.http_client.post(&url).json(request).send().await?)
    }

    /// List all users; expects 200.
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let url = format!("{}/users/", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch a single user by id; expects 200.
    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        let url = format!("{}/users/{}", self.base_url, id);
        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        Ok(response.json().await?)
    }

    /// Delete a user by id; expects 200 (404 surfaces as `RequestFailed`).
    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        let url = format!("{}/users/{}", self.base_url, id);
        let response = self.http_client.delete(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_create_user_request_serialization() {
        let request = CreateUserRequest {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            is_active: true,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"name\":\"John Doe\""));
        assert!(json.contains("\"email\":\"john@example.com\""));
        assert!(json.contains("\"is_active\":true"));
    }

    #[test]
    fn test_user_deserialization() {
        let json = r#"{"id": 7, "name": "Jane", "email": "jane@example.com", "is_active": false}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.email, "jane@example.com");
        assert!(!user.is_active);
    }

    #[test]
    fn test_error_body_truncation() {
        let long_body = "x".repeat(600);
        let truncated = truncate_error_body(&long_body);
        assert!(truncated.ends_with("...[truncated]"));
        assert!(truncated.len() <= MAX_ERROR_BODY_LEN + 15);

        let short = r#"{"detail": "Email already registered"}"#;
        assert_eq!(truncate_error_body(short), short);
    }

    #[tokio::test]
    async fn test_health_check_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        client(&server).health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_health_check_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).health_check().await.unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_create_user_expects_201() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 1,
                "name": "John Doe",
                "email": "john@example.com",
                "is_active": true
            })))
            .mount(&server)
            .await;

        let user = client(&server)
            .create_user(&CreateUserRequest {
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                is_active: true,
            })
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.email, "john@example.com");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"detail": "Email already registered"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .create_user(&CreateUserRequest {
                name: "Dup".to_string(),
                email: "dup@example.com".to_string(),
                is_active: true,
            })
            .await
            .unwrap_err();

        match err {
            ApiError::RequestFailed { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("already registered"));
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_and_delete_users() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "name": "A", "email": "a@example.com", "is_active": true},
                {"id": 2, "name": "B", "email": "b@example.com", "is_active": true}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let api = client(&server);
        let users = api.list_users().await.unwrap();
        assert_eq!(users.len(), 2);

        api.delete_user(1).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_404() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/users/99"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).delete_user(99).await.unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed { status: 404, .. }));
    }
}
