//! Session acquisition and introspection against the primary service.

use std::time::Duration;

use serde_json::Value;

use idc_core::types::{IntrospectionResult, Session};

/// Token field names the login payload may use, probed in order; the first
/// one present wins. The primary service is not contractually fixed to a
/// single name.
const TOKEN_FIELDS: [&str; 3] = ["token", "accessToken", "access_token"];

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure taxonomy for login and introspection calls.
///
/// The three variants are distinguished because the orchestrator reports
/// them differently: `Unreachable` and `Malformed` indicate environment or
/// integration problems, not credential problems.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The service answered with a non-success status. For login this means
    /// bad credentials; for introspection, a rejected token.
    #[error("rejected: [{status}] {message}")]
    Rejected {
        /// Numeric HTTP status, always included in the rendered message.
        status: u16,
        /// Server-supplied message, or the status reason when absent.
        message: String,
    },

    /// No response within the timeout, or the connection failed outright.
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// A success status whose payload violates the contract (no token field
    /// on login, missing required identity fields on introspection).
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl AuthError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unreachable(format!("request timed out: {err}"))
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AuthClient
// ---------------------------------------------------------------------------

/// HTTP client for the primary service's authentication, identity, and
/// reachability endpoints. One instance is shared across all subjects of a
/// run; every call carries its own bounded timeout and is attempted exactly
/// once — the harness detects transient problems, it does not retry past them.
pub struct AuthClient {
    client: reqwest::Client,
    api_url: String,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl AuthClient {
    pub fn new(api_url: impl Into<String>, request_timeout: Duration, probe_timeout: Duration) -> Self {
        let api_url = api_url.into();
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            request_timeout,
            probe_timeout,
        }
    }

    /// Base URL this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Exchange credentials for a bearer session via the login endpoint.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Rejected`] on a non-success status (message carries the
    ///   numeric status plus any server-supplied `message` field)
    /// - [`AuthError::Unreachable`] on timeout or connection failure
    /// - [`AuthError::Malformed`] when a success payload carries none of the
    ///   accepted token fields
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let resp = self
            .client
            .post(format!("{}/api/auth/login", self.api_url))
            .timeout(self.request_timeout)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        let body = Self::success_body(resp).await?;
        extract_token(&body)
            .map(Session::new)
            .ok_or_else(|| AuthError::Malformed("no token field in login payload".to_string()))
    }

    /// Fetch the authenticated identity's self-reported attributes.
    pub async fn who_am_i(&self, session: &Session) -> Result<IntrospectionResult, AuthError> {
        let resp = self
            .client
            .get(format!("{}/api/user", self.api_url))
            .timeout(self.request_timeout)
            .bearer_auth(session.bearer())
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        let body = Self::success_body(resp).await?;
        serde_json::from_value(body).map_err(|e| {
            AuthError::Malformed(format!("identity payload missing required fields: {e}"))
        })
    }

    /// Run-precondition reachability probe against a lightweight endpoint.
    pub async fn probe(&self) -> Result<(), AuthError> {
        let resp = self
            .client
            .get(format!("{}/api/config", self.api_url))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(AuthError::Rejected {
                status: resp.status().as_u16(),
                message: resp
                    .status()
                    .canonical_reason()
                    .unwrap_or("unknown")
                    .to_string(),
            })
        }
    }

    /// Decode a response into its JSON body, mapping non-success statuses to
    /// [`AuthError::Rejected`] with the server's own message when it sent one.
    async fn success_body(resp: reqwest::Response) -> Result<Value, AuthError> {
        let status = resp.status();
        if status.is_success() {
            return resp
                .json()
                .await
                .map_err(|e| AuthError::Malformed(format!("undecodable payload: {e}")));
        }

        let fallback = status.canonical_reason().unwrap_or("unknown").to_string();
        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or(fallback);
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Walk the accepted token field names in order and return the first present.
fn extract_token(body: &Value) -> Option<&str> {
    TOKEN_FIELDS
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::{
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> AuthClient {
        AuthClient::new(base, Duration::from_secs(2), Duration::from_secs(1))
    }

    #[test]
    fn token_extraction_prefers_fields_in_order() {
        let both = json!({"accessToken": "second", "token": "first"});
        assert_eq!(extract_token(&both), Some("first"));

        let snake = json!({"access_token": "third"});
        assert_eq!(extract_token(&snake), Some("third"));

        assert_eq!(extract_token(&json!({"user": "nobody"})), None);
    }

    #[tokio::test]
    async fn login_accepts_camel_case_token_field() {
        let app = Router::new().route(
            "/api/auth/login",
            post(|| async { Json(json!({"accessToken": "jwt-abc"})) }),
        );
        let base = serve(app).await;

        let session = client(&base).login("admin@test.com", "pw").await.unwrap();
        assert_eq!(session.bearer(), "jwt-abc");
    }

    #[tokio::test]
    async fn login_rejected_includes_status_and_server_message() {
        let app = Router::new().route(
            "/api/auth/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Invalid credentials"})),
                )
            }),
        );
        let base = serve(app).await;

        let err = client(&base).login("admin@test.com", "bad").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
        let rendered = err.to_string();
        assert!(rendered.contains("401"));
        assert!(rendered.contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn login_without_token_field_is_malformed() {
        let app = Router::new().route(
            "/api/auth/login",
            post(|| async { Json(json!({"user": {"email": "admin@test.com"}})) }),
        );
        let base = serve(app).await;

        let err = client(&base).login("admin@test.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }

    #[tokio::test]
    async fn login_unreachable_on_connect_failure() {
        let err = client("http://127.0.0.1:1")
            .login("admin@test.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unreachable(_)));
    }

    #[tokio::test]
    async fn who_am_i_parses_mongo_style_id() {
        let app = Router::new().route(
            "/api/user",
            get(|| async {
                Json(json!({
                    "_id": "u1",
                    "email": "admin@test.com",
                    "role": "ADMIN",
                    "name": "Admin"
                }))
            }),
        );
        let base = serve(app).await;

        let session = Session::new("jwt-abc");
        let who = client(&base).who_am_i(&session).await.unwrap();
        assert_eq!(who.id, "u1");
        assert_eq!(who.role.as_deref(), Some("ADMIN"));
    }

    #[tokio::test]
    async fn who_am_i_missing_required_fields_is_malformed() {
        let app = Router::new().route(
            "/api/user",
            get(|| async { Json(json!({"role": "ADMIN"})) }),
        );
        let base = serve(app).await;

        let err = client(&base)
            .who_am_i(&Session::new("jwt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }

    #[tokio::test]
    async fn who_am_i_rejects_expired_token() {
        let app = Router::new().route(
            "/api/user",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "expired"}))) }),
        );
        let base = serve(app).await;

        let err = client(&base)
            .who_am_i(&Session::new("stale"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn probe_succeeds_against_config_endpoint() {
        let app = Router::new().route("/api/config", get(|| async { Json(json!({})) }));
        let base = serve(app).await;
        client(&base).probe().await.unwrap();
    }

    #[tokio::test]
    async fn probe_fails_when_nothing_listens() {
        let err = client("http://127.0.0.1:1").probe().await.unwrap_err();
        assert!(matches!(err, AuthError::Unreachable(_)));
    }
}
