//! Identity directory seam.
//!
//! The system of record for user identities (seeding, storage) is an
//! external concern; the harness only needs a read-only lookup by email.
//! That lookup sits behind the [`IdentityDirectory`] trait so deployments
//! with no lookup endpoint can run with [`NullDirectory`] and tests can
//! substitute a mock.

use std::time::Duration;

use idc_core::types::DirectoryRecord;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from a directory lookup.
///
/// A missing record is **not** an error — it is an expected outcome during
/// harness setup and is reported as `Ok(None)` by [`IdentityDirectory::resolve`].
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The directory endpoint refused the lookup.
    #[error("directory lookup rejected: [{status}] {message}")]
    Rejected {
        /// HTTP status returned by the endpoint.
        status: u16,
        /// Server-supplied message, or the status reason when absent.
        message: String,
    },

    /// No response within the timeout, or the connection failed outright.
    #[error("directory unreachable: {0}")]
    Unreachable(String),

    /// A success status whose payload could not be read as a record.
    #[error("malformed directory record: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// IdentityDirectory trait
// ---------------------------------------------------------------------------

/// Read-only lookup of a subject's canonical record by email.
#[async_trait::async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolve the record for `email`, or `Ok(None)` when no record exists.
    async fn resolve(&self, email: &str) -> Result<Option<DirectoryRecord>, DirectoryError>;

    /// Human-readable name for progress reporting.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// HttpDirectory
// ---------------------------------------------------------------------------

/// Directory backed by an HTTP lookup endpoint: `GET {base_url}/users/{email}`.
///
/// A 404 is the NotFound case and maps to `Ok(None)`.
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl IdentityDirectory for HttpDirectory {
    async fn resolve(&self, email: &str) -> Result<Option<DirectoryRecord>, DirectoryError> {
        let url = format!("{}/users/{email}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DirectoryError::Unreachable(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp
                .status()
                .canonical_reason()
                .unwrap_or("unknown")
                .to_string();
            return Err(DirectoryError::Rejected { status, message });
        }

        let record: DirectoryRecord = resp
            .json()
            .await
            .map_err(|e| DirectoryError::Malformed(e.to_string()))?;
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ---------------------------------------------------------------------------
// NullDirectory – resolves nothing.
// ---------------------------------------------------------------------------

/// Placeholder directory for deployments without a lookup endpoint.
/// Every resolution returns `Ok(None)`, which the orchestrator treats as a
/// soft warning before proceeding straight to login.
#[derive(Debug, Clone, Default)]
pub struct NullDirectory;

#[async_trait::async_trait]
impl IdentityDirectory for NullDirectory {
    async fn resolve(&self, _email: &str) -> Result<Option<DirectoryRecord>, DirectoryError> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::{routing::get, Json, Router};
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

    #[tokio::test]
    async fn http_directory_resolves_record() {
        let app = Router::new().route(
            "/users/{email}",
            get(|| async {
                Json(json!({
                    "_id": "u42",
                    "email": "admin@test.com",
                    "role": "ADMIN",
                    "username": "admin"
                }))
            }),
        );
        let base = serve(app).await;

        let dir = HttpDirectory::new(&base, Duration::from_secs(2));
        let record = dir.resolve("admin@test.com").await.unwrap().unwrap();
        assert_eq!(record.id, "u42");
        assert_eq!(record.role.as_deref(), Some("ADMIN"));
        assert_eq!(record.username.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn http_directory_maps_404_to_none() {
        let app = Router::new().route(
            "/users/{email}",
            get(|| async { (StatusCode::NOT_FOUND, "") }),
        );
        let base = serve(app).await;

        let dir = HttpDirectory::new(&base, Duration::from_secs(2));
        assert!(dir.resolve("ghost@test.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn http_directory_rejects_on_server_error() {
        let app = Router::new().route(
            "/users/{email}",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "") }),
        );
        let base = serve(app).await;

        let dir = HttpDirectory::new(&base, Duration::from_secs(2));
        let err = dir.resolve("admin@test.com").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Rejected { status: 500, .. }));
    }

    #[tokio::test]
    async fn http_directory_unreachable_on_connect_failure() {
        // Port 1 is never serving.
        let dir = HttpDirectory::new("http://127.0.0.1:1", Duration::from_secs(1));
        let err = dir.resolve("admin@test.com").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unreachable(_)));
    }

    #[tokio::test]
    async fn null_directory_always_resolves_none() {
        let dir = NullDirectory;
        assert!(dir.resolve("anyone@test.com").await.unwrap().is_none());
        assert_eq!(dir.name(), "null");
    }
}
