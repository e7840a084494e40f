use serde::{Deserialize, Serialize};

/// Role assumed when neither the live session nor the directory reports one.
pub const BASELINE_ROLE: &str = "USER";

/// How many characters of a bearer token the report is allowed to retain.
const TOKEN_PREVIEW_LEN: usize = 20;

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// A test identity exercised by the harness. Declared in configuration,
/// immutable during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub email: String,
    pub password: String,
    pub expected_role: String,
    #[serde(default)]
    pub description: String,
}

impl Subject {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        expected_role: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            expected_role: expected_role.into(),
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// DirectoryRecord
// ---------------------------------------------------------------------------

/// A subject's canonical record as resolved from the system of record.
///
/// Read-only snapshot; it may go stale between resolution and introspection.
/// That is acceptable — the record is a pre-check, and the live session's
/// self-report always wins over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl DirectoryRecord {
    /// The record's role, defaulting to [`BASELINE_ROLE`] when absent.
    pub fn role_or_baseline(&self) -> &str {
        self.role.as_deref().unwrap_or(BASELINE_ROLE)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An opaque bearer credential obtained from the primary service.
///
/// Never persisted and never logged in full: `Debug` and the report only
/// ever see [`Session::preview`], a truncated prefix that is useless as a
/// credential.
#[derive(Clone)]
pub struct Session(String);

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The full token, for the `Authorization` header only.
    pub fn bearer(&self) -> &str {
        &self.0
    }

    /// Truncated prefix safe to retain in reports and logs.
    pub fn preview(&self) -> String {
        let prefix: String = self.0.chars().take(TOKEN_PREVIEW_LEN).collect();
        format!("{prefix}...")
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Session").field(&self.preview()).finish()
    }
}

// ---------------------------------------------------------------------------
// IntrospectionResult
// ---------------------------------------------------------------------------

/// The primary service's self-reported view of the authenticated identity.
///
/// This is what a downstream header contract would be derived from, so the
/// harness treats it as ground truth. The service is not contractually fixed
/// on the id field name, hence the `_id` alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionResult {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// HeaderContract
// ---------------------------------------------------------------------------

/// The identity headers the downstream tool-invocation service is expected
/// to receive for an authenticated session. Derived and checked by the
/// harness, never transmitted by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderContract {
    #[serde(rename = "X-User-Role")]
    pub role: String,
    #[serde(rename = "X-User-Email")]
    pub email: String,
    #[serde(rename = "X-User-ID")]
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    /// The live role matched the subject's expected role.
    Passed,
    /// Introspection succeeded but the role did not match.
    Failed,
    /// A per-subject step failed before verification could run.
    Error,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// The classified outcome of one subject's verification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub email: String,
    #[serde(default)]
    pub description: String,
    pub status: VerdictStatus,
    pub expected_role: String,
    #[serde(default)]
    pub actual_role: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub token_preview: Option<String>,
    #[serde(default)]
    pub headers: Option<HeaderContract>,
    /// Present only when `status` is [`VerdictStatus::Error`].
    #[serde(default)]
    pub error: Option<String>,
}

impl Verdict {
    /// Build an `Error` verdict for a subject whose run was cut short.
    pub fn error(subject: &Subject, message: impl Into<String>) -> Self {
        Self {
            email: subject.email.clone(),
            description: subject.description.clone(),
            status: VerdictStatus::Error,
            expected_role: subject.expected_role.clone(),
            actual_role: None,
            user_id: None,
            token_preview: None,
            headers: None,
            error: Some(message.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Ordered verdicts for a completed (or aborted) run plus aggregate counts.
///
/// Created empty at run start, appended to after each subject, finalized at
/// run end. Owned exclusively by the orchestrator; verdicts appear in
/// subject declaration order, never reordered by completion time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub verdicts: Vec<Verdict>,
    pub passed: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a verdict and keep the aggregate counts current.
    ///
    /// `failed` counts both `Failed` and `Error` verdicts — anything that is
    /// not a clean pass counts against the run.
    pub fn record(&mut self, verdict: Verdict) {
        match verdict.status {
            VerdictStatus::Passed => self.passed += 1,
            VerdictStatus::Failed | VerdictStatus::Error => self.failed += 1,
        }
        self.verdicts.push(verdict);
    }

    pub fn total(&self) -> usize {
        self.verdicts.len()
    }

    /// Process exit signal: 0 iff every subject passed.
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 {
            0
        } else {
            1
        }
    }
}
