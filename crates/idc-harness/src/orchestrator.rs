//! Run orchestration: sequences subjects, isolates per-subject failures,
//! and aggregates the final report.

use tracing::{info, warn};

use idc_core::types::{RunReport, Subject, Verdict};

use crate::auth::AuthClient;
use crate::directory::IdentityDirectory;
use crate::verify::verify;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Fatal, run-aborting conditions. Per-subject failures never appear here —
/// they are converted into `Error` verdicts inside the loop.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The precondition reachability probe failed; nothing was verified.
    #[error("primary service unreachable at {url}: {detail}")]
    PrimaryUnreachable {
        /// Base URL that was probed.
        url: String,
        /// The probe failure, verbatim.
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No probe has been attempted yet.
    NotStarted,
    /// Probe succeeded; subjects are being processed.
    Running,
    /// Every subject has a verdict.
    Completed,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives one verification run over a declared subject list.
///
/// Subjects are processed strictly sequentially — concurrency buys nothing
/// at this scale and sequential output is far easier to audit. The report is
/// owned here exclusively, so verdict order is always declaration order.
pub struct Orchestrator<'a> {
    auth: &'a AuthClient,
    directory: &'a dyn IdentityDirectory,
    subjects: &'a [Subject],
    state: RunState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        auth: &'a AuthClient,
        directory: &'a dyn IdentityDirectory,
        subjects: &'a [Subject],
    ) -> Self {
        Self {
            auth,
            directory,
            subjects,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the run: probe once, then verify every subject in order.
    ///
    /// # Errors
    ///
    /// [`HarnessError::PrimaryUnreachable`] when the precondition probe
    /// fails; in that case zero verdicts exist. Every other failure is
    /// captured inside the returned report.
    pub async fn run(&mut self) -> Result<RunReport, HarnessError> {
        info!(url = self.auth.api_url(), "probing primary service");
        if let Err(e) = self.auth.probe().await {
            return Err(HarnessError::PrimaryUnreachable {
                url: self.auth.api_url().to_string(),
                detail: e.to_string(),
            });
        }
        self.state = RunState::Running;
        info!(
            subjects = self.subjects.len(),
            directory = self.directory.name(),
            "primary service reachable, starting verification run"
        );

        let mut report = RunReport::new();
        for subject in self.subjects {
            let verdict = self.check_subject(subject).await;
            match &verdict.error {
                Some(message) => warn!(
                    email = %subject.email,
                    error = %message,
                    "subject errored"
                ),
                None => info!(
                    email = %subject.email,
                    status = %verdict.status,
                    actual_role = verdict.actual_role.as_deref().unwrap_or("-"),
                    "subject verified"
                ),
            }
            report.record(verdict);
        }

        self.state = RunState::Completed;
        info!(
            total = report.total(),
            passed = report.passed,
            failed = report.failed,
            "verification run completed"
        );
        Ok(report)
    }

    /// Run the full pipeline for one subject. Every failure along the way is
    /// absorbed into an `Error` verdict so the next subject always runs.
    async fn check_subject(&self, subject: &Subject) -> Verdict {
        let record = match self.directory.resolve(&subject.email).await {
            Ok(Some(record)) => {
                info!(
                    email = %subject.email,
                    id = %record.id,
                    role = record.role_or_baseline(),
                    "directory record resolved"
                );
                Some(record)
            }
            Ok(None) => {
                // Soft warning only: login is still attempted without a record.
                warn!(email = %subject.email, "no directory record, attempting login anyway");
                None
            }
            Err(e) => return Verdict::error(subject, format!("directory lookup failed: {e}")),
        };

        let session = match self.auth.login(&subject.email, &subject.password).await {
            Ok(session) => session,
            Err(e) => return Verdict::error(subject, format!("login failed: {e}")),
        };

        let introspection = match self.auth.who_am_i(&session).await {
            Ok(introspection) => introspection,
            Err(e) => {
                // The session was obtained, so the error verdict keeps its preview.
                let mut verdict = Verdict::error(subject, format!("introspection failed: {e}"));
                verdict.token_preview = Some(session.preview());
                return verdict;
            }
        };

        let mut verdict = verify(subject, record.as_ref(), &introspection);
        verdict.token_preview = Some(session.preview());
        verdict
    }
}
