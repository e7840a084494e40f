//! Verification engine: pure expected-vs-actual role check and derivation of
//! the downstream header contract.
//!
//! This is the one place a false `Passed` would mask a real
//! authorization-propagation bug, so it stays a pure function of its inputs
//! with no I/O and no side effects.

use idc_core::types::{
    DirectoryRecord, HeaderContract, IntrospectionResult, Subject, Verdict, VerdictStatus,
    BASELINE_ROLE,
};

/// The role a downstream service would see for this session.
///
/// Priority: the live session's self-report, then the directory snapshot,
/// then the baseline. The live report is authoritative because the directory
/// read may be stale.
pub fn effective_role(
    record: Option<&DirectoryRecord>,
    introspection: &IntrospectionResult,
) -> String {
    introspection
        .role
        .clone()
        .or_else(|| record.and_then(|r| r.role.clone()))
        .unwrap_or_else(|| BASELINE_ROLE.to_string())
}

/// Classify one subject's outcome from a successful introspection.
///
/// `Passed` iff the effective role equals the subject's expected role,
/// otherwise `Failed` — a completed introspection never yields `Error`.
/// The attached [`HeaderContract`] preview is exactly the attribute set the
/// downstream tool-invocation service is expected to receive; making that
/// contract explicit and checkable is the point of the harness.
pub fn verify(
    subject: &Subject,
    record: Option<&DirectoryRecord>,
    introspection: &IntrospectionResult,
) -> Verdict {
    let actual_role = effective_role(record, introspection);
    let status = if actual_role == subject.expected_role {
        VerdictStatus::Passed
    } else {
        VerdictStatus::Failed
    };

    let headers = HeaderContract {
        role: actual_role.clone(),
        email: introspection.email.clone(),
        user_id: introspection.id.clone(),
    };

    Verdict {
        email: subject.email.clone(),
        description: subject.description.clone(),
        status,
        expected_role: subject.expected_role.clone(),
        actual_role: Some(actual_role),
        user_id: Some(introspection.id.clone()),
        token_preview: None,
        headers: Some(headers),
        error: None,
    }
}
