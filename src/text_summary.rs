//! Text summary builder for CLI output.

use crate::model::{AuditState, SubmissionOutcome, AUDIT_FAILED_MESSAGE};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    /// Status line, then the audit log if one was fetched.
    pub stdout: Vec<String>,
    /// Audit log body, written as-is after `stdout`.
    pub audit_log: Option<String>,
    /// Details that never reach the status line.
    pub stderr: Vec<String>,
}

pub(crate) fn build_text_summary(outcome: &SubmissionOutcome) -> TextSummary {
    let mut stdout = vec![outcome.status.message().to_string()];
    let mut stderr = vec![format!(
        "Submission {} ({} file(s), user {})",
        outcome.submission_id, outcome.file_count, outcome.user
    )];

    let mut audit_log = None;

    if let Some(err) = outcome.error.as_deref() {
        stderr.push(format!("Cause: {err}"));
    }

    match &outcome.audit {
        AuditState::Hidden => {}
        AuditState::Loading => stdout.push("Audit log:".into()),
        AuditState::Loaded(text) => {
            stdout.push("Audit log:".into());
            audit_log = Some(text.clone());
        }
        AuditState::Failed => {
            stdout.push(AUDIT_FAILED_MESSAGE.into());
            if let Some(err) = outcome.audit_error.as_deref() {
                stderr.push(format!("Audit cause: {err}"));
            }
        }
    }

    TextSummary {
        stdout,
        audit_log,
        stderr,
    }
}
