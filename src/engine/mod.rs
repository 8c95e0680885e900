pub mod form;
pub mod http;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::{AuditError, IngestError};
use crate::model::{
    AuditState, FormEvent, Identity, IngestResponse, Status, Submission, SubmissionOutcome,
    AUDIT_LOG_PATH, INGEST_PATH,
};
use form::FormPayload;
use rand::RngCore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;
use transport::Transport;

/// Runs ingest submissions and audit fetches against a transport.
#[derive(Clone)]
pub struct IngestEngine {
    transport: Arc<dyn Transport>,
}

impl IngestEngine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Run one submission, reporting progress through `event_tx`.
    ///
    /// Primary-flow failures become `Status::Failed`. Audit failures become
    /// `AuditState::Failed` and leave the status at `Complete`. Every call
    /// performs a real POST.
    pub async fn submit(
        &self,
        submission: Submission,
        event_tx: &mpsc::UnboundedSender<FormEvent>,
    ) -> SubmissionOutcome {
        let submission_id = gen_submission_id();
        let span = tracing::info_span!("submission", id = %submission_id, user = %submission.user);
        self.submit_inner(submission_id, submission, event_tx)
            .instrument(span)
            .await
    }

    async fn submit_inner(
        &self,
        submission_id: String,
        submission: Submission,
        event_tx: &mpsc::UnboundedSender<FormEvent>,
    ) -> SubmissionOutcome {
        let user = submission.user.clone();
        let mut outcome = SubmissionOutcome {
            submission_id,
            timestamp_utc: now_rfc3339(),
            user: user.clone(),
            file_count: submission.files.len(),
            status: Status::Ingesting,
            audit: AuditState::Hidden,
            response: None,
            error: None,
            audit_error: None,
        };
        let _ = event_tx.send(FormEvent::Status(Status::Ingesting));
        tracing::debug!(files = outcome.file_count, "posting ingest form");

        let response = match self.ingest(submission).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "ingest failed");
                outcome.status = Status::Failed;
                outcome.error = Some(e.to_string());
                let _ = event_tx.send(FormEvent::Status(Status::Failed));
                return outcome;
            }
        };

        outcome.status = Status::Complete;
        let _ = event_tx.send(FormEvent::Status(Status::Complete));

        if response.audit_requested() {
            outcome.audit = AuditState::Loading;
            let _ = event_tx.send(FormEvent::AuditRevealed);
            match self.fetch_audit(&user).await {
                Ok(text) => {
                    tracing::debug!(bytes = text.len(), "audit log loaded");
                    outcome.audit = AuditState::Loaded(text.clone());
                    let _ = event_tx.send(FormEvent::AuditLoaded { text });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "audit log fetch failed");
                    outcome.audit = AuditState::Failed;
                    outcome.audit_error = Some(e.to_string());
                    let _ = event_tx.send(FormEvent::AuditFailed);
                }
            }
        }

        outcome.response = Some(response.body);
        outcome
    }

    /// POST the submission and parse the JSON reply. Any status counts as long
    /// as the body is JSON.
    pub async fn ingest(&self, submission: Submission) -> Result<IngestResponse, IngestError> {
        let payload = FormPayload::from_submission(submission);
        let reply = self.transport.post_form(INGEST_PATH, payload).await?;
        if !reply.is_success() {
            tracing::warn!(status = reply.status, url = %reply.url, "ingest replied with non-success status");
        }
        Ok(IngestResponse::from_slice(&reply.body)?)
    }

    /// GET the audit log for `user` as text, unmodified. Whatever body the
    /// server sends is the log, whatever the status code.
    pub async fn fetch_audit(&self, user: &Identity) -> Result<String, AuditError> {
        let reply = self
            .transport
            .get(AUDIT_LOG_PATH, &[("user", user.as_str())])
            .await?;
        if !reply.is_success() {
            tracing::warn!(status = reply.status, url = %reply.url, "audit log replied with non-success status");
        }
        Ok(String::from_utf8_lossy(&reply.body).into_owned())
    }
}

/// Client-local id used to correlate log lines. Never sent to the server.
fn gen_submission_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    format!("{:016x}", u64::from_le_bytes(b))
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}
