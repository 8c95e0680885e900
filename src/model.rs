use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity used when nothing else is configured.
pub const PLACEHOLDER_USER: &str = "definitelynotaspren";

pub const INGEST_PATH: &str = "/ingest";
pub const AUDIT_LOG_PATH: &str = "/audit-log";

/// Identity that ingest actions are attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(user: impl Into<String>) -> Self {
        Self(user.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self(PLACEHOLDER_USER.to_string())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }
}

/// Everything one submit sends to the ingest endpoint. Built fresh per submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub files: Vec<UploadFile>,
    /// Raw URL text; splitting is left to the server.
    pub urls: String,
    pub flag_reason: String,
    pub api_key: String,
    pub user: Identity,
}

/// Parsed ingest response body. Any JSON value is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestResponse {
    pub body: serde_json::Value,
}

impl IngestResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(|body| Self { body })
    }

    /// Whether the server signalled an audit record, using JavaScript truthiness.
    pub fn audit_requested(&self) -> bool {
        self.body.get("audit").map(is_truthy).unwrap_or(false)
    }
}

fn is_truthy(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Ingesting,
    Complete,
    Failed,
}

impl Status {
    /// Text shown in the status indicator.
    pub fn message(self) -> &'static str {
        match self {
            Status::Idle => "",
            Status::Ingesting => "Ingesting...",
            Status::Complete => "Ingest complete",
            Status::Failed => "Error running ingest",
        }
    }
}

pub const AUDIT_FAILED_MESSAGE: &str = "Error loading audit log";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "text")]
pub enum AuditState {
    #[default]
    Hidden,
    Loading,
    Loaded(String),
    Failed,
}

impl AuditState {
    pub fn is_visible(&self) -> bool {
        !matches!(self, AuditState::Hidden)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadRoute {
    Public,
    Private,
}

impl DownloadRoute {
    pub fn path(self) -> &'static str {
        match self {
            DownloadRoute::Public => "/download/public",
            DownloadRoute::Private => "/download/private",
        }
    }

    /// Only the private route carries the identity.
    pub fn carries_identity(self) -> bool {
        matches!(self, DownloadRoute::Private)
    }
}

/// Result of one submission, for text/JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub submission_id: String,
    pub timestamp_utc: String,
    pub user: Identity,
    pub file_count: usize,
    pub status: Status,
    pub audit: AuditState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum FormEvent {
    Status(Status),
    AuditRevealed,
    AuditLoaded {
        text: String,
    },
    AuditFailed,
    Info(String),
    Navigated {
        target: String,
    },
    SubmissionFinished {
        // Boxed to keep the event small.
        outcome: Box<SubmissionOutcome>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: serde_json::Value) -> IngestResponse {
        IngestResponse { body }
    }

    #[test]
    fn audit_member_uses_truthiness() {
        assert!(response(json!({"audit": true})).audit_requested());
        assert!(response(json!({"audit": 1})).audit_requested());
        assert!(response(json!({"audit": "yes"})).audit_requested());
        assert!(response(json!({"audit": {}})).audit_requested());
        assert!(response(json!({"audit": []})).audit_requested());

        assert!(!response(json!({"audit": false})).audit_requested());
        assert!(!response(json!({"audit": 0})).audit_requested());
        assert!(!response(json!({"audit": 0.0})).audit_requested());
        assert!(!response(json!({"audit": ""})).audit_requested());
        assert!(!response(json!({"audit": null})).audit_requested());
        assert!(!response(json!({"ingested": 3})).audit_requested());
    }

    #[test]
    fn non_object_bodies_never_request_audit() {
        assert!(!response(json!([1, 2])).audit_requested());
        assert!(!response(json!("audit")).audit_requested());
        assert!(!response(json!(null)).audit_requested());
    }

    #[test]
    fn from_slice_rejects_non_json() {
        assert!(IngestResponse::from_slice(b"<html>oops</html>").is_err());
        assert!(IngestResponse::from_slice(b"").is_err());
        let r = IngestResponse::from_slice(br#"{"audit":true}"#).unwrap();
        assert!(r.audit_requested());
    }

    #[test]
    fn status_messages_are_fixed() {
        assert_eq!(Status::Ingesting.message(), "Ingesting...");
        assert_eq!(Status::Complete.message(), "Ingest complete");
        assert_eq!(Status::Failed.message(), "Error running ingest");
    }

    #[test]
    fn identity_defaults_to_placeholder() {
        assert_eq!(Identity::default().as_str(), "definitelynotaspren");
        assert_eq!(Submission::default().user, Identity::default());
    }
}
