//! Scripted transport that records every call.

use crate::engine::form::FormPayload;
use crate::engine::transport::{HttpReply, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub(crate) enum Recorded {
    Post {
        path: String,
        form: FormPayload,
    },
    Get {
        path: String,
        query: Vec<(String, String)>,
    },
}

type ErrorFactory = Box<dyn Fn() -> TransportError + Send + Sync>;

enum IngestScript {
    Reply { status: u16, body: String },
    Fail(ErrorFactory),
}

pub(crate) struct FakeTransport {
    ingest: IngestScript,
    audit_status: u16,
    audit_text: String,
    audit_error: Option<ErrorFactory>,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<Recorded>>,
}

/// A real `reqwest::Error` without touching the network.
pub(crate) fn network_error() -> reqwest::Error {
    reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("relative URL must not build")
}

impl FakeTransport {
    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            ingest: IngestScript::Reply {
                status,
                body: body.to_string(),
            },
            audit_status: 200,
            audit_text: String::new(),
            audit_error: None,
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn json(body: &str) -> Self {
        Self::raw(200, body)
    }

    pub fn failing_ingest(make: impl Fn() -> TransportError + Send + Sync + 'static) -> Self {
        Self {
            ingest: IngestScript::Fail(Box::new(make)),
            ..Self::raw(200, "")
        }
    }

    pub fn with_audit_text(mut self, text: &str) -> Self {
        self.audit_text = text.to_string();
        self
    }

    pub fn with_audit_status(mut self, status: u16) -> Self {
        self.audit_status = status;
        self
    }

    pub fn failing_audit(
        mut self,
        make: impl Fn() -> TransportError + Send + Sync + 'static,
    ) -> Self {
        self.audit_error = Some(Box::new(make));
        self
    }

    /// Hold every ingest reply until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Recorded::Post { .. }))
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post_form(&self, path: &str, form: FormPayload) -> Result<HttpReply, TransportError> {
        self.calls.lock().unwrap().push(Recorded::Post {
            path: path.to_string(),
            form,
        });
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.ingest {
            IngestScript::Reply { status, body } => Ok(HttpReply {
                url: format!("http://test{path}"),
                status: *status,
                body: Bytes::from(body.clone()),
            }),
            IngestScript::Fail(make) => Err(make()),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
        self.calls.lock().unwrap().push(Recorded::Get {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        if let Some(make) = &self.audit_error {
            return Err(make());
        }
        Ok(HttpReply {
            url: format!("http://test{path}"),
            status: self.audit_status,
            body: Bytes::from(self.audit_text.clone()),
        })
    }
}
