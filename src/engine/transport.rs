use crate::engine::form::FormPayload;
use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;

/// Raw HTTP reply. Status is not checked by the transport.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub url: String,
    pub status: u16,
    pub body: Bytes,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The two calls the form controller makes against the ingest service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(&self, path: &str, form: FormPayload) -> Result<HttpReply, TransportError>;

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpReply, TransportError>;
}
