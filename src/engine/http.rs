use crate::config::Config;
use crate::engine::form::FormPayload;
use crate::engine::transport::{HttpReply, Transport};
use crate::error::{NavigationError, TransportError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const FALLBACK_FILE_NAME: &str = "download";

/// reqwest-backed transport rooted at the configured base URL.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url).context("parse base_url")?;
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        // No timeout unless configured; requests wait as long as the server does.
        if let Some(t) = cfg.timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().context("build HTTP client")?;
        Ok(Self { http, base_url })
    }

    /// Join an origin-relative path onto the base URL and append `query` pairs.
    pub fn resolve(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|_| TransportError::InvalidUrl(format!("{}{}", self.base_url, path)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET `url` and stream the body into `dir`. Returns the written path.
    pub async fn download_to(&self, url: Url, dir: &Path) -> Result<PathBuf, NavigationError> {
        let url_str = url.to_string();
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url_str.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(TransportError::Status {
                url: url_str,
                status: resp.status().as_u16(),
            }
            .into());
        }

        let file_name = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name)
            .or_else(|| last_path_segment(&url))
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        let path = dir.join(file_name);

        let write_err = |source| NavigationError::Write {
            path: path.clone(),
            source,
        };
        let mut file = tokio::fs::File::create(&path).await.map_err(write_err)?;
        let mut stream = resp.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| TransportError::Body {
                url: url_str.clone(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;

        tracing::info!(url = %url_str, path = %path.display(), bytes = written, "download saved");
        Ok(path)
    }

    async fn collect(url: String, resp: reqwest::Response) -> Result<HttpReply, TransportError> {
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|source| TransportError::Body {
            url: url.clone(),
            source,
        })?;
        Ok(HttpReply { url, status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, path: &str, form: FormPayload) -> Result<HttpReply, TransportError> {
        let url = self.resolve(path, &[])?;
        let url_str = url.to_string();
        let request_err = |source| TransportError::Request {
            url: url_str.clone(),
            source,
        };
        let form = form.into_reqwest().map_err(request_err)?;
        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(request_err)?;
        Self::collect(url_str, resp).await
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
        let url = self.resolve(path, query)?;
        let url_str = url.to_string();
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url_str.clone(),
                source,
            })?;
        Self::collect(url_str, resp).await
    }
}

/// Pull `filename` out of a Content-Disposition value, keeping only the final path component.
fn attachment_file_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))
        .map(|v| v.trim_matches('"'))
        .and_then(|v| Path::new(v).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|mut segs| segs.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
