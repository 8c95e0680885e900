//! Download triggers.
//!
//! A trigger only resolves its route and hands the URL to a [`Navigator`];
//! whatever happens to the response is the navigator's business.

use crate::engine::http::HttpTransport;
use crate::error::NavigationError;
use crate::model::{DownloadRoute, Identity};
use async_trait::async_trait;
use reqwest::Url;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigated {
    Saved(PathBuf),
    Printed,
}

/// Plays the browser's role for download routes.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, url: Url) -> Result<Navigated, NavigationError>;
}

/// Fetches the route and writes the body into a directory.
pub struct SaveToDisk {
    transport: HttpTransport,
    dir: PathBuf,
}

impl SaveToDisk {
    pub fn new(transport: HttpTransport, dir: PathBuf) -> Self {
        Self { transport, dir }
    }
}

#[async_trait]
impl Navigator for SaveToDisk {
    async fn navigate(&self, url: Url) -> Result<Navigated, NavigationError> {
        let path = self.transport.download_to(url, &self.dir).await?;
        Ok(Navigated::Saved(path))
    }
}

/// Prints the URL for another tool to open.
pub struct PrintUrl;

#[async_trait]
impl Navigator for PrintUrl {
    async fn navigate(&self, url: Url) -> Result<Navigated, NavigationError> {
        println!("{url}");
        Ok(Navigated::Printed)
    }
}

/// Absolute URL for a download route. Only the private route carries `user`.
pub fn download_url(
    transport: &HttpTransport,
    route: DownloadRoute,
    user: &Identity,
) -> Result<Url, NavigationError> {
    let user_pair = [("user", user.as_str())];
    let query: &[(&str, &str)] = if route.carries_identity() {
        &user_pair
    } else {
        &[]
    };
    Ok(transport.resolve(route.path(), query)?)
}

pub async fn trigger_download(
    transport: &HttpTransport,
    navigator: &dyn Navigator,
    route: DownloadRoute,
    user: &Identity,
) -> Result<Navigated, NavigationError> {
    let url = download_url(transport, route, user)?;
    tracing::debug!(%url, ?route, "navigating");
    navigator.navigate(url).await
}

/// Path plus query string, as a browser's location bar would show relative to the origin.
pub fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}
