//! Submission lifecycle controller.
//!
//! Owns the in-flight submission and the download triggers, and emits events
//! for presentation layers.

use crate::engine::http::HttpTransport;
use crate::engine::IngestEngine;
use crate::model::{DownloadRoute, FormEvent, Identity, Submission, SubmissionOutcome};
use crate::navigation::{self, Navigated, Navigator};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

pub(crate) const ALREADY_IN_PROGRESS: &str = "Ingest already in progress";

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(Submission),
    Download(DownloadRoute),
    Quit,
}

/// Everything the controller needs to act on commands.
#[derive(Clone)]
pub(crate) struct Services {
    pub engine: IngestEngine,
    pub transport: HttpTransport,
    pub navigator: Arc<dyn Navigator>,
    pub user: Identity,
}

fn start_submission(
    engine: &IngestEngine,
    submission: Submission,
    event_tx: UnboundedSender<FormEvent>,
) -> JoinHandle<SubmissionOutcome> {
    let engine = engine.clone();
    tokio::spawn(async move { engine.submit(submission, &event_tx).await })
}

fn start_download(
    services: &Services,
    route: DownloadRoute,
    event_tx: UnboundedSender<FormEvent>,
) -> JoinHandle<()> {
    let services = services.clone();
    tokio::spawn(async move {
        let res = navigation::trigger_download(
            &services.transport,
            services.navigator.as_ref(),
            route,
            &services.user,
        )
        .await;
        let ev = match res {
            Ok(Navigated::Saved(path)) => FormEvent::Navigated {
                target: path.display().to_string(),
            },
            Ok(Navigated::Printed) => {
                match navigation::download_url(&services.transport, route, &services.user) {
                    Ok(url) => FormEvent::Navigated {
                        target: navigation::path_and_query(&url),
                    },
                    Err(e) => FormEvent::Info(format!("Download failed: {e}")),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, ?route, "download failed");
                FormEvent::Info(format!("Download failed: {e}"))
            }
        };
        let _ = event_tx.send(ev);
    })
}

/// Serve UI commands until `Quit` (or the command channel closes).
///
/// At most one submission is in flight; a `Submit` that arrives while one is
/// running is dropped with an info message. `Quit` waits for the in-flight
/// submission so its outcome still reaches the UI.
pub(crate) async fn run_controller(
    services: Services,
    event_tx: UnboundedSender<FormEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut in_flight: Option<JoinHandle<SubmissionOutcome>> = None;
    let mut downloads: Vec<JoinHandle<()>> = Vec::new();
    let mut quit_pending = false;
    let mut cmd_open = true;

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if cmd_open && !quit_pending => {
                match cmd {
                    Some(UiCommand::Submit(submission)) => {
                        if in_flight.is_some() {
                            tracing::info!("submit ignored, ingest already in flight");
                            let _ = event_tx.send(FormEvent::Info(ALREADY_IN_PROGRESS.into()));
                        } else {
                            in_flight = Some(start_submission(&services.engine, submission, event_tx.clone()));
                        }
                    }
                    Some(UiCommand::Download(route)) => {
                        downloads.retain(|h| !h.is_finished());
                        downloads.push(start_download(&services, route, event_tx.clone()));
                    }
                    Some(UiCommand::Quit) => {
                        quit_pending = true;
                        if in_flight.is_none() {
                            break Ok(());
                        }
                    }
                    None => {
                        cmd_open = false;
                        quit_pending = true;
                        if in_flight.is_none() {
                            break Ok(());
                        }
                    }
                }
            }
            // Keep the JoinHandle in place until this branch wins so completion is never lost.
            maybe_done = async {
                if let Some(h) = in_flight.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    in_flight = None;
                    match join_res {
                        Ok(outcome) => {
                            let _ = event_tx.send(FormEvent::SubmissionFinished {
                                outcome: Box::new(outcome),
                            });
                        }
                        Err(e) => {
                            let _ = event_tx.send(FormEvent::Info(format!(
                                "Submission task failed: {e}"
                            )));
                        }
                    }
                    if quit_pending {
                        break Ok(());
                    }
                }
            }
        }
    };

    for h in downloads {
        h.abort();
    }

    res
}
