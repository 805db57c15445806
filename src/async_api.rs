use crate::client::SnapshotClient;
use crate::surface::{ImageSurface, MemorySurface};
use crate::{Error, Result, SnapshotConfig, SnapshotRequest};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Snapshot(SnapshotRequest, oneshot::Sender<SnapshotOutcome>),
    Icon(SnapshotRequest, oneshot::Sender<SnapshotOutcome>),
    Close(oneshot::Sender<()>),
}

/// Where a dispatched request ended up.
///
/// `accepted` mirrors the blocking API's return value; `final_source` is the
/// URL the worker-side surface pointed at when the flow finished (the request
/// URL on success, an error-image URL on terminal failure, `None` for
/// preloads and rejected requests).
#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    pub accepted: bool,
    pub final_source: Option<String>,
}

/// An async-friendly snapshot client backed by a dedicated worker thread.
///
/// The worker thread owns a blocking [`SnapshotClient`] and executes commands
/// sent from async tasks, so callers get a non-blocking dispatch without the
/// blocking client having to be shared across threads. The retry loop runs on
/// the worker; awaiting the returned outcome is the async analogue of the
/// background image load completing.
#[derive(Clone)]
pub struct AsyncClient {
    cmd_tx: Sender<Command>,
}

impl AsyncClient {
    /// Create a new async client (spawns the worker thread that owns the
    /// blocking client).
    pub async fn new(config: SnapshotConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize the blocking client on the worker thread
            let client = match SnapshotClient::new(config) {
                Ok(c) => c,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Snapshot(request, resp) => {
                        let mut surface = MemorySurface::new(request.width, request.height);
                        let accepted = client.request_snapshot(&request, Some(&mut surface));
                        let _ = resp.send(SnapshotOutcome {
                            accepted,
                            final_source: surface.source().map(|s| s.to_string()),
                        });
                    }
                    Command::Icon(request, resp) => {
                        let mut surface = MemorySurface::new(request.width, request.height);
                        let accepted = client.request_website_icon(&request, Some(&mut surface));
                        let _ = resp.send(SnapshotOutcome {
                            accepted,
                            final_source: surface.source().map(|s| s.to_string()),
                        });
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Dispatch a snapshot request and await its outcome.
    pub async fn snapshot(&self, request: SnapshotRequest) -> Result<SnapshotOutcome> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Snapshot(request, tx));
        rx.await
            .map_err(|e| Error::Other(format!("Snapshot canceled: {}", e)))
    }

    /// Dispatch a website-icon request and await its outcome.
    pub async fn website_icon(&self, request: SnapshotRequest) -> Result<SnapshotOutcome> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Icon(request, tx));
        rx.await
            .map_err(|e| Error::Other(format!("Icon canceled: {}", e)))
    }

    /// Shut down the background worker.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn worker_init_propagates_config_errors() {
        let res = AsyncClient::new(SnapshotConfig::new("")).await;
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn rejected_requests_resolve_without_a_source() {
        let client = AsyncClient::new(SnapshotConfig::new("1a2b3c")).await.unwrap();
        let outcome = client.snapshot(SnapshotRequest::new("")).await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.final_source, None);
        client.close().await.unwrap();
    }
}
