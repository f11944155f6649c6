//! Live orchestrator status client
//!
//! Maintains a merged status snapshot over a long-lived stream:
//! Disconnected → Connecting → Connected → message loop, back to a delayed
//! reconnect on any connection-level failure, indefinitely, until the owner
//! tears the listener down. One full-status fetch runs concurrently with
//! the first connect to seed the snapshot; stream updates then replace only
//! the orchestrator sub-object.

use crate::error::StreamError;
use crate::status::model::{Orchestrator, StatusSnapshot};
use crate::status::stream::{SnapshotFetcher, StatusStream, StreamConnector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Fixed delay between a connection failure and the next attempt. No
/// ceiling, no jitter; reconnection repeats until the listener is stopped.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

pub struct StatusStreamClient {
    fetcher: Arc<dyn SnapshotFetcher>,
    connector: Arc<dyn StreamConnector>,
    ws_url: String,
}

impl StatusStreamClient {
    pub fn new(
        fetcher: Arc<dyn SnapshotFetcher>,
        connector: Arc<dyn StreamConnector>,
        ws_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            connector,
            ws_url: ws_url.into(),
        }
    }

    /// Start the listen loop and hand back its controls.
    pub fn spawn(self) -> StatusListener {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(
            self.fetcher,
            self.connector,
            self.ws_url,
            snapshot_tx,
            shutdown_rx,
        ));
        StatusListener {
            snapshots: snapshot_rx,
            shutdown: shutdown_tx,
            handle,
        }
    }
}

/// Handle to a running status listen loop.
pub struct StatusListener {
    snapshots: watch::Receiver<Option<StatusSnapshot>>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StatusListener {
    /// Subscribe to merged snapshots. The channel always holds the latest
    /// value; a fresh subscriber sees the current snapshot immediately.
    pub fn subscribe(&self) -> watch::Receiver<Option<StatusSnapshot>> {
        self.snapshots.clone()
    }

    /// The latest merged snapshot, if any full fetch has succeeded yet.
    pub fn snapshot(&self) -> Option<StatusSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Tear the loop down: no further reconnects are scheduled, an
    /// in-flight receive is abandoned, and no further snapshots surface.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

async fn run(
    fetcher: Arc<dyn SnapshotFetcher>,
    connector: Arc<dyn StreamConnector>,
    ws_url: String,
    snapshots: watch::Sender<Option<StatusSnapshot>>,
    mut shutdown: watch::Receiver<bool>,
) {
    // Seed the snapshot and open the stream concurrently.
    let (fetched, connected) = tokio::join!(fetcher.fetch_full(), connector.connect(&ws_url));

    match fetched {
        Ok(snapshot) => {
            snapshots.send_replace(Some(snapshot));
        }
        Err(error) => warn!(error = %error, "Full status fetch failed"),
    }

    let mut stream: Option<Box<dyn StatusStream>> = match connected {
        Ok(stream) => {
            info!(url = %ws_url, "Status stream connected");
            Some(stream)
        }
        Err(error) => {
            warn!(error = %error, "Status stream connect failed");
            None
        }
    };

    loop {
        if *shutdown.borrow() {
            break;
        }

        let Some(active) = stream.as_mut() else {
            // Reconnecting: one attempt per delay window, scheduled only
            // after the previous receive definitively failed.
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = sleep(RECONNECT_DELAY) => {}
            }
            match connector.connect(&ws_url).await {
                Ok(reconnected) => {
                    info!(url = %ws_url, "Status stream reconnected");
                    stream = Some(reconnected);
                }
                Err(error) => {
                    warn!(error = %error, "Status stream reconnect failed");
                }
            }
            continue;
        };

        // Exactly one outstanding receive per connection.
        let received = tokio::select! {
            _ = shutdown.changed() => break,
            received = active.receive_one() => received,
        };

        match received {
            Ok(Some(bytes)) => merge_update(&snapshots, &bytes),
            Ok(None) => {}
            Err(error) => {
                report_disconnect(&error);
                stream = None;
            }
        }
    }

    debug!("Status listener stopped");
}

/// Decode an orchestrator-only payload and merge it into the current
/// snapshot. Undecodable messages are dropped without touching the
/// snapshot and without triggering a reconnect.
fn merge_update(snapshots: &watch::Sender<Option<StatusSnapshot>>, bytes: &[u8]) {
    let update: Orchestrator = match serde_json::from_slice(bytes) {
        Ok(update) => update,
        Err(error) => {
            debug!(error = %error, "Discarding undecodable stream message");
            return;
        }
    };
    snapshots.send_if_modified(|current| match current.as_mut() {
        Some(snapshot) => {
            snapshot.apply(update);
            true
        }
        // No full fetch has landed yet; there is no outer snapshot to
        // patch, so the update is dropped.
        None => false,
    });
}

fn report_disconnect(error: &StreamError) {
    match error {
        StreamError::Closed => {
            warn!(delay_s = RECONNECT_DELAY.as_secs(), "Status stream closed; reconnecting")
        }
        other => {
            warn!(error = %other, delay_s = RECONNECT_DELAY.as_secs(), "Status stream failed; reconnecting")
        }
    }
}
