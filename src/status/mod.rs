//! Orchestrator status
//!
//! Wire model, transport seams and the reconnecting stream client.

pub mod client;
pub mod model;
pub mod stream;

pub use client::{StatusListener, StatusStreamClient, RECONNECT_DELAY};
pub use model::{Job, Orchestrator, OrchestratorState, StatusSnapshot, Task, TaskState};
pub use stream::{
    HttpSnapshotFetcher, SnapshotFetcher, StatusStream, StreamConnector, WebSocketConnector,
};
