//! Coursemirror: Selective Local Mirroring of Remote Course Resources
//!
//! Mirrors a remote hierarchy of course resources onto a local sync root,
//! materializing and evicting individual nodes on demand, and keeps a live
//! view of the remote orchestrator's job/task status over a reconnecting
//! stream.

pub mod concurrency;
pub mod config;
pub mod course;
pub mod error;
pub mod logging;
pub mod mirror;
pub mod path;
pub mod status;
pub mod sync_state;
pub mod tooling;
pub mod tree;
