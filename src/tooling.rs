//! Tooling & Integration Layer
//!
//! Thin presentation shell over the mirror engine and status client. The
//! core components stay UI-agnostic; everything here is replaceable
//! plumbing.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
