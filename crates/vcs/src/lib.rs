//! Version-control integration
//!
//! This crate provides:
//! - `VcsBackend`: list uncommitted paths, stage, commit
//! - `GitCli`: backend driving the `git` executable
//! - `MemoryVcs`: in-process backend with scriptable failures
//! - `VcsGateway`: cached façade the rest of the tracker talks to

pub mod backend;
pub mod gateway;
pub mod git;
pub mod memory;

// Re-exports
pub use backend::{UncommittedPaths, VcsBackend, VcsError};
pub use gateway::VcsGateway;
pub use git::GitCli;
pub use memory::MemoryVcs;
