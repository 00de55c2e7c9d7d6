//! Workflow integration tests

pub mod session_config;
pub mod stake_lifecycle;
