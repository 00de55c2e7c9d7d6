//! CLI command implementations

pub mod config;
pub mod history;
pub mod init;
pub mod intent;
pub mod reset;
pub mod scan;
pub mod stake;
pub mod status;
pub mod watch;
