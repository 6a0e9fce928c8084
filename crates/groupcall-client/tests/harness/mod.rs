//! Group-call integration test harness
//!
//! Provides an in-process mock signaling server on a random port and
//! counting fakes for the peer-connection and view collaborators.
//!
//! Basic usage pattern:
//!
//! 1. Start a `MockServer` and point a client at `server.url()`
//! 2. Read what the client sent with `server.next_command()`
//! 3. Drive the client with `server.push(...)` or `server.close()`

#![allow(dead_code)]

pub mod fakes;
pub mod mock_server;

use std::time::Duration;

pub use fakes::{CountingConnector, SilentView};
pub use mock_server::MockServer;

/// Upper bound for any single wait in the integration tests
pub const WAIT: Duration = Duration::from_secs(5);

/// Result type for test harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error type for test harness operations
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("groupcall_client=debug")
        .with_test_writer()
        .try_init();
}
