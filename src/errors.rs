//! Coordination Emulator Error Hierarchy
//!
//! Defines the closed protocol error surface visible to callers together
//! with crate-level configuration failures.

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Protocol-level error codes surfaced through the request/response API
    #[error(transparent)]
    Keeper(#[from] KeeperError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Configuration validation failures
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Protocol error codes mirrored from the coordination service API.
///
/// Per-request errors (`NoNode`, `NodeExists`, `NoChildrenForEphemerals`,
/// `BadVersion`, `NotEmpty`, `BadArguments`) are returned through response
/// channels and never tear down the session. `OperationTimeout` and
/// `SessionExpired` are terminal: observing either means the session has
/// been finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum KeeperError {
    #[error("node does not exist")]
    NoNode,

    #[error("node already exists")]
    NodeExists,

    #[error("ephemeral nodes may not have children")]
    NoChildrenForEphemerals,

    #[error("version conflict")]
    BadVersion,

    #[error("node has children")]
    NotEmpty,

    #[error("bad arguments")]
    BadArguments,

    #[error("operation timeout")]
    OperationTimeout,

    #[error("session expired")]
    SessionExpired,
}
