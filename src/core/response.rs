use bytes::Bytes;

use crate::core::node::Stat;
use crate::errors::KeeperError;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateResponse {
    /// The realized path: the requested one, suffixed for sequential nodes
    pub path_created: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistsResponse {
    pub stat: Stat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetResponse {
    pub data: Bytes,
    pub stat: Stat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetResponse {
    pub stat: Stat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse {
    /// Immediate child base names, in container order
    pub names: Vec<String>,
    pub stat: Stat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResponse;

#[derive(Debug, Clone, PartialEq)]
pub struct MultiResponse {
    pub responses: Vec<KeeperResponse>,
}

/// Successful response payloads, one variant per request kind.
///
/// Protocol errors travel as the `Err` arm of the completion channel, so a
/// `KeeperResponse` always describes a request that succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum KeeperResponse {
    Create(CreateResponse),
    Remove(RemoveResponse),
    Exists(ExistsResponse),
    Get(GetResponse),
    Set(SetResponse),
    List(ListResponse),
    Check(CheckResponse),
    Multi(MultiResponse),
}

impl KeeperResponse {
    /// Strips the session root prefix from every path field on the way back
    /// to the caller.
    pub(crate) fn strip_root_path(&mut self, root_path: &str) {
        if root_path.is_empty() {
            return;
        }
        match self {
            KeeperResponse::Create(r) => {
                if let Some(stripped) = r.path_created.strip_prefix(root_path) {
                    r.path_created = stripped.to_string();
                }
            }
            KeeperResponse::Multi(m) => {
                for response in &mut m.responses {
                    response.strip_root_path(root_path);
                }
            }
            _ => {}
        }
    }
}

/// Whether a watch fired for a node event or for session teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchKind {
    #[default]
    Node,
    Session,
}

/// Session liveness communicated alongside a watch event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Connected,
    Expired,
}

/// Event delivered through a one-shot watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchResponse {
    pub kind: WatchKind,
    pub state: SessionState,
    /// The watched path for node events; empty for session events
    pub path: String,
    pub error: Option<KeeperError>,
}

impl WatchResponse {
    /// A node or child-list event at `path`.
    pub(crate) fn node_event(path: &str) -> Self {
        Self {
            kind: WatchKind::Node,
            state: SessionState::Connected,
            path: path.to_string(),
            error: None,
        }
    }

    /// The terminal event delivered to every pending watch on expiry.
    pub(crate) fn session_expired() -> Self {
        Self {
            kind: WatchKind::Session,
            state: SessionState::Expired,
            path: String::new(),
            error: Some(KeeperError::SessionExpired),
        }
    }
}
