//! One-shot watch registries.
//!
//! Two instances live inside the worker: the node registry, fired on
//! create/remove/set at the watched path, and the list registry, fired on
//! child add/remove under the watched path. A sender is consumed the first
//! time its path fires; session expiry flushes whatever is left.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tracing::debug;
use tracing::trace;

use crate::core::response::WatchResponse;
use crate::metrics::WATCHES_FIRED_METRIC;

/// One-shot delivery channel handed in by a read request.
pub type WatchSender = oneshot::Sender<WatchResponse>;

/// Path → ordered one-shot senders.
#[derive(Debug)]
pub(crate) struct WatchRegistry {
    /// Registry label for logs and metrics ("node" or "list")
    name: &'static str,
    watches: HashMap<String, Vec<WatchSender>>,
}

impl WatchRegistry {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            watches: HashMap::new(),
        }
    }

    /// Appends a watch for `path`, preserving registration order.
    pub fn register(&mut self, path: &str, sender: WatchSender) {
        trace!("[{}] watch registered for {}", self.name, path);
        self.watches.entry(path.to_string()).or_default().push(sender);
    }

    /// Delivers a node event to every watch registered for `path` and
    /// drains the entry. A receiver that has gone away is skipped.
    pub fn fire(&mut self, path: &str) {
        let Some(senders) = self.watches.remove(path) else {
            return;
        };

        debug!("[{}] firing {} watch(es) for {}", self.name, senders.len(), path);
        WATCHES_FIRED_METRIC
            .with_label_values(&[self.name])
            .inc_by(senders.len() as u64);

        let response = WatchResponse::node_event(path);
        for sender in senders {
            if sender.send(response.clone()).is_err() {
                trace!("[{}] watch receiver for {} dropped before delivery", self.name, path);
            }
        }
    }

    /// Delivers the session-expired event to every pending watch and
    /// clears the registry.
    pub fn expire_all(&mut self) {
        for (path, senders) in self.watches.drain() {
            for sender in senders {
                if sender.send(WatchResponse::session_expired()).is_err() {
                    trace!("[{}] watch receiver for {} dropped before expiry", self.name, path);
                }
            }
        }
    }

    #[cfg(test)]
    pub fn pending(&self, path: &str) -> usize {
        self.watches.get(path).map_or(0, Vec::len)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}
