//! The single-worker processing loop.
//!
//! Exactly one task owns the node tree and both watch registries. Requests
//! arrive through a bounded queue as [`RequestInfo`] envelopes; each
//! dequeued envelope consumes the next zxid, successful or not, so zxid
//! assignment totally orders processed requests.

use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::core::node::NodeStore;
use crate::core::request::KeeperRequest;
use crate::core::response::KeeperResponse;
use crate::core::response::WatchResponse;
use crate::core::watch::WatchRegistry;
use crate::core::watch::WatchSender;
use crate::errors::KeeperError;
use crate::metrics::QUEUE_WAIT_DURATION_METRIC;
use crate::metrics::REQUESTS_PROCESSED_METRIC;

/// A queued request together with its delivery channels.
#[derive(Debug)]
pub(crate) struct RequestInfo {
    pub request: KeeperRequest,
    /// Enqueue time, for queue-wait accounting
    pub received_at: Instant,
    pub callback: Option<oneshot::Sender<Result<KeeperResponse, KeeperError>>>,
    pub watch: Option<WatchSender>,
}

pub(crate) struct Processor {
    store: NodeStore,
    node_watches: WatchRegistry,
    list_watches: WatchRegistry,
    /// Last assigned transaction id
    zxid: i64,
    /// Normalized session root; prepended to request paths before
    /// processing and stripped from everything that leaves the worker
    root_path: String,
    request_rx: Option<mpsc::Receiver<RequestInfo>>,
    shutdown_signal: watch::Receiver<()>,
}

impl Processor {
    pub(crate) fn new(
        root_path: String,
        request_rx: mpsc::Receiver<RequestInfo>,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            store: NodeStore::new(),
            node_watches: WatchRegistry::new("node"),
            list_watches: WatchRegistry::new("list"),
            zxid: 0,
            root_path,
            request_rx: Some(request_rx),
            shutdown_signal,
        }
    }

    /// Runs until the session is finalized or every façade handle is gone,
    /// then drains: pending watches and queued envelopes are all answered
    /// with session expiry.
    pub(crate) async fn run(mut self) {
        let mut request_rx = self
            .request_rx
            .take()
            .expect("Expected a request receiver but found None");
        let mut shutdown_signal = self.shutdown_signal.clone();

        loop {
            tokio::select! {
                biased;

                // P0: session finalization wins over queued work
                _ = shutdown_signal.changed() => {
                    warn!("[Processor] shutdown signal received.");
                    break;
                }

                maybe_info = request_rx.recv() => {
                    match maybe_info {
                        Some(info) => self.handle_request(info),
                        None => {
                            debug!("[Processor] all request senders dropped.");
                            break;
                        }
                    }
                }
            }
        }

        self.drain(&mut request_rx);
    }

    fn handle_request(&mut self, mut info: RequestInfo) {
        // Watches are installed before processing: a read that fails still
        // leaves its watch behind, to be fired by a later mutation.
        if let Some(watch) = info.watch.take() {
            let registry = if info.request.is_list() {
                &mut self.list_watches
            } else {
                &mut self.node_watches
            };
            registry.register(info.request.path(), watch);
        }

        // A zxid is consumed per dequeued envelope, failed requests included.
        self.zxid += 1;

        QUEUE_WAIT_DURATION_METRIC
            .with_label_values(&[info.request.kind_name()])
            .observe(info.received_at.elapsed().as_millis() as f64);

        let mut request = info.request;
        request.add_root_path(&self.root_path);
        let mut result = request.process(&mut self.store, self.zxid);
        request.strip_root_path(&self.root_path);

        match &mut result {
            Ok(response) => {
                request.process_watches(&mut self.node_watches, &mut self.list_watches);
                response.strip_root_path(&self.root_path);
            }
            Err(error) => {
                trace!(
                    "[Processor] {} for {} failed: {}",
                    request.kind_name(),
                    request.path(),
                    error
                );
            }
        }

        REQUESTS_PROCESSED_METRIC
            .with_label_values(&[
                request.kind_name(),
                if result.is_ok() { "ok" } else { "error" },
            ])
            .inc();
        debug!(
            "[Processor] zxid={} processed {} request",
            self.zxid,
            request.kind_name()
        );

        if let Some(callback) = info.callback.take() {
            if callback.send(result).is_err() {
                trace!("[Processor] completion receiver dropped before delivery");
            }
        }
    }

    /// Session-expiry drain: pushes are already fenced off by the expired
    /// flag, so everything still queued here is answered exactly once.
    fn drain(&mut self, request_rx: &mut mpsc::Receiver<RequestInfo>) {
        self.node_watches.expire_all();
        self.list_watches.expire_all();

        while let Ok(mut info) = request_rx.try_recv() {
            if let Some(callback) = info.callback.take() {
                if callback.send(Err(KeeperError::SessionExpired)).is_err() {
                    trace!("[Processor] completion receiver dropped before expiry");
                }
            }
            if let Some(watch) = info.watch.take() {
                if watch.send(WatchResponse::session_expired()).is_err() {
                    trace!("[Processor] watch receiver dropped before expiry");
                }
            }
        }
        debug!("[Processor] drained; {} nodes retained", self.store.len());
    }
}
