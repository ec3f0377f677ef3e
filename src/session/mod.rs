//! The session façade.
//!
//! [`MemKeeper`] owns the bounded request queue and the worker task. Every
//! public operation builds a concrete request, wraps it in an envelope with
//! a fresh completion channel, and pushes it; the worker answers through
//! the channel in processing order.
//!
//! The engine carries exactly one implicit session. It ends when
//! [`MemKeeper::finalize`] runs, or when a push times out or races the
//! expiry flag, which finalizes the session as a side effect.


use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use autometrics::autometrics;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::config::KeeperConfig;
use crate::core::node::Acl;
use crate::core::node::Stat;
use crate::core::processor::Processor;
use crate::core::processor::RequestInfo;
use crate::core::request::CheckRequest;
use crate::core::request::CreateMode;
use crate::core::request::CreateRequest;
use crate::core::request::ExistsRequest;
use crate::core::request::GetRequest;
use crate::core::request::KeeperRequest;
use crate::core::request::ListRequest;
use crate::core::request::MultiRequest;
use crate::core::request::RemoveRequest;
use crate::core::request::SetRequest;
use crate::core::response::KeeperResponse;
use crate::core::watch::WatchSender;
use crate::errors::KeeperError;
use crate::metrics::SESSIONS_EXPIRED_METRIC;
use crate::API_SLO;

/// In-process coordination engine handle.
///
/// Cheap to instantiate and fully independent of other instances; tests may
/// run many in parallel. Construction installs the root node and spawns the
/// worker, so it must happen inside a tokio runtime.
pub struct MemKeeper {
    request_tx: mpsc::Sender<RequestInfo>,
    /// Serializes push against the expired transition so finalize's drain
    /// sees every queued request
    push_lock: tokio::sync::Mutex<()>,
    expired: AtomicBool,
    shutdown_tx: watch::Sender<()>,
    processor_handle: Mutex<Option<JoinHandle<()>>>,
    operation_timeout: Duration,
}

impl MemKeeper {
    pub fn new(config: KeeperConfig) -> crate::Result<Self> {
        config.validate()?;

        let (request_tx, request_rx) = mpsc::channel(config.request_queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let processor = Processor::new(config.normalized_root_path(), request_rx, shutdown_rx);
        let processor_handle = tokio::spawn(processor.run());

        info!(
            "memkeeper session started, root_path={:?}",
            config.root_path
        );
        Ok(Self {
            request_tx,
            push_lock: tokio::sync::Mutex::new(()),
            expired: AtomicBool::new(false),
            shutdown_tx,
            processor_handle: Mutex::new(Some(processor_handle)),
            operation_timeout: config.operation_timeout(),
        })
    }

    /// Creates a node and returns the realized path (suffixed for
    /// sequential modes).
    ///
    /// # Errors
    /// - [`KeeperError::NodeExists`] if `path` is already present
    /// - [`KeeperError::NoNode`] if the parent is missing
    /// - [`KeeperError::NoChildrenForEphemerals`] if the parent is ephemeral
    #[autometrics(objective = API_SLO)]
    pub async fn create(
        &self,
        path: &str,
        data: impl Into<Bytes>,
        mode: CreateMode,
        acls: Vec<Acl>,
    ) -> Result<String, KeeperError> {
        let request = KeeperRequest::Create(CreateRequest {
            path: path.to_string(),
            data: data.into(),
            is_ephemeral: mode.is_ephemeral(),
            is_sequential: mode.is_sequential(),
            acls,
        });
        match self.submit(request, None).await? {
            KeeperResponse::Create(response) => Ok(response.path_created),
            response => unreachable!("create produced mismatched response: {response:?}"),
        }
    }

    /// Removes a childless node, conditionally on `version` unless it is -1.
    #[autometrics(objective = API_SLO)]
    pub async fn remove(&self, path: &str, version: i32) -> Result<(), KeeperError> {
        let request = KeeperRequest::Remove(RemoveRequest {
            path: path.to_string(),
            version,
        });
        match self.submit(request, None).await? {
            KeeperResponse::Remove(_) => Ok(()),
            response => unreachable!("remove produced mismatched response: {response:?}"),
        }
    }

    /// Returns the node's stat, or `None` if it does not exist.
    #[autometrics(objective = API_SLO)]
    pub async fn exists(&self, path: &str) -> Result<Option<Stat>, KeeperError> {
        self.exists_inner(path, None).await
    }

    /// [`exists`](Self::exists), additionally installing a one-shot watch.
    ///
    /// The watch is installed whether or not the node exists: a miss still
    /// leaves a watch that fires on the eventual create.
    #[autometrics(objective = API_SLO)]
    pub async fn exists_watch(
        &self,
        path: &str,
        watch: WatchSender,
    ) -> Result<Option<Stat>, KeeperError> {
        self.exists_inner(path, Some(watch)).await
    }

    /// Reads a node's payload and stat.
    #[autometrics(objective = API_SLO)]
    pub async fn get(&self, path: &str) -> Result<(Bytes, Stat), KeeperError> {
        self.get_inner(path, None).await
    }

    /// [`get`](Self::get), additionally installing a one-shot watch.
    #[autometrics(objective = API_SLO)]
    pub async fn get_watch(
        &self,
        path: &str,
        watch: WatchSender,
    ) -> Result<(Bytes, Stat), KeeperError> {
        self.get_inner(path, Some(watch)).await
    }

    /// Replaces a node's payload, conditionally on `version` unless it is
    /// -1. Returns the post-update stat.
    #[autometrics(objective = API_SLO)]
    pub async fn set(
        &self,
        path: &str,
        data: impl Into<Bytes>,
        version: i32,
    ) -> Result<Stat, KeeperError> {
        let request = KeeperRequest::Set(SetRequest {
            path: path.to_string(),
            data: data.into(),
            version,
        });
        match self.submit(request, None).await? {
            KeeperResponse::Set(response) => Ok(response.stat),
            response => unreachable!("set produced mismatched response: {response:?}"),
        }
    }

    /// Lists the immediate child base names of `path` plus its stat.
    #[autometrics(objective = API_SLO)]
    pub async fn list(&self, path: &str) -> Result<(Vec<String>, Stat), KeeperError> {
        self.list_inner(path, None).await
    }

    /// [`list`](Self::list), additionally installing a one-shot child-list
    /// watch keyed by `path`.
    #[autometrics(objective = API_SLO)]
    pub async fn list_watch(
        &self,
        path: &str,
        watch: WatchSender,
    ) -> Result<(Vec<String>, Stat), KeeperError> {
        self.list_inner(path, Some(watch)).await
    }

    /// Version check with no mutation and no children constraint.
    #[autometrics(objective = API_SLO)]
    pub async fn check(&self, path: &str, version: i32) -> Result<(), KeeperError> {
        let request = KeeperRequest::Check(CheckRequest {
            path: path.to_string(),
            version,
        });
        match self.submit(request, None).await? {
            KeeperResponse::Check(_) => Ok(()),
            response => unreachable!("check produced mismatched response: {response:?}"),
        }
    }

    /// Executes an ordered batch of Create/Remove/Set/Check atomically.
    ///
    /// On success every sub-response is returned in order. The first
    /// failing sub-request rolls the tree back and its error is returned;
    /// other sub-request kinds are rejected up front with
    /// [`KeeperError::BadArguments`].
    #[autometrics(objective = API_SLO)]
    pub async fn multi(
        &self,
        requests: Vec<KeeperRequest>,
    ) -> Result<Vec<KeeperResponse>, KeeperError> {
        let request = KeeperRequest::Multi(MultiRequest::new(requests)?);
        match self.submit(request, None).await? {
            KeeperResponse::Multi(response) => Ok(response.responses),
            response => unreachable!("multi produced mismatched response: {response:?}"),
        }
    }

    /// Whether the session has been finalized.
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    /// Ends the session: stops accepting work, waits for the worker, and
    /// guarantees that every queued completion callback and every installed
    /// watch has been answered with session expiry. Idempotent.
    pub async fn finalize(&self) {
        {
            let _guard = self.push_lock.lock().await;
            if self.expired.swap(true, Ordering::AcqRel) {
                return;
            }
            SESSIONS_EXPIRED_METRIC
                .with_label_values(&["finalized"])
                .inc();
            let _ = self.shutdown_tx.send(());
        }

        let handle = self.processor_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("processor task ended abnormally: {:?}", e);
            }
        }
        debug!("memkeeper session finalized");
    }

    async fn exists_inner(
        &self,
        path: &str,
        watch: Option<WatchSender>,
    ) -> Result<Option<Stat>, KeeperError> {
        let request = KeeperRequest::Exists(ExistsRequest {
            path: path.to_string(),
        });
        match self.submit(request, watch).await {
            Ok(KeeperResponse::Exists(response)) => Ok(Some(response.stat)),
            Ok(response) => unreachable!("exists produced mismatched response: {response:?}"),
            Err(KeeperError::NoNode) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn get_inner(
        &self,
        path: &str,
        watch: Option<WatchSender>,
    ) -> Result<(Bytes, Stat), KeeperError> {
        let request = KeeperRequest::Get(GetRequest {
            path: path.to_string(),
        });
        match self.submit(request, watch).await? {
            KeeperResponse::Get(response) => Ok((response.data, response.stat)),
            response => unreachable!("get produced mismatched response: {response:?}"),
        }
    }

    async fn list_inner(
        &self,
        path: &str,
        watch: Option<WatchSender>,
    ) -> Result<(Vec<String>, Stat), KeeperError> {
        let request = KeeperRequest::List(ListRequest {
            path: path.to_string(),
        });
        match self.submit(request, watch).await? {
            KeeperResponse::List(response) => Ok((response.names, response.stat)),
            response => unreachable!("list produced mismatched response: {response:?}"),
        }
    }

    async fn submit(
        &self,
        request: KeeperRequest,
        watch: Option<WatchSender>,
    ) -> Result<KeeperResponse, KeeperError> {
        let (callback_tx, callback_rx) = oneshot::channel();
        let info = RequestInfo {
            request,
            received_at: Instant::now(),
            callback: Some(callback_tx),
            watch,
        };
        self.push(info).await?;

        match callback_rx.await {
            Ok(result) => result,
            // The worker went away before answering.
            Err(_) => Err(KeeperError::SessionExpired),
        }
    }

    async fn push(&self, info: RequestInfo) -> Result<(), KeeperError> {
        let result = {
            let _guard = self.push_lock.lock().await;

            if self.expired.load(Ordering::Acquire) {
                Err(KeeperError::SessionExpired)
            } else {
                match self
                    .request_tx
                    .send_timeout(info, self.operation_timeout)
                    .await
                {
                    Ok(()) => Ok(()),
                    Err(SendTimeoutError::Timeout(_)) => Err(KeeperError::OperationTimeout),
                    Err(SendTimeoutError::Closed(_)) => Err(KeeperError::SessionExpired),
                }
            }
        };

        // The engine is single-session: a failed push is terminal.
        if let Err(error) = &result {
            debug!("push failed ({error}), finalizing session");
            self.finalize().await;
        }
        result
    }
}

impl Drop for MemKeeper {
    fn drop(&mut self) {
        // Fence off racing pushes, then nudge the worker; its drain runs in
        // the background.
        self.expired.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }
}
