use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;

use crate::config::KeeperConfig;
use crate::core::processor::Processor;
use crate::core::processor::RequestInfo;
use crate::core::request::KeeperRequest;
use crate::core::response::KeeperResponse;
use crate::core::watch::WatchSender;
use crate::errors::KeeperError;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// A config with a short timeout so failing paths don't stall the suite.
pub fn test_config() -> KeeperConfig {
    KeeperConfig {
        operation_timeout_in_ms: 1_000,
        ..KeeperConfig::default()
    }
}

/// Spawns a bare processor and hands back its intake and shutdown channels.
pub fn spawn_processor(
    root_path: &str,
    queue_capacity: usize,
) -> (mpsc::Sender<RequestInfo>, watch::Sender<()>) {
    let (request_tx, request_rx) = mpsc::channel(queue_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let processor = Processor::new(root_path.to_string(), request_rx, shutdown_rx);
    tokio::spawn(processor.run());
    (request_tx, shutdown_tx)
}

/// Builds an envelope around `request` and returns the completion receiver.
pub fn envelope(
    request: KeeperRequest,
    watch: Option<WatchSender>,
) -> (
    RequestInfo,
    oneshot::Receiver<Result<KeeperResponse, KeeperError>>,
) {
    let (callback_tx, callback_rx) = oneshot::channel();
    let info = RequestInfo {
        request,
        received_at: std::time::Instant::now(),
        callback: Some(callback_tx),
        watch,
    };
    (info, callback_rx)
}

/// Sends an envelope and waits for its completion result.
pub async fn roundtrip(
    request_tx: &mpsc::Sender<RequestInfo>,
    request: KeeperRequest,
) -> Result<KeeperResponse, KeeperError> {
    let (info, callback_rx) = envelope(request, None);
    request_tx
        .send(info)
        .await
        .expect("Should succeed to send request");
    tokio::time::timeout(Duration::from_secs(5), callback_rx)
        .await
        .expect("worker should answer within 5s")
        .expect("worker should not drop the completion channel")
}
