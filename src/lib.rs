//! # memkeeper
//!
//! ![License](https://img.shields.io/badge/license-MIT%20%7C%20Apache--2.0-blue)
//!
//! An in-process emulator of a hierarchical coordination service, for tests
//! and single-process deployments of systems that normally coordinate
//! through a replicated keeper ensemble.
//!
//! ## Features
//! - **Full request surface**: create, remove, exists, get, set, list,
//!   check, and atomic multi batches
//! - **Watches**: one-shot node and child-list notifications
//! - **Versioned updates**: conditional set/remove/check with ZooKeeper
//!   error semantics
//! - **Single worker**: totally ordered processing with a monotonic
//!   transaction id, no locks on the tree
//! - **Observability**: metrics and tracing
//!
//! ## Quick Start
//! ```no_run
//! use memkeeper::CreateMode;
//! use memkeeper::KeeperConfig;
//! use memkeeper::MemKeeper;
//!
//! #[tokio::main]
//! async fn main() {
//!     let keeper = MemKeeper::new(KeeperConfig::default()).unwrap();
//!
//!     let path = keeper
//!         .create("/service", "ready", CreateMode::Persistent, vec![])
//!         .await
//!         .unwrap();
//!     let (data, stat) = keeper.get(&path).await.unwrap();
//!     assert_eq!(data, "ready");
//!     assert_eq!(stat.version, 0);
//!
//!     keeper.finalize().await;
//! }
//! ```
//!
//! The emulator keeps one implicit session that lives until [`MemKeeper::finalize`]
//! is called; there is no network transport, persistence, or ACL enforcement.

pub mod config;
pub mod metrics;
pub mod session;

mod constants;
mod core;
mod errors;
mod utils;

pub use crate::core::node::Acl;
pub use crate::core::node::Stat;
pub use crate::core::request::CheckRequest;
pub use crate::core::request::CreateMode;
pub use crate::core::request::CreateRequest;
pub use crate::core::request::ExistsRequest;
pub use crate::core::request::GetRequest;
pub use crate::core::request::KeeperRequest;
pub use crate::core::request::ListRequest;
pub use crate::core::request::MultiRequest;
pub use crate::core::request::RemoveRequest;
pub use crate::core::request::SetRequest;
pub use crate::core::response::CheckResponse;
pub use crate::core::response::CreateResponse;
pub use crate::core::response::ExistsResponse;
pub use crate::core::response::GetResponse;
pub use crate::core::response::KeeperResponse;
pub use crate::core::response::ListResponse;
pub use crate::core::response::MultiResponse;
pub use crate::core::response::RemoveResponse;
pub use crate::core::response::SessionState;
pub use crate::core::response::SetResponse;
pub use crate::core::response::WatchKind;
pub use crate::core::response::WatchResponse;
pub use crate::core::watch::WatchSender;
pub use crate::config::KeeperConfig;
pub use errors::*;
pub use session::MemKeeper;

//-----------------------------------------------------------
// Test utils
#[cfg(test)]
#[doc(hidden)]
pub mod test_utils;

//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;

#[doc(hidden)]
pub(crate) const API_SLO: Objective = Objective::new("api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
