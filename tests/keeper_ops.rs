//! End-to-end request semantics through the public façade.

mod common;

use bytes::Bytes;
use memkeeper::CheckRequest;
use memkeeper::CreateMode;
use memkeeper::CreateRequest;
use memkeeper::KeeperConfig;
use memkeeper::KeeperError;
use memkeeper::KeeperRequest;
use memkeeper::KeeperResponse;
use memkeeper::RemoveRequest;
use memkeeper::SetRequest;
use rand::Rng;

use crate::common::start_keeper;
use crate::common::start_keeper_with_config;

fn create_op(path: &str, data: &'static str) -> KeeperRequest {
    KeeperRequest::Create(CreateRequest {
        path: path.to_string(),
        data: Bytes::from_static(data.as_bytes()),
        ..CreateRequest::default()
    })
}

#[tokio::test]
async fn create_then_read_back() {
    let keeper = start_keeper();

    let path = keeper
        .create("/a", "x", CreateMode::Persistent, vec![])
        .await
        .unwrap();
    assert_eq!(path, "/a");

    let (data, stat) = keeper.get("/a").await.unwrap();
    assert_eq!(data, "x");
    assert_eq!(stat.version, 0);
    assert_eq!(stat.czxid, stat.mzxid);

    keeper.finalize().await;
}

#[tokio::test]
async fn sequential_creates_take_consecutive_suffixes() {
    let keeper = start_keeper();
    keeper
        .create("/a", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();

    let first = keeper
        .create("/a/s", "", CreateMode::PersistentSequential, vec![])
        .await
        .unwrap();
    let second = keeper
        .create("/a/s", "", CreateMode::PersistentSequential, vec![])
        .await
        .unwrap();

    assert_eq!(first, "/a/s0000000000");
    assert_eq!(second, "/a/s0000000001");

    let (names, stat) = keeper.list("/a").await.unwrap();
    assert_eq!(names, vec!["s0000000000", "s0000000001"]);
    assert_eq!(stat.num_children, 2);

    keeper.finalize().await;
}

#[tokio::test]
async fn conditional_set_honors_versions() {
    let keeper = start_keeper();
    keeper
        .create("/a", "x", CreateMode::Persistent, vec![])
        .await
        .unwrap();

    let stat = keeper.set("/a", "y", 0).await.unwrap();
    assert_eq!(stat.version, 1);

    let stale = keeper.set("/a", "z", 0).await;
    assert_eq!(stale.unwrap_err(), KeeperError::BadVersion);

    let (data, stat) = keeper.get("/a").await.unwrap();
    assert_eq!(data, "y");
    assert_eq!(stat.version, 1);
    assert!(stat.mzxid > stat.czxid);

    keeper.finalize().await;
}

#[tokio::test]
async fn failed_multi_leaves_no_trace() {
    let keeper = start_keeper();

    let result = keeper
        .multi(vec![
            create_op("/b", ""),
            create_op("/b/c", ""),
            KeeperRequest::Check(CheckRequest {
                path: "/b".to_string(),
                version: 5,
            }),
        ])
        .await;

    assert_eq!(result.unwrap_err(), KeeperError::BadVersion);
    assert_eq!(keeper.exists("/b").await.unwrap(), None);
    assert_eq!(keeper.exists("/b/c").await.unwrap(), None);

    keeper.finalize().await;
}

#[tokio::test]
async fn successful_multi_returns_every_sub_response() {
    let keeper = start_keeper();
    keeper
        .create("/a", "x", CreateMode::Persistent, vec![])
        .await
        .unwrap();

    let responses = keeper
        .multi(vec![
            create_op("/a/b", ""),
            KeeperRequest::Set(SetRequest {
                path: "/a".to_string(),
                data: Bytes::from_static(b"y"),
                version: 0,
            }),
            KeeperRequest::Check(CheckRequest {
                path: "/a".to_string(),
                version: 1,
            }),
            KeeperRequest::Remove(RemoveRequest {
                path: "/a/b".to_string(),
                version: -1,
            }),
        ])
        .await
        .unwrap();

    assert_eq!(responses.len(), 4);
    assert!(matches!(responses[0], KeeperResponse::Create(_)));
    assert!(matches!(responses[3], KeeperResponse::Remove(_)));

    let (data, stat) = keeper.get("/a").await.unwrap();
    assert_eq!(data, "y");
    assert_eq!(stat.num_children, 0);

    keeper.finalize().await;
}

#[tokio::test]
async fn remove_with_wildcard_version_ignores_revisions() {
    let keeper = start_keeper();
    keeper
        .create("/a", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();
    keeper.set("/a", "1", -1).await.unwrap();
    keeper.set("/a", "2", -1).await.unwrap();

    keeper.remove("/a", -1).await.unwrap();
    assert_eq!(keeper.exists("/a").await.unwrap(), None);

    keeper.finalize().await;
}

#[tokio::test]
async fn remove_maintains_parent_bookkeeping() {
    let keeper = start_keeper();
    keeper
        .create("/a", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();
    keeper
        .create("/a/b", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();

    let before = keeper.exists("/a").await.unwrap().unwrap();
    keeper.remove("/a/b", -1).await.unwrap();
    let after = keeper.exists("/a").await.unwrap().unwrap();

    assert_eq!(after.num_children, before.num_children - 1);
    assert_eq!(after.cversion, before.cversion + 1);

    keeper.finalize().await;
}

#[tokio::test]
async fn list_of_root_returns_top_level_names() {
    let keeper = start_keeper();
    keeper
        .create("/beta", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();
    keeper
        .create("/alpha", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();
    keeper
        .create("/alpha/nested", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();

    let (names, _) = keeper.list("/").await.unwrap();
    assert_eq!(names, vec!["alpha", "beta"]);

    keeper.finalize().await;
}

#[tokio::test]
async fn binary_payloads_round_trip() {
    let keeper = start_keeper();

    let mut rng = rand::thread_rng();
    let payload: Vec<u8> = (0..64).map(|_| rng.gen()).collect();

    keeper
        .create("/bin", payload.clone(), CreateMode::Persistent, vec![])
        .await
        .unwrap();
    let (data, stat) = keeper.get("/bin").await.unwrap();
    assert_eq!(data, payload);
    assert_eq!(stat.data_length, 64);

    keeper.finalize().await;
}

#[tokio::test]
async fn check_is_read_only() {
    let keeper = start_keeper();
    keeper
        .create("/a", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();

    keeper.check("/a", 0).await.unwrap();
    keeper.check("/a", -1).await.unwrap();
    assert_eq!(
        keeper.check("/a", 9).await.unwrap_err(),
        KeeperError::BadVersion
    );

    let stat = keeper.exists("/a").await.unwrap().unwrap();
    assert_eq!(stat.version, 0);

    keeper.finalize().await;
}

// A configured root prefix is applied on the way in and stripped on the
// way out; callers never see it.
#[tokio::test]
async fn root_path_rewriting_is_transparent() {
    let keeper = start_keeper_with_config(KeeperConfig {
        root_path: "/chroot/".to_string(),
        operation_timeout_in_ms: 1_000,
        ..KeeperConfig::default()
    });

    // Bootstrap the chroot node itself, as the embedding host does
    keeper
        .create("", "", CreateMode::Persistent, vec![])
        .await
        .unwrap();

    let path = keeper
        .create("/a", "inside", CreateMode::Persistent, vec![])
        .await
        .unwrap();
    assert_eq!(path, "/a");

    let (data, _) = keeper.get("/a").await.unwrap();
    assert_eq!(data, "inside");

    keeper.finalize().await;
}
