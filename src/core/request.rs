//! The eight request variants and their processing semantics.
//!
//! Every variant implements `process(store, zxid)` against the worker-owned
//! tree and a watch-firing hook consulted only after the request succeeded.
//! Dispatch is a plain match over the tagged union; the only place the
//! concrete kind matters to callers is the façade boundary, where the
//! response is narrowed back to its kind-specific payload.

use bytes::Bytes;

use crate::constants::ROOT_NODE_PATH;
use crate::constants::SEQUENTIAL_SUFFIX_WIDTH;
use crate::core::node::Acl;
use crate::core::node::Node;
use crate::core::node::NodeStore;
use crate::core::node::Stat;
use crate::core::response::CheckResponse;
use crate::core::response::CreateResponse;
use crate::core::response::ExistsResponse;
use crate::core::response::GetResponse;
use crate::core::response::KeeperResponse;
use crate::core::response::ListResponse;
use crate::core::response::MultiResponse;
use crate::core::response::RemoveResponse;
use crate::core::response::SetResponse;
use crate::core::watch::WatchRegistry;
use crate::errors::KeeperError;
use crate::utils::paths::parent_path;
use crate::utils::time::now_ms;

/// Creation disposition of a new node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateMode {
    #[default]
    Persistent,
    Ephemeral,
    PersistentSequential,
    EphemeralSequential,
}

impl CreateMode {
    pub fn is_ephemeral(self) -> bool {
        matches!(self, CreateMode::Ephemeral | CreateMode::EphemeralSequential)
    }

    pub fn is_sequential(self) -> bool {
        matches!(
            self,
            CreateMode::PersistentSequential | CreateMode::EphemeralSequential
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateRequest {
    pub path: String,
    pub data: Bytes,
    pub is_ephemeral: bool,
    pub is_sequential: bool,
    /// Accepted for API compatibility; never enforced
    pub acls: Vec<Acl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveRequest {
    pub path: String,
    /// Expected data version; -1 skips the check
    pub version: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistsRequest {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetRequest {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetRequest {
    pub path: String,
    pub data: Bytes,
    /// Expected data version; -1 skips the check
    pub version: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckRequest {
    pub path: String,
    /// Expected data version; -1 skips the check
    pub version: i32,
}

/// An ordered batch of Create/Remove/Set/Check sub-requests executed with
/// all-or-nothing semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRequest {
    requests: Vec<KeeperRequest>,
}

impl MultiRequest {
    /// Rejects sub-request kinds other than Create/Remove/Set/Check.
    pub fn new(requests: Vec<KeeperRequest>) -> Result<Self, KeeperError> {
        for request in &requests {
            match request {
                KeeperRequest::Create(_)
                | KeeperRequest::Remove(_)
                | KeeperRequest::Set(_)
                | KeeperRequest::Check(_) => {}
                _ => return Err(KeeperError::BadArguments),
            }
        }
        Ok(Self { requests })
    }

    pub fn requests(&self) -> &[KeeperRequest] {
        &self.requests
    }
}

/// Tagged union over the eight concrete request kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum KeeperRequest {
    Create(CreateRequest),
    Remove(RemoveRequest),
    Exists(ExistsRequest),
    Get(GetRequest),
    Set(SetRequest),
    List(ListRequest),
    Check(CheckRequest),
    Multi(MultiRequest),
}

impl KeeperRequest {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            KeeperRequest::Create(_) => "create",
            KeeperRequest::Remove(_) => "remove",
            KeeperRequest::Exists(_) => "exists",
            KeeperRequest::Get(_) => "get",
            KeeperRequest::Set(_) => "set",
            KeeperRequest::List(_) => "list",
            KeeperRequest::Check(_) => "check",
            KeeperRequest::Multi(_) => "multi",
        }
    }

    /// The path a watch pushed with this request is registered under.
    pub(crate) fn path(&self) -> &str {
        match self {
            KeeperRequest::Create(r) => &r.path,
            KeeperRequest::Remove(r) => &r.path,
            KeeperRequest::Exists(r) => &r.path,
            KeeperRequest::Get(r) => &r.path,
            KeeperRequest::Set(r) => &r.path,
            KeeperRequest::List(r) => &r.path,
            KeeperRequest::Check(r) => &r.path,
            KeeperRequest::Multi(_) => "",
        }
    }

    pub(crate) fn is_list(&self) -> bool {
        matches!(self, KeeperRequest::List(_))
    }

    /// Prefixes every path field with the session root before processing.
    pub(crate) fn add_root_path(&mut self, root_path: &str) {
        if root_path.is_empty() {
            return;
        }
        match self {
            KeeperRequest::Create(r) => r.path = format!("{root_path}{}", r.path),
            KeeperRequest::Remove(r) => r.path = format!("{root_path}{}", r.path),
            KeeperRequest::Exists(r) => r.path = format!("{root_path}{}", r.path),
            KeeperRequest::Get(r) => r.path = format!("{root_path}{}", r.path),
            KeeperRequest::Set(r) => r.path = format!("{root_path}{}", r.path),
            KeeperRequest::List(r) => r.path = format!("{root_path}{}", r.path),
            KeeperRequest::Check(r) => r.path = format!("{root_path}{}", r.path),
            KeeperRequest::Multi(m) => {
                for request in &mut m.requests {
                    request.add_root_path(root_path);
                }
            }
        }
    }

    /// Undoes [`add_root_path`] so watch firing sees client-visible paths.
    pub(crate) fn strip_root_path(&mut self, root_path: &str) {
        fn strip(path: &mut String, root_path: &str) {
            if let Some(stripped) = path.strip_prefix(root_path) {
                *path = stripped.to_string();
            }
        }
        if root_path.is_empty() {
            return;
        }
        match self {
            KeeperRequest::Create(r) => strip(&mut r.path, root_path),
            KeeperRequest::Remove(r) => strip(&mut r.path, root_path),
            KeeperRequest::Exists(r) => strip(&mut r.path, root_path),
            KeeperRequest::Get(r) => strip(&mut r.path, root_path),
            KeeperRequest::Set(r) => strip(&mut r.path, root_path),
            KeeperRequest::List(r) => strip(&mut r.path, root_path),
            KeeperRequest::Check(r) => strip(&mut r.path, root_path),
            KeeperRequest::Multi(m) => {
                for request in &mut m.requests {
                    request.strip_root_path(root_path);
                }
            }
        }
    }

    pub(crate) fn process(
        &self,
        store: &mut NodeStore,
        zxid: i64,
    ) -> Result<KeeperResponse, KeeperError> {
        match self {
            KeeperRequest::Create(r) => r.process(store, zxid).map(KeeperResponse::Create),
            KeeperRequest::Remove(r) => r.process(store).map(KeeperResponse::Remove),
            KeeperRequest::Exists(r) => r.process(store).map(KeeperResponse::Exists),
            KeeperRequest::Get(r) => r.process(store).map(KeeperResponse::Get),
            KeeperRequest::Set(r) => r.process(store, zxid).map(KeeperResponse::Set),
            KeeperRequest::List(r) => r.process(store).map(KeeperResponse::List),
            KeeperRequest::Check(r) => r.process(store).map(KeeperResponse::Check),
            KeeperRequest::Multi(r) => r.process(store, zxid).map(KeeperResponse::Multi),
        }
    }

    /// Fires the watches a successful request triggers. Reads install
    /// watches but never fire them.
    pub(crate) fn process_watches(
        &self,
        node_watches: &mut WatchRegistry,
        list_watches: &mut WatchRegistry,
    ) {
        match self {
            KeeperRequest::Create(r) => fire_node_and_list(&r.path, node_watches, list_watches),
            KeeperRequest::Remove(r) => fire_node_and_list(&r.path, node_watches, list_watches),
            KeeperRequest::Set(r) => node_watches.fire(&r.path),
            KeeperRequest::Multi(m) => {
                for request in &m.requests {
                    request.process_watches(node_watches, list_watches);
                }
            }
            _ => {}
        }
    }
}

fn fire_node_and_list(path: &str, node_watches: &mut WatchRegistry, list_watches: &mut WatchRegistry) {
    node_watches.fire(path);
    list_watches.fire(parent_path(path));
}

impl CreateRequest {
    fn process(&self, store: &mut NodeStore, zxid: i64) -> Result<CreateResponse, KeeperError> {
        if store.contains(&self.path) {
            return Err(KeeperError::NodeExists);
        }
        let parent = store
            .get_mut(parent_path(&self.path))
            .ok_or(KeeperError::NoNode)?;
        if parent.is_ephemeral {
            return Err(KeeperError::NoChildrenForEphemerals);
        }

        let mut path_created = self.path.clone();
        if self.is_sequential {
            let seq_num = parent.seq_num;
            parent.seq_num += 1;
            path_created.push_str(&format!(
                "{seq_num:0width$}",
                width = SEQUENTIAL_SUFFIX_WIDTH
            ));
        }
        parent.stat.cversion += 1;
        parent.stat.num_children += 1;

        let now = now_ms();
        let created_node = Node {
            data: self.data.clone(),
            seq_num: 0,
            is_ephemeral: self.is_ephemeral,
            is_sequential: self.is_sequential,
            stat: Stat {
                czxid: zxid,
                mzxid: zxid,
                ctime: now,
                mtime: now,
                data_length: self.data.len() as i32,
                ..Stat::default()
            },
        };
        store.insert(path_created.clone(), created_node);

        Ok(CreateResponse { path_created })
    }
}

impl RemoveRequest {
    fn process(&self, store: &mut NodeStore) -> Result<RemoveResponse, KeeperError> {
        // The root node is permanent.
        if self.path == ROOT_NODE_PATH {
            return Err(KeeperError::BadArguments);
        }
        let node = store.get(&self.path).ok_or(KeeperError::NoNode)?;
        if self.version != -1 && self.version != node.stat.version {
            return Err(KeeperError::BadVersion);
        }
        if node.stat.num_children != 0 {
            return Err(KeeperError::NotEmpty);
        }

        store.remove(&self.path);
        if let Some(parent) = store.get_mut(parent_path(&self.path)) {
            parent.stat.num_children -= 1;
            parent.stat.cversion += 1;
        }
        Ok(RemoveResponse)
    }
}

impl ExistsRequest {
    fn process(&self, store: &NodeStore) -> Result<ExistsResponse, KeeperError> {
        let node = store.get(&self.path).ok_or(KeeperError::NoNode)?;
        Ok(ExistsResponse { stat: node.stat })
    }
}

impl GetRequest {
    fn process(&self, store: &NodeStore) -> Result<GetResponse, KeeperError> {
        let node = store.get(&self.path).ok_or(KeeperError::NoNode)?;
        Ok(GetResponse {
            data: node.data.clone(),
            stat: node.stat,
        })
    }
}

impl SetRequest {
    fn process(&self, store: &mut NodeStore, zxid: i64) -> Result<SetResponse, KeeperError> {
        {
            let node = store.get_mut(&self.path).ok_or(KeeperError::NoNode)?;
            if self.version != -1 && self.version != node.stat.version {
                return Err(KeeperError::BadVersion);
            }
            node.data = self.data.clone();
            node.stat.version += 1;
            node.stat.mzxid = zxid;
            node.stat.mtime = now_ms();
            // data_length keeps its creation-time value
        }
        if let Some(parent) = store.get_mut(parent_path(&self.path)) {
            parent.stat.cversion += 1;
        }
        let stat = store
            .get(&self.path)
            .map(|node| node.stat)
            .ok_or(KeeperError::NoNode)?;
        Ok(SetResponse { stat })
    }
}

impl ListRequest {
    fn process(&self, store: &NodeStore) -> Result<ListResponse, KeeperError> {
        let stat = store.get(&self.path).ok_or(KeeperError::NoNode)?.stat;
        let names = store.child_names(&self.path);
        Ok(ListResponse { names, stat })
    }
}

impl CheckRequest {
    fn process(&self, store: &NodeStore) -> Result<CheckResponse, KeeperError> {
        let node = store.get(&self.path).ok_or(KeeperError::NoNode)?;
        if self.version != -1 && self.version != node.stat.version {
            return Err(KeeperError::BadVersion);
        }
        Ok(CheckResponse)
    }
}

impl MultiRequest {
    /// Runs the batch in order against a snapshot boundary: the first
    /// failing sub-request restores the pre-batch tree and its error
    /// becomes the batch error.
    fn process(&self, store: &mut NodeStore, zxid: i64) -> Result<MultiResponse, KeeperError> {
        let snapshot = store.clone();
        let mut responses = Vec::with_capacity(self.requests.len());
        for request in &self.requests {
            match request.process(store, zxid) {
                Ok(response) => responses.push(response),
                Err(error) => {
                    *store = snapshot;
                    return Err(error);
                }
            }
        }
        Ok(MultiResponse { responses })
    }
}
