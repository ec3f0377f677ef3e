/// Width of the zero-padded decimal suffix appended to sequential node names.
pub(crate) const SEQUENTIAL_SUFFIX_WIDTH: usize = 10;

/// Default bound of the pending-request queue.
pub(crate) const DEFAULT_REQUEST_QUEUE_CAPACITY: usize = 1024;

/// Default push timeout in milliseconds.
pub(crate) const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 10_000;

/// Path of the permanent root node.
pub(crate) const ROOT_NODE_PATH: &str = "/";

/// Environment prefix for configuration overrides, e.g. `KEEPER__ROOT_PATH`.
pub(crate) const CONFIG_ENV_PREFIX: &str = "KEEPER";

/// Environment variable naming an optional configuration file.
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
