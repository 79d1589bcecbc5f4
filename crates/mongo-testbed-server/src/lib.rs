//! MongoDB lifecycle for mongo-testbed.
//!
//! A [`MongoManager`] provides one MongoDB server for the duration of a test,
//! in one of three modes:
//!
//! - **embedded**: a `mongo` container started through testcontainers and
//!   published on a fixed host port (feature `embedded`, on by default)
//! - **external**: a `mongod` executable launched with `--port` and `--dbpath`,
//!   its output relayed to the log
//! - **connect**: an already running server named by a
//!   `scheme://[user[:password]@]host:port` URI
//!
//! Every mode connects to the `mongo_testbed_db` database. `stop()` releases
//! the client before the server, tolerates partial startup and may be called
//! repeatedly.
//!
//! ```ignore
//! use mongo_testbed_server::prelude::*;
//!
//! let mut manager = MongoManager::external(ExternalConfig::from_env()).await?;
//! manager.ping().await?;
//! manager.stop().await;
//! ```

#![warn(missing_docs)]

pub mod config;
#[cfg(feature = "embedded")]
pub mod embedded;
pub mod error;
pub mod external;
pub mod manager;
pub mod prelude;

pub use config::{
	ConnectConfig, ConnectionConfig, ConnectionUri, DEFAULT_HOST, DEFAULT_PORT, EmbeddedConfig,
	ExternalConfig, StartupPolicy, TESTBED_DATABASE,
};
pub use error::{ServerError, ServerResult};
pub use manager::{LifecycleState, MongoManager, TestBedMode};
