//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use mongo_testbed_server::prelude::*;
//! ```

pub use crate::config::{
	ConnectConfig, EmbeddedConfig, ExternalConfig, StartupPolicy, TESTBED_DATABASE,
};
pub use crate::error::{ServerError, ServerResult};
pub use crate::manager::{LifecycleState, MongoManager, TestBedMode};
