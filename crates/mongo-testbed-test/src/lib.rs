//! Test integration for mongo-testbed.
//!
//! Binds JSON fixtures to collections of a [`MongoManager`] and scopes the
//! manager's lifetime to a test body:
//!
//! ```ignore
//! use mongo_testbed_test::prelude::*;
//!
//! #[tokio::test]
//! async fn test_collection_is_seeded() {
//!     init_test_logging();
//!     let manager = MongoManager::connect(ConnectConfig::from_env()).await.unwrap();
//!     let binder = FixtureBinder::new()
//!         .collection(FixtureSpec::new("test_collection", "test_collection.json"));
//!
//!     run_with_testbed(manager, &binder, |handles| async move {
//!         let collection = handles.collection("test_collection").unwrap();
//!         // ...
//!     })
//!     .await
//!     .unwrap();
//! }
//! ```
//!
//! [`MongoManager`]: mongo_testbed_server::MongoManager

#![warn(missing_docs)]

pub mod binding;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod resource;

pub use binding::{FixtureBinder, FixtureSpec, TestBedHandles};
pub use error::{TestBedError, TestBedResult};
pub use logging::init_test_logging;
pub use resource::{TestBed, run_with_testbed};
