//! # mongo-testbed
//!
//! A MongoDB test bed: provision a database for a test, seed its collections
//! from JSON fixtures, and tear everything down afterward, whatever the test
//! body does.
//!
//! ## Crates
//!
//! - [`seeding`] - locate and parse JSON fixtures, bulk-insert them
//! - [`server`] - embedded container, external `mongod`, or existing server
//! - [`test`] - bind fixtures to collections and scope the server to a test
//!
//! ## Feature Flags
//!
//! - `embedded` (default) - Docker-backed embedded MongoDB via testcontainers
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use mongo_testbed::prelude::*;
//! use mongodb::bson::doc;
//!
//! #[tokio::test]
//! async fn test_users_are_seeded() {
//!     init_test_logging();
//!     let manager = MongoManager::embedded(EmbeddedConfig::from_env()).await.unwrap();
//!     let binder = FixtureBinder::new()
//!         .collection(FixtureSpec::new("users", "users.json"));
//!
//!     run_with_testbed(manager, &binder, |handles| async move {
//!         let users = handles.collection("users").unwrap();
//!         assert_eq!(users.count_documents(doc! {}).await.unwrap(), 4);
//!     })
//!     .await
//!     .unwrap();
//! }
//! ```
//!
//! ## Environment
//!
//! | Variable | Used by |
//! |---|---|
//! | `MONGO_TESTBED_PORT` | embedded and external port (default 9819) |
//! | `MONGO_TESTBED_IMAGE_TAG` | embedded image tag (default `7.0`) |
//! | `MONGOD_COMMAND` | external executable (default `mongod`) |
//! | `MONGOD_DBPATH` | external `--dbpath` |
//! | `MONGO_TESTBED_URI` | connect mode URI |
//! | `MONGO_TESTBED_RESOURCES` | extra fixture search roots |

#![warn(missing_docs)]

/// Fixture loading.
pub mod seeding {
	pub use mongo_testbed_seeding::*;
}

/// Server lifecycle.
pub mod server {
	pub use mongo_testbed_server::*;
}

/// Fixture binding and scoped teardown.
pub mod test {
	pub use mongo_testbed_test::*;
}

/// Everything needed to write a test bed test.
pub mod prelude {
	pub use mongo_testbed_test::prelude::*;
}

pub use mongo_testbed_seeding::{FixtureLoader, FixtureSource, SeedingError};
pub use mongo_testbed_server::{MongoManager, ServerError, StartupPolicy};
pub use mongo_testbed_test::{
	FixtureBinder, FixtureSpec, TestBed, TestBedError, TestBedHandles, run_with_testbed,
};
