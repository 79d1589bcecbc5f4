//! Scoped test bed lifetimes with guaranteed teardown.
//!
//! [`run_with_testbed`] runs one test body between fixture binding and
//! `stop()`. [`TestBed`] is the same pair of steps for callers that manage
//! the scope themselves, e.g. a suite that seeds once for several tests.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use mongo_testbed_server::MongoManager;

use crate::binding::{FixtureBinder, TestBedHandles};
use crate::error::TestBedResult;

/// A started manager with its fixtures bound.
///
/// Call [`teardown`](Self::teardown) when done. Dropping a `TestBed` without
/// it still kills a launched server, but skips the orderly shutdown.
///
/// # Example
///
/// ```ignore
/// use mongo_testbed_test::prelude::*;
///
/// let manager = MongoManager::connect_uri("mongodb://127.0.0.1:27017").await?;
/// let binder = FixtureBinder::new()
///     .collection(FixtureSpec::new("users", "users.json"));
///
/// let testbed = TestBed::setup(manager, &binder).await?;
/// let users = testbed.handles().collection("users").unwrap();
/// // ...
/// testbed.teardown().await;
/// ```
#[derive(Debug)]
pub struct TestBed {
	manager: MongoManager,
	handles: TestBedHandles,
}

impl TestBed {
	/// Binds `binder` to `manager`.
	///
	/// On failure the manager is stopped before the error is returned.
	pub async fn setup(mut manager: MongoManager, binder: &FixtureBinder) -> TestBedResult<Self> {
		match binder.bind(&manager).await {
			Ok(handles) => Ok(Self { manager, handles }),
			Err(e) => {
				tracing::error!("Fixture binding failed, stopping test bed: {}", e);
				manager.stop().await;
				Err(e)
			}
		}
	}

	/// Handles for the bound collections.
	pub fn handles(&self) -> &TestBedHandles {
		&self.handles
	}

	/// The underlying manager.
	pub fn manager(&self) -> &MongoManager {
		&self.manager
	}

	/// Stops the manager.
	pub async fn teardown(mut self) {
		self.manager.stop().await;
	}
}

/// Runs `body` against a freshly bound test bed and always stops `manager` afterwards.
///
/// - binding fails: the manager is stopped and the error returned; `body` never runs
/// - `body` returns: the manager is stopped and the value returned
/// - `body` panics: the manager is stopped and the panic resumed
///
/// # Example
///
/// ```ignore
/// use mongo_testbed_test::prelude::*;
/// use mongodb::bson::doc;
///
/// #[tokio::test]
/// async fn test_users() {
///     let manager = MongoManager::external(ExternalConfig::from_env()).await.unwrap();
///     let binder = FixtureBinder::new()
///         .collection(FixtureSpec::new("users", "users.json"));
///
///     run_with_testbed(manager, &binder, |handles| async move {
///         let users = handles.collection("users").unwrap();
///         assert_eq!(users.count_documents(doc! {}).await.unwrap(), 4);
///     })
///     .await
///     .unwrap();
/// }
/// ```
pub async fn run_with_testbed<F, Fut, T>(
	manager: MongoManager,
	binder: &FixtureBinder,
	body: F,
) -> TestBedResult<T>
where
	F: FnOnce(TestBedHandles) -> Fut,
	Fut: Future<Output = T>,
{
	let testbed = TestBed::setup(manager, binder).await?;
	let handles = testbed.handles().clone();

	let outcome = AssertUnwindSafe(async move { body(handles).await })
		.catch_unwind()
		.await;

	testbed.teardown().await;

	match outcome {
		Ok(value) => Ok(value),
		Err(panic) => {
			tracing::debug!("Test body panicked; test bed stopped");
			std::panic::resume_unwind(panic)
		}
	}
}
