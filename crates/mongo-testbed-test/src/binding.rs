//! Binding fixture files to collections of a running test bed.

use std::collections::{HashMap, HashSet};

use mongo_testbed_seeding::{FixtureLoader, FixtureSource, LoadResult, ObjectIdPolicy};
use mongo_testbed_server::MongoManager;
use mongodb::bson::Document;
use mongodb::{Client, Collection, Database};

use crate::error::{TestBedError, TestBedResult};

/// A collection to (re)create and the fixture to fill it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSpec {
	name: String,
	source: FixtureSource,
}

impl FixtureSpec {
	/// Binds collection `name` to `source`, usually a resource path.
	///
	/// # Examples
	///
	/// ```
	/// use mongo_testbed_test::FixtureSpec;
	///
	/// let spec = FixtureSpec::new("test_collection", "test_collection.json");
	/// assert_eq!(spec.name(), "test_collection");
	/// ```
	pub fn new(name: impl Into<String>, source: impl Into<FixtureSource>) -> Self {
		Self {
			name: name.into(),
			source: source.into(),
		}
	}

	/// Collection name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Fixture source.
	pub fn source(&self) -> &FixtureSource {
		&self.source
	}
}

/// Handles a test body receives once its fixtures are in place.
#[derive(Debug, Clone)]
pub struct TestBedHandles {
	client: Client,
	database: Database,
	collections: HashMap<String, Collection<Document>>,
	loaded: Vec<LoadResult>,
}

impl TestBedHandles {
	/// The driver client.
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// The test bed database.
	pub fn database(&self) -> &Database {
		&self.database
	}

	/// A bound collection.
	pub fn collection(&self, name: &str) -> Option<&Collection<Document>> {
		self.collections.get(name)
	}

	/// Every bound collection, by name.
	pub fn collections(&self) -> &HashMap<String, Collection<Document>> {
		&self.collections
	}

	/// Insert counts, in binding order.
	pub fn load_results(&self) -> &[LoadResult] {
		&self.loaded
	}
}

/// An ordered set of [`FixtureSpec`]s applied to a manager before a test runs.
///
/// Binding a collection drops it if it exists, creates it again and inserts
/// its fixture, so every run starts from the same contents.
#[derive(Debug, Clone, Default)]
pub struct FixtureBinder {
	specs: Vec<FixtureSpec>,
	loader: FixtureLoader,
}

impl FixtureBinder {
	/// Creates a binder with no collections and the default fixture loader.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a collection.
	pub fn collection(mut self, spec: FixtureSpec) -> Self {
		self.specs.push(spec);
		self
	}

	/// Replaces the fixture loader.
	pub fn with_loader(mut self, loader: FixtureLoader) -> Self {
		self.loader = loader;
		self
	}

	/// Sets the `_id` rewrite policy of the loader.
	pub fn with_policy(mut self, policy: ObjectIdPolicy) -> Self {
		self.loader = self.loader.with_policy(policy);
		self
	}

	/// Specs in binding order.
	pub fn specs(&self) -> &[FixtureSpec] {
		&self.specs
	}

	/// Whether no collection is bound.
	pub fn is_empty(&self) -> bool {
		self.specs.is_empty()
	}

	fn check_unique(&self) -> TestBedResult<()> {
		let mut seen = HashSet::new();
		for spec in &self.specs {
			if !seen.insert(spec.name()) {
				return Err(TestBedError::DuplicateCollection(spec.name().to_string()));
			}
		}
		Ok(())
	}

	/// Recreates and seeds every bound collection, in order.
	///
	/// All fixtures are parsed before any collection is touched, so a broken
	/// fixture leaves the database as it was. A database error stops binding;
	/// collections bound before it stay seeded.
	pub async fn bind(&self, manager: &MongoManager) -> TestBedResult<TestBedHandles> {
		self.check_unique()?;
		let client = manager.client()?.clone();
		let database = manager.database()?.clone();

		let mut fixtures = Vec::with_capacity(self.specs.len());
		for spec in &self.specs {
			fixtures.push((spec, self.loader.load(spec.source().clone()).await?));
		}

		let mut collections = HashMap::with_capacity(fixtures.len());
		let mut loaded = Vec::with_capacity(fixtures.len());

		if !fixtures.is_empty() {
			let existing: HashSet<String> =
				database.list_collection_names().await?.into_iter().collect();

			for (spec, documents) in fixtures {
				let collection = database.collection::<Document>(spec.name());

				if existing.contains(spec.name()) {
					tracing::debug!("Dropping existing collection {}", spec.name());
					collection.drop().await?;
				}
				database.create_collection(spec.name()).await?;

				let result = self.loader.insert_all(&collection, documents).await?;
				tracing::info!(
					"Bound collection {} with {} documents from {}",
					spec.name(),
					result.documents_inserted,
					spec.source().describe()
				);

				collections.insert(spec.name().to_string(), collection);
				loaded.push(result);
			}
		}

		Ok(TestBedHandles {
			client,
			database,
			collections,
			loaded,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mongo_testbed_server::{ServerError, StartupPolicy};
	use rstest::rstest;
	use tempfile::TempDir;

	async fn offline_manager(dir: &TempDir) -> MongoManager {
		let config = mongo_testbed_server::ExternalConfig::new(
			"/nonexistent/bin/mongod",
			dir.path().join("db"),
		)
		.with_working_dir(dir.path().join("target"))
		.with_policy(StartupPolicy::Degraded);
		MongoManager::external(config).await.unwrap()
	}

	#[rstest]
	fn test_builder_keeps_order() {
		let binder = FixtureBinder::new()
			.collection(FixtureSpec::new("users", "users.json"))
			.collection(FixtureSpec::new("orders", FixtureSource::inline("[]")));

		let names: Vec<&str> = binder.specs().iter().map(FixtureSpec::name).collect();
		assert_eq!(names, vec!["users", "orders"]);
		assert_eq!(
			binder.specs()[0].source(),
			&FixtureSource::resource("users.json")
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_duplicate_collection_rejected() {
		let dir = TempDir::new().unwrap();
		let mut manager = offline_manager(&dir).await;
		let binder = FixtureBinder::new()
			.collection(FixtureSpec::new("users", "a.json"))
			.collection(FixtureSpec::new("users", "b.json"));

		let result = binder.bind(&manager).await;
		manager.stop().await;

		assert!(matches!(
			result,
			Err(TestBedError::DuplicateCollection(name)) if name == "users"
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_bind_without_connection() {
		let mut manager = MongoManager::default();
		let result = FixtureBinder::new().bind(&manager).await;
		manager.stop().await;

		assert!(matches!(
			result,
			Err(TestBedError::Server(ServerError::NotConnected))
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_binder_yields_handles_without_io() {
		let dir = TempDir::new().unwrap();
		let mut manager = offline_manager(&dir).await;

		let handles = FixtureBinder::new().bind(&manager).await.unwrap();
		manager.stop().await;

		assert_eq!(handles.database().name(), "mongo_testbed_db");
		assert!(handles.collections().is_empty());
		assert!(handles.load_results().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_fixture_fails_before_touching_database() {
		let dir = TempDir::new().unwrap();
		let mut manager = offline_manager(&dir).await;
		let binder = FixtureBinder::new()
			.with_loader(
				FixtureLoader::new().with_locator(mongo_testbed_seeding::ResourceLocator::new([
					dir.path(),
				])),
			)
			.collection(FixtureSpec::new("users", "missing.json"));

		// No mongod is listening; reaching the database would time out instead.
		let result = tokio::time::timeout(
			std::time::Duration::from_secs(5),
			binder.bind(&manager),
		)
		.await;
		manager.stop().await;

		assert!(matches!(
			result,
			Ok(Err(TestBedError::Seeding(
				mongo_testbed_seeding::SeedingError::ResourceNotFound { .. }
			)))
		));
	}
}
