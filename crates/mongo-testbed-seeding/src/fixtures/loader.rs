//! Fixture loading into MongoDB collections.

use mongodb::Collection;
use mongodb::bson::Document;

use super::{FixtureParser, FixtureSource, ObjectIdPolicy, ResourceLocator};
use crate::error::SeedingResult;

/// Outcome of inserting a fixture into a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
	/// Target collection name.
	pub collection: String,
	/// Number of documents inserted.
	pub documents_inserted: usize,
}

/// Loads JSON fixtures and bulk-inserts them into collections.
///
/// # Example
///
/// ```ignore
/// use mongo_testbed_seeding::prelude::*;
///
/// let loader = FixtureLoader::new();
/// let result = loader
///     .load_into(&collection, FixtureSource::resource("users.json"))
///     .await?;
/// assert_eq!(result.documents_inserted, 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixtureLoader {
	locator: ResourceLocator,
	parser: FixtureParser,
}

impl FixtureLoader {
	/// Creates a loader with the default search roots and top-level `_id` rewriting.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the resource locator.
	pub fn with_locator(mut self, locator: ResourceLocator) -> Self {
		self.locator = locator;
		self
	}

	/// Sets the `_id` rewrite policy.
	pub fn with_policy(mut self, policy: ObjectIdPolicy) -> Self {
		self.parser = self.parser.with_policy(policy);
		self
	}

	/// Returns the resource locator.
	pub fn locator(&self) -> &ResourceLocator {
		&self.locator
	}

	/// Reads and parses a fixture into documents, in array order.
	pub async fn load(&self, source: impl Into<FixtureSource>) -> SeedingResult<Vec<Document>> {
		let source = source.into();
		let documents = match &source {
			FixtureSource::Resource(path) => {
				let content = self.locator.read(path).await?;
				self.parser.parse_str(&content)?
			}
			FixtureSource::Inline(content) => self.parser.parse_str(content)?,
		};

		tracing::debug!(
			"Parsed {} documents from fixture {}",
			documents.len(),
			source.describe()
		);
		Ok(documents)
	}

	/// Inserts all documents into `collection` with a single bulk insert.
	///
	/// There is no transaction: if the server rejects the batch, whatever it
	/// already applied stays in the collection. An empty batch is a no-op.
	pub async fn insert_all(
		&self,
		collection: &Collection<Document>,
		documents: Vec<Document>,
	) -> SeedingResult<LoadResult> {
		let name = collection.name().to_string();

		if documents.is_empty() {
			tracing::debug!("Fixture for collection {} is empty, nothing to insert", name);
			return Ok(LoadResult {
				collection: name,
				documents_inserted: 0,
			});
		}

		let result = collection.insert_many(documents).await?;
		tracing::debug!(
			"Inserted {} documents into collection {}",
			result.inserted_ids.len(),
			name
		);

		Ok(LoadResult {
			collection: name,
			documents_inserted: result.inserted_ids.len(),
		})
	}

	/// Loads a fixture and inserts it into `collection`.
	pub async fn load_into(
		&self,
		collection: &Collection<Document>,
		source: impl Into<FixtureSource>,
	) -> SeedingResult<LoadResult> {
		let documents = self.load(source).await?;
		self.insert_all(collection, documents).await
	}
}
