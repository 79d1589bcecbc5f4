//! JSON fixture loading for mongo-testbed.
//!
//! A fixture is a UTF-8 JSON array of objects:
//!
//! ```json
//! [
//!   {"_id": "507f1f77bcf86cd799439011", "name": "a"},
//!   {"name": "b"}
//! ]
//! ```
//!
//! Loading resolves the fixture against a set of search roots, reads it
//! whole, converts every object to a BSON document (a string `_id` becomes
//! an `ObjectId`) and inserts the documents into a collection with one bulk
//! insert.
//!
//! ```ignore
//! use mongo_testbed_seeding::prelude::*;
//!
//! let loader = FixtureLoader::new();
//! let documents = loader.load("test_collection.json").await?;
//! let result = loader.insert_all(&collection, documents).await?;
//! println!("Loaded {} documents", result.documents_inserted);
//! ```
//!
//! # Architecture
//!
//! - [`ResourceLocator`](fixtures::ResourceLocator) - find fixture files
//! - [`FixtureParser`](fixtures::FixtureParser) - JSON text to BSON documents
//! - [`FixtureLoader`](fixtures::FixtureLoader) - parse and insert

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod fixtures;
pub mod prelude;

pub use error::{SeedingError, SeedingResult};
pub use fixtures::{
	FixtureLoader, FixtureParser, FixtureSource, LoadResult, ObjectIdPolicy, ResourceLocator,
};
