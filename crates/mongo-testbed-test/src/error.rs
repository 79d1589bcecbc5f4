//! Errors raised while binding fixtures to a test bed.

use mongo_testbed_seeding::SeedingError;
use mongo_testbed_server::ServerError;
use thiserror::Error;

/// Errors raised while preparing or tearing down a test bed.
#[derive(Debug, Error)]
pub enum TestBedError {
	/// A fixture could not be found, parsed or inserted.
	#[error(transparent)]
	Seeding(#[from] SeedingError),

	/// The manager has no usable server or client.
	#[error(transparent)]
	Server(#[from] ServerError),

	/// Dropping or creating a collection failed.
	#[error("Database error: {0}")]
	Database(#[from] mongodb::error::Error),

	/// Two fixture specs name the same collection.
	#[error("Collection {0} is bound more than once")]
	DuplicateCollection(String),
}

/// Result type alias for test bed operations.
pub type TestBedResult<T> = Result<T, TestBedError>;
