//! Error types for fixture loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a fixture into a collection.
#[derive(Debug, Error)]
pub enum SeedingError {
	/// The fixture resource could not be found under any search root.
	#[error("Fixture resource not found: {resource} (searched: {})", format_roots(.searched))]
	ResourceNotFound {
		/// Resource path as requested by the caller.
		resource: String,
		/// Search roots that were tried, in order.
		searched: Vec<PathBuf>,
	},

	/// The fixture is not a JSON array of JSON objects.
	#[error("Malformed fixture: {0}")]
	MalformedFixture(String),

	/// An `_id` string is not a 24-character hexadecimal object identifier.
	#[error("Invalid object id {value:?} in document {index}: {reason}")]
	InvalidObjectId {
		/// Position of the offending document in the fixture array.
		index: usize,
		/// The rejected `_id` string.
		value: String,
		/// Parser message.
		reason: String,
	},

	/// I/O operation failed while reading a fixture.
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	/// The fixture text is not valid JSON.
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	/// The bulk insert was rejected by the server.
	#[error("Database error: {0}")]
	DatabaseError(#[from] mongodb::error::Error),
}

fn format_roots(roots: &[PathBuf]) -> String {
	if roots.is_empty() {
		return "(no search roots)".to_string();
	}
	roots
		.iter()
		.map(|root| root.display().to_string())
		.collect::<Vec<_>>()
		.join(", ")
}

/// Result type alias for fixture loading.
pub type SeedingResult<T> = Result<T, SeedingError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_resource_not_found_lists_roots() {
		let error = SeedingError::ResourceNotFound {
			resource: "users.json".to_string(),
			searched: vec![PathBuf::from("/a"), PathBuf::from("/b")],
		};
		assert_eq!(
			error.to_string(),
			"Fixture resource not found: users.json (searched: /a, /b)"
		);
	}

	#[rstest]
	fn test_resource_not_found_without_roots() {
		let error = SeedingError::ResourceNotFound {
			resource: "users.json".to_string(),
			searched: vec![],
		};
		assert!(error.to_string().ends_with("(searched: (no search roots))"));
	}

	#[rstest]
	fn test_invalid_object_id_message() {
		let error = SeedingError::InvalidObjectId {
			index: 2,
			value: "xyz".to_string(),
			reason: "bad hex".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Invalid object id \"xyz\" in document 2: bad hex"
		);
	}

	#[rstest]
	fn test_json_error_from() {
		let json_error: serde_json::Error =
			serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
		let seeding_error: SeedingError = json_error.into();
		assert!(matches!(seeding_error, SeedingError::JsonError(_)));
	}
}
