//! Fixture system: locate, parse and insert JSON fixtures.

pub mod loader;
pub mod parser;
pub mod resource;

pub use loader::{FixtureLoader, LoadResult};
pub use parser::{FixtureParser, ID_KEY, json_to_bson};
pub use resource::{RESOURCES_ENV_VAR, ResourceLocator};

use std::path::PathBuf;

/// Which `_id` fields are rewritten from hex strings to object identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ObjectIdPolicy {
	/// Only the `_id` of each top-level document.
	#[default]
	TopLevel,
	/// Every `_id` in every nested object as well.
	Recursive,
}

/// Where fixture text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSource {
	/// A resource path resolved through a [`ResourceLocator`].
	Resource(PathBuf),
	/// Fixture text held in memory, e.g. from `include_str!`.
	Inline(String),
}

impl FixtureSource {
	/// Creates a source for a resource path.
	pub fn resource(path: impl Into<PathBuf>) -> Self {
		Self::Resource(path.into())
	}

	/// Creates a source for in-memory fixture text.
	pub fn inline(content: impl Into<String>) -> Self {
		Self::Inline(content.into())
	}

	/// Human-readable description used in log messages.
	pub fn describe(&self) -> String {
		match self {
			Self::Resource(path) => path.display().to_string(),
			Self::Inline(content) => format!("<inline, {} bytes>", content.len()),
		}
	}
}

impl From<&str> for FixtureSource {
	fn from(path: &str) -> Self {
		Self::resource(path)
	}
}

impl From<PathBuf> for FixtureSource {
	fn from(path: PathBuf) -> Self {
		Self::Resource(path)
	}
}
