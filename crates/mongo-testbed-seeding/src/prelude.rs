//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use mongo_testbed_seeding::prelude::*;
//! ```

pub use crate::error::{SeedingError, SeedingResult};

pub use crate::fixtures::{
	FixtureLoader, FixtureParser, FixtureSource, ID_KEY, LoadResult, ObjectIdPolicy,
	ResourceLocator,
};
