//! Everything a test needs, including the server and seeding types.
//!
//! ```ignore
//! use mongo_testbed_test::prelude::*;
//! ```

pub use crate::binding::{FixtureBinder, FixtureSpec, TestBedHandles};
pub use crate::error::{TestBedError, TestBedResult};
pub use crate::logging::init_test_logging;
pub use crate::resource::{TestBed, run_with_testbed};

pub use mongo_testbed_seeding::prelude::*;
pub use mongo_testbed_server::prelude::*;
