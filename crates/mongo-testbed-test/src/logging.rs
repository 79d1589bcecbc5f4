//! Log output for test bed tests.

use std::sync::Once;

use env_logger::Env;

static INIT: Once = Once::new();

/// Filter applied when `RUST_LOG` is unset: warnings everywhere, plus the
/// lifecycle steps and relayed `mongod` output of the server crate.
pub const DEFAULT_FILTER: &str = "warn,mongo_testbed_server=info";

/// Routes test bed log records to the test harness output, once per process.
///
/// `RUST_LOG` replaces [`DEFAULT_FILTER`]. The external `mongod` output is
/// logged at `info` as `Mongo DB: <line>` by `mongo_testbed_server::external`,
/// so it can be silenced or isolated on its own:
///
/// ```text
/// RUST_LOG=warn,mongo_testbed_server::external=off cargo test
/// RUST_LOG=mongo_testbed_server::external=info cargo test -- --nocapture
/// RUST_LOG=mongo_testbed_test=debug,mongo_testbed_seeding=debug cargo test
/// ```
///
/// # Examples
///
/// ```
/// use mongo_testbed_test::logging::init_test_logging;
///
/// init_test_logging();
/// // Later calls are no-ops.
/// init_test_logging();
/// ```
pub fn init_test_logging() {
	INIT.call_once(|| {
		let _ = env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
			.is_test(true)
			.try_init();
	});
}
