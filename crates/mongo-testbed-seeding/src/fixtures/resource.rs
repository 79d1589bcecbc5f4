//! Fixture resource resolution and reading.
//!
//! Fixtures are addressed by a path relative to a set of search roots, the
//! way a test resource would be found on a classpath. The first root that
//! contains the resource wins.

use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use crate::error::{SeedingError, SeedingResult};

/// Environment variable holding extra search roots (platform path-list syntax).
pub const RESOURCES_ENV_VAR: &str = "MONGO_TESTBED_RESOURCES";

/// Read buffer size used when materializing a fixture.
const BUFFER_SIZE: usize = 8192;

/// Resolves fixture resource paths against an ordered list of search roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
	roots: Vec<PathBuf>,
}

impl Default for ResourceLocator {
	fn default() -> Self {
		Self::from_env()
	}
}

impl ResourceLocator {
	/// Creates a locator with the given search roots.
	pub fn new<I, P>(roots: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		Self {
			roots: roots.into_iter().map(Into::into).collect(),
		}
	}

	/// Creates a locator with the default search roots.
	///
	/// Roots, in order:
	/// 1. Every entry of `MONGO_TESTBED_RESOURCES`
	/// 2. `$CARGO_MANIFEST_DIR/tests/resources`
	/// 3. `$CARGO_MANIFEST_DIR/tests/fixtures`
	/// 4. The current working directory
	pub fn from_env() -> Self {
		let mut roots = Vec::new();

		if let Some(paths) = std::env::var_os(RESOURCES_ENV_VAR) {
			roots.extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
		}

		if let Some(manifest_dir) = std::env::var_os("CARGO_MANIFEST_DIR") {
			let manifest_dir = PathBuf::from(manifest_dir);
			roots.push(manifest_dir.join("tests").join("resources"));
			roots.push(manifest_dir.join("tests").join("fixtures"));
		}

		if let Ok(cwd) = std::env::current_dir() {
			roots.push(cwd);
		}

		Self { roots }
	}

	/// Appends a search root with the lowest priority.
	pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.roots.push(root.into());
		self
	}

	/// Returns the search roots in priority order.
	pub fn roots(&self) -> &[PathBuf] {
		&self.roots
	}

	/// Resolves `resource` to an existing file.
	///
	/// Absolute paths bypass the search roots.
	///
	/// # Errors
	///
	/// Returns [`SeedingError::ResourceNotFound`] when no root contains the resource.
	pub fn resolve(&self, resource: impl AsRef<Path>) -> SeedingResult<PathBuf> {
		let resource = resource.as_ref();

		if resource.is_absolute() {
			if resource.is_file() {
				return Ok(resource.to_path_buf());
			}
			return Err(SeedingError::ResourceNotFound {
				resource: resource.display().to_string(),
				searched: vec![],
			});
		}

		self.roots
			.iter()
			.map(|root| root.join(resource))
			.find(|candidate| candidate.is_file())
			.ok_or_else(|| SeedingError::ResourceNotFound {
				resource: resource.display().to_string(),
				searched: self.roots.clone(),
			})
	}

	/// Resolves and reads a resource as UTF-8 text.
	pub async fn read(&self, resource: impl AsRef<Path>) -> SeedingResult<String> {
		let path = self.resolve(resource)?;
		tracing::debug!("Reading fixture resource {}", path.display());
		read_utf8(&path).await
	}
}

/// Reads the whole file into memory through a fixed-size buffer, then decodes it as UTF-8.
pub(crate) async fn read_utf8(path: &Path) -> SeedingResult<String> {
	let mut file = tokio::fs::File::open(path).await.map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			SeedingError::ResourceNotFound {
				resource: path.display().to_string(),
				searched: vec![],
			}
		} else {
			SeedingError::IoError(e)
		}
	})?;

	let mut bytes = Vec::new();
	let mut buf = [0u8; BUFFER_SIZE];
	loop {
		let read = file.read(&mut buf).await?;
		if read == 0 {
			break;
		}
		bytes.extend_from_slice(&buf[..read]);
	}

	String::from_utf8(bytes).map_err(|e| {
		SeedingError::MalformedFixture(format!(
			"{} is not valid UTF-8: {}",
			path.display(),
			e.utf8_error()
		))
	})
}
