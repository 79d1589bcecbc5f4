//! Lifecycle coordination for one test bed MongoDB.

use std::time::Duration;

use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection, Database};

#[cfg(feature = "embedded")]
use crate::config::EmbeddedConfig;
use crate::config::{
	ConnectConfig, ConnectionConfig, ConnectionUri, ExternalConfig, StartupPolicy,
	TESTBED_DATABASE,
};
#[cfg(feature = "embedded")]
use crate::embedded::EmbeddedMongo;
use crate::error::{ServerError, ServerResult};
use crate::external::ExternalMongo;

/// Where a manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	/// Created, nothing acquired yet.
	Uninitialized,
	/// Acquiring the server and the client.
	Starting,
	/// Startup finished; in degraded mode some handles may be missing.
	Running,
	/// `stop()` ran; every handle is released.
	Stopped,
}

/// How the manager obtained its server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestBedMode {
	/// A container started by the manager.
	Embedded,
	/// A `mongod` process launched by the manager.
	External,
	/// An existing server the manager only connects to.
	Connect,
}

#[derive(Debug)]
enum ProcessHandle {
	#[cfg(feature = "embedded")]
	Embedded(EmbeddedMongo),
	External(ExternalMongo),
	None,
}

/// Owns the server process (if any), the client and the database handle of a test bed.
///
/// Build one with [`embedded`](Self::embedded), [`external`](Self::external),
/// [`connect`](Self::connect) or [`connect_uri`](Self::connect_uri), and
/// release it with [`stop`](Self::stop).
///
/// # Example
///
/// ```ignore
/// use mongo_testbed_server::prelude::*;
///
/// let mut manager = MongoManager::connect_uri("mongodb://127.0.0.1:27017").await?;
/// let users = manager.collection("users")?;
/// // ...
/// manager.stop().await;
/// ```
#[derive(Debug)]
pub struct MongoManager {
	mode: TestBedMode,
	database_name: String,
	process: ProcessHandle,
	client: Option<Client>,
	database: Option<Database>,
	state: LifecycleState,
}

impl MongoManager {
	fn new(mode: TestBedMode, database_name: &str) -> Self {
		Self {
			mode,
			database_name: database_name.to_string(),
			process: ProcessHandle::None,
			client: None,
			database: None,
			state: LifecycleState::Uninitialized,
		}
	}

	/// Starts a MongoDB container on `config.port` and connects to it.
	#[cfg(feature = "embedded")]
	pub async fn embedded(config: EmbeddedConfig) -> ServerResult<Self> {
		let mut manager = Self::new(TestBedMode::Embedded, &config.database_name);
		manager.state = LifecycleState::Starting;
		tracing::info!("Starting embedded MongoDB on port {}", config.port);

		let result = manager.start_embedded(&config).await;
		manager.finish_startup(result, config.policy).await
	}

	#[cfg(feature = "embedded")]
	async fn start_embedded(&mut self, config: &EmbeddedConfig) -> ServerResult<()> {
		let mongo = EmbeddedMongo::start(config).await?;
		self.process = ProcessHandle::Embedded(mongo);
		self.open(config.connection(), config.server_selection_timeout, true)
			.await
	}

	/// Launches `mongod` and creates a client for it.
	///
	/// The client connects lazily, so a slow `mongod` only delays the first
	/// operation. Under [`StartupPolicy::Degraded`] a launch failure is logged
	/// and the client is still created.
	pub async fn external(config: ExternalConfig) -> ServerResult<Self> {
		let mut manager = Self::new(TestBedMode::External, &config.database_name);
		manager.state = LifecycleState::Starting;

		let result = manager.start_external(&config).await;
		manager.finish_startup(result, config.policy).await
	}

	async fn start_external(&mut self, config: &ExternalConfig) -> ServerResult<()> {
		match ExternalMongo::launch(config).await {
			Ok(mongo) => self.process = ProcessHandle::External(mongo),
			Err(e) if config.policy == StartupPolicy::Degraded => {
				tracing::error!("{}", e);
			}
			Err(e) => return Err(e),
		}
		self.open(config.connection(), config.server_selection_timeout, false)
			.await
	}

	/// Connects to the server named by `config.uri` and verifies it answers a ping.
	pub async fn connect(config: ConnectConfig) -> ServerResult<Self> {
		let mut manager = Self::new(TestBedMode::Connect, &config.database_name);
		manager.state = LifecycleState::Starting;

		let result = manager.start_connect(&config).await;
		manager.finish_startup(result, config.policy).await
	}

	async fn start_connect(&mut self, config: &ConnectConfig) -> ServerResult<()> {
		let uri = ConnectionUri::parse(&config.uri)?;
		tracing::info!("Connecting to MongoDB at {}", uri);
		self.open(
			ConnectionConfig::Uri(uri),
			config.server_selection_timeout,
			true,
		)
		.await
	}

	/// [`connect`](Self::connect) with default settings.
	pub async fn connect_uri(uri: &str) -> ServerResult<Self> {
		Self::connect(ConnectConfig::new(uri)).await
	}

	async fn open(
		&mut self,
		connection: ConnectionConfig,
		server_selection_timeout: Option<Duration>,
		verify: bool,
	) -> ServerResult<()> {
		let target = connection.target();
		let options = connection.client_options(&self.database_name, server_selection_timeout)?;
		let client =
			Client::with_options(options).map_err(|e| ServerError::connection(&target, e))?;
		let database = client.database(&self.database_name);

		self.client = Some(client);
		self.database = Some(database.clone());

		if verify {
			database
				.run_command(doc! { "ping": 1 })
				.await
				.map_err(|e| ServerError::connection(&target, e))?;
			tracing::debug!("MongoDB at {} answered ping", target);
		}
		Ok(())
	}

	async fn finish_startup(
		mut self,
		result: ServerResult<()>,
		policy: StartupPolicy,
	) -> ServerResult<Self> {
		match result {
			Ok(()) => {
				self.state = LifecycleState::Running;
				tracing::info!(
					"Mongo test bed ({:?}) ready, database {}",
					self.mode,
					self.database_name
				);
				Ok(self)
			}
			Err(e) => match policy {
				StartupPolicy::FailFast => {
					tracing::error!("Mongo test bed ({:?}) failed to start: {}", self.mode, e);
					self.stop().await;
					Err(e)
				}
				StartupPolicy::Degraded => {
					tracing::error!(
						"Mongo test bed ({:?}) failed to start, continuing degraded: {}",
						self.mode,
						e
					);
					self.state = LifecycleState::Running;
					Ok(self)
				}
			},
		}
	}

	/// How this manager obtained its server.
	pub fn mode(&self) -> TestBedMode {
		self.mode
	}

	/// Current lifecycle state.
	pub fn state(&self) -> LifecycleState {
		self.state
	}

	/// Name of the test bed database.
	pub fn database_name(&self) -> &str {
		&self.database_name
	}

	/// Whether a client handle is held.
	pub fn is_connected(&self) -> bool {
		self.client.is_some()
	}

	/// Whether the manager launched a server it is responsible for stopping.
	pub fn owns_process(&self) -> bool {
		!matches!(self.process, ProcessHandle::None)
	}

	/// The driver client.
	pub fn client(&self) -> ServerResult<&Client> {
		self.client.as_ref().ok_or(ServerError::NotConnected)
	}

	/// The test bed database handle.
	pub fn database(&self) -> ServerResult<&Database> {
		self.database.as_ref().ok_or(ServerError::NotConnected)
	}

	/// A collection of the test bed database.
	pub fn collection(&self, name: &str) -> ServerResult<Collection<Document>> {
		Ok(self.database()?.collection(name))
	}

	/// Sends `ping` to the test bed database.
	pub async fn ping(&self) -> ServerResult<()> {
		let database = self.database()?;
		database
			.run_command(doc! { "ping": 1 })
			.await
			.map_err(|e| ServerError::connection(database.name(), e))?;
		Ok(())
	}

	/// Releases the client, then stops any server this manager started.
	///
	/// Safe to call any number of times and on a manager whose startup
	/// failed. Errors are logged, never returned.
	pub async fn stop(&mut self) {
		if self.state == LifecycleState::Stopped {
			tracing::debug!("Mongo test bed already stopped");
			return;
		}

		self.database = None;
		if let Some(client) = self.client.take() {
			// Clones held by test handles share this client's pools and monitors.
			client.shutdown().immediate(true).await;
			tracing::debug!("Shut down MongoDB client");
		}

		match std::mem::replace(&mut self.process, ProcessHandle::None) {
			#[cfg(feature = "embedded")]
			ProcessHandle::Embedded(mongo) => {
				if let Err(e) = mongo.shutdown().await {
					tracing::warn!("Failed to stop embedded MongoDB: {}", e);
				}
			}
			ProcessHandle::External(mongo) => mongo.shutdown().await,
			ProcessHandle::None => {}
		}

		self.state = LifecycleState::Stopped;
		tracing::info!("Mongo test bed ({:?}) stopped", self.mode);
	}
}

impl Drop for MongoManager {
	fn drop(&mut self) {
		if self.owns_process() {
			tracing::warn!(
				"Mongo test bed ({:?}) dropped without stop(); its server is killed on drop",
				self.mode
			);
		}
	}
}

impl Default for MongoManager {
	/// An unconnected manager for [`TESTBED_DATABASE`]; every accessor fails until replaced.
	fn default() -> Self {
		Self::new(TestBedMode::Connect, TESTBED_DATABASE)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	const UNREACHABLE_URI: &str = "mongodb://127.0.0.1:1";

	fn missing_mongod(dir: &TempDir, policy: StartupPolicy) -> ExternalConfig {
		ExternalConfig::new("/nonexistent/bin/mongod", dir.path().join("db"))
			.with_working_dir(dir.path().join("target"))
			.with_policy(policy)
	}

	#[rstest]
	#[tokio::test]
	async fn test_stop_is_idempotent() {
		let mut manager = MongoManager::default();
		assert_eq!(manager.state(), LifecycleState::Uninitialized);

		manager.stop().await;
		manager.stop().await;

		assert_eq!(manager.state(), LifecycleState::Stopped);
		assert!(matches!(manager.client(), Err(ServerError::NotConnected)));
	}

	#[cfg(unix)]
	fn fake_mongod(dir: &TempDir) -> std::path::PathBuf {
		use std::os::unix::fs::PermissionsExt;

		let path = dir.path().join("mongod");
		std::fs::write(
			&path,
			"#!/bin/sh\nwhile true; do echo \"waiting for connections on $2\"; sleep 0.1; done\n",
		)
		.unwrap();
		std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
		path
	}

	#[cfg(unix)]
	#[rstest]
	#[tokio::test]
	async fn test_stop_twice_releases_live_process_once() {
		let dir = TempDir::new().unwrap();
		let config = ExternalConfig::new(fake_mongod(&dir), dir.path().join("db"))
			.with_working_dir(dir.path().join("target"));

		let mut manager = MongoManager::external(config).await.unwrap();
		assert!(manager.owns_process());
		assert_eq!(manager.state(), LifecycleState::Running);

		tokio::time::timeout(Duration::from_secs(10), async {
			manager.stop().await;
			manager.stop().await;
		})
		.await
		.expect("stop should finish");

		assert!(!manager.owns_process());
		assert!(!manager.is_connected());
		assert_eq!(manager.state(), LifecycleState::Stopped);
	}

	#[rstest]
	#[tokio::test]
	async fn test_stop_shuts_down_shared_client() {
		let dir = TempDir::new().unwrap();
		let mut manager = MongoManager::external(missing_mongod(&dir, StartupPolicy::Degraded))
			.await
			.unwrap();
		let shared = manager.client().unwrap().clone();

		tokio::time::timeout(Duration::from_secs(10), manager.stop())
			.await
			.expect("stop should not wait for other client handles");

		assert!(!manager.is_connected());
		drop(shared);
	}

	#[rstest]
	#[tokio::test]
	async fn test_external_launch_failure_fails_fast() {
		let dir = TempDir::new().unwrap();

		let result = MongoManager::external(missing_mongod(&dir, StartupPolicy::FailFast)).await;

		assert!(matches!(
			result,
			Err(ServerError::ProcessLaunchError { .. })
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_external_launch_failure_degraded() {
		let dir = TempDir::new().unwrap();

		let mut manager = MongoManager::external(missing_mongod(&dir, StartupPolicy::Degraded))
			.await
			.unwrap();

		assert_eq!(manager.mode(), TestBedMode::External);
		assert_eq!(manager.state(), LifecycleState::Running);
		assert!(!manager.owns_process());
		assert!(manager.is_connected());
		assert_eq!(manager.database().unwrap().name(), TESTBED_DATABASE);

		manager.stop().await;
		manager.stop().await;
		assert!(!manager.is_connected());
		assert!(matches!(manager.database(), Err(ServerError::NotConnected)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_connect_unreachable_fails_fast() {
		let config = ConnectConfig::new(UNREACHABLE_URI)
			.with_server_selection_timeout(Duration::from_millis(300));

		let error = MongoManager::connect(config).await.unwrap_err();

		match error {
			ServerError::ConnectionError { target, .. } => assert_eq!(target, "127.0.0.1:1"),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_connect_unreachable_degraded() {
		let config = ConnectConfig::new(UNREACHABLE_URI)
			.with_server_selection_timeout(Duration::from_millis(300))
			.with_policy(StartupPolicy::Degraded);

		let mut manager = MongoManager::connect(config).await.unwrap();
		assert!(manager.is_connected());
		assert!(matches!(
			manager.ping().await,
			Err(ServerError::ConnectionError { .. })
		));

		manager.stop().await;
	}

	#[rstest]
	#[tokio::test]
	async fn test_connect_invalid_uri() {
		let result = MongoManager::connect_uri("not a uri").await;
		assert!(matches!(result, Err(ServerError::InvalidUri { .. })));

		let mut manager = MongoManager::connect(
			ConnectConfig::new("not a uri").with_policy(StartupPolicy::Degraded),
		)
		.await
		.unwrap();
		assert!(matches!(
			manager.collection("users"),
			Err(ServerError::NotConnected)
		));
		manager.stop().await;
	}

	#[cfg(feature = "embedded")]
	#[rstest]
	#[tokio::test]
	#[ignore = "requires Docker"]
	async fn test_embedded_lifecycle() {
		let mut manager = MongoManager::embedded(EmbeddedConfig::new().with_port(9817))
			.await
			.unwrap();

		assert_eq!(manager.mode(), TestBedMode::Embedded);
		assert!(manager.owns_process());
		manager.ping().await.unwrap();

		manager.stop().await;
		assert_eq!(manager.state(), LifecycleState::Stopped);
		assert!(!manager.owns_process());
	}

	#[rstest]
	#[tokio::test]
	#[ignore = "requires mongod on PATH"]
	async fn test_external_lifecycle() {
		let dir = TempDir::new().unwrap();
		std::fs::create_dir_all(dir.path().join("db")).unwrap();
		let config = ExternalConfig::new("mongod", dir.path().join("db"))
			.with_working_dir(dir.path().join("target"))
			.with_server_selection_timeout(Duration::from_secs(30));

		let mut manager = MongoManager::external(config).await.unwrap();
		assert!(manager.owns_process());
		manager.ping().await.unwrap();

		manager.stop().await;
	}
}
