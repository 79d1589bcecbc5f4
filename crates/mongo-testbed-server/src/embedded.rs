//! Embedded MongoDB, run as a throwaway container.

use std::time::Duration;

use testcontainers::{
	ContainerAsync, GenericImage, ImageExt,
	core::{ContainerPort, WaitFor},
	runners::AsyncRunner,
};

use crate::config::EmbeddedConfig;
use crate::error::{ServerError, ServerResult};

const MONGO_CONTAINER_PORT: u16 = 27017;
const READY_MESSAGE: &str = "Waiting for connections";
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// A running MongoDB container whose port 27017 is published on the configured host port.
pub struct EmbeddedMongo {
	container: ContainerAsync<GenericImage>,
	port: u16,
}

impl std::fmt::Debug for EmbeddedMongo {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EmbeddedMongo")
			.field("id", &self.container.id())
			.field("port", &self.port)
			.finish()
	}
}

async fn try_start(config: &EmbeddedConfig) -> ServerResult<ContainerAsync<GenericImage>> {
	GenericImage::new(config.image.as_str(), config.tag.as_str())
		.with_exposed_port(ContainerPort::Tcp(MONGO_CONTAINER_PORT))
		.with_wait_for(WaitFor::message_on_stdout(READY_MESSAGE))
		.with_mapped_port(config.port, ContainerPort::Tcp(MONGO_CONTAINER_PORT))
		.with_startup_timeout(config.startup_timeout)
		.start()
		.await
		.map_err(|e| ServerError::ContainerError(e.to_string()))
}

impl EmbeddedMongo {
	/// Starts the container and waits until MongoDB accepts connections.
	///
	/// Startup is retried `start_attempts` times, two seconds apart.
	pub async fn start(config: &EmbeddedConfig) -> ServerResult<Self> {
		let attempts = config.start_attempts.max(1);
		let mut last_error = None;

		for attempt in 1..=attempts {
			match try_start(config).await {
				Ok(container) => {
					tracing::info!(
						"Started embedded MongoDB {}:{} on port {}",
						config.image,
						config.tag,
						config.port
					);
					return Ok(Self {
						container,
						port: config.port,
					});
				}
				Err(e) => {
					tracing::warn!(
						"Embedded MongoDB start attempt {} of {} failed: {}",
						attempt,
						attempts,
						e
					);
					last_error = Some(e);
					if attempt < attempts {
						tokio::time::sleep(RETRY_DELAY).await;
					}
				}
			}
		}

		Err(last_error.unwrap_or_else(|| {
			ServerError::ContainerError("embedded MongoDB did not start".to_string())
		}))
	}

	/// Host port the server listens on.
	pub fn port(&self) -> u16 {
		self.port
	}

	/// Stops and removes the container.
	pub async fn shutdown(self) -> ServerResult<()> {
		let id = self.container.id().to_string();
		self.container
			.stop()
			.await
			.map_err(|e| ServerError::ContainerError(e.to_string()))?;
		self.container
			.rm()
			.await
			.map_err(|e| ServerError::ContainerError(e.to_string()))?;
		tracing::info!("Removed embedded MongoDB container {}", id);
		Ok(())
	}
}
