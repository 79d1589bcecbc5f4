//! Error types for MongoDB lifecycle management.

use thiserror::Error;

/// Errors raised while starting, connecting to, or using a test bed MongoDB.
#[derive(Debug, Error)]
pub enum ServerError {
	/// The target host or port could not be reached.
	#[error("Connection error: {target}: {message}")]
	ConnectionError {
		/// `host:port` or URI that was being contacted.
		target: String,
		/// Driver message.
		message: String,
	},

	/// The external `mongod` executable could not be started.
	#[error("Could not launch {command}: {source}")]
	ProcessLaunchError {
		/// Executable that was being launched.
		command: String,
		/// Underlying spawn error.
		#[source]
		source: std::io::Error,
	},

	/// The embedded MongoDB container failed to start or stop.
	#[error("Container error: {0}")]
	ContainerError(String),

	/// The connection URI could not be parsed.
	#[error("Invalid connection URI {uri:?}: {message}")]
	InvalidUri {
		/// URI as given by the caller.
		uri: String,
		/// What is wrong with it.
		message: String,
	},

	/// The manager has no live connection, because startup failed or `stop()` already ran.
	#[error("Mongo test bed is not connected")]
	NotConnected,

	/// Driver error outside of connection setup.
	#[error("Database error: {0}")]
	DatabaseError(#[from] mongodb::error::Error),
}

impl ServerError {
	pub(crate) fn connection(target: impl Into<String>, error: impl std::fmt::Display) -> Self {
		Self::ConnectionError {
			target: target.into(),
			message: error.to_string(),
		}
	}
}

/// Result type alias for lifecycle operations.
pub type ServerResult<T> = Result<T, ServerError>;
