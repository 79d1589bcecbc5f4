//! Externally launched `mongod` process.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ExternalConfig;
use crate::error::{ServerError, ServerResult};

/// A child `mongod` process whose stdout and stderr are relayed to the log.
///
/// The child is killed if the handle is dropped without [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct ExternalMongo {
	command: String,
	child: Child,
	cancel: CancellationToken,
	drain: JoinHandle<()>,
}

impl ExternalMongo {
	/// Launches `config.command --port <port> --dbpath <dbpath>` in `config.working_dir`.
	///
	/// Returns as soon as the process is spawned; readiness is not awaited.
	pub async fn launch(config: &ExternalConfig) -> ServerResult<Self> {
		let command = config.command.display().to_string();
		tokio::fs::create_dir_all(&config.working_dir)
			.await
			.map_err(|source| ServerError::ProcessLaunchError {
				command: command.clone(),
				source,
			})?;

		Self::spawn(&config.command, &config.args(), &config.working_dir)
	}

	pub(crate) fn spawn(program: &Path, args: &[String], working_dir: &Path) -> ServerResult<Self> {
		let command = program.display().to_string();

		let mut child = Command::new(program)
			.args(args)
			.current_dir(working_dir)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|source| ServerError::ProcessLaunchError {
				command: command.clone(),
				source,
			})?;

		tracing::info!(
			pid = ?child.id(),
			"Launched {} {}",
			command,
			args.join(" ")
		);

		let cancel = CancellationToken::new();
		let drain = tokio::spawn(drain_output(
			child.stdout.take(),
			child.stderr.take(),
			cancel.clone(),
		));

		Ok(Self {
			command,
			child,
			cancel,
			drain,
		})
	}

	/// OS process id, if the process has not been reaped yet.
	pub fn pid(&self) -> Option<u32> {
		self.child.id()
	}

	/// Executable this handle launched.
	pub fn command(&self) -> &str {
		&self.command
	}

	/// Kills the process, waits for it to exit and stops relaying its output.
	///
	/// Failures are logged, never returned.
	pub async fn shutdown(mut self) {
		if let Err(e) = self.child.start_kill() {
			tracing::debug!("Could not signal {}: {}", self.command, e);
		}

		match self.child.wait().await {
			Ok(status) => tracing::info!("{} exited with {}", self.command, status),
			Err(e) => tracing::warn!("Failed to wait for {}: {}", self.command, e),
		}

		self.cancel.cancel();
		if let Err(e) = self.drain.await {
			tracing::warn!("Output relay for {} failed: {}", self.command, e);
		}
	}
}

async fn next_line<R>(lines: &mut Option<Lines<R>>) -> std::io::Result<Option<String>>
where
	R: AsyncBufRead + Unpin,
{
	match lines {
		Some(lines) => lines.next_line().await,
		None => std::future::pending().await,
	}
}

fn relay<R>(lines: &mut Option<Lines<R>>, line: std::io::Result<Option<String>>) {
	match line {
		Ok(Some(line)) => tracing::info!("Mongo DB: {}", line),
		Ok(None) => *lines = None,
		Err(e) => {
			tracing::warn!("Error reading mongod output: {}", e);
			*lines = None;
		}
	}
}

/// Logs each output line until both streams close or `cancel` fires.
async fn drain_output(
	stdout: Option<ChildStdout>,
	stderr: Option<ChildStderr>,
	cancel: CancellationToken,
) {
	let mut stdout = stdout.map(|s| BufReader::new(s).lines());
	let mut stderr = stderr.map(|s| BufReader::new(s).lines());

	while stdout.is_some() || stderr.is_some() {
		tokio::select! {
			_ = cancel.cancelled() => break,
			line = next_line(&mut stdout) => relay(&mut stdout, line),
			line = next_line(&mut stderr) => relay(&mut stderr, line),
		}
	}
	tracing::debug!("Stopped relaying mongod output");
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::path::PathBuf;
	use std::time::Duration;
	use tempfile::TempDir;

	#[rstest]
	#[tokio::test]
	async fn test_launch_missing_executable() {
		let dir = TempDir::new().unwrap();
		let config = ExternalConfig::new("/nonexistent/bin/mongod", dir.path().join("db"))
			.with_working_dir(dir.path().join("target"));

		let error = ExternalMongo::launch(&config).await.unwrap_err();

		match error {
			ServerError::ProcessLaunchError { command, source } => {
				assert_eq!(command, "/nonexistent/bin/mongod");
				assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[cfg(unix)]
	#[rstest]
	#[tokio::test]
	async fn test_launch_creates_working_dir() {
		let dir = TempDir::new().unwrap();
		let working_dir = dir.path().join("target");
		let config =
			ExternalConfig::new("echo", dir.path().join("db")).with_working_dir(&working_dir);

		let mongo = ExternalMongo::launch(&config).await.unwrap();
		assert!(working_dir.is_dir());
		assert_eq!(mongo.command(), "echo");

		mongo.shutdown().await;
	}

	#[cfg(unix)]
	#[rstest]
	#[tokio::test]
	async fn test_shutdown_stops_long_running_process() {
		let dir = TempDir::new().unwrap();
		let mongo = ExternalMongo::spawn(
			&PathBuf::from("sh"),
			&[
				"-c".to_string(),
				"while true; do echo waiting for connections; sleep 0.1; done".to_string(),
			],
			dir.path(),
		)
		.unwrap();
		assert!(mongo.pid().is_some());

		tokio::time::timeout(Duration::from_secs(10), mongo.shutdown())
			.await
			.expect("shutdown should finish");
	}

	#[cfg(unix)]
	#[rstest]
	#[tokio::test]
	async fn test_drain_stops_when_streams_close() {
		let dir = TempDir::new().unwrap();
		let mut mongo = ExternalMongo::spawn(
			&PathBuf::from("sh"),
			&["-c".to_string(), "echo out; echo err 1>&2".to_string()],
			dir.path(),
		)
		.unwrap();

		let status = mongo.child.wait().await.unwrap();
		assert!(status.success());

		let drain = &mut mongo.drain;
		tokio::time::timeout(Duration::from_secs(10), drain)
			.await
			.expect("drain should finish on EOF")
			.unwrap();
	}
}
