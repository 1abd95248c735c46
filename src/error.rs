use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a `create` or `seed` command.
///
/// Statement failures the seeder tolerates are not represented here; they are
/// collected as [`crate::report::StatementIssue`] entries instead.
#[derive(Debug, Error)]
pub enum SeedError {
	#[error("{}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("seed file already exists: {}", .path.display())]
	AlreadyExists { path: PathBuf },

	#[error("{0}")]
	Validation(String),

	#[error("failed connecting to database: {0}")]
	Connect(#[source] sqlx::Error),

	#[error("checking whether table {table} has rows: {source}")]
	Probe {
		table: String,
		#[source]
		source: sqlx::Error,
	},
}

impl SeedError {
	pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}

	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}
}
