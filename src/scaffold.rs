use std::{
	fs::{self, OpenOptions},
	io::{self, Write},
	path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::SeedError;
use crate::selector::seed_file_name;

pub const SEED_TEMPLATE: &str =
	"-- example: INSERT INTO table (column1, column2) VALUES (value1, value2);";

/// Writes `seed_<table>_table.sql` into `dir`, creating the directory first.
/// An existing file is never touched.
pub fn create_seed_template(dir: &Path, table: &str) -> Result<PathBuf, SeedError> {
	fs::create_dir_all(dir).map_err(|e| SeedError::io(dir, e))?;

	let path = dir.join(seed_file_name(table));
	let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
		Ok(file) => file,
		Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
			return Err(SeedError::AlreadyExists { path });
		}
		Err(e) => return Err(SeedError::io(path, e)),
	};

	file.write_all(SEED_TEMPLATE.as_bytes())
		.map_err(|e| SeedError::io(&path, e))?;
	debug!(path = %path.display(), "created seed template");
	Ok(path)
}

/// Creates one template per table, stopping at the first failure.
pub fn create_seed_templates(dir: &Path, tables: &[String]) -> Result<Vec<PathBuf>, SeedError> {
	if tables.is_empty() {
		return Err(SeedError::validation("table name argument is required"));
	}

	tables
		.iter()
		.map(|table| create_seed_template(dir, table))
		.collect()
}
