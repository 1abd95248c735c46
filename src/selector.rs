use std::{
	fs, io,
	path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::error::SeedError;

pub const SEED_PREFIX: &str = "seed_";
pub const SEED_SUFFIX: &str = "_table.sql";

/// One fixture source on disk and the table it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFile {
	pub name: String,
	pub path: PathBuf,
	pub table: String,
}

impl SeedFile {
	pub fn from_path(path: PathBuf) -> Result<Self, SeedError> {
		let name = path
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.ok_or_else(|| SeedError::validation(format!("not a seed file: {}", path.display())))?;
		let table = table_name(&name)?.to_owned();

		Ok(Self { name, path, table })
	}
}

pub fn seed_file_name(table: &str) -> String {
	format!("{SEED_PREFIX}{table}{SEED_SUFFIX}")
}

/// `seed_orders_table.sql` -> `orders`
pub fn table_name(file_name: &str) -> Result<&str, SeedError> {
	let table = file_name
		.strip_prefix(SEED_PREFIX)
		.and_then(|rest| rest.strip_suffix(SEED_SUFFIX))
		.ok_or_else(|| {
			SeedError::validation(format!(
				"seed file name {file_name:?} does not match {SEED_PREFIX}<table>{SEED_SUFFIX}"
			))
		})?;

	if table.is_empty() {
		return Err(SeedError::validation(format!(
			"seed file name {file_name:?} has an empty table name"
		)));
	}

	Ok(table)
}

/// Lists the entries of `dir` to seed, in file name order.
///
/// With no `requested` names every entry is returned, subdirectories
/// included. Otherwise only entries whose name matches one of `requested`;
/// names that match nothing are dropped silently.
pub fn select_files(requested: &[String], dir: &Path) -> Result<Vec<PathBuf>, SeedError> {
	let meta = fs::metadata(dir).map_err(|e| SeedError::io(dir, e))?;
	if !meta.is_dir() {
		return Err(SeedError::io(
			dir,
			io::Error::new(io::ErrorKind::NotADirectory, "seed path is not a directory"),
		));
	}

	let mut files = Vec::new();
	for entry in WalkDir::new(dir)
		.min_depth(1)
		.max_depth(1)
		.sort_by_file_name()
	{
		let entry = entry.map_err(|e| SeedError::io(dir, io::Error::from(e)))?;
		let name = entry.file_name().to_string_lossy();
		if requested.is_empty() || requested.iter().any(|r| r.as_str() == name.as_ref()) {
			files.push(entry.into_path());
		}
	}

	Ok(files)
}
