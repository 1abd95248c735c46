use std::{
	fs,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rust_dotenv::dotenv::DotEnv;
use serde::Deserialize;

use crate::error::SeedError;

pub const CONFIG_PATH: &str = "seeder.toml";

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_SEED_PATH: &str = "SEEDER_PATH";
pub const ENV_TRANSACTIONAL: &str = "SEEDER_TRANSACTIONAL";

/// Optional `seeder.toml` in the working directory.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileCfg {
	pub database_url: Option<String>,
	pub path: Option<String>,
	pub transactional: Option<bool>,
}

pub fn load_file_config(path: &Path) -> Result<FileCfg> {
	if !path.exists() {
		return Ok(FileCfg::default());
	}

	let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	let cfg: FileCfg =
		toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
	Ok(cfg)
}

/// Loads `.env` from the working directory if present.
pub fn load_env() -> DotEnv {
	DotEnv::new("")
}

pub fn env_lookup(env: &DotEnv) -> impl Fn(&str) -> Option<String> + '_ {
	|key: &str| {
		env.get_var(key.to_string())
			.or_else(|| std::env::var(key).ok())
			.filter(|v| !v.is_empty())
	}
}

/// Values given on the command line for `seed`.
#[derive(Debug, Clone, Default)]
pub struct SeedFlags {
	pub database: Option<String>,
	pub path: Option<String>,
	pub transactional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedCfg {
	database_url: Option<String>,
	path: String,
	transactional: bool,
}

impl SeedCfg {
	/// Flag, then environment, then `seeder.toml`. The database url is only
	/// checked when it is asked for, so a dry run needs none.
	pub fn resolve(
		flags: SeedFlags,
		file: FileCfg,
		env: impl Fn(&str) -> Option<String>,
	) -> Result<Self, SeedError> {
		let database_url = flags
			.database
			.or_else(|| env(ENV_DATABASE_URL))
			.or(file.database_url);

		let path = flags
			.path
			.or_else(|| env(ENV_SEED_PATH))
			.or(file.path)
			.ok_or_else(|| {
				SeedError::validation(format!(
					"seed directory is required (--path, {ENV_SEED_PATH} or {CONFIG_PATH})"
				))
			})?;

		let transactional = if flags.transactional {
			true
		} else if let Some(raw) = env(ENV_TRANSACTIONAL) {
			parse_bool(&raw).ok_or_else(|| {
				SeedError::validation(format!("{ENV_TRANSACTIONAL} must be true or false, got {raw:?}"))
			})?
		} else {
			file.transactional.unwrap_or(false)
		};

		Ok(Self {
			database_url,
			path,
			transactional,
		})
	}

	pub fn database_url(&self) -> Result<&str, SeedError> {
		self.database_url.as_deref().ok_or_else(|| {
			SeedError::validation(format!(
				"database url is required (--database, {ENV_DATABASE_URL} or {CONFIG_PATH})"
			))
		})
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn transactional(&self) -> bool {
		self.transactional
	}
}

fn parse_bool(raw: &str) -> Option<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

/// Seed files live under `<cwd>/<path>`, even when `path` starts with `/`.
pub fn seed_dir(cwd: &Path, raw: &str) -> PathBuf {
	cwd.join(raw.trim_start_matches('/'))
}

/// Joins a user-supplied relative directory onto the working directory.
pub fn project_dir(cwd: &Path, raw: &str) -> Result<PathBuf, SeedError> {
	if raw.is_empty() {
		return Err(SeedError::validation("directory's path is empty"));
	}
	if Path::new(raw).is_absolute() {
		return Err(SeedError::validation(format!(
			"directory's path is invalid: {raw} must be relative to the project"
		)));
	}
	Ok(cwd.join(raw))
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key: &str| map.get(key).cloned()
	}

	fn file_cfg() -> FileCfg {
		FileCfg {
			database_url: Some("postgres://file".into()),
			path: Some("file/seeds".into()),
			transactional: Some(true),
		}
	}

	#[test]
	fn flags_win_over_env_and_file() {
		let flags = SeedFlags {
			database: Some("postgres://flag".into()),
			path: Some("flag/seeds".into()),
			transactional: false,
		};
		let env = env_of(&[(ENV_DATABASE_URL, "postgres://env"), (ENV_SEED_PATH, "env/seeds")]);

		let cfg = SeedCfg::resolve(flags, file_cfg(), env).unwrap();

		assert_eq!(cfg.database_url().unwrap(), "postgres://flag");
		assert_eq!(cfg.path(), "flag/seeds");
		assert!(cfg.transactional());
	}

	#[test]
	fn env_wins_over_file() {
		let env = env_of(&[
			(ENV_DATABASE_URL, "postgres://env"),
			(ENV_TRANSACTIONAL, "false"),
		]);

		let cfg = SeedCfg::resolve(SeedFlags::default(), file_cfg(), env).unwrap();

		assert_eq!(cfg.database_url().unwrap(), "postgres://env");
		assert_eq!(cfg.path(), "file/seeds");
		assert!(!cfg.transactional());
	}

	#[test]
	fn missing_database_url_only_fails_when_needed() {
		let flags = SeedFlags {
			path: Some("db/seeds".into()),
			..SeedFlags::default()
		};

		let cfg = SeedCfg::resolve(flags, FileCfg::default(), env_of(&[])).unwrap();

		assert_eq!(cfg.path(), "db/seeds");
		assert!(matches!(cfg.database_url(), Err(SeedError::Validation(_))));
	}

	#[test]
	fn missing_seed_path_is_validation_error() {
		let flags = SeedFlags {
			database: Some("postgres://flag".into()),
			..SeedFlags::default()
		};
		let err = SeedCfg::resolve(flags, FileCfg::default(), env_of(&[])).unwrap_err();
		assert!(matches!(err, SeedError::Validation(_)));
	}

	#[test]
	fn seed_dir_stays_under_working_directory() {
		let cwd = Path::new("/work");
		assert_eq!(seed_dir(cwd, "db/seeds"), Path::new("/work/db/seeds"));
		assert_eq!(seed_dir(cwd, "/fixtures"), Path::new("/work/fixtures"));
		assert_eq!(seed_dir(cwd, "//tmp/wd/fixtures"), Path::new("/work/tmp/wd/fixtures"));
	}

	#[test]
	fn garbage_transactional_env_is_rejected() {
		let env = env_of(&[(ENV_TRANSACTIONAL, "maybe")]);
		let err = SeedCfg::resolve(SeedFlags::default(), file_cfg(), env).unwrap_err();
		assert!(err.to_string().contains(ENV_TRANSACTIONAL));
	}

	#[test]
	fn project_dir_rejects_absolute_paths() {
		let cwd = Path::new("/work");
		assert!(matches!(project_dir(cwd, "/etc/seeds"), Err(SeedError::Validation(_))));
		assert!(matches!(project_dir(cwd, ""), Err(SeedError::Validation(_))));
		assert_eq!(project_dir(cwd, "db/seeds").unwrap(), Path::new("/work/db/seeds"));
	}

	#[test]
	fn file_config_is_optional_and_strict() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(CONFIG_PATH);
		assert_eq!(load_file_config(&path).unwrap(), FileCfg::default());

		fs::write(&path, "database_url = \"postgres://x\"\npath = \"db/seeds\"\n").unwrap();
		let cfg = load_file_config(&path).unwrap();
		assert_eq!(cfg.path.as_deref(), Some("db/seeds"));
		assert_eq!(cfg.transactional, None);

		fs::write(&path, "databse_url = \"typo\"\n").unwrap();
		assert!(load_file_config(&path).is_err());
	}
}
