use std::{env, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::Connection;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod core;
mod error;
mod parser;
mod report;
mod scaffold;
mod seed;
mod selector;

use crate::config::{
	CONFIG_PATH, SeedCfg, SeedFlags, env_lookup, load_env, load_file_config, project_dir, seed_dir,
};
use crate::core::connect;
use crate::seed::{SeedSession, plan};

#[derive(Parser, Debug)]
#[command(
	version,
	about = "Seed your database with fixture data from SQL files",
	long_about = "Creates seed file templates and applies them to a PostgreSQL database. \
	              Each seed file replaces the contents of the table it is named after."
)]
pub struct Cli {
	/// Increase output
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Create seed_<table>_table.sql templates in a directory
	Create {
		/// Directory relative to the working directory, e.g. db/seeds
		#[arg(short, long)]
		dir: String,

		tables: Vec<String>,
	},
	/// Insert data from seed files into the database
	Seed {
		/// Database url, falls back to DATABASE_URL
		#[arg(long, visible_alias = "db")]
		database: Option<String>,

		/// Directory that holds the seed files, relative to the working directory
		#[arg(short, long)]
		path: Option<String>,

		/// Replace each table's rows inside a transaction
		#[arg(long)]
		transactional: bool,

		/// List the files that would be seeded without connecting
		#[arg(long)]
		dry_run: bool,

		/// Also write the run report as JSON
		#[arg(long)]
		json_out: Option<PathBuf>,

		/// Seed only these files (default: every file in the directory)
		files: Vec<String>,
	},
}

fn init_logging(verbose: bool) {
	let default = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
		.init();
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Cli::parse();
	init_logging(args.verbose);

	let cwd = env::current_dir().context("resolving working directory")?;

	match args.command {
		Commands::Create { dir, tables } => {
			let dir = project_dir(&cwd, &dir)?;
			for path in scaffold::create_seed_templates(&dir, &tables)? {
				println!("created {}", path.display());
			}
		}
		Commands::Seed {
			database,
			path,
			transactional,
			dry_run,
			json_out,
			files,
		} => {
			let start = Instant::now();
			let dotenv = load_env();
			let file_cfg = load_file_config(&cwd.join(CONFIG_PATH))?;
			let flags = SeedFlags {
				database,
				path,
				transactional,
			};
			let cfg = SeedCfg::resolve(flags, file_cfg, env_lookup(&dotenv))?;

			let dir = seed_dir(&cwd, cfg.path());
			let planned = plan(&files, &dir)?;

			if dry_run {
				for file in &planned {
					println!("DRY RUN: would seed {} from {}", file.table, file.name);
				}
				return Ok(());
			}

			let mut conn = connect(cfg.database_url()?).await?;
			let report = SeedSession::new(&mut conn, dir, planned)
				.transactional(cfg.transactional())
				.run()
				.await;
			conn.close().await.ok();
			let report = report?;

			report::print_human_report(&report);
			if let Some(path) = &json_out {
				report::write_json_report(path, &report)?;
			}
			info!("seeding time: {:?}", start.elapsed());
		}
	}

	Ok(())
}
