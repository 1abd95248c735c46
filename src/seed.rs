use std::{
	fs, io,
	path::{Path, PathBuf},
	time::Instant,
};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, warn};

use crate::core::SeedConnection;
use crate::error::SeedError;
use crate::parser::parse;
use crate::report::{Outcome, SeedReport, StatementIssue, Step, TableReport};
use crate::selector::{SeedFile, select_files};

/// Resolves the seed files to run, failing before any database traffic when
/// the directory is unreadable, nothing matches, or a name is malformed.
pub fn plan(requested: &[String], seed_dir: &Path) -> Result<Vec<SeedFile>, SeedError> {
	let paths = select_files(requested, seed_dir)?;
	if paths.is_empty() {
		return Err(SeedError::validation(format!(
			"no seed files found in {}",
			seed_dir.display()
		)));
	}

	paths.into_iter().map(SeedFile::from_path).collect()
}

pub struct SeedSession<'c, C> {
	conn: &'c mut C,
	files: Vec<SeedFile>,
	seed_dir: PathBuf,
	transactional: bool,
}

impl<'c, C: SeedConnection> SeedSession<'c, C> {
	pub fn new(conn: &'c mut C, seed_dir: PathBuf, files: Vec<SeedFile>) -> Self {
		Self {
			conn,
			files,
			seed_dir,
			transactional: false,
		}
	}

	/// Wrap each table's delete + insert in its own transaction.
	pub fn transactional(mut self, on: bool) -> Self {
		self.transactional = on;
		self
	}

	/// Seeds every file in order.
	///
	/// Only an unreadable seed file or a failed emptiness probe stops the
	/// run. Every other statement failure is logged, recorded on the table's
	/// report, and the run moves on to the next file.
	pub async fn run(self) -> Result<SeedReport, SeedError> {
		let started_at = OffsetDateTime::now_utc();
		let run_start = Instant::now();
		info!(
			dir = %self.seed_dir.display(),
			files = self.files.len(),
			transactional = self.transactional,
			"seeding"
		);

		let Self {
			conn,
			files,
			transactional,
			..
		} = self;

		let mut tables = Vec::with_capacity(files.len());
		for file in files {
			let report = seed_file(conn, &file, transactional).await?;
			info!(table = %report.table, outcome = %report.outcome, "seeded {}", report.file);
			tables.push(report);
		}

		let finished_at = OffsetDateTime::now_utc();
		Ok(SeedReport {
			started_at: format_ts(started_at),
			finished_at: format_ts(finished_at),
			duration_ms: run_start.elapsed().as_millis(),
			transactional,
			tables,
		})
	}
}

fn format_ts(ts: OffsetDateTime) -> String {
	ts.format(&Rfc3339).unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

struct TableRun<'f, C> {
	conn: &'f mut C,
	file: &'f SeedFile,
	issues: Vec<StatementIssue>,
}

impl<C: SeedConnection> TableRun<'_, C> {
	/// Runs one statement, recording a failure instead of returning it.
	async fn attempt(&mut self, step: Step, sql: &str) -> bool {
		debug!(table = %self.file.table, %step, sql, "executing");
		match self.conn.execute(sql).await {
			Ok(_) => true,
			Err(err) => {
				warn!(table = %self.file.table, %step, "{err}");
				self.issues.push(StatementIssue {
					step,
					message: err.to_string(),
				});
				false
			}
		}
	}

	fn finish(self, outcome: Outcome, sequence_reset: bool) -> TableReport {
		TableReport {
			file: self.file.name.clone(),
			table: self.file.table.clone(),
			outcome,
			sequence_reset,
			issues: self.issues,
		}
	}
}

async fn seed_file<C: SeedConnection>(
	conn: &mut C,
	file: &SeedFile,
	transactional: bool,
) -> Result<TableReport, SeedError> {
	let raw = fs::read_to_string(&file.path).map_err(|e| read_error(&file.path, e))?;
	let insert = parse(&raw);
	let table = file.table.as_str();

	let mut run = TableRun {
		conn,
		file,
		issues: Vec::new(),
	};

	// Missing or unqueryable table: skip it, keep going.
	if !run
		.attempt(Step::ExistenceProbe, &format!("SELECT * FROM {table};"))
		.await
	{
		return Ok(run.finish(Outcome::Skipped, false));
	}

	let existing = run
		.conn
		.execute(&format!("SELECT * FROM {table} LIMIT 1;"))
		.await
		.map_err(|source| SeedError::Probe {
			table: table.to_owned(),
			source,
		})?;

	// Not every table has a serial id.
	let sequence_reset = run
		.attempt(
			Step::SequenceReset,
			&format!("ALTER SEQUENCE {table}_id_seq RESTART WITH 1"),
		)
		.await;

	let empty = existing == 0;
	let applied = match (empty, transactional) {
		(true, false) => run.attempt(Step::Insert, &insert).await,
		(false, false) => {
			let deleted = run.attempt(Step::Delete, &format!("DELETE FROM {table};")).await;
			let inserted = run.attempt(Step::Insert, &insert).await;
			deleted && inserted
		}
		(_, true) => replace_in_transaction(&mut run, empty, &insert).await,
	};

	let outcome = match (applied, empty) {
		(false, _) => Outcome::Failed,
		(true, true) => Outcome::Inserted,
		(true, false) => Outcome::Replaced,
	};
	Ok(run.finish(outcome, sequence_reset))
}

/// Seed files are read as UTF-8 text; other encodings abort the run.
fn read_error(path: &Path, err: io::Error) -> SeedError {
	if err.kind() == io::ErrorKind::InvalidData {
		let err = io::Error::new(io::ErrorKind::InvalidData, "seed file is not valid UTF-8 text");
		return SeedError::io(path, err);
	}
	SeedError::io(path, err)
}

/// Either the whole replace lands or the table keeps its previous rows.
async fn replace_in_transaction<C: SeedConnection>(
	run: &mut TableRun<'_, C>,
	empty: bool,
	insert: &str,
) -> bool {
	if !run.attempt(Step::Begin, "BEGIN").await {
		return false;
	}

	let table = run.file.table.clone();
	let applied = (empty || run.attempt(Step::Delete, &format!("DELETE FROM {table};")).await)
		&& run.attempt(Step::Insert, insert).await;

	if applied {
		return run.attempt(Step::Commit, "COMMIT").await;
	}

	run.attempt(Step::Rollback, "ROLLBACK").await;
	false
}
