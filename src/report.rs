use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
	pub started_at: String,
	pub finished_at: String,
	pub duration_ms: u128,
	pub transactional: bool,
	pub tables: Vec<TableReport>,
}

impl SeedReport {
	pub fn count(&self, outcome: Outcome) -> usize {
		self.tables.iter().filter(|t| t.outcome == outcome).count()
	}

	/// Tables that were skipped or had a statement fail.
	pub fn failed_tables(&self) -> impl Iterator<Item = &TableReport> {
		self.tables
			.iter()
			.filter(|t| matches!(t.outcome, Outcome::Skipped | Outcome::Failed))
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
	pub file: String,
	pub table: String,
	pub outcome: Outcome,
	pub sequence_reset: bool,
	pub issues: Vec<StatementIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
	/// Table was empty; fixture rows inserted.
	Inserted,
	/// Existing rows deleted, fixture rows inserted.
	Replaced,
	/// Table could not be queried, nothing was run against it.
	Skipped,
	Failed,
}

impl fmt::Display for Outcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Outcome::Inserted => "inserted",
			Outcome::Replaced => "replaced",
			Outcome::Skipped => "skipped",
			Outcome::Failed => "failed",
		};
		f.write_str(s)
	}
}

/// A statement failure that was logged and tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementIssue {
	pub step: Step,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
	ExistenceProbe,
	SequenceReset,
	Begin,
	Delete,
	Insert,
	Commit,
	Rollback,
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Step::ExistenceProbe => "existence probe",
			Step::SequenceReset => "sequence reset",
			Step::Begin => "begin",
			Step::Delete => "delete",
			Step::Insert => "insert",
			Step::Commit => "commit",
			Step::Rollback => "rollback",
		};
		f.write_str(s)
	}
}

pub fn render_human_report(report: &SeedReport) -> String {
	let mut out = String::from("Seed run summary:\n");
	out.push_str(&format!(
		"  tables: {} total, {} inserted, {} replaced, {} skipped, {} failed\n",
		report.tables.len(),
		report.count(Outcome::Inserted),
		report.count(Outcome::Replaced),
		report.count(Outcome::Skipped),
		report.count(Outcome::Failed),
	));
	out.push_str(&format!("  duration_ms: {}\n", report.duration_ms));

	for table in report.failed_tables() {
		out.push_str(&format!(
			"  {} {} ({})\n",
			table.outcome.to_string().to_uppercase(),
			table.table,
			table.file
		));
		for issue in &table.issues {
			out.push_str(&format!("    - {}: {}\n", issue.step, issue.message));
		}
	}
	out
}

pub fn print_human_report(report: &SeedReport) {
	print!("{}", render_human_report(report));
}

/// Writes the report as pretty JSON, creating missing parent directories.
pub fn write_json_report(path: &Path, report: &SeedReport) -> Result<()> {
	let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
	if let Some(dir) = dir {
		fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
	}

	let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
	let mut out = BufWriter::new(file);
	serde_json::to_writer_pretty(&mut out, report)
		.with_context(|| format!("encoding seed report into {}", path.display()))?;
	writeln!(out)?;
	out.flush()
		.with_context(|| format!("flushing {}", path.display()))?;
	Ok(())
}
