use sqlx::{Connection, PgConnection};

use crate::error::SeedError;

/// The single database handle a seed run sends its statements through.
pub trait SeedConnection {
	/// Runs `sql` (possibly several statements) and returns the affected-row
	/// count reported by the server. Result rows are discarded.
	async fn execute(&mut self, sql: &str) -> Result<u64, sqlx::Error>;
}

impl SeedConnection for PgConnection {
	async fn execute(&mut self, sql: &str) -> Result<u64, sqlx::Error> {
		let done = sqlx::raw_sql(sql).execute(&mut *self).await?;
		Ok(done.rows_affected())
	}
}

pub async fn connect(url: &str) -> Result<PgConnection, SeedError> {
	PgConnection::connect(url).await.map_err(SeedError::Connect)
}
