//! SQLite database sink
//!
//! Each record becomes one row of the `logs` table. The sink owns a
//! current-thread tokio runtime and drives sqlx with `block_on`, so it can be
//! called from ordinary threads such as the async pipeline consumer.

use super::file::create_parent_dir;
use crate::core::{LogRecord, LoggerError, Result, Sink};
use chrono::Local;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tokio::runtime::{Builder, Runtime};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    log_time TEXT NOT NULL,
    line_number INTEGER NOT NULL,
    thread_id TEXT NOT NULL,
    log_level TEXT NOT NULL,
    source_file TEXT NOT NULL,
    logger_name TEXT NOT NULL,
    message TEXT NOT NULL
)";

const INSERT_ROW: &str = "INSERT INTO logs
    (log_time, line_number, thread_id, log_level, source_file, logger_name, message)
    VALUES (?, ?, ?, ?, ?, ?, ?)";

/// Level stored for text that arrived without a structured record
pub const RAW_LEVEL: &str = "RAW";

const ROW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct DatabaseSink {
    path: PathBuf,
    runtime: Runtime,
    pool: SqlitePool,
}

impl DatabaseSink {
    /// Open (or create) the database at `path` and ensure the `logs` table exists
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        create_parent_dir(&path)?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LoggerError::io_operation("starting database runtime", path.display().to_string(), e))?;

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = runtime.block_on(
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options),
        )?;
        runtime.block_on(sqlx::query(CREATE_TABLE).execute(&pool))?;

        Ok(Self { path, runtime, pool })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows in the `logs` table
    pub fn count_rows(&self) -> Result<i64> {
        let count = self.runtime.block_on(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM logs").fetch_one(&self.pool),
        )?;
        Ok(count)
    }

    /// Stored `(level, message)` pairs in insertion order
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let rows = self.runtime.block_on(
            sqlx::query_as::<_, (String, String)>(
                "SELECT log_level, message FROM logs ORDER BY id",
            )
            .fetch_all(&self.pool),
        )?;
        Ok(rows)
    }
}

impl Sink for DatabaseSink {
    /// Stores each non-empty line as a `RAW` row
    fn log(&mut self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data);
        let now = Local::now().format(ROW_TIME_FORMAT).to_string();
        let pool = &self.pool;

        self.runtime.block_on(async {
            let mut tx = pool.begin().await?;
            for line in text.lines().filter(|line| !line.is_empty()) {
                sqlx::query(INSERT_ROW)
                    .bind(&now)
                    .bind(0_i64)
                    .bind("")
                    .bind(RAW_LEVEL)
                    .bind("")
                    .bind("")
                    .bind(line)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await
        })?;
        Ok(())
    }

    fn log_record(&mut self, record: &LogRecord, _rendered: &[u8]) -> Result<()> {
        let log_time = record.local_time().format(ROW_TIME_FORMAT).to_string();
        self.runtime.block_on(
            sqlx::query(INSERT_ROW)
                .bind(log_time)
                .bind(i64::from(record.line()))
                .bind(record.thread_id())
                .bind(record.level().to_str())
                .bind(record.file())
                .bind(record.logger())
                .bind(record.message())
                .execute(&self.pool),
        )?;
        Ok(())
    }

    fn name(&self) -> &str {
        "database"
    }
}

impl Drop for DatabaseSink {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}
