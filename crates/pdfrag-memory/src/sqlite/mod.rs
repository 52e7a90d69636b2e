mod records;

use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::MemoryError;

/// Database file created inside the store directory.
pub const STORE_FILE: &str = "store.sqlite";

/// Vector store persisted as a single `SQLite` database inside a directory.
#[derive(Debug, Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
    dir: PathBuf,
}

impl SqliteVectorStore {
    /// Open (or create) the store under `dir` and run migrations.
    ///
    /// The directory is created if missing. A single connection is used so
    /// that writes from one ingestion run are strictly ordered.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the database
    /// cannot be opened, or migrations fail.
    pub async fn open(dir: &Path) -> Result<Self, MemoryError> {
        tokio::fs::create_dir_all(dir).await?;

        let opts = SqliteConnectOptions::new()
            .filename(dir.join(STORE_FILE))
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("../../migrations").run(&pool).await?;

        tracing::debug!(dir = %dir.display(), "opened vector store");
        Ok(Self {
            pool,
            dir: dir.to_path_buf(),
        })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Close all connections. Pending WAL content is checkpointed by `SQLite`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
