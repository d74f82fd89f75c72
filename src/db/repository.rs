use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use super::migrations::run_migrations;
use crate::error::AppError;

pub type Tx = Transaction<'static, Sqlite>;

/// Storage handle threaded through every component.
#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` and applies the schema.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        debug!(url, "🗄️ Opening database");

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Starts a write transaction holding SQLite's writer lock from the
    /// first statement. Other writers wait up to the busy timeout.
    pub async fn begin(&self) -> Result<Tx, AppError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Private in-memory database with the schema applied.
    ///
    /// A single connection that never expires, otherwise SQLite would hand
    /// every connection its own empty database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Database file under the system temp directory, opened like
    /// [`Repository::connect`] opens the production one.
    #[cfg(test)]
    pub async fn temp_file() -> Result<Self, AppError> {
        use std::sync::atomic::{AtomicU32, Ordering};

        static NEXT: AtomicU32 = AtomicU32::new(0);

        let path = std::env::temp_dir().join(format!(
            "deckledger-test-{}-{}-{}.db",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed),
            chrono::Utc::now().timestamp_micros(),
        ));
        Self::connect(&format!("sqlite://{}", path.display())).await
    }
}

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_transactions_wait_for_each_other() {
        let repo = Repository::temp_file().await.unwrap();
        sqlx::query("CREATE TABLE counter (n INTEGER NOT NULL)")
            .execute(repo.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO counter (n) VALUES (0)")
            .execute(repo.pool())
            .await
            .unwrap();

        // Read then write inside each transaction, from several connections.
        let writers: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    for _ in 0..10 {
                        let mut tx = repo.begin().await?;
                        let (n,): (i64,) = sqlx::query_as("SELECT n FROM counter")
                            .fetch_one(&mut *tx)
                            .await?;
                        sqlx::query("UPDATE counter SET n = ?")
                            .bind(n + 1)
                            .execute(&mut *tx)
                            .await?;
                        tx.commit().await?;
                    }
                    Ok::<_, AppError>(())
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let (n,): (i64,) = sqlx::query_as("SELECT n FROM counter")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(n, 80);
    }
}
