use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::info;

pub mod change_feed;
pub mod models;

use change_feed::ChangeFeed;

#[derive(Clone)]
pub struct DBService {
    pub pool: SqlitePool,
    pub changes: ChangeFeed,
}

impl DBService {
    /// Opens (creating if needed) the database at `database_url` and brings
    /// its schema up to date.
    pub async fn new(database_url: &str) -> Result<DBService, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(database_url, "database ready");

        Ok(DBService {
            pool,
            changes: ChangeFeed::default(),
        })
    }

    /// A private in-memory database. A single connection that never expires
    /// keeps the data alive for the life of the pool.
    pub async fn new_in_memory() -> Result<DBService, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(DBService {
            pool,
            changes: ChangeFeed::default(),
        })
    }
}
