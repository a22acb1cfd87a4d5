//! SQLite persistence for channels seen during downloads and lookups.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub channel_title: Option<String>,
    pub thumbnail: Option<String>,
    pub saved_at: String,
    pub last_used_at: String,
}

pub struct ChannelStore {
    pool: Pool<Sqlite>,
}

impl ChannelStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            debug!("Creating database at: {}", database_url);
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        info!("Running database migrations");
        create_tables(&pool).await?;

        Ok(Self { pool })
    }

    /// Insert the channel or refresh its title/thumbnail and bump
    /// `last_used_at`. Existing non-null values win over incoming nulls.
    pub async fn upsert_channel(
        &self,
        channel_id: &str,
        title: Option<&str>,
        thumbnail: Option<&str>,
    ) -> Result<()> {
        if channel_id.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO channels (channel_id, channel_title, thumbnail, saved_at, last_used_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(channel_id) DO UPDATE SET
                channel_title = COALESCE(excluded.channel_title, channel_title),
                thumbnail = COALESCE(excluded.thumbnail, thumbnail),
                last_used_at = excluded.last_used_at
            "#,
        )
        .bind(channel_id)
        .bind(title)
        .bind(thumbnail)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Saved channel record: {}", channel_id);
        Ok(())
    }

    /// All saved channels, most recently used first.
    pub async fn list_channels(&self) -> Result<Vec<ChannelRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT channel_id, channel_title, thumbnail, saved_at, last_used_at
            FROM channels
            ORDER BY last_used_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_into_channel_record).collect()
    }
}

fn row_into_channel_record(row: SqliteRow) -> Result<ChannelRecord, sqlx::Error> {
    Ok(ChannelRecord {
        channel_id: row.try_get("channel_id")?,
        channel_title: row.try_get("channel_title")?,
        thumbnail: row.try_get("thumbnail")?,
        saved_at: row.try_get("saved_at")?,
        last_used_at: row.try_get("last_used_at")?,
    })
}

async fn create_tables(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channels (
            channel_id TEXT PRIMARY KEY,
            channel_title TEXT,
            thumbnail TEXT,
            saved_at TEXT NOT NULL,
            last_used_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    debug!("Database tables created successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // A shared in-memory database would need a single pooled connection,
    // so tests use a throwaway file-backed database instead.
    async fn temp_store() -> (tempfile::TempDir, ChannelStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/channels.db", dir.path().display());
        let store = ChannelStore::connect(&url).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_upsert_and_list() {
        let (_dir, store) = temp_store().await;

        store
            .upsert_channel("UC123", Some("A Channel"), Some("https://img/1.jpg"))
            .await
            .unwrap();

        let channels = store.list_channels().await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel_id, "UC123");
        assert_eq!(channels[0].channel_title.as_deref(), Some("A Channel"));
    }

    #[tokio::test]
    async fn test_upsert_keeps_existing_title_on_null() {
        let (_dir, store) = temp_store().await;

        store
            .upsert_channel("UC123", Some("A Channel"), None)
            .await
            .unwrap();
        store.upsert_channel("UC123", None, None).await.unwrap();

        let channels = store.list_channels().await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel_title.as_deref(), Some("A Channel"));
    }

    #[tokio::test]
    async fn test_upsert_refreshes_last_used() {
        let (_dir, store) = temp_store().await;

        store.upsert_channel("UC1", Some("First"), None).await.unwrap();
        store.upsert_channel("UC2", Some("Second"), None).await.unwrap();
        store.upsert_channel("UC1", None, None).await.unwrap();

        let channels = store.list_channels().await.unwrap();
        assert_eq!(channels.len(), 2);
        // UC1 was touched last, so it sorts first
        assert_eq!(channels[0].channel_id, "UC1");
    }

    #[tokio::test]
    async fn test_empty_channel_id_is_ignored() {
        let (_dir, store) = temp_store().await;
        store.upsert_channel("", Some("x"), None).await.unwrap();
        assert!(store.list_channels().await.unwrap().is_empty());
    }
}
