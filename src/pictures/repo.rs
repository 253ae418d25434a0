use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Anonymous upload record. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Picture {
    pub id: Uuid,
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait PictureStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Picture>>;
    async fn create(&self, url: &str) -> anyhow::Result<Picture>;
}

pub struct PgPictureStore {
    pool: PgPool,
}

impl PgPictureStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PictureStore for PgPictureStore {
    async fn list(&self) -> anyhow::Result<Vec<Picture>> {
        let rows = sqlx::query_as::<_, Picture>(
            "SELECT id, url, created_at FROM pictures ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, url: &str) -> anyhow::Result<Picture> {
        let picture = sqlx::query_as::<_, Picture>(
            "INSERT INTO pictures (url) VALUES ($1) RETURNING id, url, created_at",
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(picture)
    }
}

#[derive(Default)]
pub struct MemPictureStore {
    pictures: RwLock<Vec<Picture>>,
}

#[async_trait]
impl PictureStore for MemPictureStore {
    async fn list(&self) -> anyhow::Result<Vec<Picture>> {
        Ok(self.pictures.read().unwrap().clone())
    }

    async fn create(&self, url: &str) -> anyhow::Result<Picture> {
        let picture = Picture {
            id: Uuid::new_v4(),
            url: url.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.pictures.write().unwrap().push(picture.clone());
        Ok(picture)
    }
}
