use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Catalog entry for the background-replacement operation. Names are
/// unique; the catalog is read-only once an entry exists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub id: Uuid,
    pub url: String,
    pub background_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait BackgroundStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Background>>;
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Background>>;
    async fn create(&self, url: &str, name: &str) -> anyhow::Result<Background>;
}

pub struct PgBackgroundStore {
    pool: PgPool,
}

impl PgBackgroundStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BackgroundStore for PgBackgroundStore {
    async fn list(&self) -> anyhow::Result<Vec<Background>> {
        let rows = sqlx::query_as::<_, Background>(
            "SELECT id, url, background_name, created_at FROM backgrounds \
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Background>> {
        let row = sqlx::query_as::<_, Background>(
            "SELECT id, url, background_name, created_at FROM backgrounds \
             WHERE background_name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, url: &str, name: &str) -> anyhow::Result<Background> {
        let row = sqlx::query_as::<_, Background>(
            "INSERT INTO backgrounds (url, background_name) VALUES ($1, $2) \
             RETURNING id, url, background_name, created_at",
        )
        .bind(url)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

#[derive(Default)]
pub struct MemBackgroundStore {
    backgrounds: RwLock<Vec<Background>>,
}

#[async_trait]
impl BackgroundStore for MemBackgroundStore {
    async fn list(&self) -> anyhow::Result<Vec<Background>> {
        Ok(self.backgrounds.read().unwrap().clone())
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Background>> {
        Ok(self
            .backgrounds
            .read()
            .unwrap()
            .iter()
            .find(|b| b.background_name == name)
            .cloned())
    }

    async fn create(&self, url: &str, name: &str) -> anyhow::Result<Background> {
        let mut backgrounds = self.backgrounds.write().unwrap();
        anyhow::ensure!(
            !backgrounds.iter().any(|b| b.background_name == name),
            "duplicate key value violates unique constraint \"backgrounds_name_key\""
        );
        let background = Background {
            id: Uuid::new_v4(),
            url: url.into(),
            background_name: name.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        backgrounds.push(background.clone());
        Ok(background)
    }
}
