use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A processed image a user promoted into permanent storage. Belongs to
/// exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPicture {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait UserPictureStore: Send + Sync {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<UserPicture>>;
    /// Inserts unconditionally: promoting the same url twice creates two
    /// records.
    async fn create(&self, user_id: Uuid, url: &str) -> anyhow::Result<UserPicture>;
}

pub struct PgUserPictureStore {
    pool: PgPool,
}

impl PgUserPictureStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserPictureStore for PgUserPictureStore {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<UserPicture>> {
        let rows = sqlx::query_as::<_, UserPicture>(
            "SELECT id, user_id, url, created_at FROM user_pictures \
             WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, user_id: Uuid, url: &str) -> anyhow::Result<UserPicture> {
        let row = sqlx::query_as::<_, UserPicture>(
            "INSERT INTO user_pictures (user_id, url) VALUES ($1, $2) \
             RETURNING id, user_id, url, created_at",
        )
        .bind(user_id)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

#[derive(Default)]
pub struct MemUserPictureStore {
    pictures: RwLock<Vec<UserPicture>>,
}

#[async_trait]
impl UserPictureStore for MemUserPictureStore {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<UserPicture>> {
        Ok(self
            .pictures
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, user_id: Uuid, url: &str) -> anyhow::Result<UserPicture> {
        let picture = UserPicture {
            id: Uuid::new_v4(),
            user_id,
            url: url.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.pictures.write().unwrap().push(picture.clone());
        Ok(picture)
    }
}
