use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as persisted. The hash and reset-token fields are
/// server-internal; clients only ever see `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub reset_token: Option<String>,
    pub reset_token_expire: Option<OffsetDateTime>,
    pub profile_picture: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    #[cfg(test)]
    pub fn new_for_tests(email: &str, password_hash: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: "user".into(),
            status: "active".into(),
            reset_token: None,
            reset_token_expire: None,
            profile_picture: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Keyed record store for users. Backed by Postgres in production and by an
/// in-memory vector in tests (`AppState::fake`).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<User>>;
    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User>;
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expire: OffsetDateTime,
    ) -> anyhow::Result<()>;
    /// Replaces the password hash and clears any outstanding reset token.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
    async fn update_profile_picture(&self, id: Uuid, path: &str) -> anyhow::Result<()>;
}

const USER_COLUMNS: &str = "id, email, password_hash, role, status, reset_token, \
                            reset_token_expire, profile_picture, created_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expire: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET reset_token = $1, reset_token_expire = $2 WHERE id = $3")
            .bind(token)
            .bind(expire)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET password_hash = $1, reset_token = NULL, \
             reset_token_expire = NULL WHERE id = $2",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_profile_picture(&self, id: Uuid, path: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET profile_picture = $1 WHERE id = $2")
            .bind(path)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let mut users = self.users.write().unwrap();
        anyhow::ensure!(
            !users.iter().any(|u| u.email == email),
            "duplicate key value violates unique constraint \"users_email_key\""
        );
        let user = User {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: "user".into(),
            status: "active".into(),
            reset_token: None,
            reset_token_expire: None,
            profile_picture: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expire: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.reset_token = Some(token.into());
            user.reset_token_expire = Some(expire);
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.into();
            user.reset_token = None;
            user.reset_token_expire = None;
        }
        Ok(())
    }

    async fn update_profile_picture(&self, id: Uuid, path: &str) -> anyhow::Result<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.profile_picture = Some(path.into());
        }
        Ok(())
    }
}
