//! Session repository
//!
//! Plain storage for session rows. Expiry is judged by the session service,
//! which deletes rows it finds expired.

use crate::db::{Backend, DynDatabasePool};
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete by token; deleting a missing token is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_session_sqlite(pool, session).await,
            Backend::Mysql(pool) => create_session_mysql(pool, session).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_session_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_session_mysql(pool, id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => delete_session_sqlite(pool, id).await,
            Backend::Mysql(pool) => delete_session_mysql(pool, id).await,
        }
    }
}

const INSERT_SESSION: &str =
    "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)";
const SELECT_SESSION: &str =
    "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?";
const DELETE_SESSION: &str = "DELETE FROM sessions WHERE id = ?";

// SQLite

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(INSERT_SESSION)
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(pool)
        .await
        .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(SELECT_SESSION)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get session")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn delete_session_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query(DELETE_SESSION)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

// MySQL

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(INSERT_SESSION)
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(pool)
        .await
        .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(SELECT_SESSION)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get session")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn delete_session_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query(DELETE_SESSION)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use chrono::{Duration, Utc};

    async fn setup_test_repo() -> (SqlxSessionRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new("shopper".to_string(), "hash".to_string(), UserRole::User))
            .await
            .expect("Failed to create user");

        (SqlxSessionRepository::new(pool), user.id)
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (repo, user_id) = setup_test_repo().await;
        let session = Session::issue(user_id, Utc::now(), Duration::hours(24)).unwrap();

        repo.create(&session).await.expect("Failed to create session");

        let fetched = repo.get_by_id(&session.id).await.unwrap().expect("Session should exist");
        assert_eq!(fetched.user_id, user_id);
        assert_eq!(fetched.expires_at, session.expires_at);
        assert_eq!(fetched.created_at, session.created_at);
    }

    #[tokio::test]
    async fn test_get_unknown_session() {
        let (repo, _) = setup_test_repo().await;
        assert!(repo.get_by_id("no-such-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (repo, user_id) = setup_test_repo().await;
        let session = Session::issue(user_id, Utc::now(), Duration::hours(1)).unwrap();
        repo.create(&session).await.unwrap();

        repo.delete(&session.id).await.unwrap();
        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());

        repo.delete(&session.id).await.expect("Second delete should succeed");
    }

    #[tokio::test]
    async fn test_session_for_unknown_user_rejected() {
        let (repo, _) = setup_test_repo().await;
        let session = Session::issue(9999, Utc::now(), Duration::hours(1)).unwrap();

        assert!(repo.create(&session).await.is_err());
    }

    #[tokio::test]
    async fn test_user_may_hold_many_sessions() {
        let (repo, user_id) = setup_test_repo().await;
        let now = Utc::now();
        let first = Session::issue(user_id, now, Duration::hours(1)).unwrap();
        let second = Session::issue(user_id, now, Duration::hours(1)).unwrap();

        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();

        assert!(repo.get_by_id(&first.id).await.unwrap().is_some());
        assert!(repo.get_by_id(&second.id).await.unwrap().is_some());
    }
}
