//! Session service
//!
//! Issues sessions and resolves a session token to its owning user. Expiry is
//! evaluated lazily: a token read at or after its `expires_at` is deleted on
//! the spot and rejected. There is no background sweeper and no renewal.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Default session lifetime
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum SessionError {
    /// No session with this token
    #[error("Invalid session")]
    InvalidSession,

    #[error("Session expired")]
    SessionExpired,

    /// The session exists but its user does not
    #[error("Session user not found")]
    InvalidUser,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct SessionService {
    session_repo: Arc<dyn SessionRepository>,
    user_repo: Arc<dyn UserRepository>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(
        session_repo: Arc<dyn SessionRepository>,
        user_repo: Arc<dyn UserRepository>,
        ttl: Duration,
    ) -> Self {
        Self {
            session_repo,
            user_repo,
            ttl,
        }
    }

    /// Issue a session for `user_id` starting now.
    pub async fn create(&self, user_id: i64) -> Result<Session, SessionError> {
        self.create_at(user_id, Utc::now()).await
    }

    pub async fn create_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let session = Session::issue(user_id, now, self.ttl)?;
        let session = self.session_repo.create(&session).await?;
        tracing::debug!("Issued session for user {}", user_id);
        Ok(session)
    }

    /// Resolve `token` to the user that owns it.
    pub async fn resolve(&self, token: &str) -> Result<User, SessionError> {
        self.resolve_at(token, Utc::now()).await
    }

    pub async fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Result<User, SessionError> {
        let session = self
            .session_repo
            .get_by_id(token)
            .await?
            .ok_or(SessionError::InvalidSession)?;

        if session.is_expired_at(now) {
            self.session_repo.delete(&session.id).await?;
            tracing::debug!("Removed expired session of user {}", session.user_id);
            return Err(SessionError::SessionExpired);
        }

        self.user_repo
            .get_by_id(session.user_id)
            .await?
            .ok_or(SessionError::InvalidUser)
    }

    /// Drop a session. Unknown tokens are ignored.
    pub async fn remove(&self, token: &str) -> Result<(), SessionError> {
        self.session_repo.delete(token).await?;
        Ok(())
    }
}
