//! User service
//!
//! Registration, login, logout and password change. This is the only place
//! that issues sessions for credentials.

use crate::db::is_unique_violation;
use crate::db::repositories::UserRepository;
use crate::models::{Session, User, UserRole};
use crate::services::password::{hash_password_blocking, verify_password_blocking};
use crate::services::session::{SessionError, SessionService};
use anyhow::Context;
use std::sync::Arc;
use thiserror::Error;

pub const MIN_USERNAME_LEN: usize = 4;
pub const MIN_PASSWORD_LEN: usize = 6;
/// Width of the `users.username` column
pub const MAX_USERNAME_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    /// Unknown username or wrong password; deliberately not told apart
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The current password given for a password change did not match
    #[error("Wrong password")]
    WrongPassword,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordInput {
    pub fn new(old_password: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            old_password: old_password.into(),
            new_password: new_password.into(),
        }
    }
}

/// Length rule shared by registration and password change, counted in
/// characters after trimming.
fn check_min_len(value: &str, min: usize, field: &str) -> Result<(), UserServiceError> {
    if value.trim().chars().count() < min {
        return Err(UserServiceError::ValidationError(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    Ok(())
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    sessions: Arc<SessionService>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, sessions: Arc<SessionService>) -> Self {
        Self {
            user_repo,
            sessions,
        }
    }

    /// Create an account and sign it in.
    ///
    /// The username is stored trimmed; the password is hashed exactly as
    /// given. The name `admin` receives the admin role.
    pub async fn register(&self, input: RegisterInput) -> Result<(User, Session), UserServiceError> {
        let username = input.username.trim();
        check_min_len(username, MIN_USERNAME_LEN, "Username")?;
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(UserServiceError::ValidationError(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        check_min_len(&input.password, MIN_PASSWORD_LEN, "Password")?;

        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(username.to_string()));
        }

        let password_hash = hash_password_blocking(input.password).await?;
        let user = User::new(
            username.to_string(),
            password_hash,
            UserRole::for_username(username),
        );

        // The pre-check above races with concurrent registrations; the
        // UNIQUE constraint decides.
        let user = match self.user_repo.create(&user).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                return Err(UserServiceError::UserExists(username.to_string()))
            }
            Err(e) => return Err(e.context("Failed to create user").into()),
        };

        let session = self.sessions.create(user.id).await?;
        tracing::info!("Registered user {} with role {}", user.username, user.role);
        Ok((user, session))
    }

    /// Verify credentials and issue a new session. Existing sessions remain.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let username = input.username.trim();

        let user = match self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to look up user")?
        {
            Some(user) => user,
            None => {
                tracing::info!("Login failed for unknown user {}", username);
                return Err(UserServiceError::InvalidCredentials);
            }
        };

        if !verify_password_blocking(input.password, user.password_hash.clone()).await? {
            tracing::info!("Login failed for user {}: wrong password", username);
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok(self.sessions.create(user.id).await?)
    }

    /// End the session behind `token`. Succeeds for unknown tokens too.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.sessions.remove(token).await?;
        Ok(())
    }

    /// Replace the password of an authenticated user.
    ///
    /// Other sessions of the user stay valid.
    pub async fn change_password(
        &self,
        user: &User,
        input: ChangePasswordInput,
    ) -> Result<(), UserServiceError> {
        check_min_len(&input.new_password, MIN_PASSWORD_LEN, "New password")?;

        if !verify_password_blocking(input.old_password, user.password_hash.clone()).await? {
            return Err(UserServiceError::WrongPassword);
        }

        let password_hash = hash_password_blocking(input.new_password).await?;
        self.user_repo
            .update_password(user.id, &password_hash)
            .await
            .context("Failed to store new password")?;

        tracing::info!("User {} changed password", user.username);
        Ok(())
    }
}
