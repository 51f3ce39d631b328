//! API middleware
//!
//! Shared application state, the JSON error type, session cookie handling and
//! the two gating stages: `require_auth` resolves the session cookie into an
//! `AuthenticatedUser`, `require_admin` then checks the role. The admin stage
//! is only reachable through [`admin_only`], which always installs both.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::{self as axum_middleware, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::db::repositories::{SqlxProductRepository, SqlxSessionRepository, SqlxUserRepository};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    ProductService, ProductServiceError, SessionError, SessionService, UserService,
    UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub session_service: Arc<SessionService>,
    pub product_service: Arc<ProductService>,
    pub cookie: Arc<SessionCookie>,
}

impl AppState {
    /// Wire repositories and services on top of a migrated pool.
    pub fn new(pool: DynDatabasePool, session: &SessionConfig) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_service = Arc::new(SessionService::new(
            SqlxSessionRepository::boxed(pool.clone()),
            user_repo.clone(),
            session.ttl(),
        ));
        let user_service = Arc::new(UserService::new(user_repo, session_service.clone()));
        let product_service = Arc::new(ProductService::new(SqlxProductRepository::boxed(
            pool.clone(),
        )));

        Self {
            pool,
            user_service,
            session_service,
            product_service,
            cookie: Arc::new(SessionCookie::from_config(session)),
        }
    }
}

/// Attributes of the session cookie
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl SessionCookie {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.cookie_secure,
            max_age_secs: config.ttl().num_seconds(),
        }
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` headers carrying `token`
    pub fn set(&self, token: &str) -> Result<HeaderMap, ApiError> {
        self.header(&self.render(token, self.max_age_secs))
    }

    /// `Set-Cookie` headers that make the browser drop the cookie
    pub fn clear(&self) -> Result<HeaderMap, ApiError> {
        self.header(&self.render("", 0))
    }

    fn header(&self, cookie: &str) -> Result<HeaderMap, ApiError> {
        let value = HeaderValue::from_str(cookie).map_err(|e| {
            tracing::error!("Unusable session cookie header: {}", e);
            ApiError::internal_error("Internal server error")
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(header::SET_COOKIE, value);
        Ok(headers)
    }

    /// Read this cookie's value from the request `Cookie` headers.
    /// An empty value counts as absent.
    pub fn token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// The user resolved from the session cookie, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// JSON body extractor whose rejection is an `ApiError`
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn missing_session() -> Self {
        Self::new("MISSING_SESSION", "No session cookie")
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the real cause and hand the client a generic message.
    fn internal(err: &anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", err);
        Self::internal_error("Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" | "MISSING_SESSION" | "WRONG_PASSWORD" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "CONFLICT" => StatusCode::CONFLICT,
            "SERVICE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation_error(rejection.body_text())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidSession
            | SessionError::SessionExpired
            | SessionError::InvalidUser => Self::unauthorized("Invalid or expired session"),
            SessionError::Internal(e) => Self::internal(&e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::UserExists(_) => Self::conflict("Username is already taken"),
            UserServiceError::InvalidCredentials => {
                Self::unauthorized("Invalid username or password")
            }
            UserServiceError::WrongPassword => {
                Self::new("WRONG_PASSWORD", "Old password is incorrect")
            }
            UserServiceError::Session(e) => e.into(),
            UserServiceError::InternalError(e) => Self::internal(&e),
        }
    }
}

impl From<ProductServiceError> for ApiError {
    fn from(err: ProductServiceError) -> Self {
        match err {
            ProductServiceError::ValidationError(msg) => Self::validation_error(msg),
            ProductServiceError::InternalError(e) => Self::internal(&e),
        }
    }
}

/// Authentication middleware
///
/// No cookie is a 400; a cookie that does not resolve to a live session and
/// an existing user is a 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = state
        .cookie
        .token(request.headers())
        .ok_or_else(ApiError::missing_session)?;

    let user = state.session_service.resolve(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Role check; fails closed when no authenticated user was attached.
async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Gate every route of `router` behind a valid session.
pub fn authenticated(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router.route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        require_auth,
    ))
}

/// Gate every route of `router` behind a valid session and the admin role.
pub fn admin_only(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    // Layers added later run first: authentication, then the role check.
    authenticated(
        router.route_layer(axum_middleware::from_fn(require_admin)),
        state,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie() -> SessionCookie {
        SessionCookie {
            name: "sessionId".to_string(),
            secure: false,
            max_age_secs: 86400,
        }
    }

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_token_from_cookie_header() {
        let c = cookie();

        assert_eq!(c.token(&headers_with_cookie("sessionId=abc")), Some("abc".to_string()));
        assert_eq!(
            c.token(&headers_with_cookie("theme=dark; sessionId=abc; lang=en")),
            Some("abc".to_string())
        );
        assert_eq!(c.token(&headers_with_cookie("theme=dark")), None);
        assert_eq!(c.token(&headers_with_cookie("sessionId=")), None);
        assert_eq!(c.token(&headers_with_cookie("xsessionId=abc")), None);
        assert_eq!(c.token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_set_and_clear_cookie() {
        let c = cookie();

        let set = c.set("tok").unwrap();
        assert_eq!(
            set.get(header::SET_COOKIE).unwrap(),
            "sessionId=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );

        let cleared = c.clear().unwrap();
        assert!(cleared
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }

    #[test]
    fn test_secure_flag() {
        let c = SessionCookie {
            secure: true,
            ..cookie()
        };
        let set = c.set("tok").unwrap();
        assert!(set.get(header::SET_COOKIE).unwrap().to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ApiError::missing_session().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::new("WRONG_PASSWORD", "x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::internal_error("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_service_errors_map_to_codes() {
        let err: ApiError = UserServiceError::InvalidCredentials.into();
        assert_eq!(err.error.code, "UNAUTHORIZED");

        let err: ApiError = UserServiceError::UserExists("alice".to_string()).into();
        assert_eq!(err.error.code, "CONFLICT");

        let err: ApiError = SessionError::SessionExpired.into();
        assert_eq!(err.error.code, "UNAUTHORIZED");

        let err: ApiError = UserServiceError::InternalError(anyhow::anyhow!("db exploded")).into();
        assert_eq!(err.error.code, "INTERNAL_ERROR");
        assert!(!err.error.message.contains("db exploded"));
    }
}
