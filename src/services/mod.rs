//! Services layer
//!
//! Business rules on top of the repositories: credential handling, session
//! lifecycle and catalog validation.

pub mod password;
pub mod product;
pub mod session;
pub mod user;

pub use password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking};
pub use product::{ProductService, ProductServiceError};
pub use session::{SessionError, SessionService, DEFAULT_SESSION_TTL_HOURS};
pub use user::{
    ChangePasswordInput, LoginInput, RegisterInput, UserService, UserServiceError,
};
