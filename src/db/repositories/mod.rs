//! Database repositories
//!
//! One repository per entity, each a trait plus an sqlx implementation that
//! dispatches on the pool's backend.

pub mod product;
pub mod session;
pub mod user;

pub use product::{ProductRepository, SqlxProductRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
