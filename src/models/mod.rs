//! Data models
//!
//! Entities persisted by the store (users, sessions, products) and the input
//! types the services accept.

mod product;
mod session;
mod user;

pub use product::{Product, ProductInput};
pub use session::Session;
pub use user::{User, UserRole, ADMIN_USERNAME};
