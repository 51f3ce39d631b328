//! Storefront - a small shop backend
//!
//! Session-cookie accounts with a user/admin role split and a product
//! catalog whose mutations are admin-only.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
