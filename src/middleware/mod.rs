//! Middleware components
//!
//! This module contains middleware for:
//! - Authentication (JWT validation, principal extraction)

pub mod auth;

pub use auth::{auth_middleware, AuthUser, Claims, Role};
