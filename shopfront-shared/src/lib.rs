//! # Shopfront Shared Library
//!
//! This crate contains the domain types, persistence and auth primitives used
//! by the Shopfront API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool, migrations and the transient-error retry policy
//! - `models`: Database models (users, products, orders) and their queries
//! - `auth`: Password hashing, JWT tokens and role checks
//! - `cart`: Shopping cart kept by the client until checkout
//! - `pricing`: Order summary math (shipping, tax, totals)

pub mod auth;
pub mod cart;
pub mod db;
pub mod models;
pub mod pricing;

/// Current version of the Shopfront shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
