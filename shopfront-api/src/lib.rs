//! # Shopfront API Server Library
//!
//! The HTTP side of the storefront: a JSON API for browsing the catalogue,
//! pricing carts, placing orders and running the shop as an admin.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from environment variables
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: JSON body extractor with API-style rejections
//! - `middleware`: Authentication and security header layers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
