/// Middleware for the API server
///
/// - `auth`: Bearer token and admin role layers
/// - `security`: Security response headers

pub mod auth;
pub mod security;
