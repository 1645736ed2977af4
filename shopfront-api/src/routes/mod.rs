/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Welcome message and health check
/// - `auth`: Register, login, token refresh, current user
/// - `products`: Catalogue browsing and admin CRUD
/// - `cart`: Server-side cart pricing
/// - `orders`: Checkout and order history
/// - `admin`: Dashboard stats, order fulfilment, user roles

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;

use crate::error::ApiError;
use uuid::Uuid;

/// JSON 404 for paths no route matches
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Parses a path id, turning garbage into a 400 instead of axum's plain-text
/// rejection
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {} id", what)))
}

/// `limit`/`offset` query parameters shared by the admin listings
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct Pagination {
    #[serde(default = "Pagination::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 100;

    fn default_limit() -> i64 {
        20
    }

    /// Clamps to `1..=MAX_LIMIT` and a non-negative offset
    pub fn clamped(self) -> (i64, i64) {
        (self.limit.clamp(1, Self::MAX_LIMIT), self.offset.max(0))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: Self::default_limit(),
            offset: 0,
        }
    }
}
