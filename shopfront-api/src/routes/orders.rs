/// Checkout and order history
///
/// # Endpoints
///
/// - `POST /api/orders` - Place an order from cart lines
/// - `GET /api/orders` - The caller's orders, newest first
/// - `GET /api/orders/:id` - One order with items (owner or admin)
///
/// # Checkout Request
///
/// ```json
/// {
///   "items": [{ "product_id": "uuid", "quantity": 2 }],
///   "shipping_address": {
///     "full_name": "Ada Lovelace",
///     "line1": "12 St James's Square",
///     "city": "London",
///     "postal_code": "SW1Y 4JH",
///     "country": "GB"
///   }
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
    routes::parse_id,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shopfront_shared::{
    auth::{authorization::require_owner_or_admin, middleware::AuthContext},
    cart::CartLine,
    db::retry::with_retry,
    models::order::{Order, OrderWithItems, ShippingAddress},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ShippingAddressInput {
    #[validate(length(min = 1, max = 255, message = "Full name is required"))]
    pub full_name: String,

    #[validate(length(min = 1, max = 255, message = "Address line 1 is required"))]
    pub line1: String,

    #[validate(length(max = 255, message = "Address line 2 must be at most 255 characters"))]
    pub line2: Option<String>,

    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,

    #[validate(length(min = 1, max = 20, message = "Postal code is required"))]
    pub postal_code: String,

    #[validate(length(min = 2, max = 56, message = "Country is required"))]
    pub country: String,
}

impl From<ShippingAddressInput> for ShippingAddress {
    fn from(input: ShippingAddressInput) -> Self {
        Self {
            full_name: input.full_name.trim().to_string(),
            line1: input.line1.trim().to_string(),
            line2: input
                .line2
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty()),
            city: input.city.trim().to_string(),
            postal_code: input.postal_code.trim().to_string(),
            country: input.country.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    pub items: Vec<CartLine>,

    #[validate(nested)]
    pub shipping_address: ShippingAddressInput,
}

/// Place an order
///
/// Prices come from the catalogue at checkout time, never from the client.
///
/// # Errors
///
/// - `400 Bad Request`: Empty cart, zero quantity, unknown product, not
///   enough stock
/// - `422 Unprocessable Entity`: Incomplete shipping address
pub async fn place_order(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderWithItems>)> {
    req.validate()?;

    let order = Order::place(
        &state.db,
        auth.user_id,
        &req.items,
        req.shipping_address.into(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Order>>> {
    let orders = with_retry(&state.retry, "list orders", || {
        Order::list_by_user(&state.db, auth.user_id)
    })
    .await?;

    Ok(Json(orders))
}

/// One order with its items
///
/// Someone else's order answers 404, the same as a missing one.
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderWithItems>> {
    let id = parse_id(&id, "order")?;
    let not_found = || ApiError::NotFound("Order not found".to_string());

    let order = with_retry(&state.retry, "get order", || {
        Order::find_with_items(&state.db, id)
    })
    .await?
    .ok_or_else(not_found)?;

    require_owner_or_admin(&auth, order.order.user_id).map_err(|_| not_found())?;

    Ok(Json(order))
}
