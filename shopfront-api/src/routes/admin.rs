/// Admin endpoints
///
/// Everything here sits behind the admin auth layer.
///
/// # Endpoints
///
/// - `GET /api/admin/stats` - Dashboard counters
/// - `GET /api/admin/orders?status=&limit=&offset=` - All orders
/// - `PUT /api/admin/orders/:id/status` - Move an order through its lifecycle
/// - `GET /api/admin/users?limit=&offset=` - All accounts
/// - `PUT /api/admin/users/:id/role` - Promote or demote an account

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
    routes::{parse_id, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shopfront_shared::{
    auth::middleware::AuthContext,
    db::retry::with_retry,
    models::{
        order::{Order, OrderStatus},
        product::Product,
        user::{User, UserRole},
    },
};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_products: i64,
    pub pending_orders: i64,
    pub total_users: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,

    #[serde(default = "Pagination::default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let retry = &state.retry;
    let db = &state.db;

    let (total_products, pending_orders, total_users) = tokio::try_join!(
        with_retry(retry, "count products", || Product::count(db)),
        with_retry(retry, "count pending orders", || {
            Order::count_by_status(db, OrderStatus::Pending)
        }),
        with_retry(retry, "count users", || User::count(db)),
    )?;

    Ok(Json(StatsResponse {
        total_products,
        pending_orders,
        total_users,
    }))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Json<Page<Order>>> {
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .clamped();

    let items = with_retry(&state.retry, "list all orders", || {
        Order::list(&state.db, query.status, limit, offset)
    })
    .await?;

    Ok(Json(Page {
        items,
        limit,
        offset,
    }))
}

/// Change an order's status
///
/// # Errors
///
/// - `400 Bad Request`: Transition not allowed from the current status
/// - `404 Not Found`: Unknown order
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    let id = parse_id(&id, "order")?;

    let order = Order::update_status(&state.db, id, req.status).await?;

    Ok(Json(order))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Page<User>>> {
    let (limit, offset) = page.clamped();

    let items = with_retry(&state.retry, "list users", || {
        User::list(&state.db, limit, offset)
    })
    .await?;

    Ok(Json(Page {
        items,
        limit,
        offset,
    }))
}

/// Change an account's role
///
/// Admins cannot demote themselves, so the last admin can't lock everyone out.
pub async fn update_user_role(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateRoleRequest>,
) -> ApiResult<Json<User>> {
    let id = parse_id(&id, "user")?;

    if id == auth.user_id && req.role != UserRole::Admin {
        return Err(ApiError::BadRequest(
            "Admins cannot remove their own admin role".to_string(),
        ));
    }

    let user = User::update_role(&state.db, id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, role = %user.role, changed_by = %auth.user_id, "User role changed");

    Ok(Json(user))
}
