/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use shopfront_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        auth::{admin_auth_layer, jwt_auth_layer},
        security::SecurityHeadersLayer,
    },
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use shopfront_shared::db::retry::RetryPolicy;
use sqlx::PgPool;
use std::{any::Any, sync::Arc, time::Duration};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Applied to catalogue and account reads
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the database retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /api
/// ├── GET  /                         welcome message
/// ├── GET  /health
/// ├── /auth
/// │   ├── POST /register, /login, /refresh
/// │   └── GET  /me                   (JWT)
/// ├── /products
/// │   ├── GET    /, /:id
/// │   └── POST /, PUT /:id, DELETE /:id   (admin)
/// ├── POST /cart/quote
/// ├── /orders                        (JWT)
/// │   ├── POST /, GET /, GET /:id
/// └── /admin                         (admin)
///     ├── GET /stats, /orders, /users
///     └── PUT /orders/:id/status, /users/:id/role
/// ```
///
/// Layers, outermost first: panic catcher, security headers, CORS, tracing.
pub fn build_router(state: AppState) -> Router {
    let admin = || from_fn_with_state(state.clone(), admin_auth_layer);
    let jwt = || from_fn_with_state(state.clone(), jwt_auth_layer);

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(jwt())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let product_routes = Router::new()
        .route("/", post(routes::products::create_product))
        .route(
            "/:id",
            put(routes::products::update_product).delete(routes::products::delete_product),
        )
        .route_layer(admin())
        .merge(
            Router::new()
                .route("/", get(routes::products::list_products))
                .route("/:id", get(routes::products::get_product)),
        );

    let cart_routes = Router::new().route("/quote", post(routes::cart::quote));

    let order_routes = Router::new()
        .route(
            "/",
            post(routes::orders::place_order).get(routes::orders::list_my_orders),
        )
        .route("/:id", get(routes::orders::get_order))
        .route_layer(jwt());

    let admin_routes = Router::new()
        .route("/stats", get(routes::admin::stats))
        .route("/orders", get(routes::admin::list_orders))
        .route("/orders/:id/status", put(routes::admin::update_order_status))
        .route("/users", get(routes::admin::list_users))
        .route("/users/:id/role", put(routes::admin::update_user_role))
        .route_layer(admin());

    let api_routes = Router::new()
        .route("/", get(routes::health::welcome))
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/products", product_routes)
        .nest("/cart", cart_routes)
        .nest("/orders", order_routes)
        .nest("/admin", admin_routes);

    let cors = cors_layer(&state.config);
    let production = state.config.api.production;

    Router::new()
        .nest("/api", api_routes)
        .fallback(routes::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// CORS for the configured frontends
///
/// `*` allows any origin without credentials; otherwise only the listed
/// origins are allowed, with credentials.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    ApiError::InternalError(format!("Handler panicked: {}", detail)).into_response()
}
