/// Bearer token authentication layers
///
/// - [`jwt_auth_layer`] accepts any valid access token and inserts an
///   [`AuthContext`] into the request extensions
/// - [`admin_auth_layer`] additionally requires the admin role. The role in
///   the token is checked first, so customers are turned away without a
///   database round trip; then the account is re-read so a demoted or
///   deleted admin loses access before their token expires
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use shopfront_api::{app::AppState, middleware::auth::jwt_auth_layer};
///
/// fn routes(state: AppState) -> Router<AppState> {
///     Router::new()
///         .route("/me", get(|| async { "me" }))
///         .layer(middleware::from_fn_with_state(state, jwt_auth_layer))
/// }
/// ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shopfront_shared::{
    auth::{authorization::require_admin, jwt, middleware::{bearer_token, AuthContext}},
    db::retry::with_retry,
    models::user::User,
};

use crate::{app::AppState, error::ApiError};

fn authenticate(state: &AppState, req: &Request) -> Result<AuthContext, ApiError> {
    let token = bearer_token(req.headers())?;
    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    Ok(AuthContext::from_claims(&claims))
}

/// Requires a valid access token
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(&state, &req)?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Requires a valid access token belonging to a current admin
pub async fn admin_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(&state, &req)?;
    require_admin(&auth)?;

    let user = with_retry(&state.retry, "load admin", || {
        User::find_by_id(&state.db, auth.user_id)
    })
    .await?
    .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    if !user.is_admin() {
        tracing::warn!(user_id = %user.id, "Token carries admin role but account does not");
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    req.extensions_mut().insert(AuthContext::new(user.id, user.role));

    Ok(next.run(req).await)
}
