/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Create a customer account and get tokens
/// - `POST /api/auth/login` - Exchange email and password for tokens
/// - `POST /api/auth/refresh` - Exchange a refresh token for an access token
/// - `GET /api/auth/me` - The authenticated user's profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::AppJson,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use shopfront_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    db::retry::with_retry,
    models::user::{CreateUser, User, UserRole},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked for strength after the field rules pass
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Tokens plus the account they belong to
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token (24h)
    pub token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub token: String,
}

fn issue(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let tokens = TokenPair::issue(user.id, user.role, state.jwt_secret())?;

    Ok(AuthResponse {
        token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user,
    })
}

/// Register a new account
///
/// The account is a customer unless its email matches `ADMIN_EMAIL`.
///
/// # Errors
///
/// - `409 Conflict`: Username or email already taken
/// - `422 Unprocessable Entity`: Field validation or weak password
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)]))?;

    let email = req.email.trim().to_lowercase();
    let username = req.username.trim().to_string();

    // Checked before hashing; the unique indexes still catch a racing signup
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }
    if User::find_by_username(&state.db, &username).await?.is_some() {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    let role = if state.config.is_admin_email(&email) {
        UserRole::Admin
    } else {
        UserRole::Customer
    };

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username,
            email,
            password_hash,
            role,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

/// Log in with email and password
///
/// Unknown email and wrong password give the same 401.
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = with_retry(&state.retry, "find user by email", || {
        User::find_by_email(&state.db, &req.email)
    })
    .await?
    .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;

    Ok(Json(issue(&state, user)?))
}

/// Exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { token }))
}

/// The authenticated user's profile
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<User>> {
    let user = with_retry(&state.retry, "find user", || {
        User::find_by_id(&state.db, auth.user_id)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
