/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`. Expected failures carry their own status
/// and message; anything unexpected is logged and answered with a generic 500
/// so internals never reach the client.
///
/// Every error body has the same shape:
///
/// ```json
/// { "error": "not_found", "message": "Product not found" }
/// ```
///
/// # Example
///
/// ```
/// use shopfront_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Product not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shopfront_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError},
    models::order::OrderError,
};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Postgres SQLSTATE codes we translate into client errors
mod sqlstate {
    pub const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const CHECK_VIOLATION: &str = "23514";
}

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Wraps an unexpected failure; the message is only logged
    pub fn internal(err: impl fmt::Display) -> Self {
        ApiError::InternalError(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %msg, "Internal error");
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg, None),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// True when the error is a foreign key violation
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(sqlstate::FOREIGN_KEY_VIOLATION)
    )
}

/// Client-facing text for a CHECK constraint; constraint names stay internal
fn check_violation_message(constraint: &str) -> &'static str {
    match constraint {
        "products_price_positive" => "Price must be a positive value",
        "products_stock_non_negative" => "Stock cannot be negative",
        c if c.starts_with("order_items") && c.contains("quantity") => {
            "Quantity must be a positive integer"
        }
        _ => "Value is outside the allowed range",
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or_default().to_string();

                match db_err.code().as_deref() {
                    Some(sqlstate::UNIQUE_VIOLATION) if constraint.contains("email") => {
                        ApiError::Conflict("Email is already registered".to_string())
                    }
                    Some(sqlstate::UNIQUE_VIOLATION) if constraint.contains("username") => {
                        ApiError::Conflict("Username is already taken".to_string())
                    }
                    Some(sqlstate::UNIQUE_VIOLATION) => {
                        ApiError::Conflict("Resource already exists".to_string())
                    }
                    Some(sqlstate::FOREIGN_KEY_VIOLATION) => ApiError::BadRequest(
                        "Operation conflicts with records that reference this resource".to_string(),
                    ),
                    Some(sqlstate::CHECK_VIOLATION) => {
                        ApiError::BadRequest(check_violation_message(&constraint).to_string())
                    }
                    Some(sqlstate::NUMERIC_VALUE_OUT_OF_RANGE) => {
                        ApiError::BadRequest("Numeric value out of range".to_string())
                    }
                    _ => ApiError::InternalError(format!("Database error: {}", db_err)),
                }
            }
            sqlx::Error::PoolTimedOut => {
                ApiError::ServiceUnavailable("Database is busy, please retry".to_string())
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Flattens field errors, naming nested fields `outer.inner` and list
/// entries `items[0].field`
fn collect_validation_details(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<ValidationErrorDetail>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|error| ValidationErrorDetail {
                    field: path.clone(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_details(&path, nested, out),
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    collect_validation_details(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

/// Rejections from [`crate::extract::AppJson`]
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::BadRequest("Expected a JSON body with Content-Type: application/json".to_string())
            }
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::BadRequest("Request body is not valid JSON".to_string())
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Convert `validator` derive errors into 422 details
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_validation_details("", &errors, &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound => ApiError::NotFound("Order not found".to_string()),
            OrderError::Database(db_err) => db_err.into(),
            OrderError::EmptyOrder
            | OrderError::InvalidQuantity(_)
            | OrderError::ProductNotFound(_)
            | OrderError::InsufficientStock { .. }
            | OrderError::TotalTooLarge { .. }
            | OrderError::InvalidTransition { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_shared::models::order::OrderStatus;
    use uuid::Uuid;
    use validator::Validate;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Product not found".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, body) = body_json(ApiError::internal("connection string leaked")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An internal error occurred");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let err = ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "email",
            "Invalid email format",
        )]);
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "email");
    }

    #[derive(Validate)]
    struct Signup {
        #[validate(email(message = "Invalid email format"))]
        email: String,
        #[validate(length(min = 3, message = "Username must be 3-50 characters"))]
        username: String,
    }

    #[test]
    fn test_from_validation_errors_sorted_by_field() {
        let signup = Signup {
            email: "nope".to_string(),
            username: "x".to_string(),
        };

        let ApiError::ValidationError(details) = ApiError::from(signup.validate().unwrap_err())
        else {
            panic!("expected validation error");
        };

        assert_eq!(
            details,
            vec![
                ValidationErrorDetail::new("email", "Invalid email format"),
                ValidationErrorDetail::new("username", "Username must be 3-50 characters"),
            ]
        );
    }

    #[derive(Validate)]
    struct Checkout {
        #[validate(nested)]
        address: Address,
    }

    #[derive(Validate)]
    struct Address {
        #[validate(length(min = 1, message = "City is required"))]
        city: String,
    }

    #[test]
    fn test_nested_validation_errors_use_dotted_paths() {
        let checkout = Checkout {
            address: Address {
                city: String::new(),
            },
        };

        let ApiError::ValidationError(details) = ApiError::from(checkout.validate().unwrap_err())
        else {
            panic!("expected validation error");
        };

        assert_eq!(
            details,
            vec![ValidationErrorDetail::new("address.city", "City is required")]
        );
    }

    #[test]
    fn test_order_errors() {
        assert_eq!(
            ApiError::from(OrderError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(OrderError::EmptyOrder).status(),
            StatusCode::BAD_REQUEST
        );

        let err = ApiError::from(OrderError::InsufficientStock {
            product_id: Uuid::new_v4(),
            name: "Mug".to_string(),
            requested: 3,
            available: 1,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("requested 3, available 1"));

        let err = ApiError::from(OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Paid,
        });
        assert!(err.to_string().contains("from delivered to paid"));

        let err = ApiError::from(OrderError::TotalTooLarge {
            total: "12000000000.00".parse().unwrap(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("exceeds the maximum allowed amount"));
    }

    #[test]
    fn test_sqlx_errors() {
        assert_eq!(
            ApiError::from(sqlx::Error::RowNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(sqlx::Error::PoolTimedOut).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(!is_foreign_key_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_check_violation_messages_hide_constraint_names() {
        assert_eq!(
            check_violation_message("products_price_positive"),
            "Price must be a positive value"
        );
        assert_eq!(
            check_violation_message("products_stock_non_negative"),
            "Stock cannot be negative"
        );
        assert_eq!(
            check_violation_message("order_items_quantity_check"),
            "Quantity must be a positive integer"
        );

        let fallback = check_violation_message("users_secret_internal_check");
        assert_eq!(fallback, "Value is outside the allowed range");
        assert!(!fallback.contains("users"));
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            ApiError::from(AuthError::MissingCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthzError::NotAdmin).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(JwtError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(JwtError::CreateError("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
