/// Product catalogue endpoints
///
/// # Endpoints
///
/// - `GET /api/products` - Listing (id, name, price, image), newest first
/// - `GET /api/products/:id` - Full product
/// - `POST /api/products` - Create (admin)
/// - `PUT /api/products/:id` - Partial update (admin)
/// - `DELETE /api/products/:id` - Delete unless ordered (admin)
///
/// Every query goes through the database retry policy.

use crate::{
    app::AppState,
    error::{is_foreign_key_violation, ApiError, ApiResult},
    extract::AppJson,
    routes::parse_id,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_shared::{
    db::retry::with_retry,
    models::product::{CreateProduct, Product, ProductSummary, UpdateProduct, MAX_PRICE},
    pricing::round_cents,
};
use validator::Validate;

/// Create request
///
/// Required fields are optional here so a missing one is reported as a
/// 400 with a readable message.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub price: Option<Decimal>,

    pub stock: Option<i32>,

    #[validate(length(max = 512, message = "Image URL must be at most 512 characters"))]
    pub image_url: Option<String>,
}

/// Update request; absent and `null` fields are left alone
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub price: Option<Decimal>,

    pub stock: Option<i32>,

    #[validate(length(max = 512, message = "Image URL must be at most 512 characters"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: &'static str,
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn product_not_found() -> ApiError {
    ApiError::NotFound("Product not found".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    trimmed(value).filter(|v| !v.is_empty())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Rounds to cents and rejects prices the column cannot hold
fn bounded_price(price: Decimal) -> ApiResult<Decimal> {
    let price = round_cents(price);
    if price >= MAX_PRICE {
        return Err(ApiError::BadRequest(format!(
            "Price must be less than {}",
            MAX_PRICE
        )));
    }
    Ok(price)
}

impl CreateProductRequest {
    fn into_create(self) -> ApiResult<CreateProduct> {
        self.validate()?;

        let (Some(name), Some(price)) = (non_blank(self.name), self.price) else {
            return Err(ApiError::BadRequest(
                "Name and valid price are required".to_string(),
            ));
        };
        if price <= Decimal::ZERO {
            return Err(ApiError::BadRequest(
                "Name and valid price are required".to_string(),
            ));
        }
        let price = bounded_price(price)?;

        let stock = self.stock.unwrap_or(0);
        if stock < 0 {
            return Err(ApiError::BadRequest("Stock cannot be negative".to_string()));
        }

        Ok(CreateProduct {
            name,
            description: non_blank(self.description),
            price,
            stock,
            image_url: non_blank(self.image_url),
        })
    }
}

impl UpdateProductRequest {
    fn into_update(self) -> ApiResult<UpdateProduct> {
        self.validate()?;

        // Blank description or image URL clears it
        let mut update = UpdateProduct {
            name: trimmed(self.name),
            description: trimmed(self.description),
            price: self.price,
            stock: self.stock,
            image_url: trimmed(self.image_url),
        };

        if update.is_empty() {
            return Err(ApiError::BadRequest("No update fields provided".to_string()));
        }
        if update.name.as_deref() == Some("") {
            return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
        }
        if update.price.is_some_and(|price| price <= Decimal::ZERO) {
            return Err(ApiError::BadRequest(
                "Price must be a positive value".to_string(),
            ));
        }
        if update.stock.is_some_and(|stock| stock < 0) {
            return Err(ApiError::BadRequest("Stock cannot be negative".to_string()));
        }
        update.price = update.price.map(bounded_price).transpose()?;

        Ok(update)
    }
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductSummary>>> {
    let products = with_retry(&state.retry, "list products", || {
        Product::list_summaries(&state.db)
    })
    .await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let id = parse_id(&id, "product")?;

    let product = with_retry(&state.retry, "get product", || {
        Product::find_by_id(&state.db, id)
    })
    .await?
    .ok_or_else(product_not_found)?;

    Ok(Json(product))
}

/// Create a product
///
/// # Errors
///
/// - `400 Bad Request`: Missing name, price not positive or too large,
///   negative stock
pub async fn create_product(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let data = req.into_create()?;

    let product = with_retry(&state.retry, "create product", || {
        Product::create(&state.db, data.clone())
    })
    .await?;

    tracing::info!(product_id = %product.id, name = %product.name, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created successfully",
            product,
        }),
    ))
}

/// Update some fields of a product
///
/// # Errors
///
/// - `400 Bad Request`: No fields, price not positive or too large,
///   negative stock
/// - `404 Not Found`: Unknown product
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let id = parse_id(&id, "product")?;
    let update = req.into_update()?;

    let product = with_retry(&state.retry, "update product", || {
        Product::update(&state.db, id, update.clone())
    })
    .await?
    .ok_or_else(product_not_found)?;

    tracing::info!(product_id = %product.id, "Product updated");

    Ok(Json(ProductResponse {
        message: "Product updated successfully",
        product,
    }))
}

/// Delete a product
///
/// # Errors
///
/// - `400 Bad Request`: The product appears in an order
/// - `404 Not Found`: Unknown product
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "product")?;

    let deleted = with_retry(&state.retry, "delete product", || {
        Product::delete(&state.db, id)
    })
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            ApiError::BadRequest(
                "Cannot delete product as it is referenced in existing orders.".to_string(),
            )
        } else {
            e.into()
        }
    })?;

    if !deleted {
        return Err(product_not_found());
    }

    tracing::info!(product_id = %id, "Product deleted");

    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}
