/// Cart pricing endpoint
///
/// The cart itself lives on the client. Before checkout the client can ask
/// the server to price it against current catalogue prices, so the totals the
/// customer sees are the ones the order will be charged.
///
/// # Endpoint
///
/// ```text
/// POST /api/cart/quote
///
/// { "items": [{ "product_id": "uuid", "quantity": 2 }] }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "lines": [{ "product_id": "uuid", "name": "Mug", "unit_price": "12.50",
///               "quantity": 2, "line_total": "25.00" }],
///   "missing_product_ids": [],
///   "summary": { "subtotal": "25.00", "shipping": "5.00", "tax": "2.00", "total": "32.00" }
/// }
/// ```

use crate::{app::AppState, error::ApiResult, extract::AppJson};
use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_shared::{
    cart::CartLine,
    db::retry::with_retry,
    models::{order::merge_lines, product::Product},
    pricing::OrderSummary,
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
pub struct QuoteLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u64,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub lines: Vec<QuoteLine>,

    /// Products that are no longer in the catalogue; not priced
    pub missing_product_ids: Vec<Uuid>,

    pub summary: OrderSummary,
}

/// Price cart lines at current catalogue prices
///
/// Repeated products are merged. Stock is not reserved.
///
/// # Errors
///
/// - `400 Bad Request`: Empty cart or a zero quantity
pub async fn quote(
    State(state): State<AppState>,
    AppJson(req): AppJson<QuoteRequest>,
) -> ApiResult<Json<QuoteResponse>> {
    let merged = merge_lines(&req.items)?;
    let ids: Vec<Uuid> = merged.iter().map(|(id, _)| *id).collect();

    let products = with_retry(&state.retry, "quote cart", || {
        Product::find_summaries(&state.db, &ids)
    })
    .await?;

    let mut lines = Vec::with_capacity(merged.len());
    let mut missing_product_ids = Vec::new();

    for (product_id, quantity) in merged {
        match products.iter().find(|p| p.id == product_id) {
            Some(product) => lines.push(QuoteLine {
                product_id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
                line_total: product.price * Decimal::from(quantity),
            }),
            None => missing_product_ids.push(product_id),
        }
    }

    let summary = OrderSummary::from_subtotal(lines.iter().map(|line| line.line_total).sum());

    Ok(Json(QuoteResponse {
        lines,
        missing_product_ids,
        summary,
    }))
}

