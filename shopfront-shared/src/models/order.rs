/// Orders, their line items and the checkout transaction
///
/// # Schema
///
/// ```sql
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id),
///     status order_status NOT NULL DEFAULT 'pending',
///     subtotal, shipping, tax, total NUMERIC(12, 2) NOT NULL,
///     shipping_address JSONB NOT NULL,
///     created_at, updated_at TIMESTAMPTZ NOT NULL
/// );
///
/// CREATE TABLE order_items (
///     id UUID PRIMARY KEY,
///     order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
///     product_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
///     product_name VARCHAR(255) NOT NULL,
///     unit_price NUMERIC(10, 2) NOT NULL,
///     quantity INTEGER NOT NULL CHECK (quantity > 0)
/// );
/// ```
///
/// Items keep a copy of the product name and price at the time of purchase,
/// so later catalogue edits don't rewrite order history.
///
/// # Status lifecycle
///
/// ```text
/// pending ──> paid ──> shipped ──> delivered
///    │          │
///    └──────────┴──> cancelled
/// ```
///
/// Cancelling puts the ordered quantities back into stock.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::cart::CartLine;
use crate::pricing::OrderSummary;

/// Order status
///
/// Maps to the Postgres `order_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Delivered and cancelled orders never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether an order may move from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Cancelled) | (Paid, Shipped) | (Paid, Cancelled) | (Shipped, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

/// Where the order is shipped, stored as JSONB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_address: Json<ShippingAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line of an order, priced at purchase time
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// An order together with its items
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Error type for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Quantity for product {0} must be at least 1")]
    InvalidQuantity(Uuid),

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        name: String,
        requested: u64,
        available: i32,
    },

    #[error("Order total of {total} exceeds the maximum allowed amount")]
    TotalTooLarge { total: Decimal },

    #[error("Order not found")]
    NotFound,

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Folds repeated products into one line, keeping first-seen order
///
/// # Errors
///
/// `EmptyOrder` for no lines, `InvalidQuantity` for a zero quantity
pub fn merge_lines(lines: &[CartLine]) -> Result<Vec<(Uuid, u64)>, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut merged: Vec<(Uuid, u64)> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity(line.product_id));
        }

        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, quantity)) => *quantity += u64::from(line.quantity),
            None => merged.push((line.product_id, u64::from(line.quantity))),
        }
    }

    Ok(merged)
}

#[derive(sqlx::FromRow)]
struct LockedProduct {
    id: Uuid,
    name: String,
    price: Decimal,
    stock: i32,
}

const ORDER_COLUMNS: &str = "id, user_id, status, subtotal, shipping, tax, total, \
                             shipping_address, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, unit_price, quantity";

impl Order {
    /// Places an order for `user_id`
    ///
    /// Runs in one transaction: the ordered products are locked, checked for
    /// stock, priced from the catalogue, and decremented. Either the whole
    /// order is written or nothing is.
    ///
    /// # Errors
    ///
    /// `EmptyOrder`, `InvalidQuantity`, `ProductNotFound`,
    /// `InsufficientStock`, `TotalTooLarge`, or `Database`
    pub async fn place(
        pool: &PgPool,
        user_id: Uuid,
        lines: &[CartLine],
        shipping_address: ShippingAddress,
    ) -> Result<OrderWithItems, OrderError> {
        let merged = merge_lines(lines)?;
        let ids: Vec<Uuid> = merged.iter().map(|(id, _)| *id).collect();

        let mut tx = pool.begin().await?;

        // Lock in id order so concurrent checkouts can't deadlock
        let locked = sqlx::query_as::<_, LockedProduct>(
            r#"
            SELECT id, name, price, stock
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let mut priced = Vec::with_capacity(merged.len());
        for (product_id, requested) in merged {
            let product = locked
                .iter()
                .find(|p| p.id == product_id)
                .ok_or(OrderError::ProductNotFound(product_id))?;

            let quantity = i32::try_from(requested)
                .ok()
                .filter(|q| *q <= product.stock)
                .ok_or_else(|| OrderError::InsufficientStock {
                    product_id,
                    name: product.name.clone(),
                    requested,
                    available: product.stock,
                })?;

            priced.push((product, quantity));
        }

        let summary = OrderSummary::from_lines(
            priced
                .iter()
                .map(|(product, quantity)| (product.price, quantity.unsigned_abs())),
        );
        if !summary.is_storable() {
            return Err(OrderError::TotalTooLarge {
                total: summary.total,
            });
        }

        let query = format!(
            "INSERT INTO orders (user_id, subtotal, shipping, tax, total, shipping_address) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .bind(summary.subtotal)
            .bind(summary.shipping)
            .bind(summary.tax)
            .bind(summary.total)
            .bind(Json(&shipping_address))
            .fetch_one(&mut *tx)
            .await?;

        let item_query = format!(
            "INSERT INTO order_items (order_id, product_id, product_name, unit_price, quantity) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ITEM_COLUMNS}"
        );

        let mut items = Vec::with_capacity(priced.len());
        for (product, quantity) in priced {
            let item = sqlx::query_as::<_, OrderItem>(&item_query)
                .bind(order.id)
                .bind(product.id)
                .bind(&product.name)
                .bind(product.price)
                .bind(quantity)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1")
                .bind(product.id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;

            items.push(item);
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            items = items.len(),
            total = %order.total,
            "Order placed"
        );

        Ok(OrderWithItems { order, items })
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Line items of an order
    pub async fn items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY product_name"
        );

        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// An order with its items, or None
    pub async fn find_with_items(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<OrderWithItems>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = Self::items(pool, order.id).await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// A customer's orders, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// All orders, optionally filtered by status, newest first
    pub async fn list(
        pool: &PgPool,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::order_status IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );

        sqlx::query_as::<_, Order>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_status(pool: &PgPool, status: OrderStatus) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Moves an order to `new_status`
    ///
    /// Cancelling returns every item's quantity to stock in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, or `Database`
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Self, OrderError> {
        let mut tx = pool.begin().await?;

        let (current,): (OrderStatus,) =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(OrderError::NotFound)?;

        if !current.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        if new_status == OrderStatus::Cancelled {
            let restocked = sqlx::query(
                r#"
                UPDATE products p
                SET stock = p.stock + oi.quantity, updated_at = NOW()
                FROM order_items oi
                WHERE oi.order_id = $1 AND p.id = oi.product_id
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;

            tracing::debug!(order_id = %id, products = restocked.rows_affected(), "Stock restored");
        }

        let query = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(new_status)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id = %id, from = %current, to = %new_status, "Order status changed");

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL: [OrderStatus; 5] = [Pending, Paid, Shipped, Delivered, Cancelled];

    #[test]
    fn test_transition_table() {
        let allowed = [
            (Pending, Paid),
            (Pending, Cancelled),
            (Paid, Shipped),
            (Paid, Cancelled),
            (Shipped, Delivered),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for from in [Delivered, Cancelled] {
            assert!(from.is_terminal());
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), Shipped);
        assert_eq!("CANCELLED".parse::<OrderStatus>().unwrap(), Cancelled);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_string(&Paid).unwrap(), "\"paid\"");
    }

    #[test]
    fn test_merge_lines() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = [
            CartLine { product_id: a, quantity: 2 },
            CartLine { product_id: b, quantity: 1 },
            CartLine { product_id: a, quantity: 3 },
        ];

        assert_eq!(merge_lines(&lines).unwrap(), vec![(a, 5), (b, 1)]);
    }

    #[test]
    fn test_merge_lines_rejects_empty_and_zero() {
        assert!(matches!(merge_lines(&[]), Err(OrderError::EmptyOrder)));

        let id = Uuid::new_v4();
        let lines = [CartLine { product_id: id, quantity: 0 }];
        assert!(matches!(
            merge_lines(&lines),
            Err(OrderError::InvalidQuantity(bad)) if bad == id
        ));
    }

    #[test]
    fn test_shipping_address_json() {
        let raw = r#"{"full_name":"Ada Lovelace","line1":"12 St James's Square",
                      "city":"London","postal_code":"SW1Y 4JH","country":"GB"}"#;
        let address: ShippingAddress = serde_json::from_str(raw).unwrap();
        assert!(address.line2.is_none());

        let json = serde_json::to_value(&address).unwrap();
        assert!(json.get("line2").is_none());
        assert_eq!(json["city"], "London");
    }
}
