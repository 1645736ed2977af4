/// Product catalogue model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     price NUMERIC(10, 2) NOT NULL CHECK (price > 0),
///     stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
///     image_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Products referenced by `order_items` cannot be deleted; the foreign key
/// violation is returned to the caller as a database error.
///
/// # Example
///
/// ```no_run
/// use rust_decimal::Decimal;
/// use shopfront_shared::models::product::{CreateProduct, Product, UpdateProduct};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let product = Product::create(
///     &pool,
///     CreateProduct {
///         name: "Enamel mug".to_string(),
///         description: None,
///         price: Decimal::new(1250, 2),
///         stock: 40,
///         image_url: None,
///     },
/// )
/// .await?;
///
/// let update = UpdateProduct {
///     stock: Some(35),
///     ..Default::default()
/// };
/// Product::update(&pool, product.id, update).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A product in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// Unit price, always positive, two decimal places
    pub price: Decimal,

    /// Units available for ordering
    pub stock: i32,

    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields shown on the product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// Input for creating a product
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
}

/// Input for a partial update
///
/// Only `Some` fields are written. An empty description or image URL clears
/// the column to NULL.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
}

impl UpdateProduct {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.image_url.is_none()
    }

    /// Builds the `UPDATE` statement; `$1` is the product id
    fn to_sql(&self) -> String {
        let mut query = String::from("UPDATE products SET updated_at = NOW()");
        let mut bind_count = 1;

        // (column, present, nullable)
        let columns = [
            ("name", self.name.is_some(), false),
            ("description", self.description.is_some(), true),
            ("price", self.price.is_some(), false),
            ("stock", self.stock.is_some(), false),
            ("image_url", self.image_url.is_some(), true),
        ];

        for (column, present, nullable) in columns {
            if !present {
                continue;
            }
            bind_count += 1;
            if nullable {
                query.push_str(&format!(", {} = NULLIF(${}, '')", column, bind_count));
            } else {
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }

        query.push_str(" WHERE id = $1 RETURNING ");
        query.push_str(PRODUCT_COLUMNS);
        query
    }
}

/// Exclusive upper bound for a price; the column is `NUMERIC(10, 2)`
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, image_url, created_at, updated_at";

impl Product {
    /// Inserts a product
    ///
    /// # Errors
    ///
    /// Check constraint violations if price or stock are out of range
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, description, price, stock, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.price)
            .bind(data.stock)
            .bind(data.image_url)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");

        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All products for the listing page, newest first
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<ProductSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProductSummary>(
            r#"
            SELECT id, name, price, image_url
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Summaries for a set of ids, in no particular order
    ///
    /// Unknown ids are simply absent from the result.
    pub async fn find_summaries(
        pool: &PgPool,
        ids: &[Uuid],
    ) -> Result<Vec<ProductSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProductSummary>(
            r#"
            SELECT id, name, price, image_url
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update
    ///
    /// Returns the updated product, or None if it doesn't exist. An empty
    /// update still refreshes `updated_at`.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = data.to_sql();
        let mut q = sqlx::query_as::<_, Product>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(price) = data.price {
            q = q.bind(price);
        }
        if let Some(stock) = data.stock {
            q = q.bind(stock);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a product
    ///
    /// Returns false if it didn't exist.
    ///
    /// # Errors
    ///
    /// A foreign key violation when the product appears in an order
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
