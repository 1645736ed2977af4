/// Database models for the storefront
///
/// Each model owns its SQL: operations are associated functions taking a
/// `&PgPool`, in the `Model::create(&pool, data)` style.
///
/// # Models
///
/// - `user`: Customer and admin accounts
/// - `product`: The catalogue
/// - `order`: Orders, line items, checkout and status changes
///
/// # Example
///
/// ```no_run
/// use shopfront_shared::db::pool::{create_pool, DatabaseConfig};
/// use shopfront_shared::models::product::Product;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// for product in Product::list_summaries(&pool).await? {
///     println!("{} {}", product.name, product.price);
/// }
/// # Ok(())
/// # }
/// ```

pub mod order;
pub mod product;
pub mod user;
