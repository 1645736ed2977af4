//! Shopping cart kept on the client until checkout.
//!
//! The cart holds a snapshot of each product next to the chosen quantity.
//! It is persisted in client storage under [`STORAGE_KEY`] using the
//! `{"state": {"items": [...]}, "version": 0}` envelope, and turned into
//! [`CartLine`]s when the order is placed.
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use shopfront_shared::cart::{Cart, ProductSnapshot};
//! use uuid::Uuid;
//!
//! let mug = ProductSnapshot {
//!     id: Uuid::new_v4(),
//!     name: "Mug".to_string(),
//!     price: Decimal::new(1250, 2),
//!     image_url: None,
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_item(mug.clone(), 2);
//! cart.add_item(mug.clone(), 1);
//!
//! assert_eq!(cart.item_count(), 3);
//! assert_eq!(cart.total(), Decimal::new(3750, 2));
//!
//! cart.update_quantity(mug.id, 0);
//! assert!(cart.is_empty());
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::{line_total, OrderSummary};

/// Client storage key the cart is persisted under
pub const STORAGE_KEY: &str = "cart-storage";

/// Version written into the persisted envelope
pub const STORAGE_VERSION: u32 = 0;

/// The product fields the cart needs to render and price a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A product in the cart with its quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl CartItem {
    /// `price * quantity` for this item
    pub fn line_total(&self) -> Decimal {
        line_total(self.product.price, self.quantity)
    }
}

/// What checkout sends to the server for each cart item
///
/// Prices are deliberately absent; the server prices lines from the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Ordered collection of cart items, one per product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Serialize, Deserialize)]
struct PersistedCart {
    state: Cart,
    #[serde(default)]
    version: u32,
}

impl Cart {
    /// Creates an empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in the order they were first added
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Adds `quantity` of `product`, merging with an existing line
    ///
    /// Quantities below 1 are raised to 1. When the product is already in the
    /// cart its existing snapshot is kept and only the quantity grows.
    pub fn add_item(&mut self, product: ProductSnapshot, quantity: u32) {
        let quantity = quantity.max(1);

        match self.items.iter_mut().find(|item| item.product.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem { product, quantity }),
        }
    }

    /// Removes the product from the cart; returns whether it was present
    pub fn remove_item(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product.id != product_id);
        self.items.len() != before
    }

    /// Sets the quantity of a product already in the cart
    ///
    /// A quantity of zero or less removes the item. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|item| item.product.id == product_id) {
            item.quantity = quantity;
        }
    }

    /// Empties the cart
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * quantity` over all items
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of units in the cart (not distinct products)
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Shipping, tax and total for the current contents
    pub fn summary(&self) -> OrderSummary {
        OrderSummary::from_subtotal(self.total())
    }

    /// Lines to submit at checkout
    pub fn lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|item| CartLine {
                product_id: item.product.id,
                quantity: item.quantity,
            })
            .collect()
    }

    /// Serializes the cart into its client storage envelope
    pub fn to_storage_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&PersistedCart {
            state: self.clone(),
            version: STORAGE_VERSION,
        })
    }

    /// Restores a cart from its client storage envelope
    ///
    /// Items stored with a zero quantity are dropped, and repeated products are
    /// merged, so a hand-edited or stale entry still yields a valid cart.
    pub fn from_storage_str(raw: &str) -> Result<Self, serde_json::Error> {
        let persisted: PersistedCart = serde_json::from_str(raw)?;

        let mut cart = Cart::new();
        for item in persisted.state.items {
            if item.quantity > 0 {
                cart.add_item(item.product, item.quantity);
            }
        }

        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: Decimal::new(cents, 2),
            image_url: None,
        }
    }

    #[test]
    fn test_add_item_merges_same_product() {
        let mut cart = Cart::new();
        let tee = product("T-shirt", 1999);

        cart.add_item(tee.clone(), 1);
        cart.add_item(tee.clone(), 2);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_add_item_keeps_insertion_order() {
        let mut cart = Cart::new();
        let a = product("A", 100);
        let b = product("B", 200);

        cart.add_item(a.clone(), 1);
        cart.add_item(b.clone(), 1);
        cart.add_item(a.clone(), 1);

        let ids: Vec<Uuid> = cart.items().iter().map(|i| i.product.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_add_item_clamps_quantity_to_one() {
        let mut cart = Cart::new();
        cart.add_item(product("Cap", 1500), 0);
        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = Cart::new();
        let cap = product("Cap", 1500);
        cart.add_item(cap.clone(), 1);

        cart.update_quantity(cap.id, 5);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_update_quantity_zero_or_negative_removes() {
        let mut cart = Cart::new();
        let cap = product("Cap", 1500);
        let mug = product("Mug", 900);
        cart.add_item(cap.clone(), 2);
        cart.add_item(mug.clone(), 2);

        cart.update_quantity(cap.id, 0);
        assert_eq!(cart.items().len(), 1);

        cart.update_quantity(mug.id, -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_unknown_product_is_ignored() {
        let mut cart = Cart::new();
        cart.add_item(product("Cap", 1500), 1);
        cart.update_quantity(Uuid::new_v4(), 4);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        let cap = product("Cap", 1500);
        cart.add_item(cap.clone(), 1);

        assert!(cart.remove_item(cap.id));
        assert!(!cart.remove_item(cap.id));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_and_counts() {
        let mut cart = Cart::new();
        cart.add_item(product("Tee", 1999), 2);
        cart.add_item(product("Mug", 550), 1);

        assert_eq!(cart.total(), Decimal::new(4548, 2));
        assert_eq!(cart.item_count(), 3);

        let summary = cart.summary();
        assert_eq!(summary.shipping, Decimal::new(500, 2));
        assert_eq!(summary.tax, Decimal::new(364, 2));

        cart.clear();
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.summary().shipping, Decimal::ZERO);
    }

    #[test]
    fn test_lines_for_checkout() {
        let mut cart = Cart::new();
        let tee = product("Tee", 1999);
        cart.add_item(tee.clone(), 2);

        assert_eq!(
            cart.lines(),
            vec![CartLine {
                product_id: tee.id,
                quantity: 2
            }]
        );
    }

    #[test]
    fn test_storage_envelope_layout() {
        let mut cart = Cart::new();
        cart.add_item(product("Tee", 1999), 2);

        let raw = cart.to_storage_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["items"][0]["quantity"], 2);
        assert_eq!(value["state"]["items"][0]["product"]["name"], "Tee");

        let restored = Cart::from_storage_str(&raw).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_restore_accepts_numeric_prices_and_drops_empty_lines() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"state":{{"items":[
                {{"product":{{"id":"{id}","name":"Tee","price":19.99}},"quantity":2}},
                {{"product":{{"id":"{id}","name":"Tee","price":19.99}},"quantity":1}},
                {{"product":{{"id":"{other}","name":"Gone","price":5}},"quantity":0}}
            ]}},"version":0}}"#,
            other = Uuid::new_v4()
        );

        let cart = Cart::from_storage_str(&raw).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_restore_rejects_garbage() {
        assert!(Cart::from_storage_str("not json").is_err());
    }
}
