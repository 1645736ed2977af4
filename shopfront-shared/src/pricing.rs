//! Order summary math shared by the cart, quotes and checkout.
//!
//! Shipping is a flat fee charged whenever there is something to ship, and
//! tax is a fixed rate on the subtotal, rounded to cents.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Flat shipping fee: 5.00
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

/// Sales tax rate: 8%
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Exclusive upper bound for stored order amounts; the columns are
/// `NUMERIC(12, 2)`
pub const ORDER_AMOUNT_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Totals shown in the cart and stored on every order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Derives shipping, tax and total from a subtotal
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let subtotal = round_cents(subtotal);
        let shipping = if subtotal > Decimal::ZERO {
            FLAT_SHIPPING
        } else {
            Decimal::ZERO
        };
        let tax = round_cents(subtotal * TAX_RATE);

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Sums `unit_price * quantity` over the lines and derives the rest
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, u32)>,
    {
        let subtotal = lines
            .into_iter()
            .map(|(unit_price, quantity)| line_total(unit_price, quantity))
            .sum();

        Self::from_subtotal(subtotal)
    }

    /// Summary of an empty cart
    pub fn empty() -> Self {
        Self::from_subtotal(Decimal::ZERO)
    }

    /// True when every amount can be stored on an order
    ///
    /// The total is the largest of the four, so it is the only one checked.
    pub fn is_storable(&self) -> bool {
        self.total < ORDER_AMOUNT_LIMIT
    }
}

/// Price of a single line
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Rounds to two decimal places, halves away from zero
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_constants() {
        assert_eq!(FLAT_SHIPPING, dec("5.00"));
        assert_eq!(TAX_RATE, dec("0.08"));
    }

    #[test]
    fn test_empty_summary_is_all_zero() {
        let summary = OrderSummary::empty();
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.tax, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_shipping_and_tax_applied() {
        let summary = OrderSummary::from_subtotal(dec("100.00"));
        assert_eq!(summary.shipping, dec("5.00"));
        assert_eq!(summary.tax, dec("8.00"));
        assert_eq!(summary.total, dec("113.00"));
    }

    #[test]
    fn test_amounts_round_to_cents() {
        // subtotal rounds to 10.06, tax = 0.8048
        let summary = OrderSummary::from_subtotal(dec("10.0625"));
        assert_eq!(summary.subtotal, dec("10.06"));
        assert_eq!(summary.tax, dec("0.80"));

        let summary = OrderSummary::from_subtotal(dec("19.9375"));
        // 19.94 * 0.08 = 1.5952
        assert_eq!(summary.tax, dec("1.60"));

        assert_eq!(round_cents(dec("0.125")), dec("0.13"));
    }

    #[test]
    fn test_from_lines() {
        let summary = OrderSummary::from_lines([(dec("19.99"), 2), (dec("5.50"), 1)]);
        assert_eq!(summary.subtotal, dec("45.48"));
        assert_eq!(summary.shipping, dec("5.00"));
        // 45.48 * 0.08 = 3.6384
        assert_eq!(summary.tax, dec("3.64"));
        assert_eq!(summary.total, dec("54.12"));
    }

    #[test]
    fn test_order_amount_limit() {
        assert_eq!(ORDER_AMOUNT_LIMIT, dec("10000000000"));

        // 99,999,999.99 * 10 units
        let large = OrderSummary::from_lines([(dec("99999999.99"), 10)]);
        assert!(large.is_storable());

        let too_large = OrderSummary::from_lines([(dec("99999999.99"), 1000)]);
        assert!(too_large.total >= ORDER_AMOUNT_LIMIT);
        assert!(!too_large.is_storable());

        assert!(OrderSummary::empty().is_storable());
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("2.50"), 4), dec("10.00"));
        assert_eq!(line_total(dec("2.50"), 0), Decimal::ZERO);
    }
}
