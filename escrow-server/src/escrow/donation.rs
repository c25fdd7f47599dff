//! Donation calculator
//!
//! Pure computation of the charity-bound share of a sale. Called once at
//! order creation; the result is frozen on the aggregate and never
//! recomputed.

use rust_decimal::Decimal;

/// `round2(price × quantity × percent / 100)`
///
/// Inputs must already be validated (non-negative price, quantity ≥ 1,
/// percent in 0-100). Banker's rounding to 2 decimal places.
pub fn donation_amount(price: Decimal, quantity: i32, donation_percent: i32) -> Decimal {
    let gross = price * Decimal::from(quantity) * Decimal::from(donation_percent)
        / Decimal::from(100);
    gross.round_dp(2)
}

/// Line total before the donation split.
pub fn order_total(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}
