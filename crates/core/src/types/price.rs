//! Money amounts using decimal arithmetic.
//!
//! All catalog prices are stored as `NUMERIC(12, 2)` and handled as
//! [`Decimal`]. Totals that leave the system are rounded with
//! [`round_money`].

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a money amount to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
