use bigdecimal::{BigDecimal, Signed, Zero};

use crate::database::models::Course;
use crate::error::LedgerError;

/// Lifetime referral commission: 20% of every course a referred buyer purchases.
pub fn commission_rate() -> BigDecimal {
    BigDecimal::new(20.into(), 2)
}

/// Price a buyer actually pays for a course. A zero discount price means "no discount".
pub fn effective_price(course: &Course) -> BigDecimal {
    match &course.discount_price {
        Some(discount_price) if !discount_price.is_zero() => discount_price.clone(),
        _ => course.price.clone(),
    }
}

/// Commission owed to a referrer for one course sold at `price`.
///
/// The result is kept at full precision; round only for display.
pub fn commission(price: &BigDecimal, rate: &BigDecimal) -> Result<BigDecimal, LedgerError> {
    if price.is_negative() {
        return Err(LedgerError::validation("price"));
    }
    Ok(price * rate)
}

/// Currency precision used when an amount is shown to a person or a gateway.
pub fn display_amount(value: &BigDecimal) -> String {
    value.round(2).with_scale(2).to_string()
}
