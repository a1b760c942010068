//! Monetary amounts: `Decimal` values kept at two fractional digits.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::error::MarketError;

pub const MONEY_SCALE: u32 = 2;

/// Largest price, asking price or configured amount: 9,999,999,999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, MONEY_SCALE);

/// Round to cents using banker's rounding.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

/// Parse a user or config supplied amount, rejecting negative values and
/// anything above [`MAX_MONEY`].
pub fn parse_money(field: &str, raw: &str) -> Result<Decimal, MarketError> {
    let amount = Decimal::from_str(raw.trim().replace('_', "").as_str())
        .map_err(|_| MarketError::validation(field, format!("\"{raw}\" is not a number")))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MarketError::validation(field, "must not be negative"));
    }
    ensure_within_cap(field, round_money(amount))
}

pub fn ensure_within_cap(field: &str, amount: Decimal) -> Result<Decimal, MarketError> {
    if amount > MAX_MONEY {
        return Err(MarketError::validation(
            field,
            format!("{amount} exceeds the maximum of {MAX_MONEY}"),
        ));
    }
    Ok(amount)
}

pub fn checked_add(field: &str, a: Decimal, b: Decimal) -> Result<Decimal, MarketError> {
    a.checked_add(b)
        .ok_or_else(|| MarketError::validation(field, "amount out of range"))
}

pub fn checked_sub(field: &str, a: Decimal, b: Decimal) -> Result<Decimal, MarketError> {
    a.checked_sub(b)
        .ok_or_else(|| MarketError::validation(field, "amount out of range"))
}
