//! Players and the field rules applied when they are created or edited.

use rust_decimal::Decimal;

use super::category::Category;
use super::error::MarketError;
use super::money::{ensure_within_cap, round_money};
use super::{PlayerId, TeamId};

pub const MIN_AGE: u8 = 18;
pub const MAX_AGE: u8 = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub age: u8,
    pub category: Category,
    pub price: Decimal,
    pub team_id: Option<TeamId>,
}

impl Player {
    /// Build a free agent from raw input, collecting the first rule it breaks.
    pub fn validated(
        first_name: &str,
        last_name: &str,
        country: &str,
        age: u8,
        category: Category,
        price: Decimal,
    ) -> Result<Self, MarketError> {
        let first_name = require_text("first_name", first_name)?;
        let last_name = require_text("last_name", last_name)?;
        let country = normalize_country(country)?;
        validate_age(age)?;
        validate_price(price)?;

        Ok(Player {
            id: 0,
            first_name,
            last_name,
            country,
            age,
            category,
            price: round_money(price),
            team_id: None,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_free_agent(&self) -> bool {
        self.team_id.is_none()
    }
}

pub fn require_text(field: &str, value: &str) -> Result<String, MarketError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MarketError::validation(field, "may not be blank"));
    }
    Ok(trimmed.to_string())
}

/// Countries are two-letter codes, stored upper case.
pub fn normalize_country(raw: &str) -> Result<String, MarketError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(MarketError::validation("country", "may not be blank"));
    }
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(MarketError::validation(
            "country",
            format!("\"{code}\" is not a valid choice"),
        ));
    }
    Ok(code)
}

pub fn validate_age(age: u8) -> Result<(), MarketError> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(MarketError::validation(
            "age",
            format!("should be in the range [{MIN_AGE},{MAX_AGE}]"),
        ));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), MarketError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(MarketError::validation("price", "must not be negative"));
    }
    ensure_within_cap("price", round_money(price))?;
    Ok(())
}
