//! Configuration access port trait.

use rust_decimal::Decimal;

use crate::domain::error::MarketError;
use crate::domain::money::parse_money;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// A monetary value, or `default` when the key is absent.
    fn get_money(&self, section: &str, key: &str, default: Decimal) -> Result<Decimal, MarketError> {
        match self.get_string(section, key) {
            Some(raw) => parse_money(key, &raw).map_err(|e| MarketError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}
