//! Market configuration and its validation.
//!
//! Every value is checked before a market is built from it, so the rest of
//! the crate can trust quotas, bump bounds and starting amounts.

use rust_decimal::Decimal;

use super::error::MarketError;
use super::roster::RosterPolicy;
use super::valuation::PriceBump;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    pub roster: RosterPolicy,
    pub price_bump: PriceBump,
    pub starting_budget: Decimal,
    pub initial_player_price: Decimal,
    /// Seed for the price-bump random source; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            roster: RosterPolicy::default(),
            price_bump: PriceBump::default(),
            starting_budget: Decimal::new(5_000_000, 0),
            initial_player_price: Decimal::new(1_000_000, 0),
            seed: None,
        }
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MarketError {
    MarketError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn read_count(config: &dyn ConfigPort, section: &str, key: &str, default: u32) -> Result<u32, MarketError> {
    let value = config.get_int(section, key, i64::from(default));
    if value <= 0 {
        return Err(invalid(section, key, format!("{key} must be positive")));
    }
    u32::try_from(value).map_err(|_| invalid(section, key, format!("{key} is too large")))
}

fn read_pct(config: &dyn ConfigPort, key: &str, default: u32) -> Result<u32, MarketError> {
    let value = config.get_int("market", key, i64::from(default));
    if value < 0 {
        return Err(invalid("market", key, format!("{key} must be non-negative")));
    }
    u32::try_from(value).map_err(|_| invalid("market", key, format!("{key} is too large")))
}

pub fn build_market_config(config: &dyn ConfigPort) -> Result<MarketConfig, MarketError> {
    let defaults = MarketConfig::default();

    let roster = validate_roster(config, &defaults.roster)?;

    let min_pct = read_pct(config, "price_bump_min_pct", defaults.price_bump.min_pct)?;
    let max_pct = read_pct(config, "price_bump_max_pct", defaults.price_bump.max_pct)?;
    let price_bump = PriceBump::new(min_pct, max_pct).map_err(|_| {
        invalid(
            "market",
            "price_bump_min_pct",
            "price_bump_min_pct must not exceed price_bump_max_pct",
        )
    })?;

    let starting_budget = config.get_money("market", "starting_budget", defaults.starting_budget)?;
    let initial_player_price =
        config.get_money("market", "initial_player_price", defaults.initial_player_price)?;

    let seed = match config.get_string("market", "seed") {
        Some(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|_| invalid("market", "seed", "seed must be a non-negative integer"))?,
        ),
        None => None,
    };

    Ok(MarketConfig {
        roster,
        price_bump,
        starting_budget,
        initial_player_price,
        seed,
    })
}

fn validate_roster(config: &dyn ConfigPort, defaults: &RosterPolicy) -> Result<RosterPolicy, MarketError> {
    let roster = RosterPolicy {
        max_players: read_count(config, "roster", "max_players", defaults.max_players)?,
        goalkeepers: read_count(config, "roster", "goalkeepers", defaults.goalkeepers)?,
        defenders: read_count(config, "roster", "defenders", defaults.defenders)?,
        midfielders: read_count(config, "roster", "midfielders", defaults.midfielders)?,
        forwards: read_count(config, "roster", "forwards", defaults.forwards)?,
    };
    for (key, quota) in [
        ("goalkeepers", roster.goalkeepers),
        ("defenders", roster.defenders),
        ("midfielders", roster.midfielders),
        ("forwards", roster.forwards),
    ] {
        if quota > roster.max_players {
            return Err(invalid(
                "roster",
                key,
                format!("{key} quota {quota} exceeds max_players {}", roster.max_players),
            ));
        }
    }
    Ok(roster)
}
