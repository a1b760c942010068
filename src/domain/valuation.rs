//! Team valuation and post-transfer price appreciation.

use rust_decimal::Decimal;

use super::error::MarketError;
use super::money::{MAX_MONEY, round_money};
use super::player::Player;
use super::team::Team;
use crate::ports::random_port::RandomSource;

/// Sum of the prices of the players `team` owns. Players belonging to other
/// teams are ignored.
pub fn team_value(team: &Team, players: &[Player]) -> Result<Decimal, MarketError> {
    players
        .iter()
        .filter(|p| p.team_id == Some(team.id))
        .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.price))
        .map(round_money)
        .ok_or_else(|| MarketError::validation("value", "team value out of range"))
}

/// Random price increase applied to a player after each completed transfer:
/// `price * (100 + pct) / 100` with `pct` drawn from `min_pct..=max_pct`,
/// saturating at [`MAX_MONEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBump {
    pub min_pct: u32,
    pub max_pct: u32,
}

impl Default for PriceBump {
    fn default() -> Self {
        PriceBump {
            min_pct: 10,
            max_pct: 100,
        }
    }
}

impl PriceBump {
    pub fn new(min_pct: u32, max_pct: u32) -> Result<Self, MarketError> {
        if min_pct > max_pct {
            return Err(MarketError::validation(
                "price_bump",
                format!("minimum {min_pct}% exceeds maximum {max_pct}%"),
            ));
        }
        Ok(PriceBump { min_pct, max_pct })
    }

    /// Draw the percentage increase. Out-of-range draws from a misbehaving
    /// source are clamped into the configured bounds.
    pub fn draw_pct(&self, random: &dyn RandomSource) -> u32 {
        let drawn = random.int_in_range(i64::from(self.min_pct), i64::from(self.max_pct));
        drawn.clamp(i64::from(self.min_pct), i64::from(self.max_pct)) as u32
    }

    pub fn apply(&self, price: Decimal, pct: u32) -> Result<Decimal, MarketError> {
        let bumped = price
            .checked_mul(Decimal::from(100 + u64::from(pct)))
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| MarketError::validation("price", "bumped price out of range"))?;
        Ok(round_money(bumped).min(MAX_MONEY))
    }

    pub fn bump(&self, price: Decimal, random: &dyn RandomSource) -> Result<Decimal, MarketError> {
        self.apply(price, self.draw_pct(random))
    }
}
