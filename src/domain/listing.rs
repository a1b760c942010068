//! Transfer list entries and the criteria used to search them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::category::Category;
use super::error::MarketError;
use super::money::{MAX_MONEY, round_money};
use super::player::Player;
use super::{ListingId, PlayerId};

/// A standing offer to sell one player at a fixed asking price.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: ListingId,
    pub player_id: PlayerId,
    pub asking_price: Decimal,
    pub listed_at: DateTime<Utc>,
}

impl Listing {
    /// A listing not yet stored (id 0). Fails on an asking price that is not
    /// positive or exceeds [`MAX_MONEY`].
    pub fn new(
        player_id: PlayerId,
        asking_price: Decimal,
        listed_at: DateTime<Utc>,
    ) -> Result<Self, MarketError> {
        Ok(Listing {
            id: 0,
            player_id,
            asking_price: validate_asking_price(asking_price)?,
            listed_at,
        })
    }
}

pub fn validate_asking_price(amount: Decimal) -> Result<Decimal, MarketError> {
    let rounded = round_money(amount);
    if rounded <= Decimal::ZERO || rounded > MAX_MONEY {
        return Err(MarketError::InvalidPrice { amount });
    }
    Ok(rounded)
}

/// Field filters for the transfer list. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingCriteria {
    pub asking_price: Option<Decimal>,
    pub country: Option<String>,
    /// Case-insensitive substring of the first or last name.
    pub name: Option<String>,
    /// Case-insensitive substring of the selling team's name.
    pub team_name: Option<String>,
    pub age: Option<u8>,
    pub category: Option<Category>,
}

impl ListingCriteria {
    pub fn is_empty(&self) -> bool {
        *self == ListingCriteria::default()
    }

    pub fn matches(&self, listing: &Listing, player: &Player, team_name: Option<&str>) -> bool {
        if let Some(price) = self.asking_price {
            if listing.asking_price != price {
                return false;
            }
        }
        if let Some(country) = &self.country {
            if !player.country.eq_ignore_ascii_case(country.trim()) {
                return false;
            }
        }
        if !self.matches_names(&player.first_name, &player.last_name, team_name) {
            return false;
        }
        if let Some(age) = self.age {
            if player.age != age {
                return false;
            }
        }
        if let Some(category) = self.category {
            if player.category != category {
                return false;
            }
        }
        true
    }

    /// The name and team-name filters alone. Case folding is Unicode aware.
    pub fn matches_names(&self, first_name: &str, last_name: &str, team_name: Option<&str>) -> bool {
        if let Some(name) = &self.name {
            let needle = name.trim().to_lowercase();
            if !first_name.to_lowercase().contains(&needle)
                && !last_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(wanted) = &self.team_name {
            let needle = wanted.trim().to_lowercase();
            match team_name {
                Some(actual) if actual.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        true
    }
}
