//! Listing search port.

use crate::domain::ListingId;
use crate::domain::error::MarketError;
use crate::domain::listing::ListingCriteria;

/// Filters the transfer list. Implementations may be backed by an external
/// index, so results can name listings that have since closed.
pub trait ListingSearchPort {
    fn search_listings(&self, criteria: &ListingCriteria) -> Result<Vec<ListingId>, MarketError>;
}
