//! Persistence port: transactional access to teams, players, listings and history.

use crate::domain::error::MarketError;
use crate::domain::history::{HistoryFilter, TransferRecord};
use crate::domain::listing::Listing;
use crate::domain::player::Player;
use crate::domain::team::Team;
use crate::domain::{ListingId, PlayerId, TeamId, TransferId, UserId};

/// Everything a single transaction may read or write.
///
/// Lookups by id fail with `NotFound`; `insert_*` ignore the id on the value
/// passed in and return the one assigned by the store.
pub trait UnitOfWork {
    fn team(&mut self, id: TeamId) -> Result<Team, MarketError>;
    fn team_for_owner(&mut self, owner: UserId) -> Result<Option<Team>, MarketError>;
    fn teams(&mut self) -> Result<Vec<Team>, MarketError>;
    fn insert_team(&mut self, team: &Team) -> Result<TeamId, MarketError>;
    fn save_team(&mut self, team: &Team) -> Result<(), MarketError>;
    fn delete_team(&mut self, id: TeamId) -> Result<(), MarketError>;

    fn player(&mut self, id: PlayerId) -> Result<Player, MarketError>;
    fn players_of(&mut self, team_id: TeamId) -> Result<Vec<Player>, MarketError>;
    fn insert_player(&mut self, player: &Player) -> Result<PlayerId, MarketError>;
    fn save_player(&mut self, player: &Player) -> Result<(), MarketError>;
    fn delete_player(&mut self, id: PlayerId) -> Result<(), MarketError>;

    fn listing(&mut self, id: ListingId) -> Result<Listing, MarketError>;
    fn listing_for_player(&mut self, player_id: PlayerId) -> Result<Option<Listing>, MarketError>;
    /// Fails with `AlreadyListed` when the player already has a listing.
    fn insert_listing(&mut self, listing: &Listing) -> Result<ListingId, MarketError>;
    fn delete_listing(&mut self, id: ListingId) -> Result<(), MarketError>;

    fn append_history(&mut self, record: &TransferRecord) -> Result<TransferId, MarketError>;
    /// Matching records, oldest first.
    fn history(&mut self, filter: &HistoryFilter) -> Result<Vec<TransferRecord>, MarketError>;
}

/// A store that can run a closure as one atomic unit of work.
pub trait StorePort: Send + Sync {
    /// Commits everything `work` did when it returns `Ok`, and discards all of
    /// it when it returns `Err`. The error is handed back unchanged.
    fn transaction<T, F>(&self, work: F) -> Result<T, MarketError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, MarketError>;
}
