#![allow(dead_code)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Mutex;
use transfermarket::adapters::memory_store::MemoryStore;
use transfermarket::domain::category::Category;
use transfermarket::domain::error::MarketError;
use transfermarket::domain::history::{HistoryFilter, TransferRecord};
use transfermarket::domain::listing::{Listing, ListingCriteria};
use transfermarket::domain::market::{TeamOverview, TransferMarket};
use transfermarket::domain::market_config::MarketConfig;
use transfermarket::domain::money::MAX_MONEY;
use transfermarket::domain::player::Player;
use transfermarket::domain::team::Team;
use transfermarket::domain::{ListingId, PlayerId, TeamId, TransferId, UserId};
use transfermarket::ports::random_port::RandomSource;
use transfermarket::ports::search_port::ListingSearchPort;
use transfermarket::ports::store_port::{StorePort, UnitOfWork};

/// Always draws the same value, clamped into the requested range.
pub struct FixedRandom(pub i64);

impl RandomSource for FixedRandom {
    fn int_in_range(&self, low: i64, high: i64) -> i64 {
        self.0.clamp(low, high.max(low))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    SaveTeam,
    AppendHistory,
    DeleteListing,
}

/// A memory store whose units of work fail at a chosen write.
pub struct FaultyStore {
    inner: MemoryStore,
    fault: Mutex<Fault>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fault: Mutex::new(Fault::None),
        }
    }

    pub fn arm(&self, fault: Fault) {
        *self.fault.lock().unwrap() = fault;
    }
}

impl StorePort for FaultyStore {
    fn transaction<T, F>(&self, work: F) -> Result<T, MarketError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, MarketError>,
    {
        let fault = *self.fault.lock().unwrap();
        self.inner.transaction(|uow| {
            let mut faulty = FaultyUnitOfWork { inner: uow, fault };
            work(&mut faulty)
        })
    }
}

impl ListingSearchPort for FaultyStore {
    fn search_listings(&self, criteria: &ListingCriteria) -> Result<Vec<ListingId>, MarketError> {
        self.inner.search_listings(criteria)
    }
}

struct FaultyUnitOfWork<'a> {
    inner: &'a mut dyn UnitOfWork,
    fault: Fault,
}

impl FaultyUnitOfWork<'_> {
    fn trip(&self, at: Fault) -> Result<(), MarketError> {
        if self.fault == at {
            return Err(MarketError::storage(format!("injected failure at {at:?}")));
        }
        Ok(())
    }
}

impl UnitOfWork for FaultyUnitOfWork<'_> {
    fn team(&mut self, id: TeamId) -> Result<Team, MarketError> {
        self.inner.team(id)
    }
    fn team_for_owner(&mut self, owner: UserId) -> Result<Option<Team>, MarketError> {
        self.inner.team_for_owner(owner)
    }
    fn teams(&mut self) -> Result<Vec<Team>, MarketError> {
        self.inner.teams()
    }
    fn insert_team(&mut self, team: &Team) -> Result<TeamId, MarketError> {
        self.inner.insert_team(team)
    }
    fn save_team(&mut self, team: &Team) -> Result<(), MarketError> {
        self.trip(Fault::SaveTeam)?;
        self.inner.save_team(team)
    }
    fn delete_team(&mut self, id: TeamId) -> Result<(), MarketError> {
        self.inner.delete_team(id)
    }
    fn player(&mut self, id: PlayerId) -> Result<Player, MarketError> {
        self.inner.player(id)
    }
    fn players_of(&mut self, team_id: TeamId) -> Result<Vec<Player>, MarketError> {
        self.inner.players_of(team_id)
    }
    fn insert_player(&mut self, player: &Player) -> Result<PlayerId, MarketError> {
        self.inner.insert_player(player)
    }
    fn save_player(&mut self, player: &Player) -> Result<(), MarketError> {
        self.inner.save_player(player)
    }
    fn delete_player(&mut self, id: PlayerId) -> Result<(), MarketError> {
        self.inner.delete_player(id)
    }
    fn listing(&mut self, id: ListingId) -> Result<Listing, MarketError> {
        self.inner.listing(id)
    }
    fn listing_for_player(&mut self, player_id: PlayerId) -> Result<Option<Listing>, MarketError> {
        self.inner.listing_for_player(player_id)
    }
    fn insert_listing(&mut self, listing: &Listing) -> Result<ListingId, MarketError> {
        self.inner.insert_listing(listing)
    }
    fn delete_listing(&mut self, id: ListingId) -> Result<(), MarketError> {
        self.trip(Fault::DeleteListing)?;
        self.inner.delete_listing(id)
    }
    fn append_history(&mut self, record: &TransferRecord) -> Result<TransferId, MarketError> {
        self.trip(Fault::AppendHistory)?;
        self.inner.append_history(record)
    }
    fn history(&mut self, filter: &HistoryFilter) -> Result<Vec<TransferRecord>, MarketError> {
        self.inner.history(filter)
    }
}

pub const STARTING_BUDGET: Decimal = dec!(5000000);
pub const PLAYER_PRICE: Decimal = dec!(1000000);

/// A market whose price bump always draws 50%.
pub fn market_over<S: StorePort>(store: S) -> TransferMarket<S, FixedRandom> {
    TransferMarket::new(store, FixedRandom(50), MarketConfig::default())
}

pub fn memory_market() -> TransferMarket<MemoryStore, FixedRandom> {
    market_over(MemoryStore::new())
}

/// A team with no players and the default starting budget.
pub fn empty_team<S: StorePort, R: RandomSource>(
    market: &TransferMarket<S, R>,
    name: &str,
) -> TeamId {
    team_with_budget(market, name, STARTING_BUDGET)
}

pub fn team_with_budget<S: StorePort, R: RandomSource>(
    market: &TransferMarket<S, R>,
    name: &str,
    budget: Decimal,
) -> TeamId {
    let team = Team::new(name, "GB", budget);
    market
        .store()
        .transaction(|uow| uow.insert_team(&team))
        .unwrap()
}

pub fn free_agent<S: StorePort, R: RandomSource>(
    market: &TransferMarket<S, R>,
    last_name: &str,
    category: Category,
) -> PlayerId {
    market
        .create_player("Test", last_name, "GB", 25, category, PLAYER_PRICE)
        .unwrap()
        .id
}

/// Create a player and sign it to `team_id`.
pub fn signed_player<S: StorePort, R: RandomSource>(
    market: &TransferMarket<S, R>,
    team_id: TeamId,
    last_name: &str,
    category: Category,
) -> PlayerId {
    let player_id = free_agent(market, last_name, category);
    market.sign_free_agent(team_id, player_id).unwrap();
    player_id
}

pub fn team<S: StorePort, R: RandomSource>(market: &TransferMarket<S, R>, id: TeamId) -> Team {
    market.team_overview(id).unwrap().team
}

/// Everything a failed operation must leave untouched.
#[derive(Debug, PartialEq)]
pub struct Snapshot {
    pub teams: Vec<TeamOverview>,
    pub listings: Vec<Listing>,
    pub history: Vec<TransferRecord>,
}

pub fn snapshot<S: StorePort + ListingSearchPort, R: RandomSource>(
    market: &TransferMarket<S, R>,
) -> Snapshot {
    let team_ids: Vec<TeamId> = market
        .store()
        .transaction(|uow| Ok(uow.teams()?.into_iter().map(|t| t.id).collect()))
        .unwrap();
    Snapshot {
        teams: team_ids
            .into_iter()
            .map(|id| market.team_overview(id).unwrap())
            .collect(),
        listings: market
            .search_listings(market.store(), &ListingCriteria::default())
            .unwrap(),
        history: market.transfer_history(&HistoryFilter::default()).unwrap(),
    }
}

/// Create a player priced at the money cap and sign it to `team_id`.
pub fn cap_priced_player<S: StorePort, R: RandomSource>(
    market: &TransferMarket<S, R>,
    team_id: TeamId,
) -> PlayerId {
    let player_id = market
        .create_player("Record", "Signing", "GB", 27, Category::Forward, MAX_MONEY)
        .unwrap()
        .id;
    market.sign_free_agent(team_id, player_id).unwrap();
    player_id
}

/// Sell a cap-priced player for the full cap to a buyer holding exactly
/// that much. The 50% bump saturates at the cap.
pub fn sell_at_the_cap<S: StorePort + ListingSearchPort, R: RandomSource>(
    market: &TransferMarket<S, R>,
) {
    let seller = empty_team(market, "Seller");
    let buyer = team_with_budget(market, "Buyer", MAX_MONEY);
    let star = cap_priced_player(market, seller);
    assert_eq!(team(market, seller).value, MAX_MONEY);

    let listing = market.list_player(star, MAX_MONEY).unwrap();
    let outcome = market.buy_player(listing.id, buyer).unwrap();
    assert_eq!(outcome.previous_price, MAX_MONEY);
    assert_eq!(outcome.player.price, MAX_MONEY);

    let buyer_team = team(market, buyer);
    assert_eq!(buyer_team.budget, Decimal::ZERO);
    assert_eq!(buyer_team.value, MAX_MONEY);
    let seller_team = team(market, seller);
    assert_eq!(seller_team.budget, STARTING_BUDGET + MAX_MONEY);
    assert_eq!(seller_team.value, Decimal::ZERO);
    assert_eq!(market.player(star).unwrap().price, MAX_MONEY);
    assert!(market.audit_roster(buyer).unwrap());
}

/// Amounts one cent over the cap are refused without touching anything.
pub fn refuse_amounts_over_the_cap<S: StorePort + ListingSearchPort, R: RandomSource>(
    market: &TransferMarket<S, R>,
) {
    let club = empty_team(market, "Club");
    let player = signed_player(market, club, "Steady", Category::Midfielder);
    let before = snapshot(market);
    let over = MAX_MONEY + dec!(0.01);

    assert!(matches!(
        market.create_player("Too", "Dear", "GB", 25, Category::Forward, over),
        Err(MarketError::Validation { .. })
    ));
    assert!(matches!(
        market.reprice_player(player, over),
        Err(MarketError::Validation { .. })
    ));
    assert!(matches!(
        market.list_player(player, over),
        Err(MarketError::InvalidPrice { .. })
    ));
    assert!(matches!(
        market.list_player(player, Decimal::MAX),
        Err(MarketError::InvalidPrice { .. })
    ));

    assert_eq!(snapshot(market), before);
    assert_eq!(market.player(player).unwrap().price, PLAYER_PRICE);
    assert_eq!(market.active_listing_for(player).unwrap(), None);
}
