//! The transfer market service.
//!
//! Each public operation is one unit of work against the store: it either
//! commits in full or leaves nothing behind.

use chrono::Utc;
use rust_decimal::Decimal;

use super::category::Category;
use super::error::{Entity, MarketError};
use super::generation::{full_squad, random_country, random_team_name};
use super::history::{HistoryFilter, TransferRecord};
use super::listing::{Listing, ListingCriteria};
use super::market_config::MarketConfig;
use super::money::round_money;
use super::player::{Player, normalize_country, validate_price};
use super::team::Team;
use super::transfer::{Transfer, TransferOutcome, TransferRules};
use super::valuation::team_value;
use super::{ListingId, PlayerId, TeamId, UserId};
use crate::ports::random_port::RandomSource;
use crate::ports::search_port::ListingSearchPort;
use crate::ports::store_port::{StorePort, UnitOfWork};

/// A team together with the players it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamOverview {
    pub team: Team,
    pub players: Vec<Player>,
}

pub struct TransferMarket<S, R> {
    store: S,
    random: R,
    config: MarketConfig,
}

impl<S: StorePort, R: RandomSource> TransferMarket<S, R> {
    pub fn new(store: S, random: R, config: MarketConfig) -> Self {
        TransferMarket {
            store,
            random,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    fn rules(&self) -> TransferRules<'_> {
        TransferRules {
            roster: &self.config.roster,
            price_bump: &self.config.price_bump,
            random: &self.random,
        }
    }

    /// Put a player on the transfer list. The player stays on its roster
    /// until bought.
    pub fn list_player(
        &self,
        player_id: PlayerId,
        asking_price: Decimal,
    ) -> Result<Listing, MarketError> {
        let mut listing = Listing::new(player_id, asking_price, Utc::now())?;
        let listing = self.store.transaction(|uow| {
            uow.player(player_id)?;
            if uow.listing_for_player(player_id)?.is_some() {
                return Err(MarketError::AlreadyListed { player_id });
            }
            listing.id = uow.insert_listing(&listing)?;
            Ok(listing)
        })?;
        tracing::info!(
            listing_id = listing.id,
            player_id,
            asking_price = %listing.asking_price,
            "player listed"
        );
        Ok(listing)
    }

    pub fn delist_player(&self, player_id: PlayerId) -> Result<Listing, MarketError> {
        let listing = self.store.transaction(|uow| {
            let listing = uow
                .listing_for_player(player_id)?
                .ok_or(MarketError::NotListed { player_id })?;
            uow.delete_listing(listing.id)?;
            Ok(listing)
        })?;
        tracing::info!(listing_id = listing.id, player_id, "player delisted");
        Ok(listing)
    }

    pub fn active_listing_for(&self, player_id: PlayerId) -> Result<Option<Listing>, MarketError> {
        self.store.transaction(|uow| {
            uow.player(player_id)?;
            uow.listing_for_player(player_id)
        })
    }

    /// Buy a listed player for `buying_team_id` at the asking price.
    pub fn buy_player(
        &self,
        listing_id: ListingId,
        buying_team_id: TeamId,
    ) -> Result<TransferOutcome, MarketError> {
        let rules = self.rules();
        let now = Utc::now();
        let outcome = self.store.transaction(|uow| {
            Transfer::new(listing_id, buying_team_id).execute(uow, rules, now)
        })?;
        tracing::info!(
            transfer_id = outcome.record.id,
            player_id = outcome.player.id,
            seller = ?outcome.record.selling_team,
            buyer = outcome.buyer.id,
            sell_price = %outcome.record.sell_price,
            new_price = %outcome.player.price,
            "transfer completed"
        );
        Ok(outcome)
    }

    pub fn recalculate_team_value(&self, team_id: TeamId) -> Result<Decimal, MarketError> {
        self.store.transaction(|uow| {
            let mut team = uow.team(team_id)?;
            team.value = team_value(&team, &uow.players_of(team_id)?)?;
            uow.save_team(&team)?;
            Ok(team.value)
        })
    }

    /// Create a team with a full squad at the configured quotas. Blank name
    /// or country are filled in at random.
    pub fn generate_team(
        &self,
        name: Option<&str>,
        country: Option<&str>,
        owner: Option<UserId>,
    ) -> Result<TeamOverview, MarketError> {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => random_team_name(&self.random),
        };
        let country = match country.filter(|c| !c.trim().is_empty()) {
            Some(c) => normalize_country(c)?,
            None => random_country(&self.random),
        };
        let squad = full_squad(
            &self.config.roster,
            self.config.initial_player_price,
            &self.random,
        );
        let roster = self.config.roster;
        let budget = self.config.starting_budget;

        let overview = self.store.transaction(|uow| {
            if let Some(owner_id) = owner {
                if let Some(existing) = uow.team_for_owner(owner_id)? {
                    return Err(MarketError::OwnerHasTeam {
                        owner_id,
                        team_id: existing.id,
                    });
                }
            }
            let mut team = Team::new(name, country, budget);
            team.owner = owner;
            team.id = uow.insert_team(&team)?;

            let mut players = Vec::with_capacity(squad.len());
            for mut player in squad {
                roster.add(&mut team, &mut player)?;
                player.id = uow.insert_player(&player)?;
                players.push(player);
            }
            team.value = team_value(&team, &players)?;
            uow.save_team(&team)?;
            Ok(TeamOverview { team, players })
        })?;
        tracing::info!(
            team_id = overview.team.id,
            players = overview.players.len(),
            value = %overview.team.value,
            "team generated"
        );
        Ok(overview)
    }

    /// Create a free agent.
    pub fn create_player(
        &self,
        first_name: &str,
        last_name: &str,
        country: &str,
        age: u8,
        category: Category,
        price: Decimal,
    ) -> Result<Player, MarketError> {
        let mut player = Player::validated(first_name, last_name, country, age, category, price)?;
        player.id = self.store.transaction(|uow| uow.insert_player(&player))?;
        tracing::info!(player_id = player.id, category = %player.category, "player created");
        Ok(player)
    }

    /// Add a free agent to a team's roster.
    pub fn sign_free_agent(&self, team_id: TeamId, player_id: PlayerId) -> Result<Team, MarketError> {
        let roster = self.config.roster;
        let team = self.store.transaction(|uow| {
            let mut team = uow.team(team_id)?;
            let mut player = uow.player(player_id)?;
            roster.add(&mut team, &mut player)?;
            uow.save_player(&player)?;
            team.value = team_value(&team, &uow.players_of(team_id)?)?;
            uow.save_team(&team)?;
            Ok(team)
        })?;
        tracing::info!(team_id, player_id, "free agent signed");
        Ok(team)
    }

    /// Take a player off its team, making it a free agent. Any active listing
    /// is closed.
    pub fn release_player(&self, player_id: PlayerId) -> Result<Player, MarketError> {
        let roster = self.config.roster;
        let player = self.store.transaction(|uow| {
            let mut player = uow.player(player_id)?;
            let team_id = player
                .team_id
                .ok_or_else(|| MarketError::validation("player", "is already a free agent"))?;
            let mut team = uow.team(team_id)?;
            roster.remove(&mut team, &mut player)?;
            close_listing(uow, player_id)?;
            uow.save_player(&player)?;
            team.value = team_value(&team, &uow.players_of(team_id)?)?;
            uow.save_team(&team)?;
            Ok(player)
        })?;
        tracing::info!(player_id, "player released");
        Ok(player)
    }

    /// Change a player's price and keep its team's value in step.
    pub fn reprice_player(&self, player_id: PlayerId, price: Decimal) -> Result<Player, MarketError> {
        validate_price(price)?;
        self.store.transaction(|uow| {
            let mut player = uow.player(player_id)?;
            player.price = round_money(price);
            uow.save_player(&player)?;
            if let Some(team_id) = player.team_id {
                let mut team = uow.team(team_id)?;
                team.value = team_value(&team, &uow.players_of(team_id)?)?;
                uow.save_team(&team)?;
            }
            Ok(player)
        })
    }

    /// Delete a team. Its players become free agents and their listings close.
    /// Returns the released player ids.
    pub fn delete_team(&self, team_id: TeamId) -> Result<Vec<PlayerId>, MarketError> {
        let released = self.store.transaction(|uow| {
            uow.team(team_id)?;
            let mut released = Vec::new();
            for mut player in uow.players_of(team_id)? {
                close_listing(uow, player.id)?;
                player.team_id = None;
                uow.save_player(&player)?;
                released.push(player.id);
            }
            uow.delete_team(team_id)?;
            Ok(released)
        })?;
        tracing::info!(team_id, released = released.len(), "team deleted");
        Ok(released)
    }

    pub fn delete_player(&self, player_id: PlayerId) -> Result<(), MarketError> {
        let roster = self.config.roster;
        self.store.transaction(|uow| {
            let mut player = uow.player(player_id)?;
            close_listing(uow, player_id)?;
            if let Some(team_id) = player.team_id {
                let mut team = uow.team(team_id)?;
                roster.remove(&mut team, &mut player)?;
                uow.save_player(&player)?;
                team.value = team_value(&team, &uow.players_of(team_id)?)?;
                uow.save_team(&team)?;
            }
            uow.delete_player(player_id)
        })?;
        tracing::info!(player_id, "player deleted");
        Ok(())
    }

    pub fn player(&self, player_id: PlayerId) -> Result<Player, MarketError> {
        self.store.transaction(|uow| uow.player(player_id))
    }

    pub fn team_overview(&self, team_id: TeamId) -> Result<TeamOverview, MarketError> {
        self.store.transaction(|uow| {
            Ok(TeamOverview {
                team: uow.team(team_id)?,
                players: uow.players_of(team_id)?,
            })
        })
    }

    /// Whether a team's counters match the players it owns.
    pub fn audit_roster(&self, team_id: TeamId) -> Result<bool, MarketError> {
        let overview = self.team_overview(team_id)?;
        Ok(self.config.roster.audit(&overview.team, &overview.players))
    }

    /// Listings matching `criteria`, skipping any the search returned that
    /// have closed since.
    pub fn search_listings(
        &self,
        search: &dyn ListingSearchPort,
        criteria: &ListingCriteria,
    ) -> Result<Vec<Listing>, MarketError> {
        let ids = search.search_listings(criteria)?;
        self.store.transaction(|uow| {
            let mut listings = Vec::with_capacity(ids.len());
            for id in ids {
                match uow.listing(id) {
                    Ok(listing) => listings.push(listing),
                    Err(MarketError::NotFound {
                        entity: Entity::Listing,
                        ..
                    }) => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(listings)
        })
    }

    pub fn transfer_history(&self, filter: &HistoryFilter) -> Result<Vec<TransferRecord>, MarketError> {
        self.store.transaction(|uow| uow.history(filter))
    }
}

fn close_listing(uow: &mut dyn UnitOfWork, player_id: PlayerId) -> Result<(), MarketError> {
    if let Some(listing) = uow.listing_for_player(player_id)? {
        uow.delete_listing(listing.id)?;
    }
    Ok(())
}
