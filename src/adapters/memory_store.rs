//! In-process store.
//!
//! One mutex guards the whole market for the length of a unit of work, so
//! transactions are serialized. Each write records the value it replaced; a
//! unit of work that is not committed, whether it returned an error or
//! panicked, replays that log backwards before the lock is released.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::error::{Entity, MarketError};
use crate::domain::history::{HistoryFilter, TransferRecord};
use crate::domain::listing::{Listing, ListingCriteria};
use crate::domain::player::Player;
use crate::domain::team::Team;
use crate::domain::{ListingId, PlayerId, TeamId, TransferId, UserId};
use crate::ports::search_port::ListingSearchPort;
use crate::ports::store_port::{StorePort, UnitOfWork};

#[derive(Debug, Default, Clone, Copy)]
struct NextIds {
    team: i64,
    player: i64,
    listing: i64,
    transfer: i64,
}

#[derive(Debug, Default)]
struct MarketState {
    teams: BTreeMap<TeamId, Team>,
    players: BTreeMap<PlayerId, Player>,
    listings: BTreeMap<ListingId, Listing>,
    history: Vec<TransferRecord>,
    ids: NextIds,
}

enum Undo {
    Team(TeamId, Option<Team>),
    Player(PlayerId, Option<Player>),
    Listing(ListingId, Option<Listing>),
    History,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MarketState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A poisoned lock is recovered: a panicking unit of work has already
    /// rolled its writes back by the time the guard is released.
    fn lock(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorePort for MemoryStore {
    fn transaction<T, F>(&self, work: F) -> Result<T, MarketError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, MarketError>,
    {
        let mut guard = self.lock();
        let mut uow = MemoryUnitOfWork {
            ids_at_start: guard.ids,
            state: &mut guard,
            undo: Vec::new(),
            committed: false,
        };
        let result = work(&mut uow);
        if let Err(err) = &result {
            tracing::debug!(undone = uow.undo.len(), error = %err, "memory unit of work rolled back");
        } else {
            uow.committed = true;
        }
        result
    }
}

struct MemoryUnitOfWork<'a> {
    state: &'a mut MarketState,
    undo: Vec<Undo>,
    ids_at_start: NextIds,
    committed: bool,
}

impl MemoryUnitOfWork<'_> {
    fn rollback(&mut self) {
        for entry in std::mem::take(&mut self.undo).into_iter().rev() {
            match entry {
                Undo::Team(id, previous) => restore(&mut self.state.teams, id, previous),
                Undo::Player(id, previous) => restore(&mut self.state.players, id, previous),
                Undo::Listing(id, previous) => restore(&mut self.state.listings, id, previous),
                Undo::History => {
                    self.state.history.pop();
                }
            }
        }
        self.state.ids = self.ids_at_start;
    }
}

impl Drop for MemoryUnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

fn restore<V>(map: &mut BTreeMap<i64, V>, id: i64, previous: Option<V>) {
    match previous {
        Some(value) => {
            map.insert(id, value);
        }
        None => {
            map.remove(&id);
        }
    }
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl UnitOfWork for MemoryUnitOfWork<'_> {
    fn team(&mut self, id: TeamId) -> Result<Team, MarketError> {
        self.state
            .teams
            .get(&id)
            .cloned()
            .ok_or(MarketError::not_found(Entity::Team, id))
    }

    fn team_for_owner(&mut self, owner: UserId) -> Result<Option<Team>, MarketError> {
        Ok(self
            .state
            .teams
            .values()
            .find(|t| t.owner == Some(owner))
            .cloned())
    }

    fn teams(&mut self) -> Result<Vec<Team>, MarketError> {
        Ok(self.state.teams.values().cloned().collect())
    }

    fn insert_team(&mut self, team: &Team) -> Result<TeamId, MarketError> {
        let id = next(&mut self.state.ids.team);
        let mut stored = team.clone();
        stored.id = id;
        self.state.teams.insert(id, stored);
        self.undo.push(Undo::Team(id, None));
        Ok(id)
    }

    fn save_team(&mut self, team: &Team) -> Result<(), MarketError> {
        if !self.state.teams.contains_key(&team.id) {
            return Err(MarketError::not_found(Entity::Team, team.id));
        }
        let previous = self.state.teams.insert(team.id, team.clone());
        self.undo.push(Undo::Team(team.id, previous));
        Ok(())
    }

    fn delete_team(&mut self, id: TeamId) -> Result<(), MarketError> {
        if self.state.players.values().any(|p| p.team_id == Some(id)) {
            return Err(MarketError::storage(format!("team {id} still has players")));
        }
        let previous = self
            .state
            .teams
            .remove(&id)
            .ok_or(MarketError::not_found(Entity::Team, id))?;
        self.undo.push(Undo::Team(id, Some(previous)));
        Ok(())
    }

    fn player(&mut self, id: PlayerId) -> Result<Player, MarketError> {
        self.state
            .players
            .get(&id)
            .cloned()
            .ok_or(MarketError::not_found(Entity::Player, id))
    }

    fn players_of(&mut self, team_id: TeamId) -> Result<Vec<Player>, MarketError> {
        Ok(self
            .state
            .players
            .values()
            .filter(|p| p.team_id == Some(team_id))
            .cloned()
            .collect())
    }

    fn insert_player(&mut self, player: &Player) -> Result<PlayerId, MarketError> {
        if let Some(team_id) = player.team_id {
            if !self.state.teams.contains_key(&team_id) {
                return Err(MarketError::not_found(Entity::Team, team_id));
            }
        }
        let id = next(&mut self.state.ids.player);
        let mut stored = player.clone();
        stored.id = id;
        self.state.players.insert(id, stored);
        self.undo.push(Undo::Player(id, None));
        Ok(id)
    }

    fn save_player(&mut self, player: &Player) -> Result<(), MarketError> {
        if !self.state.players.contains_key(&player.id) {
            return Err(MarketError::not_found(Entity::Player, player.id));
        }
        if let Some(team_id) = player.team_id {
            if !self.state.teams.contains_key(&team_id) {
                return Err(MarketError::not_found(Entity::Team, team_id));
            }
        }
        let previous = self.state.players.insert(player.id, player.clone());
        self.undo.push(Undo::Player(player.id, previous));
        Ok(())
    }

    fn delete_player(&mut self, id: PlayerId) -> Result<(), MarketError> {
        if self.state.listings.values().any(|l| l.player_id == id) {
            return Err(MarketError::storage(format!("player {id} is still listed")));
        }
        let previous = self
            .state
            .players
            .remove(&id)
            .ok_or(MarketError::not_found(Entity::Player, id))?;
        self.undo.push(Undo::Player(id, Some(previous)));
        Ok(())
    }

    fn listing(&mut self, id: ListingId) -> Result<Listing, MarketError> {
        self.state
            .listings
            .get(&id)
            .cloned()
            .ok_or(MarketError::not_found(Entity::Listing, id))
    }

    fn listing_for_player(&mut self, player_id: PlayerId) -> Result<Option<Listing>, MarketError> {
        Ok(self
            .state
            .listings
            .values()
            .find(|l| l.player_id == player_id)
            .cloned())
    }

    fn insert_listing(&mut self, listing: &Listing) -> Result<ListingId, MarketError> {
        if !self.state.players.contains_key(&listing.player_id) {
            return Err(MarketError::not_found(Entity::Player, listing.player_id));
        }
        if self.listing_for_player(listing.player_id)?.is_some() {
            return Err(MarketError::AlreadyListed {
                player_id: listing.player_id,
            });
        }
        let id = next(&mut self.state.ids.listing);
        let mut stored = listing.clone();
        stored.id = id;
        self.state.listings.insert(id, stored);
        self.undo.push(Undo::Listing(id, None));
        Ok(id)
    }

    fn delete_listing(&mut self, id: ListingId) -> Result<(), MarketError> {
        let previous = self
            .state
            .listings
            .remove(&id)
            .ok_or(MarketError::not_found(Entity::Listing, id))?;
        self.undo.push(Undo::Listing(id, Some(previous)));
        Ok(())
    }

    fn append_history(&mut self, record: &TransferRecord) -> Result<TransferId, MarketError> {
        let id = next(&mut self.state.ids.transfer);
        let mut stored = record.clone();
        stored.id = id;
        self.state.history.push(stored);
        self.undo.push(Undo::History);
        Ok(id)
    }

    fn history(&mut self, filter: &HistoryFilter) -> Result<Vec<TransferRecord>, MarketError> {
        Ok(self
            .state
            .history
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

impl ListingSearchPort for MemoryStore {
    fn search_listings(&self, criteria: &ListingCriteria) -> Result<Vec<ListingId>, MarketError> {
        let state = self.lock();
        Ok(state
            .listings
            .values()
            .filter(|listing| {
                let Some(player) = state.players.get(&listing.player_id) else {
                    return false;
                };
                let team_name = player
                    .team_id
                    .and_then(|id| state.teams.get(&id))
                    .map(|t| t.name.as_str());
                criteria.matches(listing, player, team_name)
            })
            .map(|listing| listing.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn team(name: &str) -> Team {
        Team::new(name, "GB", dec!(5000000))
    }

    fn free_agent(last_name: &str) -> Player {
        Player::validated("Sam", last_name, "GB", 24, Category::Defender, dec!(1000000)).unwrap()
    }

    #[test]
    fn committed_work_is_visible() {
        let store = MemoryStore::new();
        let id = store.transaction(|uow| uow.insert_team(&team("Rovers"))).unwrap();
        let loaded = store.transaction(|uow| uow.team(id)).unwrap();
        assert_eq!(loaded.name, "Rovers");
        assert_eq!(loaded.id, id);
    }

    #[test]
    fn failed_work_is_rolled_back() {
        let store = MemoryStore::new();
        let team_id = store.transaction(|uow| uow.insert_team(&team("Rovers"))).unwrap();

        let result: Result<(), MarketError> = store.transaction(|uow| {
            let mut t = uow.team(team_id)?;
            t.budget = dec!(1);
            uow.save_team(&t)?;
            let player_id = uow.insert_player(&free_agent("Gone"))?;
            uow.insert_listing(&Listing::new(player_id, dec!(10), Utc::now())?)?;
            uow.append_history(&TransferRecord {
                id: 0,
                player_id,
                sell_price: dec!(10),
                selling_team: None,
                buying_team: team_id,
                transferred_at: Utc::now(),
            })?;
            Err(MarketError::storage("boom"))
        });
        assert!(matches!(result, Err(MarketError::Storage { .. })));

        store
            .transaction(|uow| {
                assert_eq!(uow.team(team_id)?.budget, dec!(5000000));
                assert!(uow.players_of(team_id)?.is_empty());
                assert!(matches!(
                    uow.player(1),
                    Err(MarketError::NotFound { entity: Entity::Player, .. })
                ));
                assert!(uow.history(&HistoryFilter::default())?.is_empty());
                Ok(())
            })
            .unwrap();

        let reused = store.transaction(|uow| uow.insert_player(&free_agent("Next"))).unwrap();
        assert_eq!(reused, 1);
    }

    #[test]
    fn panicking_work_is_rolled_back_and_store_stays_usable() {
        let store = MemoryStore::new();
        let team_id = store.transaction(|uow| uow.insert_team(&team("Rovers"))).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<(), MarketError> = store.transaction(|uow| {
                let mut t = uow.team(team_id)?;
                t.budget = dec!(1);
                uow.save_team(&t)?;
                uow.insert_player(&free_agent("Halfway"))?;
                panic!("arithmetic blew up mid-transfer");
            });
        }));
        assert!(outcome.is_err());

        let (budget, players) = store
            .transaction(|uow| Ok((uow.team(team_id)?.budget, uow.players_of(team_id)?)))
            .unwrap();
        assert_eq!(budget, dec!(5000000));
        assert!(players.is_empty());
        assert!(store.transaction(|uow| uow.player(1)).is_err());

        let next = store.transaction(|uow| uow.insert_player(&free_agent("After"))).unwrap();
        assert_eq!(next, 1);
    }

    #[test]
    fn second_listing_for_player_is_rejected() {
        let store = MemoryStore::new();
        let player_id = store.transaction(|uow| uow.insert_player(&free_agent("Once"))).unwrap();
        let first = Listing::new(player_id, dec!(10), Utc::now()).unwrap();
        let second = Listing::new(player_id, dec!(20), Utc::now()).unwrap();

        store.transaction(|uow| uow.insert_listing(&first)).unwrap();
        let err = store.transaction(|uow| uow.insert_listing(&second)).unwrap_err();
        assert!(matches!(err, MarketError::AlreadyListed { .. }));

        let kept = store
            .transaction(|uow| uow.listing_for_player(player_id))
            .unwrap()
            .unwrap();
        assert_eq!(kept.asking_price, dec!(10));
    }

    #[test]
    fn team_with_players_cannot_be_deleted() {
        let store = MemoryStore::new();
        let team_id = store.transaction(|uow| uow.insert_team(&team("Rovers"))).unwrap();
        store
            .transaction(|uow| {
                let mut p = free_agent("Stays");
                p.team_id = Some(team_id);
                uow.insert_player(&p)
            })
            .unwrap();

        let err = store.transaction(|uow| uow.delete_team(team_id)).unwrap_err();
        assert!(matches!(err, MarketError::Storage { .. }));
    }

    #[test]
    fn save_of_unknown_team_is_not_found() {
        let store = MemoryStore::new();
        let mut ghost = team("Ghost");
        ghost.id = 99;
        let err = store.transaction(|uow| uow.save_team(&ghost)).unwrap_err();
        assert!(matches!(err, MarketError::NotFound { entity: Entity::Team, id: 99 }));
        assert!(store.transaction(|uow| uow.teams()).unwrap().is_empty());
    }

    #[test]
    fn search_filters_by_team_name() {
        let store = MemoryStore::new();
        let listing_id = store
            .transaction(|uow| {
                let team_id = uow.insert_team(&team("Santos"))?;
                let mut p = free_agent("Listed");
                p.team_id = Some(team_id);
                let player_id = uow.insert_player(&p)?;
                uow.insert_player(&free_agent("Unlisted"))?;
                uow.insert_listing(&Listing::new(player_id, dec!(10), Utc::now())?)
            })
            .unwrap();

        let criteria = ListingCriteria {
            team_name: Some("san".into()),
            ..Default::default()
        };
        assert_eq!(store.search_listings(&criteria).unwrap(), vec![listing_id]);

        let criteria = ListingCriteria {
            team_name: Some("milan".into()),
            ..Default::default()
        };
        assert!(store.search_listings(&criteria).unwrap().is_empty());
    }
}
