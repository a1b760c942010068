//! Transfer execution.
//!
//! A transfer walks `Initiated -> Validated -> RosterUpdated -> FundsSettled ->
//! HistoryRecorded -> ListingClosed`. Every precondition is checked before the
//! first write, and every write goes through the caller's unit of work, so a
//! failure at any step is undone by the store and the error is returned as-is.
//!
//! Ordering: the player leaves the seller, the price bump is applied, then the
//! player joins the buyer. Both recalculated team values therefore reflect the
//! bumped price, while budgets move by the original asking price.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::error::MarketError;
use super::history::TransferRecord;
use super::listing::Listing;
use super::money::{checked_add, checked_sub};
use super::player::Player;
use super::roster::RosterPolicy;
use super::team::Team;
use super::valuation::{PriceBump, team_value};
use super::{ListingId, TeamId};
use crate::ports::random_port::RandomSource;
use crate::ports::store_port::UnitOfWork;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Initiated,
    Validated,
    RosterUpdated,
    FundsSettled,
    HistoryRecorded,
    ListingClosed,
    Failed,
}

impl TransferState {
    /// The state that follows on the success path.
    pub fn next(self) -> Option<TransferState> {
        match self {
            TransferState::Initiated => Some(TransferState::Validated),
            TransferState::Validated => Some(TransferState::RosterUpdated),
            TransferState::RosterUpdated => Some(TransferState::FundsSettled),
            TransferState::FundsSettled => Some(TransferState::HistoryRecorded),
            TransferState::HistoryRecorded => Some(TransferState::ListingClosed),
            TransferState::ListingClosed | TransferState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

/// Market rules a transfer is executed under.
#[derive(Clone, Copy)]
pub struct TransferRules<'a> {
    pub roster: &'a RosterPolicy,
    pub price_bump: &'a PriceBump,
    pub random: &'a dyn RandomSource,
}

/// What a completed transfer changed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub listing: Listing,
    pub record: TransferRecord,
    pub player: Player,
    pub previous_price: Decimal,
    pub seller: Option<Team>,
    pub buyer: Team,
    pub states: Vec<TransferState>,
}

#[derive(Debug)]
pub struct Transfer {
    listing_id: ListingId,
    buyer_id: TeamId,
    state: TransferState,
    states: Vec<TransferState>,
}

impl Transfer {
    pub fn new(listing_id: ListingId, buyer_id: TeamId) -> Self {
        Transfer {
            listing_id,
            buyer_id,
            state: TransferState::Initiated,
            states: vec![TransferState::Initiated],
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// States visited so far, in order.
    pub fn states(&self) -> &[TransferState] {
        &self.states
    }

    /// Run the transfer inside `uow`. On error the transfer ends in `Failed`
    /// and the caller must discard the unit of work.
    pub fn execute(
        &mut self,
        uow: &mut dyn UnitOfWork,
        rules: TransferRules<'_>,
        now: DateTime<Utc>,
    ) -> Result<TransferOutcome, MarketError> {
        if self.state != TransferState::Initiated {
            return Err(MarketError::validation(
                "transfer",
                format!("cannot execute from state {:?}", self.state),
            ));
        }
        self.run(uow, rules, now).inspect_err(|err| {
            tracing::warn!(
                listing_id = self.listing_id,
                buyer_id = self.buyer_id,
                reached = ?self.state,
                error = %err,
                "transfer failed"
            );
            self.state = TransferState::Failed;
            self.states.push(TransferState::Failed);
        })
    }

    fn advance(&mut self, next: TransferState) {
        debug_assert_eq!(self.state.next(), Some(next));
        self.state = next;
        self.states.push(next);
        tracing::debug!(listing_id = self.listing_id, state = ?next, "transfer advanced");
    }

    fn run(
        &mut self,
        uow: &mut dyn UnitOfWork,
        rules: TransferRules<'_>,
        now: DateTime<Utc>,
    ) -> Result<TransferOutcome, MarketError> {
        let listing = uow.listing(self.listing_id)?;
        let mut player = uow.player(listing.player_id)?;
        let mut buyer = uow.team(self.buyer_id)?;
        let mut seller = match player.team_id {
            Some(id) => Some(uow.team(id)?),
            None => None,
        };
        let asking = listing.asking_price;

        if seller.as_ref().is_some_and(|s| s.id == buyer.id) {
            return Err(MarketError::SameTeamTransfer { team_id: buyer.id });
        }
        if buyer.budget < asking {
            return Err(MarketError::InsufficientBudget {
                team_id: buyer.id,
                budget: buyer.budget,
                required: asking,
            });
        }
        rules.roster.check_capacity(&buyer, player.category)?;
        self.advance(TransferState::Validated);

        if let Some(seller) = seller.as_mut() {
            rules.roster.remove(seller, &mut player)?;
        }
        let previous_price = player.price;
        player.price = rules.price_bump.bump(previous_price, rules.random)?;
        rules.roster.add(&mut buyer, &mut player)?;
        uow.save_player(&player)?;
        self.advance(TransferState::RosterUpdated);

        if let Some(seller) = seller.as_mut() {
            seller.budget = checked_add("budget", seller.budget, asking)?;
            seller.value = team_value(seller, &uow.players_of(seller.id)?)?;
            uow.save_team(seller)?;
        }
        buyer.budget = checked_sub("budget", buyer.budget, asking)?;
        buyer.value = team_value(&buyer, &uow.players_of(buyer.id)?)?;
        uow.save_team(&buyer)?;
        self.advance(TransferState::FundsSettled);

        let mut record = TransferRecord {
            id: 0,
            player_id: player.id,
            sell_price: asking,
            selling_team: seller.as_ref().map(|s| s.id),
            buying_team: buyer.id,
            transferred_at: now,
        };
        record.id = uow.append_history(&record)?;
        self.advance(TransferState::HistoryRecorded);

        uow.delete_listing(listing.id)?;
        self.advance(TransferState::ListingClosed);

        Ok(TransferOutcome {
            listing,
            record,
            player,
            previous_price,
            seller,
            buyer,
            states: self.states.clone(),
        })
    }
}
