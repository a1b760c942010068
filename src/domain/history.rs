//! Append-only record of completed transfers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{PlayerId, TeamId, TransferId};

#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub id: TransferId,
    pub player_id: PlayerId,
    /// The asking price the buyer paid, before the price bump.
    pub sell_price: Decimal,
    /// `None` when the player was a free agent.
    pub selling_team: Option<TeamId>,
    pub buying_team: TeamId,
    pub transferred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub player_id: Option<PlayerId>,
    /// Matches either side of the transfer.
    pub team_id: Option<TeamId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    pub fn for_player(player_id: PlayerId) -> Self {
        HistoryFilter {
            player_id: Some(player_id),
            ..Default::default()
        }
    }

    pub fn for_team(team_id: TeamId) -> Self {
        HistoryFilter {
            team_id: Some(team_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &TransferRecord) -> bool {
        if self.player_id.is_some_and(|id| record.player_id != id) {
            return false;
        }
        if let Some(team) = self.team_id {
            if record.buying_team != team && record.selling_team != Some(team) {
                return false;
            }
        }
        if self.since.is_some_and(|since| record.transferred_at < since) {
            return false;
        }
        if self.until.is_some_and(|until| record.transferred_at > until) {
            return false;
        }
        true
    }
}
