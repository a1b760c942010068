//! Roster quotas: whether a team may take on or give up a player.
//!
//! Every check runs before anything is touched, so a rejected add or remove
//! leaves both the team and the player exactly as they were.

use super::category::Category;
use super::error::MarketError;
use super::player::Player;
use super::team::{RosterCounts, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterPolicy {
    pub max_players: u32,
    pub goalkeepers: u32,
    pub defenders: u32,
    pub midfielders: u32,
    pub forwards: u32,
}

impl Default for RosterPolicy {
    fn default() -> Self {
        RosterPolicy {
            max_players: 20,
            goalkeepers: 3,
            defenders: 6,
            midfielders: 6,
            forwards: 5,
        }
    }
}

impl RosterPolicy {
    pub fn quota(&self, category: Category) -> u32 {
        match category {
            Category::Goalkeeper => self.goalkeepers,
            Category::Defender => self.defenders,
            Category::Midfielder => self.midfielders,
            Category::Forward => self.forwards,
        }
    }

    pub fn can_add(&self, team: &Team, category: Category) -> bool {
        self.check_capacity(team, category).is_ok()
    }

    /// Total cap first, then the position quota.
    pub fn check_capacity(&self, team: &Team, category: Category) -> Result<(), MarketError> {
        if team.roster.total() >= self.max_players {
            return Err(MarketError::RosterFull {
                team_id: team.id,
                max: self.max_players,
            });
        }
        let max = self.quota(category);
        if team.roster.get(category) >= max {
            return Err(MarketError::PositionFull {
                team_id: team.id,
                category,
                max,
            });
        }
        Ok(())
    }

    pub fn add(&self, team: &mut Team, player: &mut Player) -> Result<(), MarketError> {
        if let Some(owner) = player.team_id {
            return Err(MarketError::PlayerAlreadyOnTeam {
                player_id: player.id,
                team_id: owner,
            });
        }
        self.check_capacity(team, player.category)?;

        team.roster.increment(player.category);
        player.team_id = Some(team.id);
        Ok(())
    }

    pub fn remove(&self, team: &mut Team, player: &mut Player) -> Result<(), MarketError> {
        let not_on_team = || MarketError::PlayerNotOnTeam {
            player_id: player.id,
            team_id: team.id,
        };
        if player.team_id != Some(team.id) {
            return Err(not_on_team());
        }
        if !team.roster.decrement(player.category) {
            return Err(not_on_team());
        }
        player.team_id = None;
        Ok(())
    }

    /// Whether the stored counters agree with the players the team actually owns
    /// and respect the quotas.
    pub fn audit(&self, team: &Team, players: &[Player]) -> bool {
        let actual = RosterCounts::tally(players.iter().filter(|p| p.team_id == Some(team.id)));
        actual == team.roster
            && actual.total() <= self.max_players
            && Category::ALL
                .iter()
                .all(|&c| actual.get(c) <= self.quota(c))
    }
}
