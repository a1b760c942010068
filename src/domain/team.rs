//! Teams and their per-position roster counters.

use rust_decimal::Decimal;

use super::category::Category;
use super::player::Player;
use super::{TeamId, UserId};

/// Number of players a team owns in each category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterCounts {
    pub goalkeepers: u32,
    pub defenders: u32,
    pub midfielders: u32,
    pub forwards: u32,
}

impl RosterCounts {
    /// Count the players actually present in `players`.
    pub fn tally<'a>(players: impl IntoIterator<Item = &'a Player>) -> Self {
        let mut counts = RosterCounts::default();
        for player in players {
            *counts.slot_mut(player.category) += 1;
        }
        counts
    }

    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Goalkeeper => self.goalkeepers,
            Category::Defender => self.defenders,
            Category::Midfielder => self.midfielders,
            Category::Forward => self.forwards,
        }
    }

    pub fn total(&self) -> u32 {
        self.goalkeepers + self.defenders + self.midfielders + self.forwards
    }

    pub(crate) fn increment(&mut self, category: Category) {
        *self.slot_mut(category) += 1;
    }

    /// Returns false and leaves the counter alone when it is already zero.
    pub(crate) fn decrement(&mut self, category: Category) -> bool {
        let slot = self.slot_mut(category);
        match slot.checked_sub(1) {
            Some(next) => {
                *slot = next;
                true
            }
            None => false,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::Goalkeeper => &mut self.goalkeepers,
            Category::Defender => &mut self.defenders,
            Category::Midfielder => &mut self.midfielders,
            Category::Forward => &mut self.forwards,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub country: String,
    pub owner: Option<UserId>,
    pub budget: Decimal,
    pub value: Decimal,
    pub roster: RosterCounts,
}

impl Team {
    /// An empty team, not yet stored (id 0).
    pub fn new(name: impl Into<String>, country: impl Into<String>, budget: Decimal) -> Self {
        Team {
            id: 0,
            name: name.into(),
            country: country.into(),
            owner: None,
            budget,
            value: Decimal::ZERO,
            roster: RosterCounts::default(),
        }
    }

    pub fn player_count(&self) -> u32 {
        self.roster.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: i64, category: Category) -> Player {
        Player {
            id,
            first_name: "Test".into(),
            last_name: "Player".into(),
            country: "GB".into(),
            age: 25,
            category,
            price: Decimal::ONE,
            team_id: Some(1),
        }
    }

    #[test]
    fn tally_counts_each_category() {
        let players = vec![
            player(1, Category::Goalkeeper),
            player(2, Category::Defender),
            player(3, Category::Defender),
            player(4, Category::Forward),
        ];
        let counts = RosterCounts::tally(&players);
        assert_eq!(counts.goalkeepers, 1);
        assert_eq!(counts.defenders, 2);
        assert_eq!(counts.midfielders, 0);
        assert_eq!(counts.forwards, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn decrement_stops_at_zero() {
        let mut counts = RosterCounts::default();
        assert!(!counts.decrement(Category::Midfielder));
        assert_eq!(counts.midfielders, 0);

        counts.increment(Category::Midfielder);
        assert!(counts.decrement(Category::Midfielder));
        assert_eq!(counts.midfielders, 0);
    }

    #[test]
    fn new_team_is_empty() {
        let team = Team::new("Rovers", "GB", Decimal::new(5_000_000, 0));
        assert_eq!(team.player_count(), 0);
        assert_eq!(team.value, Decimal::ZERO);
        assert!(team.owner.is_none());
    }
}
