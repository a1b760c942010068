//! Domain error types.

use rust_decimal::Decimal;
use std::fmt;

use super::category::Category;
use super::{PlayerId, TeamId, UserId};

/// The kind of stored entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Team,
    Player,
    Listing,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Team => "team",
            Entity::Player => "player",
            Entity::Listing => "listing",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`MarketError`], used for exit codes and by callers that only
/// care about the family of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Capacity,
    Funds,
    NotFound,
    Storage,
    Config,
    Io,
}

/// Top-level error type for the transfer market.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid price {amount}: must be greater than 0")]
    InvalidPrice { amount: Decimal },

    #[error("player {player_id} is already on the transfer list")]
    AlreadyListed { player_id: PlayerId },

    #[error("player {player_id} is not on the transfer list")]
    NotListed { player_id: PlayerId },

    #[error("team {team_id} cannot buy a player it already owns")]
    SameTeamTransfer { team_id: TeamId },

    #[error("player {player_id} already belongs to team {team_id}")]
    PlayerAlreadyOnTeam { player_id: PlayerId, team_id: TeamId },

    #[error("user {owner_id} already owns team {team_id}")]
    OwnerHasTeam { owner_id: UserId, team_id: TeamId },

    #[error("team {team_id} can't have more than {max} players")]
    RosterFull { team_id: TeamId, max: u32 },

    #[error("team {team_id} can't have more than {max} {}", .category.plural())]
    PositionFull {
        team_id: TeamId,
        category: Category,
        max: u32,
    },

    #[error("team {team_id} has a budget of {budget} but {required} is required")]
    InsufficientBudget {
        team_id: TeamId,
        budget: Decimal,
        required: Decimal,
    },

    #[error("player {player_id} is not on team {team_id}")]
    PlayerNotOnTeam { player_id: PlayerId, team_id: TeamId },

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MarketError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MarketError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: Entity, id: i64) -> Self {
        MarketError::NotFound { entity, id }
    }

    pub fn storage(reason: impl ToString) -> Self {
        MarketError::Storage {
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::Validation { .. } | MarketError::InvalidPrice { .. } => {
                ErrorKind::Validation
            }
            MarketError::AlreadyListed { .. }
            | MarketError::NotListed { .. }
            | MarketError::SameTeamTransfer { .. }
            | MarketError::PlayerAlreadyOnTeam { .. }
            | MarketError::OwnerHasTeam { .. }
            | MarketError::PlayerNotOnTeam { .. } => ErrorKind::Conflict,
            MarketError::RosterFull { .. } | MarketError::PositionFull { .. } => {
                ErrorKind::Capacity
            }
            MarketError::InsufficientBudget { .. } => ErrorKind::Funds,
            MarketError::NotFound { .. } => ErrorKind::NotFound,
            MarketError::Storage { .. } => ErrorKind::Storage,
            MarketError::ConfigParse { .. }
            | MarketError::ConfigMissing { .. }
            | MarketError::ConfigInvalid { .. } => ErrorKind::Config,
            MarketError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<&MarketError> for std::process::ExitCode {
    fn from(err: &MarketError) -> Self {
        let code: u8 = match err.kind() {
            ErrorKind::Io => 1,
            ErrorKind::Config => 2,
            ErrorKind::Storage => 3,
            ErrorKind::Validation => 4,
            ErrorKind::NotFound => 5,
            ErrorKind::Conflict => 6,
            ErrorKind::Capacity => 7,
            ErrorKind::Funds => 8,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_full_message_uses_plural_category() {
        let err = MarketError::PositionFull {
            team_id: 4,
            category: Category::Goalkeeper,
            max: 3,
        };
        assert_eq!(err.to_string(), "team 4 can't have more than 3 goalkeepers");
        assert_eq!(err.kind(), ErrorKind::Capacity);
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = MarketError::not_found(Entity::Listing, 12);
        assert_eq!(err.to_string(), "listing 12 not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn conflicts_are_grouped() {
        assert_eq!(
            MarketError::AlreadyListed { player_id: 1 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            MarketError::SameTeamTransfer { team_id: 1 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            MarketError::InsufficientBudget {
                team_id: 1,
                budget: Decimal::ZERO,
                required: Decimal::ONE,
            }
            .kind(),
            ErrorKind::Funds
        );
    }
}
