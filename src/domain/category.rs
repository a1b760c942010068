//! Playing positions a roster is split into.

use std::fmt;
use std::str::FromStr;

use super::error::MarketError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Goalkeeper,
        Category::Defender,
        Category::Midfielder,
        Category::Forward,
    ];

    /// Short code used in storage and on the command line.
    pub fn code(self) -> &'static str {
        match self {
            Category::Goalkeeper => "GK",
            Category::Defender => "DEF",
            Category::Midfielder => "MID",
            Category::Forward => "FWD",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Category::Goalkeeper => "goalkeepers",
            Category::Defender => "defenders",
            Category::Midfielder => "midfielders",
            Category::Forward => "forwards",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for Category {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GOALKEEPER" => Ok(Category::Goalkeeper),
            "DEF" | "DEFENDER" => Ok(Category::Defender),
            "MID" | "MIDFIELDER" => Ok(Category::Midfielder),
            "FWD" | "FORWARD" => Ok(Category::Forward),
            other => Err(MarketError::validation(
                "category",
                format!("\"{other}\" is not a valid choice, options are [GK, DEF, MID, FWD]"),
            )),
        }
    }
}
