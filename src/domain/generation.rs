//! Random team generation for new users and admin-created teams.

use rust_decimal::Decimal;

use super::category::Category;
use super::player::{MAX_AGE, MIN_AGE, Player};
use super::roster::RosterPolicy;
use crate::ports::random_port::RandomSource;

const FIRST_NAMES: &[&str] = &[
    "Adam", "Bruno", "Carlos", "David", "Emil", "Felix", "Gabriel", "Hugo", "Ivan", "Jonas",
    "Karim", "Luca", "Marco", "Nikola", "Oscar", "Pedro", "Rafael", "Sami", "Tomas", "Yusuf",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Berg", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Horvat", "Ito",
    "Jansen", "Kowalski", "Larsen", "Moreau", "Novak", "Okafor", "Petrov", "Rossi", "Silva",
    "Tanaka", "Weber",
];

const COUNTRIES: &[&str] = &[
    "AR", "BE", "BR", "DE", "DK", "ES", "FR", "GB", "HR", "IT", "JP", "NG", "NL", "PL", "PT",
    "RS", "SE", "US", "UZ",
];

fn pick<'a>(options: &[&'a str], random: &dyn RandomSource) -> &'a str {
    let last = options.len().saturating_sub(1) as i64;
    let index = random.int_in_range(0, last).clamp(0, last) as usize;
    options[index]
}

pub fn random_country(random: &dyn RandomSource) -> String {
    pick(COUNTRIES, random).to_string()
}

pub fn random_team_name(random: &dyn RandomSource) -> String {
    format!("{} United", pick(LAST_NAMES, random))
}

/// A randomly named free agent of the given category.
pub fn random_player(category: Category, price: Decimal, random: &dyn RandomSource) -> Player {
    let age = random
        .int_in_range(i64::from(MIN_AGE), i64::from(MAX_AGE))
        .clamp(i64::from(MIN_AGE), i64::from(MAX_AGE)) as u8;
    Player {
        id: 0,
        first_name: pick(FIRST_NAMES, random).to_string(),
        last_name: pick(LAST_NAMES, random).to_string(),
        country: random_country(random),
        age,
        category,
        price,
        team_id: None,
    }
}

/// One free agent per open slot, filling each position to its quota without
/// passing the total cap. Goalkeepers first, forwards last.
pub fn full_squad(policy: &RosterPolicy, price: Decimal, random: &dyn RandomSource) -> Vec<Player> {
    let mut squad = Vec::new();
    for category in Category::ALL {
        for _ in 0..policy.quota(category) {
            if squad.len() as u32 >= policy.max_players {
                return squad;
            }
            squad.push(random_player(category, price, random));
        }
    }
    squad
}
