//! Core domain types and logic.

pub mod category;
pub mod error;
pub mod generation;
pub mod history;
pub mod listing;
pub mod market;
pub mod market_config;
pub mod money;
pub mod player;
pub mod roster;
pub mod team;
pub mod transfer;
pub mod valuation;

pub type TeamId = i64;
pub type PlayerId = i64;
pub type ListingId = i64;
pub type TransferId = i64;
pub type UserId = i64;
