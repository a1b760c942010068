//! Port traits the domain talks to its collaborators through.

pub mod config_port;
pub mod random_port;
pub mod search_port;
pub mod store_port;
