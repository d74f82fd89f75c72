mod migrations;
mod models;
pub mod queries;
mod repository;

pub use migrations::run_migrations;
pub use models::{Deck, League, LeagueStatus, Match, MatchResult, PendingMatch, Standing};
pub use repository::{Repository, Tx};
