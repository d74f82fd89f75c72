//! League bookkeeping: registry, scoring, the confirmation workflow and deck
//! analytics. Everything here is independent of Discord.

mod analytics;
mod confirmation;
mod export;
mod format;
mod ledger;
mod locks;
mod registry;
mod scoring;
mod service;

pub use analytics::{DeckRecord, DeckStats, DeckUsage, Matchup, MatchupLine};
pub use confirmation::{ConfirmOutcome, DiscardReason, MatchReport, Opponent, ReportedResult, Side};
pub use export::{CsvRecord, to_csv};
pub use format::{Format, Scope};
pub use ledger::{HeadToHead, PlayerStats, RebuildReport};
pub use registry::{CreatedLeague, LeagueOverview, Registration, ResetReport};
pub use scoring::{DRAW_POINTS, LOSS_POINTS, Outcome, Role, WIN_POINTS, replay};
pub use service::{Actor, LeagueService, LeagueSettings};

pub type UserId = i64;
pub type GuildId = i64;

/// Minimum number of games before a deck matchup is ranked.
pub const MIN_MATCHUP_GAMES: u32 = 2;

#[cfg(test)]
pub(crate) mod test_support;
