use std::fmt;

use sqlx::FromRow;

use crate::league::{Format, GuildId, Scope, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum LeagueStatus {
    Open,
    Closed,
}

/// Result of a committed match. For `Win`, `p1` is the winner and `p2` the
/// loser; for `Draw` they are the participants in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Draw,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => f.write_str("win"),
            Self::Draw => f.write_str("draw"),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct League {
    pub id: i64,
    pub guild_id: GuildId,
    pub format: Format,
    pub name: String,
    pub status: LeagueStatus,
    pub created_at: i64,
}

impl League {
    pub fn is_open(&self) -> bool {
        self.status == LeagueStatus::Open
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.guild_id, self.format)
    }
}

/// Materialized per-player aggregate. Only the scoring engine writes it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Standing {
    pub league_id: i64,
    pub user_id: UserId,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Match {
    pub id: i64,
    pub league_id: i64,
    pub format: Format,
    pub p1: UserId,
    pub p2: UserId,
    pub result: MatchResult,
    pub created_at: i64,
    pub p1_deck: String,
    pub p2_deck: String,
}

impl Match {
    /// Deck the given participant played, if they took part.
    pub fn deck_of(&self, user_id: UserId) -> Option<&str> {
        if self.p1 == user_id {
            Some(&self.p1_deck)
        } else if self.p2 == user_id {
            Some(&self.p2_deck)
        } else {
            None
        }
    }
}

/// A self-reported result waiting for the named opponent.
///
/// `p1_deck`/`p2_deck` already follow the [`Match`] orientation: winner first
/// for a win, reporter first for a draw.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PendingMatch {
    pub id: i64,
    pub league_id: i64,
    pub guild_id: GuildId,
    pub format: Format,
    pub reporter_id: UserId,
    pub opponent_id: UserId,
    pub result: MatchResult,
    pub winner_id: Option<UserId>,
    pub loser_id: Option<UserId>,
    pub p1_deck: String,
    pub p2_deck: String,
    pub created_at: i64,
}

impl PendingMatch {
    /// Participants in ledger order.
    pub fn sides(&self) -> (UserId, UserId) {
        match (self.result, self.winner_id, self.loser_id) {
            (MatchResult::Win, Some(winner), Some(loser)) => (winner, loser),
            _ => (self.reporter_id, self.opponent_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Deck {
    pub guild_id: GuildId,
    pub format: Format,
    pub name: String,
}
