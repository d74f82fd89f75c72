use std::sync::Arc;
use std::time::Duration;

use super::UserId;
use super::locks::LeagueLocks;
use crate::db::{PendingMatch, Repository};
use crate::error::{AppError, ValidationError};

#[derive(Debug, Clone)]
pub struct LeagueSettings {
    /// How long a reported match waits for its opponent.
    pub pending_ttl: Duration,
    /// Cap on committed matches between the same two players in one league.
    pub max_matches_per_pair: u32,
    pub deck_name_max_len: usize,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::from_secs(24 * 60 * 60),
            max_matches_per_pair: 5,
            deck_name_max_len: 50,
        }
    }
}

/// Whoever issues a command, with the capability the chat layer resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn member(id: UserId) -> Self {
        Self {
            id,
            is_admin: false,
        }
    }

    pub fn admin(id: UserId) -> Self {
        Self { id, is_admin: true }
    }

    pub(crate) fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Service context shared by every command: storage handle, per-league
/// writer locks and settings. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LeagueService {
    pub(crate) repo: Repository,
    pub(crate) locks: Arc<LeagueLocks>,
    pub(crate) settings: LeagueSettings,
}

impl LeagueService {
    pub fn new(repo: Repository, settings: LeagueSettings) -> Self {
        Self {
            repo,
            locks: Arc::new(LeagueLocks::default()),
            settings,
        }
    }

    /// Trimmed deck name, or why it is rejected.
    pub(crate) fn deck_name(&self, raw: &str) -> Result<String, ValidationError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyDeckName);
        }
        let max = self.settings.deck_name_max_len;
        if name.chars().count() > max {
            return Err(ValidationError::DeckNameTooLong { max });
        }
        Ok(name.to_string())
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.settings.pending_ttl.as_millis()).unwrap_or(i64::MAX)
    }

    pub(crate) fn is_expired(&self, pending: &PendingMatch, now: i64) -> bool {
        now >= pending.created_at.saturating_add(self.ttl_millis())
    }

    /// Oldest `created_at` a pending report may have and still be live.
    pub(crate) fn live_since(&self, now: i64) -> i64 {
        now.saturating_sub(self.ttl_millis()).saturating_add(1)
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
