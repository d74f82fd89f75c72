use std::collections::BTreeMap;

use tracing::{info, instrument, warn};

use super::scoring::{self, Outcome};
use super::{Actor, LeagueService, UserId};
use crate::db::{Match, MatchResult, Standing, queries};
use crate::error::{AppError, NotFound};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadToHead {
    pub games: u32,
    pub a_wins: u32,
    pub b_wins: u32,
    pub draws: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub standing: Standing,
    /// Decks the player used in this league with how often, most used first.
    pub decks: Vec<(String, u32)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub matches: usize,
    /// Standing rows whose stored totals differed from the replay.
    pub corrected: Vec<UserId>,
}

impl LeagueService {
    /// Removes the most recent match of the league and reverts its scoring.
    #[instrument(skip(self), fields(admin = actor.id))]
    pub async fn undo_last(&self, actor: Actor, league_id: i64) -> Result<Match, AppError> {
        actor.require_admin()?;
        let _guard = self.locks.acquire(league_id).await;

        let mut tx = self.repo.begin().await?;
        let last = queries::last_match(&mut *tx, league_id)
            .await?
            .ok_or(NotFound::MatchToUndo)?;

        scoring::revert_outcome(&mut *tx, league_id, Outcome::of(&last)).await?;
        queries::delete_match(&mut *tx, last.id).await?;
        tx.commit().await?;

        info!(league_id, match_id = last.id, "↩️ Last match undone");
        Ok(last)
    }

    /// Standing of a user, zeroed when they never played.
    pub async fn standing(&self, league_id: i64, user_id: UserId) -> Result<Standing, AppError> {
        Ok(queries::standing(self.repo.pool(), league_id, user_id)
            .await?
            .unwrap_or_else(|| Standing::zeroed(league_id, user_id)))
    }

    /// Standings with at least one game, best first.
    pub async fn leaderboard(
        &self,
        league_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<Standing>, AppError> {
        let mut standings = queries::standings(self.repo.pool(), league_id).await?;
        standings.retain(|standing| !standing.is_empty());
        if let Some(limit) = limit {
            standings.truncate(limit as usize);
        }
        Ok(standings)
    }

    /// Most recent matches first.
    pub async fn history(
        &self,
        league_id: i64,
        user_id: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<Match>, AppError> {
        queries::recent_matches(self.repo.pool(), league_id, user_id, limit).await
    }

    pub async fn ledger(&self, league_id: i64) -> Result<Vec<Match>, AppError> {
        queries::league_matches(self.repo.pool(), league_id).await
    }

    pub async fn head_to_head(
        &self,
        league_id: i64,
        a: UserId,
        b: UserId,
    ) -> Result<HeadToHead, AppError> {
        let ledger = self.ledger(league_id).await?;
        Ok(head_to_head(&ledger, a, b))
    }

    pub async fn player_stats(&self, league_id: i64, user_id: UserId) -> Result<PlayerStats, AppError> {
        let standing = self.standing(league_id, user_id).await?;
        let ledger = self.ledger(league_id).await?;

        let mut usage: BTreeMap<&str, u32> = BTreeMap::new();
        for deck in ledger.iter().filter_map(|played| played.deck_of(user_id)) {
            *usage.entry(deck).or_default() += 1;
        }

        let mut decks: Vec<(String, u32)> = usage
            .into_iter()
            .map(|(deck, games)| (deck.to_string(), games))
            .collect();
        decks.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(PlayerStats { standing, decks })
    }

    /// Replays the whole ledger and overwrites the stored standings with the
    /// result. Users without matches keep a zeroed row.
    #[instrument(skip(self), fields(admin = actor.id))]
    pub async fn rebuild_standings(
        &self,
        actor: Actor,
        league_id: i64,
    ) -> Result<RebuildReport, AppError> {
        actor.require_admin()?;
        self.league(league_id).await?;
        let _guard = self.locks.acquire(league_id).await;

        let mut tx = self.repo.begin().await?;
        let ledger = queries::league_matches(&mut *tx, league_id).await?;
        let stored = queries::standings(&mut *tx, league_id).await?;
        let mut replayed = scoring::replay(league_id, &ledger);

        for standing in &stored {
            replayed
                .entry(standing.user_id)
                .or_insert_with(|| Standing::zeroed(league_id, standing.user_id));
        }

        let mut corrected = Vec::new();
        for (user_id, expected) in &replayed {
            let current = stored.iter().find(|standing| standing.user_id == *user_id);
            if current != Some(expected) {
                corrected.push(*user_id);
                queries::store_standing(&mut *tx, expected).await?;
            }
        }
        tx.commit().await?;

        if corrected.is_empty() {
            info!(league_id, matches = ledger.len(), "🔁 Standings verified");
        } else {
            warn!(league_id, corrected = corrected.len(), "🔁 ⚠️ Standings corrected from ledger");
        }

        Ok(RebuildReport {
            matches: ledger.len(),
            corrected,
        })
    }
}

pub fn head_to_head(ledger: &[Match], a: UserId, b: UserId) -> HeadToHead {
    let mut record = HeadToHead::default();
    for played in ledger {
        let (p1, p2) = (played.p1, played.p2);
        if !((p1 == a && p2 == b) || (p1 == b && p2 == a)) {
            continue;
        }
        record.games += 1;
        match played.result {
            MatchResult::Draw => record.draws += 1,
            MatchResult::Win if p1 == a => record.a_wins += 1,
            MatchResult::Win => record.b_wins += 1,
        }
    }
    record
}
