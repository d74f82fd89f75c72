//! Single-statement storage access.
//!
//! Every function is generic over the executor so the same statement runs on
//! the pool for reads and inside a transaction (`&mut *tx`) for writes.

use sqlx::SqliteExecutor;

use super::models::{Deck, League, Match, MatchResult, PendingMatch, Standing};
use crate::error::AppError;
use crate::league::{Format, Scope, UserId};

const LEAGUE_COLUMNS: &str = "id, guild_id, format, name, status, created_at";
const MATCH_COLUMNS: &str =
    "id, league_id, format, p1, p2, result, created_at, p1_deck, p2_deck";
const PENDING_COLUMNS: &str = "id, league_id, guild_id, format, reporter_id, opponent_id, \
     result, winner_id, loser_id, p1_deck, p2_deck, created_at";
const STANDING_COLUMNS: &str = "league_id, user_id, wins, draws, losses, points";

fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(", ")
        .map(|col| format!("{alias}.{col}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// === Leagues ===

pub async fn insert_league<'e, E>(
    exec: E,
    scope: Scope,
    name: &str,
    created_at: i64,
) -> Result<League, AppError>
where
    E: SqliteExecutor<'e>,
{
    let league = sqlx::query_as::<_, League>(&format!(
        "INSERT INTO leagues (guild_id, format, name, status, created_at)
         VALUES (?, ?, ?, 'open', ?)
         RETURNING {LEAGUE_COLUMNS}"
    ))
    .bind(scope.guild_id)
    .bind(scope.format)
    .bind(name)
    .bind(created_at)
    .fetch_one(exec)
    .await?;
    Ok(league)
}

/// Closes every open league of the scope and returns how many were closed.
pub async fn close_open_leagues<'e, E>(exec: E, scope: Scope) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE leagues SET status = 'closed'
         WHERE guild_id = ? AND format = ? AND status = 'open'",
    )
    .bind(scope.guild_id)
    .bind(scope.format)
    .execute(exec)
    .await?;
    Ok(result.rows_affected())
}

pub async fn open_league<'e, E>(exec: E, scope: Scope) -> Result<Option<League>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let league = sqlx::query_as::<_, League>(&format!(
        "SELECT {LEAGUE_COLUMNS} FROM leagues
         WHERE guild_id = ? AND format = ? AND status = 'open'
         ORDER BY created_at DESC, id DESC
         LIMIT 1"
    ))
    .bind(scope.guild_id)
    .bind(scope.format)
    .fetch_optional(exec)
    .await?;
    Ok(league)
}

/// Closes the league if it is still open. Returns whether it was.
pub async fn close_league<'e, E>(exec: E, league_id: i64) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE leagues SET status = 'closed'
         WHERE id = ? AND status = 'open'",
    )
    .bind(league_id)
    .execute(exec)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn league_by_id<'e, E>(exec: E, league_id: i64) -> Result<Option<League>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let league = sqlx::query_as::<_, League>(&format!(
        "SELECT {LEAGUE_COLUMNS} FROM leagues WHERE id = ?"
    ))
    .bind(league_id)
    .fetch_optional(exec)
    .await?;
    Ok(league)
}

pub async fn count_open_leagues<'e, E>(exec: E, scope: Scope) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM leagues WHERE guild_id = ? AND format = ? AND status = 'open'",
    )
    .bind(scope.guild_id)
    .bind(scope.format)
    .fetch_one(exec)
    .await?;
    Ok(count)
}

// === Players ===

/// Returns `false` when the user was already registered.
pub async fn insert_player<'e, E>(
    exec: E,
    league_id: i64,
    user_id: UserId,
    joined_at: i64,
) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result =
        sqlx::query("INSERT OR IGNORE INTO players (league_id, user_id, joined_at) VALUES (?, ?, ?)")
            .bind(league_id)
            .bind(user_id)
            .bind(joined_at)
            .execute(exec)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_player<'e, E>(exec: E, league_id: i64, user_id: UserId) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM players WHERE league_id = ? AND user_id = ?")
        .bind(league_id)
        .bind(user_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_registered<'e, E>(exec: E, league_id: i64, user_id: UserId) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let exists = sqlx::query_scalar::<_, i32>(
        "SELECT 1 FROM players WHERE league_id = ? AND user_id = ?",
    )
    .bind(league_id)
    .bind(user_id)
    .fetch_optional(exec)
    .await?;
    Ok(exists.is_some())
}

pub async fn count_players<'e, E>(exec: E, league_id: i64) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM players WHERE league_id = ?")
        .bind(league_id)
        .fetch_one(exec)
        .await?;
    Ok(count)
}

pub async fn delete_players<'e, E>(exec: E, league_id: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM players WHERE league_id = ?")
        .bind(league_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

// === Standings ===

pub async fn ensure_standing<'e, E>(exec: E, league_id: i64, user_id: UserId) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("INSERT OR IGNORE INTO standings (league_id, user_id) VALUES (?, ?)")
        .bind(league_id)
        .bind(user_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn standing<'e, E>(
    exec: E,
    league_id: i64,
    user_id: UserId,
) -> Result<Option<Standing>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let standing = sqlx::query_as::<_, Standing>(&format!(
        "SELECT {STANDING_COLUMNS} FROM standings WHERE league_id = ? AND user_id = ?"
    ))
    .bind(league_id)
    .bind(user_id)
    .fetch_optional(exec)
    .await?;
    Ok(standing)
}

/// Inserts or overwrites a standing row with the given totals.
pub async fn store_standing<'e, E>(exec: E, standing: &Standing) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO standings (league_id, user_id, wins, draws, losses, points)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(league_id, user_id) DO UPDATE SET
            wins = excluded.wins,
            draws = excluded.draws,
            losses = excluded.losses,
            points = excluded.points",
    )
    .bind(standing.league_id)
    .bind(standing.user_id)
    .bind(standing.wins)
    .bind(standing.draws)
    .bind(standing.losses)
    .bind(standing.points)
    .execute(exec)
    .await?;
    Ok(())
}

/// Standings in leaderboard order: points, then wins, then fewest losses.
pub async fn standings<'e, E>(exec: E, league_id: i64) -> Result<Vec<Standing>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let standings = sqlx::query_as::<_, Standing>(&format!(
        "SELECT {STANDING_COLUMNS} FROM standings
         WHERE league_id = ?
         ORDER BY points DESC, wins DESC, losses ASC, user_id ASC"
    ))
    .bind(league_id)
    .fetch_all(exec)
    .await?;
    Ok(standings)
}

pub async fn delete_standings<'e, E>(exec: E, league_id: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM standings WHERE league_id = ?")
        .bind(league_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

// === Matches ===

#[derive(Debug, Clone)]
pub struct NewMatch<'a> {
    pub league_id: i64,
    pub format: Format,
    pub p1: UserId,
    pub p2: UserId,
    pub result: MatchResult,
    pub created_at: i64,
    pub p1_deck: &'a str,
    pub p2_deck: &'a str,
}

pub async fn insert_match<'e, E>(exec: E, new: &NewMatch<'_>) -> Result<Match, AppError>
where
    E: SqliteExecutor<'e>,
{
    let inserted = sqlx::query_as::<_, Match>(&format!(
        "INSERT INTO matches (league_id, format, p1, p2, result, created_at, p1_deck, p2_deck)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {MATCH_COLUMNS}"
    ))
    .bind(new.league_id)
    .bind(new.format)
    .bind(new.p1)
    .bind(new.p2)
    .bind(new.result)
    .bind(new.created_at)
    .bind(new.p1_deck)
    .bind(new.p2_deck)
    .fetch_one(exec)
    .await?;
    Ok(inserted)
}

/// Highest-id match of the league, i.e. the last one applied.
pub async fn last_match<'e, E>(exec: E, league_id: i64) -> Result<Option<Match>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let last = sqlx::query_as::<_, Match>(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches WHERE league_id = ? ORDER BY id DESC LIMIT 1"
    ))
    .bind(league_id)
    .fetch_optional(exec)
    .await?;
    Ok(last)
}

pub async fn delete_match<'e, E>(exec: E, match_id: i64) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM matches WHERE id = ?")
        .bind(match_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Whole ledger of a league in application order.
pub async fn league_matches<'e, E>(exec: E, league_id: i64) -> Result<Vec<Match>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let matches = sqlx::query_as::<_, Match>(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches WHERE league_id = ? ORDER BY id ASC"
    ))
    .bind(league_id)
    .fetch_all(exec)
    .await?;
    Ok(matches)
}

/// Most recent matches first, optionally restricted to one participant.
pub async fn recent_matches<'e, E>(
    exec: E,
    league_id: i64,
    user_id: Option<UserId>,
    limit: u32,
) -> Result<Vec<Match>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let matches = sqlx::query_as::<_, Match>(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches
         WHERE league_id = ? AND (? IS NULL OR p1 = ? OR p2 = ?)
         ORDER BY created_at DESC, id DESC
         LIMIT ?"
    ))
    .bind(league_id)
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .bind(limit)
    .fetch_all(exec)
    .await?;
    Ok(matches)
}

/// Every match played in a scope, across all of its leagues, oldest first.
pub async fn scope_matches<'e, E>(exec: E, scope: Scope) -> Result<Vec<Match>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let columns = prefixed(MATCH_COLUMNS, "m");
    let matches = sqlx::query_as::<_, Match>(&format!(
        "SELECT {columns} FROM matches m
         INNER JOIN leagues l ON l.id = m.league_id
         WHERE l.guild_id = ? AND m.format = ?
         ORDER BY m.id ASC"
    ))
    .bind(scope.guild_id)
    .bind(scope.format)
    .fetch_all(exec)
    .await?;
    Ok(matches)
}

/// Matches between the two users in the league, in either order.
pub async fn pair_match_count<'e, E>(
    exec: E,
    league_id: i64,
    a: UserId,
    b: UserId,
) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM matches
         WHERE league_id = ? AND ((p1 = ? AND p2 = ?) OR (p1 = ? AND p2 = ?))",
    )
    .bind(league_id)
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_one(exec)
    .await?;
    Ok(count)
}

pub async fn count_matches<'e, E>(exec: E, league_id: i64) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM matches WHERE league_id = ?")
        .bind(league_id)
        .fetch_one(exec)
        .await?;
    Ok(count)
}

pub async fn delete_matches<'e, E>(exec: E, league_id: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM matches WHERE league_id = ?")
        .bind(league_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

// === Pending matches ===

#[derive(Debug, Clone)]
pub struct NewPendingMatch<'a> {
    pub league_id: i64,
    pub scope: Scope,
    pub reporter_id: UserId,
    pub opponent_id: UserId,
    pub result: MatchResult,
    pub winner_id: Option<UserId>,
    pub loser_id: Option<UserId>,
    pub p1_deck: &'a str,
    pub p2_deck: &'a str,
    pub created_at: i64,
}

pub async fn insert_pending<'e, E>(exec: E, new: &NewPendingMatch<'_>) -> Result<PendingMatch, AppError>
where
    E: SqliteExecutor<'e>,
{
    let pending = sqlx::query_as::<_, PendingMatch>(&format!(
        "INSERT INTO pending_matches
            (league_id, guild_id, format, reporter_id, opponent_id, result,
             winner_id, loser_id, p1_deck, p2_deck, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {PENDING_COLUMNS}"
    ))
    .bind(new.league_id)
    .bind(new.scope.guild_id)
    .bind(new.scope.format)
    .bind(new.reporter_id)
    .bind(new.opponent_id)
    .bind(new.result)
    .bind(new.winner_id)
    .bind(new.loser_id)
    .bind(new.p1_deck)
    .bind(new.p2_deck)
    .bind(new.created_at)
    .fetch_one(exec)
    .await?;
    Ok(pending)
}

pub async fn pending_by_id<'e, E>(exec: E, pending_id: i64) -> Result<Option<PendingMatch>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let pending = sqlx::query_as::<_, PendingMatch>(&format!(
        "SELECT {PENDING_COLUMNS} FROM pending_matches WHERE id = ?"
    ))
    .bind(pending_id)
    .fetch_optional(exec)
    .await?;
    Ok(pending)
}

/// Consumes the pending row. Only the caller that gets `true` owns it.
pub async fn claim_pending<'e, E>(exec: E, pending_id: i64) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM pending_matches WHERE id = ?")
        .bind(pending_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Pending reports addressed to `opponent_id` created at or after `not_before`.
pub async fn pending_for_opponent<'e, E>(
    exec: E,
    opponent_id: UserId,
    not_before: i64,
) -> Result<Vec<PendingMatch>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let pending = sqlx::query_as::<_, PendingMatch>(&format!(
        "SELECT {PENDING_COLUMNS} FROM pending_matches
         WHERE opponent_id = ? AND created_at >= ?
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(opponent_id)
    .bind(not_before)
    .fetch_all(exec)
    .await?;
    Ok(pending)
}

pub async fn count_pending<'e, E>(exec: E, league_id: i64) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pending_matches WHERE league_id = ?")
            .bind(league_id)
            .fetch_one(exec)
            .await?;
    Ok(count)
}

pub async fn delete_pending_for_league<'e, E>(exec: E, league_id: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM pending_matches WHERE league_id = ?")
        .bind(league_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes every pending report created before `cutoff`.
pub async fn delete_pending_before<'e, E>(exec: E, cutoff: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM pending_matches WHERE created_at < ?")
        .bind(cutoff)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

// === Decks ===

/// Returns `true` when the deck was not known yet.
pub async fn upsert_deck<'e, E>(exec: E, scope: Scope, name: &str) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("INSERT OR IGNORE INTO decks (guild_id, format, name) VALUES (?, ?, ?)")
        .bind(scope.guild_id)
        .bind(scope.format)
        .bind(name)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_deck<'e, E>(exec: E, scope: Scope, name: &str) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM decks WHERE guild_id = ? AND format = ? AND name = ?")
        .bind(scope.guild_id)
        .bind(scope.format)
        .bind(name)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn decks<'e, E>(exec: E, scope: Scope) -> Result<Vec<Deck>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let decks = sqlx::query_as::<_, Deck>(
        "SELECT guild_id, format, name FROM decks
         WHERE guild_id = ? AND format = ?
         ORDER BY name ASC",
    )
    .bind(scope.guild_id)
    .bind(scope.format)
    .fetch_all(exec)
    .await?;
    Ok(decks)
}

/// Deck names of the scope starting with `prefix`, case-insensitively.
pub async fn search_decks<'e, E>(
    exec: E,
    scope: Scope,
    prefix: &str,
    limit: u32,
) -> Result<Vec<String>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let pattern = format!("{}%", escape_like(prefix));
    let names = sqlx::query_scalar::<_, String>(
        "SELECT name FROM decks
         WHERE guild_id = ? AND format = ? AND name LIKE ? ESCAPE '\\'
         ORDER BY name ASC
         LIMIT ?",
    )
    .bind(scope.guild_id)
    .bind(scope.format)
    .bind(pattern)
    .bind(limit)
    .fetch_all(exec)
    .await?;
    Ok(names)
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
