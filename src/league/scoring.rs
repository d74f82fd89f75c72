//! Point accounting. The only code that changes standing totals.

use std::collections::BTreeMap;

use sqlx::SqliteConnection;

use super::UserId;
use crate::db::{Match, MatchResult, Standing, queries};
use crate::error::AppError;

pub const WIN_POINTS: u32 = 3;
pub const DRAW_POINTS: u32 = 1;
pub const LOSS_POINTS: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win { winner: UserId, loser: UserId },
    Draw { a: UserId, b: UserId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Winner,
    Loser,
    Drawer,
}

impl Outcome {
    pub fn of(played: &Match) -> Self {
        match played.result {
            MatchResult::Win => Self::Win {
                winner: played.p1,
                loser: played.p2,
            },
            MatchResult::Draw => Self::Draw {
                a: played.p1,
                b: played.p2,
            },
        }
    }

    pub fn result(&self) -> MatchResult {
        match self {
            Self::Win { .. } => MatchResult::Win,
            Self::Draw { .. } => MatchResult::Draw,
        }
    }

    /// `(p1, p2)` as stored in the ledger.
    pub fn sides(&self) -> (UserId, UserId) {
        match *self {
            Self::Win { winner, loser } => (winner, loser),
            Self::Draw { a, b } => (a, b),
        }
    }

    pub fn roles(&self) -> [(UserId, Role); 2] {
        match *self {
            Self::Win { winner, loser } => [(winner, Role::Winner), (loser, Role::Loser)],
            Self::Draw { a, b } => [(a, Role::Drawer), (b, Role::Drawer)],
        }
    }
}

impl Standing {
    pub fn zeroed(league_id: i64, user_id: UserId) -> Self {
        Self {
            league_id,
            user_id,
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
        }
    }

    pub fn apply(&mut self, role: Role) {
        match role {
            Role::Winner => {
                self.wins += 1;
                self.points += WIN_POINTS;
            }
            Role::Loser => {
                self.losses += 1;
                self.points += LOSS_POINTS;
            }
            Role::Drawer => {
                self.draws += 1;
                self.points += DRAW_POINTS;
            }
        }
    }

    /// Exact inverse of [`Standing::apply`]. Returns `false` and leaves the
    /// row untouched if the role was never applied.
    #[must_use]
    pub fn revert(&mut self, role: Role) -> bool {
        let reverted = match role {
            Role::Winner => self
                .wins
                .checked_sub(1)
                .zip(self.points.checked_sub(WIN_POINTS))
                .map(|(wins, points)| (wins, self.draws, self.losses, points)),
            Role::Loser => self
                .losses
                .checked_sub(1)
                .zip(self.points.checked_sub(LOSS_POINTS))
                .map(|(losses, points)| (self.wins, self.draws, losses, points)),
            Role::Drawer => self
                .draws
                .checked_sub(1)
                .zip(self.points.checked_sub(DRAW_POINTS))
                .map(|(draws, points)| (self.wins, draws, self.losses, points)),
        };

        match reverted {
            Some((wins, draws, losses, points)) => {
                self.wins = wins;
                self.draws = draws;
                self.losses = losses;
                self.points = points;
                true
            }
            None => false,
        }
    }

    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    /// `points == 3 * wins + draws`.
    pub fn is_consistent(&self) -> bool {
        self.points == WIN_POINTS * self.wins + DRAW_POINTS * self.draws + LOSS_POINTS * self.losses
    }

    pub fn is_empty(&self) -> bool {
        self.games() == 0 && self.points == 0
    }
}

/// Recomputes standings from scratch by applying every match in order.
pub fn replay<'a>(
    league_id: i64,
    ledger: impl IntoIterator<Item = &'a Match>,
) -> BTreeMap<UserId, Standing> {
    let mut table: BTreeMap<UserId, Standing> = BTreeMap::new();
    for played in ledger {
        for (user_id, role) in Outcome::of(played).roles() {
            table
                .entry(user_id)
                .or_insert_with(|| Standing::zeroed(league_id, user_id))
                .apply(role);
        }
    }
    table
}

/// Applies an outcome to the stored standings, creating zeroed rows first.
pub(crate) async fn apply_outcome(
    conn: &mut SqliteConnection,
    league_id: i64,
    outcome: Outcome,
) -> Result<(), AppError> {
    for (user_id, role) in outcome.roles() {
        let mut standing = load_standing(conn, league_id, user_id).await?;
        standing.apply(role);
        queries::store_standing(&mut *conn, &standing).await?;
    }
    Ok(())
}

/// Reverts an outcome that is still applied to the stored standings.
pub(crate) async fn revert_outcome(
    conn: &mut SqliteConnection,
    league_id: i64,
    outcome: Outcome,
) -> Result<(), AppError> {
    for (user_id, role) in outcome.roles() {
        let mut standing = load_standing(conn, league_id, user_id).await?;
        if !standing.revert(role) {
            return Err(AppError::CorruptStanding { league_id, user_id });
        }
        queries::store_standing(&mut *conn, &standing).await?;
    }
    Ok(())
}

async fn load_standing(
    conn: &mut SqliteConnection,
    league_id: i64,
    user_id: UserId,
) -> Result<Standing, AppError> {
    queries::ensure_standing(&mut *conn, league_id, user_id).await?;
    Ok(queries::standing(&mut *conn, league_id, user_id)
        .await?
        .unwrap_or_else(|| Standing::zeroed(league_id, user_id)))
}
