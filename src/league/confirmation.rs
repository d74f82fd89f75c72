//! Two-party confirmation of self-reported results.
//!
//! A report becomes a [`PendingMatch`]. Only the named opponent can resolve
//! it: confirming commits it to the ledger and the standings, refusing drops
//! it. Unresolved reports expire after the configured TTL.

use std::fmt;

use sqlx::SqliteConnection;
use tracing::{debug, info, instrument, warn};

use super::scoring::{self, Outcome};
use super::service::now_millis;
use super::{Actor, LeagueService, Scope, UserId};
use crate::db::queries::{self, NewMatch, NewPendingMatch};
use crate::db::{Match, MatchResult, PendingMatch};
use crate::error::{AppError, NotFound, ValidationError};

/// Which side of a report won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Reporter,
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedResult {
    Win(Side),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opponent {
    pub id: UserId,
    pub is_bot: bool,
}

impl Opponent {
    pub fn human(id: UserId) -> Self {
        Self { id, is_bot: false }
    }
}

#[derive(Debug, Clone)]
pub struct MatchReport {
    pub scope: Scope,
    pub reporter: UserId,
    pub opponent: Opponent,
    pub result: ReportedResult,
    pub reporter_deck: String,
    pub opponent_deck: String,
}

/// A report that passed validation, oriented the way the ledger stores it.
struct CheckedReport {
    reporter: UserId,
    opponent: UserId,
    outcome: Outcome,
    p1_deck: String,
    p2_deck: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed(Match),
    /// The pending report was deleted without touching the ledger.
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    LeagueClosed,
    NotRegistered(UserId),
    PairLimit { max: u32 },
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeagueClosed => f.write_str("the league is no longer open"),
            Self::NotRegistered(user_id) => {
                write!(f, "user {user_id} is no longer registered in the league")
            }
            Self::PairLimit { max } => {
                write!(f, "these players already played {max} matches in this league")
            }
        }
    }
}

impl From<DiscardReason> for AppError {
    fn from(reason: DiscardReason) -> Self {
        match reason {
            DiscardReason::LeagueClosed => NotFound::OpenLeague.into(),
            DiscardReason::NotRegistered(user_id) => ValidationError::NotRegistered(user_id).into(),
            DiscardReason::PairLimit { max } => ValidationError::PairLimit { max }.into(),
        }
    }
}

impl PendingMatch {
    pub fn outcome(&self) -> Outcome {
        let (p1, p2) = self.sides();
        match self.result {
            MatchResult::Win => Outcome::Win {
                winner: p1,
                loser: p2,
            },
            MatchResult::Draw => Outcome::Draw { a: p1, b: p2 },
        }
    }
}

impl LeagueService {
    fn check_report(&self, report: &MatchReport) -> Result<CheckedReport, AppError> {
        let reporter = report.reporter;
        let opponent = report.opponent.id;

        if reporter == opponent {
            return Err(ValidationError::SelfMatch.into());
        }
        if report.opponent.is_bot {
            return Err(ValidationError::BotOpponent.into());
        }

        let reporter_deck = self.deck_name(&report.reporter_deck)?;
        let opponent_deck = self.deck_name(&report.opponent_deck)?;

        let checked = match report.result {
            ReportedResult::Win(Side::Reporter) => CheckedReport {
                reporter,
                opponent,
                outcome: Outcome::Win {
                    winner: reporter,
                    loser: opponent,
                },
                p1_deck: reporter_deck,
                p2_deck: opponent_deck,
            },
            ReportedResult::Win(Side::Opponent) => CheckedReport {
                reporter,
                opponent,
                outcome: Outcome::Win {
                    winner: opponent,
                    loser: reporter,
                },
                p1_deck: opponent_deck,
                p2_deck: reporter_deck,
            },
            ReportedResult::Draw => CheckedReport {
                reporter,
                opponent,
                outcome: Outcome::Draw {
                    a: reporter,
                    b: opponent,
                },
                p1_deck: reporter_deck,
                p2_deck: opponent_deck,
            },
        };
        Ok(checked)
    }

    /// Registration and pair-cap checks, run inside the writer's transaction.
    async fn check_participants(
        &self,
        conn: &mut SqliteConnection,
        league_id: i64,
        a: UserId,
        b: UserId,
    ) -> Result<Option<DiscardReason>, AppError> {
        for user_id in [a, b] {
            if !queries::is_registered(&mut *conn, league_id, user_id).await? {
                return Ok(Some(DiscardReason::NotRegistered(user_id)));
            }
        }

        let max = self.settings.max_matches_per_pair;
        let played = queries::pair_match_count(&mut *conn, league_id, a, b).await?;
        if played >= i64::from(max) {
            return Ok(Some(DiscardReason::PairLimit { max }));
        }
        Ok(None)
    }

    /// Files a report awaiting the opponent's confirmation.
    #[instrument(
        skip(self, report),
        fields(
            guild_id = report.scope.guild_id,
            format = %report.scope.format,
            reporter = report.reporter,
            opponent = report.opponent.id
        )
    )]
    pub async fn report_match(&self, report: MatchReport) -> Result<PendingMatch, AppError> {
        let checked = self.check_report(&report)?;
        let league = self.require_open_league(report.scope).await?;
        let _guard = self.locks.acquire(league.id).await;

        let mut tx = self.repo.begin().await?;
        if !is_open(&mut *tx, league.id).await? {
            return Err(NotFound::OpenLeague.into());
        }
        if let Some(issue) = self
            .check_participants(&mut *tx, league.id, checked.reporter, checked.opponent)
            .await?
        {
            return Err(issue.into());
        }

        queries::upsert_deck(&mut *tx, report.scope, &checked.p1_deck).await?;
        queries::upsert_deck(&mut *tx, report.scope, &checked.p2_deck).await?;

        let (winner_id, loser_id) = match checked.outcome {
            Outcome::Win { winner, loser } => (Some(winner), Some(loser)),
            Outcome::Draw { .. } => (None, None),
        };
        let pending = queries::insert_pending(
            &mut *tx,
            &NewPendingMatch {
                league_id: league.id,
                scope: report.scope,
                reporter_id: checked.reporter,
                opponent_id: checked.opponent,
                result: checked.outcome.result(),
                winner_id,
                loser_id,
                p1_deck: &checked.p1_deck,
                p2_deck: &checked.p2_deck,
                created_at: now_millis(),
            },
        )
        .await?;
        tx.commit().await?;

        info!(pending_id = pending.id, league_id = league.id, "📝 Match reported");
        Ok(pending)
    }

    /// Commits a result straight to the ledger, skipping confirmation.
    #[instrument(
        skip(self, report),
        fields(
            guild_id = report.scope.guild_id,
            format = %report.scope.format,
            admin = actor.id
        )
    )]
    pub async fn record_match(&self, actor: Actor, report: MatchReport) -> Result<Match, AppError> {
        actor.require_admin()?;
        let checked = self.check_report(&report)?;
        let league = self.require_open_league(report.scope).await?;
        let _guard = self.locks.acquire(league.id).await;

        let mut tx = self.repo.begin().await?;
        if !is_open(&mut *tx, league.id).await? {
            return Err(NotFound::OpenLeague.into());
        }
        if let Some(issue) = self
            .check_participants(&mut *tx, league.id, checked.reporter, checked.opponent)
            .await?
        {
            return Err(issue.into());
        }

        queries::upsert_deck(&mut *tx, report.scope, &checked.p1_deck).await?;
        queries::upsert_deck(&mut *tx, report.scope, &checked.p2_deck).await?;
        scoring::apply_outcome(&mut *tx, league.id, checked.outcome).await?;

        let (p1, p2) = checked.outcome.sides();
        let recorded = queries::insert_match(
            &mut *tx,
            &NewMatch {
                league_id: league.id,
                format: report.scope.format,
                p1,
                p2,
                result: checked.outcome.result(),
                created_at: now_millis(),
                p1_deck: &checked.p1_deck,
                p2_deck: &checked.p2_deck,
            },
        )
        .await?;
        tx.commit().await?;

        info!(match_id = recorded.id, league_id = league.id, "📒 Match recorded");
        Ok(recorded)
    }

    /// Resolves a pending report in favour of the ledger.
    ///
    /// The pending row is deleted inside the same transaction that applies
    /// the scoring, so of two concurrent confirmations only one commits a
    /// match; the other sees the report as gone.
    #[instrument(skip(self))]
    pub async fn confirm(&self, actor: UserId, pending_id: i64) -> Result<ConfirmOutcome, AppError> {
        let pending = self.authorized_pending(actor, pending_id).await?;
        let _guard = self.locks.acquire(pending.league_id).await;

        let mut tx = self.repo.begin().await?;
        let Some(pending) = queries::pending_by_id(&mut *tx, pending_id).await? else {
            return Err(NotFound::PendingMatch(pending_id).into());
        };
        if !queries::claim_pending(&mut *tx, pending_id).await? {
            return Err(NotFound::PendingMatch(pending_id).into());
        }

        if self.is_expired(&pending, now_millis()) {
            tx.commit().await?;
            debug!(pending_id, "📝 Pending match expired before confirmation");
            return Err(NotFound::PendingMatch(pending_id).into());
        }

        if let Some(reason) = self.discard_reason(&mut *tx, &pending).await? {
            tx.commit().await?;
            warn!(pending_id, %reason, "📝 ⚠️ Pending match discarded at confirmation");
            return Ok(ConfirmOutcome::Discarded(reason));
        }

        let scope = Scope::new(pending.guild_id, pending.format);
        queries::upsert_deck(&mut *tx, scope, &pending.p1_deck).await?;
        queries::upsert_deck(&mut *tx, scope, &pending.p2_deck).await?;

        let outcome = pending.outcome();
        scoring::apply_outcome(&mut *tx, pending.league_id, outcome).await?;

        let (p1, p2) = outcome.sides();
        let confirmed = queries::insert_match(
            &mut *tx,
            &NewMatch {
                league_id: pending.league_id,
                format: pending.format,
                p1,
                p2,
                result: pending.result,
                created_at: pending.created_at,
                p1_deck: &pending.p1_deck,
                p2_deck: &pending.p2_deck,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            pending_id,
            match_id = confirmed.id,
            league_id = confirmed.league_id,
            "✅ Match confirmed"
        );
        Ok(ConfirmOutcome::Confirmed(confirmed))
    }

    /// Drops a pending report without touching the ledger.
    #[instrument(skip(self))]
    pub async fn refuse(&self, actor: UserId, pending_id: i64) -> Result<PendingMatch, AppError> {
        let pending = self.authorized_pending(actor, pending_id).await?;
        let _guard = self.locks.acquire(pending.league_id).await;

        let mut tx = self.repo.begin().await?;
        if !queries::claim_pending(&mut *tx, pending_id).await? {
            return Err(NotFound::PendingMatch(pending_id).into());
        }
        tx.commit().await?;

        if self.is_expired(&pending, now_millis()) {
            debug!(pending_id, "📝 Pending match expired before refusal");
            return Err(NotFound::PendingMatch(pending_id).into());
        }

        info!(pending_id, league_id = pending.league_id, "❌ Match refused");
        Ok(pending)
    }

    /// Live reports waiting for `user_id` to confirm or refuse.
    pub async fn pending_for(&self, user_id: UserId) -> Result<Vec<PendingMatch>, AppError> {
        let since = self.live_since(now_millis());
        queries::pending_for_opponent(self.repo.pool(), user_id, since).await
    }

    /// Deletes every expired pending report. Returns how many were removed.
    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        let cutoff = self.live_since(now_millis());
        let removed = queries::delete_pending_before(self.repo.pool(), cutoff).await?;
        if removed > 0 {
            info!(removed, "🧹 Expired pending matches removed");
        }
        Ok(removed)
    }

    /// The pending report, if `actor` is the one who has to answer it.
    ///
    /// An unknown id and someone else's report give the same error, so ids
    /// cannot be discovered by users who are not involved.
    async fn authorized_pending(
        &self,
        actor: UserId,
        pending_id: i64,
    ) -> Result<PendingMatch, AppError> {
        match queries::pending_by_id(self.repo.pool(), pending_id).await? {
            Some(pending) if pending.opponent_id == actor => Ok(pending),
            Some(_) => {
                warn!(pending_id, actor, "📝 ⚠️ Pending match touched by someone else");
                Err(AppError::Unauthorized)
            }
            None => {
                debug!(pending_id, actor, "📝 Unknown pending match");
                Err(AppError::Unauthorized)
            }
        }
    }

    async fn discard_reason(
        &self,
        conn: &mut SqliteConnection,
        pending: &PendingMatch,
    ) -> Result<Option<DiscardReason>, AppError> {
        if !is_open(&mut *conn, pending.league_id).await? {
            return Ok(Some(DiscardReason::LeagueClosed));
        }

        self.check_participants(conn, pending.league_id, pending.reporter_id, pending.opponent_id)
            .await
    }
}

/// Re-reads the league's status under the writer lock. The league a command
/// resolved may have been closed or superseded since.
async fn is_open(conn: &mut SqliteConnection, league_id: i64) -> Result<bool, AppError> {
    Ok(queries::league_by_id(conn, league_id)
        .await?
        .is_some_and(|league| league.is_open()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::league::{Format, LeagueSettings};
    use crate::league::test_support::{self, U1, U2, U3, admin, scope};

    fn report(reporter: UserId, opponent: UserId, result: ReportedResult) -> MatchReport {
        MatchReport {
            scope: scope(),
            reporter,
            opponent: Opponent::human(opponent),
            result,
            reporter_deck: "Aggro".into(),
            opponent_deck: "Control".into(),
        }
    }

    async fn match_count(service: &LeagueService, league_id: i64) -> i64 {
        queries::count_matches(service.repo.pool(), league_id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn only_the_opponent_can_confirm_a_draw() {
        let service = test_support::service().await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let pending = service
            .report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap();

        let err = service.confirm(U1, pending.id).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert!(queries::pending_by_id(service.repo.pool(), pending.id)
            .await
            .unwrap()
            .is_some());
        assert_eq!(match_count(&service, league.id).await, 0);

        let ConfirmOutcome::Confirmed(confirmed) = service.confirm(U2, pending.id).await.unwrap()
        else {
            panic!("confirmation should commit the match");
        };
        assert_eq!(confirmed.result, MatchResult::Draw);
        assert_eq!((confirmed.p1, confirmed.p2), (U1, U2));
        assert_eq!(confirmed.created_at, pending.created_at);
        assert_eq!(match_count(&service, league.id).await, 1);

        for user in [U1, U2] {
            let standing = service.standing(league.id, user).await.unwrap();
            assert_eq!((standing.draws, standing.points), (1, 1));
        }

        let err = service.confirm(U2, pending.id).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn unknown_and_foreign_reports_look_the_same() {
        let service = test_support::service().await;
        test_support::league_with(&service, &[U1, U2, U3]).await;

        let pending = service
            .report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap();

        let foreign = service.confirm(U3, pending.id).await.unwrap_err();
        let unknown = service.confirm(U3, pending.id + 1000).await.unwrap_err();
        assert_eq!(foreign.to_string(), unknown.to_string());
        assert!(matches!(foreign, AppError::Unauthorized));
        assert!(matches!(unknown, AppError::Unauthorized));

        let foreign = service.refuse(U3, pending.id).await.unwrap_err();
        let unknown = service.refuse(U3, pending.id + 1000).await.unwrap_err();
        assert_eq!(foreign.to_string(), unknown.to_string());
        assert_eq!(service.pending_for(U2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn opponent_win_is_stored_winner_first() {
        let service = test_support::service().await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let pending = service
            .report_match(report(U1, U2, ReportedResult::Win(Side::Opponent)))
            .await
            .unwrap();
        assert_eq!((pending.winner_id, pending.loser_id), (Some(U2), Some(U1)));
        assert_eq!(pending.p1_deck, "Control");

        let outcome = service.confirm(U2, pending.id).await.unwrap();
        let ConfirmOutcome::Confirmed(confirmed) = outcome else {
            panic!("expected a confirmed match, got {outcome:?}");
        };
        assert_eq!((confirmed.p1, confirmed.p2), (U2, U1));
        assert_eq!((confirmed.p1_deck.as_str(), confirmed.p2_deck.as_str()), ("Control", "Aggro"));
        assert_eq!(service.standing(league.id, U2).await.unwrap().points, 3);
        assert_eq!(service.standing(league.id, U1).await.unwrap().losses, 1);
    }

    #[tokio::test]
    async fn invalid_reports_change_nothing() {
        let service = test_support::service().await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let cases = [
            (report(U1, U1, ReportedResult::Draw), "self"),
            (
                MatchReport {
                    opponent: Opponent { id: U2, is_bot: true },
                    ..report(U1, U2, ReportedResult::Draw)
                },
                "bot",
            ),
            (
                MatchReport {
                    reporter_deck: "  ".into(),
                    ..report(U1, U2, ReportedResult::Draw)
                },
                "empty deck",
            ),
            (
                MatchReport {
                    opponent_deck: "x".repeat(80),
                    ..report(U1, U2, ReportedResult::Draw)
                },
                "long deck",
            ),
            (report(U1, U3, ReportedResult::Draw), "unregistered"),
        ];

        for (bad, label) in cases {
            let err = service.report_match(bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{label}: {err:?}");
        }

        assert_eq!(
            queries::count_pending(service.repo.pool(), league.id)
                .await
                .unwrap(),
            0
        );
        assert!(service.list_decks(scope()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn refusal_drops_the_report() {
        let service = test_support::service().await;
        let league = test_support::league_with(&service, &[U1, U2, U3]).await;

        let pending = service
            .report_match(report(U1, U2, ReportedResult::Win(Side::Reporter)))
            .await
            .unwrap();

        let err = service.refuse(U3, pending.id).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        let refused = service.refuse(U2, pending.id).await.unwrap();
        assert_eq!(refused.id, pending.id);
        assert_eq!(match_count(&service, league.id).await, 0);
        assert!(service.leaderboard(league.id, None).await.unwrap().is_empty());

        let err = service.confirm(U2, pending.id).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn closed_league_discards_at_confirmation() {
        let service = test_support::service().await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let pending = service
            .report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap();
        service.close_league(admin(), scope()).await.unwrap();

        let outcome = service.confirm(U2, pending.id).await.unwrap();
        assert_eq!(outcome, ConfirmOutcome::Discarded(DiscardReason::LeagueClosed));
        assert_eq!(match_count(&service, league.id).await, 0);
        assert!(queries::pending_by_id(service.repo.pool(), pending.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unregistered_participant_discards_at_confirmation() {
        let service = test_support::service().await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let pending = service
            .report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap();
        service.leave(scope(), U1).await.unwrap();

        let outcome = service.confirm(U2, pending.id).await.unwrap();
        assert_eq!(
            outcome,
            ConfirmOutcome::Discarded(DiscardReason::NotRegistered(U1))
        );
        assert_eq!(match_count(&service, league.id).await, 0);
    }

    #[tokio::test]
    async fn expired_reports_cannot_be_confirmed() {
        let service = test_support::service_with(LeagueSettings {
            pending_ttl: Duration::ZERO,
            ..LeagueSettings::default()
        })
        .await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let pending = service
            .report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap();
        assert!(service.pending_for(U2).await.unwrap().is_empty());

        let err = service.confirm(U2, pending.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(NotFound::PendingMatch(_))));
        assert_eq!(match_count(&service, league.id).await, 0);

        // Lazily deleted by the failed confirmation.
        assert!(queries::pending_by_id(service.repo.pool(), pending.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_reports() {
        let live = test_support::service().await;
        test_support::league_with(&live, &[U1, U2]).await;
        live.report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap();
        assert_eq!(live.sweep_expired().await.unwrap(), 0);
        assert_eq!(live.pending_for(U2).await.unwrap().len(), 1);

        let expiring = test_support::service_with(LeagueSettings {
            pending_ttl: Duration::ZERO,
            ..LeagueSettings::default()
        })
        .await;
        test_support::league_with(&expiring, &[U1, U2]).await;
        expiring
            .report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap();
        assert_eq!(expiring.sweep_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_confirmations_commit_once() {
        let service = test_support::file_service().await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let pending_id = service
            .report_match(report(U1, U2, ReportedResult::Win(Side::Reporter)))
            .await
            .unwrap()
            .id;

        let attempts: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.confirm(U2, pending_id).await })
            })
            .collect();

        let mut confirmed = 0;
        let mut rejected = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(ConfirmOutcome::Confirmed(_)) => confirmed += 1,
                // Gone before or after the opponent check, depending on timing.
                Err(AppError::NotFound(NotFound::PendingMatch(_)) | AppError::Unauthorized) => {
                    rejected += 1
                }
                other => panic!("unexpected confirmation result: {other:?}"),
            }
        }

        assert_eq!((confirmed, rejected), (1, 3));
        assert_eq!(match_count(&service, league.id).await, 1);
        let winner = service.standing(league.id, U1).await.unwrap();
        assert_eq!((winner.wins, winner.points), (1, 3));
    }

    #[tokio::test]
    async fn leagues_of_different_guilds_write_concurrently() {
        const GUILDS: i64 = 4;
        const MATCHES: usize = 25;

        let service = test_support::file_service_with(LeagueSettings {
            max_matches_per_pair: 1000,
            ..LeagueSettings::default()
        })
        .await;

        let mut leagues = Vec::new();
        for guild in 0..GUILDS {
            let scope = Scope::new(test_support::GUILD + guild, Format::Genesys);
            let league = service
                .create_league(admin(), scope, "Spring")
                .await
                .unwrap()
                .league;
            for player in [U1, U2] {
                service.join(scope, player).await.unwrap();
            }
            leagues.push((scope, league.id));
        }

        let writers: Vec<_> = leagues
            .iter()
            .map(|&(scope, _)| {
                let service = service.clone();
                tokio::spawn(async move {
                    for i in 0..MATCHES {
                        let result = if i % 2 == 0 {
                            ReportedResult::Win(Side::Reporter)
                        } else {
                            ReportedResult::Draw
                        };
                        service
                            .record_match(admin(), MatchReport { scope, ..report(U1, U2, result) })
                            .await?;
                    }
                    Ok::<_, AppError>(())
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        for (_, league_id) in leagues {
            assert_eq!(match_count(&service, league_id).await, MATCHES as i64);
            let standing = service.standing(league_id, U1).await.unwrap();
            assert_eq!((standing.wins, standing.draws), (13, 12));
            assert_eq!(standing.points, 13 * 3 + 12);
        }
    }

    #[tokio::test]
    async fn confirmations_and_sweeps_interleave() {
        let service = test_support::file_service_with(LeagueSettings {
            max_matches_per_pair: 1000,
            ..LeagueSettings::default()
        })
        .await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let mut pending = Vec::new();
        for _ in 0..20 {
            let report = service
                .report_match(report(U1, U2, ReportedResult::Draw))
                .await
                .unwrap();
            pending.push(report.id);
        }

        let sweeper = {
            let service = service.clone();
            tokio::spawn(async move {
                let mut removed = 0;
                for _ in 0..20 {
                    removed += service.sweep_expired().await?;
                    tokio::task::yield_now().await;
                }
                Ok::<_, AppError>(removed)
            })
        };
        let confirmations: Vec<_> = pending
            .into_iter()
            .map(|id| {
                let service = service.clone();
                tokio::spawn(async move { service.confirm(U2, id).await })
            })
            .collect();

        for confirmation in confirmations {
            let outcome = confirmation.await.unwrap().unwrap();
            assert!(matches!(outcome, ConfirmOutcome::Confirmed(_)));
        }
        assert_eq!(sweeper.await.unwrap().unwrap(), 0);
        assert_eq!(match_count(&service, league.id).await, 20);
    }

    #[tokio::test]
    async fn expired_report_is_removed_once_by_confirm_or_sweep() {
        let service = test_support::file_service_with(LeagueSettings {
            pending_ttl: Duration::ZERO,
            ..LeagueSettings::default()
        })
        .await;
        let league = test_support::league_with(&service, &[U1, U2]).await;
        let pending_id = service
            .report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap()
            .id;

        let sweep = {
            let service = service.clone();
            tokio::spawn(async move { service.sweep_expired().await })
        };
        let confirm = {
            let service = service.clone();
            tokio::spawn(async move { service.confirm(U2, pending_id).await })
        };

        let swept = sweep.await.unwrap().unwrap();
        let err = confirm.await.unwrap().unwrap_err();
        assert!(swept <= 1);
        assert!(err.is_user_facing(), "{err:?}");
        assert_eq!(match_count(&service, league.id).await, 0);
        assert_eq!(
            queries::count_pending(service.repo.pool(), league.id)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn pair_cap_blocks_reports_and_confirmations() {
        let service = test_support::service_with(LeagueSettings {
            max_matches_per_pair: 1,
            ..LeagueSettings::default()
        })
        .await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let pending = service
            .report_match(report(U2, U1, ReportedResult::Draw))
            .await
            .unwrap();
        service
            .record_match(admin(), report(U1, U2, ReportedResult::Win(Side::Reporter)))
            .await
            .unwrap();

        let err = service
            .report_match(report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::PairLimit { max: 1 })
        ));

        let outcome = service.confirm(U1, pending.id).await.unwrap();
        assert_eq!(
            outcome,
            ConfirmOutcome::Discarded(DiscardReason::PairLimit { max: 1 })
        );
        assert_eq!(match_count(&service, league.id).await, 1);
    }

    #[tokio::test]
    async fn direct_recording_is_admin_only() {
        let service = test_support::service().await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        let err = service
            .record_match(Actor::member(U1), report(U1, U2, ReportedResult::Draw))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(match_count(&service, league.id).await, 0);
    }
}
