use tracing::{info, instrument};

use super::service::now_millis;
use super::{Actor, LeagueService, Scope, UserId};
use crate::db::{League, queries};
use crate::error::{AppError, NotFound, ValidationError};

#[derive(Debug, Clone)]
pub struct Registration {
    pub league: League,
    /// `false` when the user was already registered.
    pub newly_joined: bool,
}

#[derive(Debug, Clone)]
pub struct CreatedLeague {
    pub league: League,
    /// Previously open league of the scope that was closed to make room.
    pub superseded: Option<League>,
}

#[derive(Debug, Clone)]
pub struct LeagueOverview {
    pub league: League,
    pub players: i64,
    pub matches: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub matches: u64,
    pub standings: u64,
    pub players: u64,
    pub pending: u64,
}

impl LeagueService {
    /// Opens a new league, closing whichever league was open in the scope.
    #[instrument(skip(self), fields(guild_id = scope.guild_id, format = %scope.format))]
    pub async fn create_league(
        &self,
        actor: Actor,
        scope: Scope,
        name: &str,
    ) -> Result<CreatedLeague, AppError> {
        actor.require_admin()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyLeagueName.into());
        }

        let _scope_guard = self.locks.acquire_scope(scope).await;
        let previous = queries::open_league(self.repo.pool(), scope).await?;
        let _guard = match &previous {
            Some(league) => Some(self.locks.acquire(league.id).await),
            None => None,
        };

        let mut tx = self.repo.begin().await?;
        let closed = queries::close_open_leagues(&mut *tx, scope).await?;
        let league = queries::insert_league(&mut *tx, scope, name, now_millis()).await?;
        tx.commit().await?;

        info!(league_id = league.id, closed, "🏆 League created");

        Ok(CreatedLeague {
            league,
            superseded: previous.filter(|_| closed > 0),
        })
    }

    #[instrument(skip(self), fields(guild_id = scope.guild_id, format = %scope.format))]
    pub async fn close_league(&self, actor: Actor, scope: Scope) -> Result<League, AppError> {
        actor.require_admin()?;
        let _scope_guard = self.locks.acquire_scope(scope).await;
        let league = self.require_open_league(scope).await?;
        let _guard = self.locks.acquire(league.id).await;

        if !queries::close_league(self.repo.pool(), league.id).await? {
            return Err(NotFound::OpenLeague.into());
        }

        info!(league_id = league.id, "🏆 League closed");
        Ok(league)
    }

    pub async fn open_league(&self, scope: Scope) -> Result<Option<League>, AppError> {
        queries::open_league(self.repo.pool(), scope).await
    }

    pub async fn require_open_league(&self, scope: Scope) -> Result<League, AppError> {
        self.open_league(scope)
            .await?
            .ok_or_else(|| NotFound::OpenLeague.into())
    }

    pub async fn league(&self, league_id: i64) -> Result<League, AppError> {
        queries::league_by_id(self.repo.pool(), league_id)
            .await?
            .ok_or_else(|| NotFound::League(league_id).into())
    }

    pub async fn league_overview(&self, scope: Scope) -> Result<LeagueOverview, AppError> {
        let league = self.require_open_league(scope).await?;
        let pool = self.repo.pool();

        Ok(LeagueOverview {
            players: queries::count_players(pool, league.id).await?,
            matches: queries::count_matches(pool, league.id).await?,
            pending: queries::count_pending(pool, league.id).await?,
            league,
        })
    }

    /// Wipes the ledger, standings, registrations and pending reports of a
    /// league. Decks are kept.
    #[instrument(skip(self))]
    pub async fn reset_league(&self, actor: Actor, league_id: i64) -> Result<ResetReport, AppError> {
        actor.require_admin()?;
        self.league(league_id).await?;
        let _guard = self.locks.acquire(league_id).await;

        let mut tx = self.repo.begin().await?;
        let report = ResetReport {
            matches: queries::delete_matches(&mut *tx, league_id).await?,
            standings: queries::delete_standings(&mut *tx, league_id).await?,
            players: queries::delete_players(&mut *tx, league_id).await?,
            pending: queries::delete_pending_for_league(&mut *tx, league_id).await?,
        };
        tx.commit().await?;

        info!(
            league_id,
            matches = report.matches,
            players = report.players,
            "🏆 League reset"
        );
        Ok(report)
    }

    #[instrument(skip(self), fields(guild_id = scope.guild_id, format = %scope.format))]
    pub async fn join(&self, scope: Scope, user_id: UserId) -> Result<Registration, AppError> {
        let league = self.require_open_league(scope).await?;
        let _guard = self.locks.acquire(league.id).await;

        let newly_joined =
            queries::insert_player(self.repo.pool(), league.id, user_id, now_millis()).await?;
        if newly_joined {
            info!(league_id = league.id, "🙋 Player joined");
        }

        Ok(Registration {
            league,
            newly_joined,
        })
    }

    /// Drops the registration. Standings and past matches stay.
    #[instrument(skip(self), fields(guild_id = scope.guild_id, format = %scope.format))]
    pub async fn leave(&self, scope: Scope, user_id: UserId) -> Result<League, AppError> {
        let league = self.require_open_league(scope).await?;
        let _guard = self.locks.acquire(league.id).await;

        if !queries::delete_player(self.repo.pool(), league.id, user_id).await? {
            return Err(NotFound::Registration.into());
        }

        info!(league_id = league.id, "🙋 Player left");
        Ok(league)
    }

    pub async fn is_registered(&self, league_id: i64, user_id: UserId) -> Result<bool, AppError> {
        queries::is_registered(self.repo.pool(), league_id, user_id).await
    }
}
