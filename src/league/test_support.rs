use super::{Actor, Format, LeagueService, LeagueSettings, Scope, UserId};
use crate::db::{League, Repository};

pub const GUILD: i64 = 4242;
pub const ADMIN: UserId = 1;
pub const U1: UserId = 101;
pub const U2: UserId = 102;
pub const U3: UserId = 103;

pub fn scope() -> Scope {
    Scope::new(GUILD, Format::Genesys)
}

pub fn admin() -> Actor {
    Actor::admin(ADMIN)
}

pub async fn service() -> LeagueService {
    service_with(LeagueSettings::default()).await
}

pub async fn service_with(settings: LeagueSettings) -> LeagueService {
    let repo = Repository::in_memory()
        .await
        .expect("in-memory database should open");
    LeagueService::new(repo, settings)
}

/// Service over a file database with a multi-connection pool, for tests
/// that race writers against each other.
pub async fn file_service() -> LeagueService {
    file_service_with(LeagueSettings::default()).await
}

pub async fn file_service_with(settings: LeagueSettings) -> LeagueService {
    let repo = Repository::temp_file()
        .await
        .expect("temp database should open");
    LeagueService::new(repo, settings)
}

/// Opens a league in [`scope`] and registers the given players.
pub async fn league_with(service: &LeagueService, players: &[UserId]) -> League {
    let league = service
        .create_league(admin(), scope(), "Spring")
        .await
        .expect("league should be created")
        .league;
    for &player in players {
        service
            .join(scope(), player)
            .await
            .expect("player should join");
    }
    league
}
