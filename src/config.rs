use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::league::LeagueSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub pending_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_matches_per_pair: u32,
    pub deck_name_max_len: usize,
    pub leaderboard_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        const DEFAULT_PENDING_TTL_SECS: u64 = 24 * 60 * 60;
        const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;
        const DEFAULT_MAX_MATCHES_PER_PAIR: u32 = 5;
        const DEFAULT_DECK_NAME_MAX_LEN: usize = 50;
        const DEFAULT_LEADERBOARD_LIMIT: u32 = 20;

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| AppError::Config("DISCORD_TOKEN must be set".into()))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:deckledger.db".into());

        Ok(Self {
            discord_token,
            database_url,
            pending_ttl_secs: parse_or("PENDING_TTL_SECS", DEFAULT_PENDING_TTL_SECS),
            sweep_interval_secs: parse_or("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)
                .max(1),
            max_matches_per_pair: parse_or("MAX_MATCHES_PER_PAIR", DEFAULT_MAX_MATCHES_PER_PAIR),
            deck_name_max_len: parse_or("DECK_NAME_MAX_LEN", DEFAULT_DECK_NAME_MAX_LEN),
            leaderboard_limit: parse_or("LEADERBOARD_LIMIT", DEFAULT_LEADERBOARD_LIMIT),
        })
    }

    pub fn league_settings(&self) -> LeagueSettings {
        LeagueSettings {
            pending_ttl: Duration::from_secs(self.pending_ttl_secs),
            max_matches_per_pair: self.max_matches_per_pair,
            deck_name_max_len: self.deck_name_max_len,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
