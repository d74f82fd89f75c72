use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS leagues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    guild_id INTEGER NOT NULL,
    format TEXT NOT NULL,
    name TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('open', 'closed')),
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS players (
    league_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    joined_at INTEGER NOT NULL,
    PRIMARY KEY (league_id, user_id),
    FOREIGN KEY (league_id) REFERENCES leagues(id)
);

CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    league_id INTEGER NOT NULL,
    format TEXT NOT NULL,
    p1 INTEGER NOT NULL,
    p2 INTEGER NOT NULL,
    result TEXT NOT NULL CHECK (result IN ('win', 'draw')),
    created_at INTEGER NOT NULL,
    p1_deck TEXT NOT NULL,
    p2_deck TEXT NOT NULL,
    FOREIGN KEY (league_id) REFERENCES leagues(id)
);

CREATE TABLE IF NOT EXISTS standings (
    league_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    wins INTEGER NOT NULL DEFAULT 0 CHECK (wins >= 0),
    draws INTEGER NOT NULL DEFAULT 0 CHECK (draws >= 0),
    losses INTEGER NOT NULL DEFAULT 0 CHECK (losses >= 0),
    points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
    PRIMARY KEY (league_id, user_id),
    FOREIGN KEY (league_id) REFERENCES leagues(id)
);

CREATE TABLE IF NOT EXISTS decks (
    guild_id INTEGER NOT NULL,
    format TEXT NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (guild_id, format, name)
);

CREATE TABLE IF NOT EXISTS pending_matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    league_id INTEGER NOT NULL,
    guild_id INTEGER NOT NULL,
    format TEXT NOT NULL,
    reporter_id INTEGER NOT NULL,
    opponent_id INTEGER NOT NULL,
    result TEXT NOT NULL CHECK (result IN ('win', 'draw')),
    winner_id INTEGER,
    loser_id INTEGER,
    p1_deck TEXT NOT NULL,
    p2_deck TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (league_id) REFERENCES leagues(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_leagues_one_open ON leagues(guild_id, format) WHERE status = 'open';
CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league_id, id);
CREATE INDEX IF NOT EXISTS idx_matches_format ON matches(format);
CREATE INDEX IF NOT EXISTS idx_pending_opponent ON pending_matches(opponent_id);
CREATE INDEX IF NOT EXISTS idx_pending_created ON pending_matches(created_at);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
