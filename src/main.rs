use poise::serenity_prelude as serenity;
use tracing::{error, info};

mod config;
mod db;
mod discord;
mod error;
mod league;
mod logging;
mod sweeper;

use config::Config;
use db::Repository;
use discord::{Data, create_framework};
use error::AppError;
use league::LeagueService;

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        error!(error = ?e, "🐙 ❌ Fatal error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    info!("🐙 Starting deckledger...");

    let config = Config::from_env()?;
    let repo = Repository::connect(&config.database_url).await?;
    let league = LeagueService::new(repo, config.league_settings());

    tokio::spawn(sweeper::start_sweeping(
        league.clone(),
        config.sweep_interval_secs,
    ));

    let token = config.discord_token.clone();
    let framework = create_framework(Data { league, config });

    let intents = serenity::GatewayIntents::non_privileged();
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    info!("🐙 Connecting to Discord");
    client.start().await?;

    Ok(())
}
