use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

use super::{actor, scope, user_key};
use crate::discord::bot::Context;
use crate::discord::embeds::{self, GREEN, ORANGE};
use crate::error::AppError;
use crate::league::Format;

const HISTORY_LIMIT: u32 = 10;

/// Show the league leaderboard
#[poise::command(slash_command, guild_only)]
pub async fn leaderboard(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let service = &ctx.data().league;
    let league = service.require_open_league(scope(ctx, format)?).await?;
    let standings = service
        .leaderboard(league.id, Some(ctx.data().config.leaderboard_limit))
        .await?;

    ctx.send(poise::CreateReply::default().embed(embeds::leaderboard_embed(&league, &standings)))
        .await?;
    Ok(())
}

/// Show the latest matches of the league
#[poise::command(slash_command, guild_only)]
pub async fn history(
    ctx: Context<'_>,
    #[description = "Only matches of this player"] player: Option<serenity::User>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let service = &ctx.data().league;
    let league = service.require_open_league(scope(ctx, format)?).await?;
    let matches = service
        .history(league.id, player.as_ref().map(user_key), HISTORY_LIMIT)
        .await?;

    ctx.send(poise::CreateReply::default().embed(embeds::history_embed(&league, &matches)))
        .await?;
    Ok(())
}

/// Cancel the last recorded match
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn undo(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let service = &ctx.data().league;
    let league = service.require_open_league(scope(ctx, format)?).await?;
    let undone = service.undo_last(actor(ctx).await?, league.id).await?;

    let embed = embeds::match_embed("Match cancelled", &undone).color(ORANGE);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Recompute the standings from the match history
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn rebuild(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    ctx.defer().await?;

    let service = &ctx.data().league;
    let league = service.require_open_league(scope(ctx, format)?).await?;
    let report = service.rebuild_standings(actor(ctx).await?, league.id).await?;

    let description = if report.corrected.is_empty() {
        format!(
            "Replayed {} matches, the standings were already correct.",
            report.matches
        )
    } else {
        format!(
            "Replayed {} matches and corrected the standings of {}.",
            report.matches,
            report
                .corrected
                .iter()
                .map(|user_id| embeds::mention(*user_id))
                .collect::<Vec<_>>()
                .join(", ")
        )
    };

    let embed = serenity::CreateEmbed::new()
        .title("Standings Rebuilt")
        .description(description)
        .color(GREEN);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    info!(
        league_id = league.id,
        corrected = report.corrected.len(),
        "🔁 Standings rebuilt from Discord"
    );
    Ok(())
}

/// Show a player's record in the league
#[poise::command(slash_command, guild_only)]
pub async fn stats(
    ctx: Context<'_>,
    #[description = "Player, yourself by default"] player: Option<serenity::User>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let service = &ctx.data().league;
    let league = service.require_open_league(scope(ctx, format)?).await?;
    let user_id = user_key(player.as_ref().unwrap_or(ctx.author()));
    let stats = service.player_stats(league.id, user_id).await?;

    ctx.send(poise::CreateReply::default().embed(embeds::player_embed(user_id, &stats)))
        .await?;
    Ok(())
}

/// Compare the record of two players against each other
#[poise::command(slash_command, guild_only)]
pub async fn h2h(
    ctx: Context<'_>,
    #[description = "Opponent"] against: serenity::User,
    #[description = "Player, yourself by default"] player: Option<serenity::User>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let service = &ctx.data().league;
    let league = service.require_open_league(scope(ctx, format)?).await?;
    let a = user_key(player.as_ref().unwrap_or(ctx.author()));
    let b = user_key(&against);
    let record = service.head_to_head(league.id, a, b).await?;

    ctx.send(poise::CreateReply::default().embed(embeds::head_to_head_embed(a, b, &record)))
        .await?;
    Ok(())
}
