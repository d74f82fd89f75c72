use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

use super::{actor, scope, user_key};
use crate::discord::bot::Context;
use crate::discord::embeds::{self, GREEN, ORANGE};
use crate::error::AppError;
use crate::league::Format;

/// Manage the league of this server
#[poise::command(
    slash_command,
    guild_only,
    subcommands("create", "close", "status", "reset"),
    subcommand_required
)]
pub async fn league(_ctx: Context<'_>) -> Result<(), AppError> {
    // Parent command, subcommands handle the actual work
    Ok(())
}

/// Open a new league, closing the current one
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn create(
    ctx: Context<'_>,
    #[description = "League name"] name: String,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let scope = scope(ctx, format)?;
    let created = ctx
        .data()
        .league
        .create_league(actor(ctx).await?, scope, &name)
        .await?;

    let mut description = format!(
        "**{}** is open for **{}**. Use `/join` to take part.",
        created.league.name, scope.format
    );
    if let Some(previous) = &created.superseded {
        description.push_str(&format!("\n**{}** has been closed.", previous.name));
    }

    let embed = serenity::CreateEmbed::new()
        .title("League Created")
        .description(description)
        .color(GREEN);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Close the current league
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn close(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let scope = scope(ctx, format)?;
    let league = ctx
        .data()
        .league
        .close_league(actor(ctx).await?, scope)
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("League Closed")
        .description(format!("**{}** no longer accepts matches.", league.name))
        .color(ORANGE);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Show the current league
#[poise::command(slash_command, guild_only)]
pub async fn status(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let overview = ctx.data().league.league_overview(scope(ctx, format)?).await?;
    ctx.send(poise::CreateReply::default().embed(embeds::overview_embed(&overview)))
        .await?;
    Ok(())
}

/// Wipe matches, standings and players of the current league
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn reset(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let service = &ctx.data().league;
    let league = service.require_open_league(scope(ctx, format)?).await?;
    let report = service.reset_league(actor(ctx).await?, league.id).await?;

    let embed = serenity::CreateEmbed::new()
        .title("League Reset")
        .description(format!(
            "**{}** was reset: {} matches, {} players and {} pending reports removed.",
            league.name, report.matches, report.players, report.pending
        ))
        .color(ORANGE);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    info!(league_id = league.id, "🏆 League reset from Discord");
    Ok(())
}

/// Join the current league
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn join(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let registration = ctx
        .data()
        .league
        .join(scope(ctx, format)?, user_key(ctx.author()))
        .await?;

    let message = if registration.newly_joined {
        format!("You joined **{}**.", registration.league.name)
    } else {
        format!("You are already part of **{}**.", registration.league.name)
    };
    ctx.send(poise::CreateReply::default().content(message).ephemeral(true))
        .await?;
    Ok(())
}

/// Leave the current league. Your results stay on the board.
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn leave(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let league = ctx
        .data()
        .league
        .leave(scope(ctx, format)?, user_key(ctx.author()))
        .await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!("You left **{}**.", league.name))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
