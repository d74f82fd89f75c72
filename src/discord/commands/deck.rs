use poise::ChoiceParameter;
use poise::serenity_prelude::{self as serenity, ResolvedOption, ResolvedValue};
use tracing::{debug, instrument};

use super::{actor, scope};
use crate::discord::bot::Context;
use crate::discord::embeds::{self, BLUE, GREEN, ORANGE};
use crate::error::AppError;
use crate::league::{Format, MIN_MATCHUP_GAMES, Scope};

const AUTOCOMPLETE_LIMIT: u32 = 25;
const MOST_PLAYED_LIMIT: usize = 10;

/// Format picked so far in the command being autocompleted.
fn selected_format(options: &[ResolvedOption<'_>]) -> Option<Format> {
    options.iter().find_map(|option| match &option.value {
        ResolvedValue::SubCommand(nested) | ResolvedValue::SubCommandGroup(nested) => {
            selected_format(nested)
        }
        ResolvedValue::Integer(index) if option.name == "format" => {
            usize::try_from(*index).ok().and_then(Format::from_index)
        }
        _ => None,
    })
}

pub async fn autocomplete_deck(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Some(guild_id) = ctx.guild_id() else {
        return Vec::new();
    };
    let format = match ctx {
        poise::Context::Application(app) => selected_format(&app.interaction.data.options()),
        poise::Context::Prefix(_) => None,
    };
    let scope = Scope::new(guild_id.get() as i64, format.unwrap_or_default());

    match ctx
        .data()
        .league
        .search_decks(scope, partial, AUTOCOMPLETE_LIMIT)
        .await
    {
        Ok(names) => names,
        Err(e) => {
            debug!(error = %e, "🃏 Deck autocomplete failed");
            Vec::new()
        }
    }
}

/// Manage and inspect the decks of this server
#[poise::command(
    slash_command,
    guild_only,
    subcommands("add", "remove", "list", "deck_stats", "matchup", "top", "popular"),
    subcommand_required
)]
pub async fn deck(_ctx: Context<'_>) -> Result<(), AppError> {
    // Parent command, subcommands handle the actual work
    Ok(())
}

/// Register a deck name
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Deck name"] name: String,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let added = ctx
        .data()
        .league
        .add_deck(actor(ctx).await?, scope(ctx, format)?, &name)
        .await?;

    let message = if added {
        format!("Deck **{}** added.", name.trim())
    } else {
        format!("Deck **{}** is already registered.", name.trim())
    };
    ctx.send(
        poise::CreateReply::default().embed(
            serenity::CreateEmbed::new()
                .description(message)
                .color(GREEN),
        ),
    )
    .await?;
    Ok(())
}

/// Remove a deck name. Matches already played keep it.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Deck name"]
    #[autocomplete = "autocomplete_deck"]
    name: String,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    ctx.data()
        .league
        .remove_deck(actor(ctx).await?, scope(ctx, format)?, &name)
        .await?;

    ctx.send(
        poise::CreateReply::default().embed(
            serenity::CreateEmbed::new()
                .description(format!("Deck **{}** removed.", name.trim()))
                .color(ORANGE),
        ),
    )
    .await?;
    Ok(())
}

/// List the registered decks
#[poise::command(slash_command, guild_only)]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let scope = scope(ctx, format)?;
    let decks = ctx.data().league.list_decks(scope).await?;

    if decks.is_empty() {
        ctx.say("No deck is registered yet.").await?;
        return Ok(());
    }

    let description = decks
        .iter()
        .map(|deck| format!("- {}", deck.name))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title(format!("{} decks ({})", scope.format, decks.len()))
        .description(description)
        .color(BLUE);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Win rate and best matchups of a deck
#[poise::command(slash_command, guild_only, rename = "stats")]
pub async fn deck_stats(
    ctx: Context<'_>,
    #[description = "Deck name"]
    #[autocomplete = "autocomplete_deck"]
    name: String,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let stats = ctx
        .data()
        .league
        .deck_stats(scope(ctx, format)?, &name)
        .await?;
    ctx.send(poise::CreateReply::default().embed(embeds::deck_stats_embed(&stats)))
        .await?;
    Ok(())
}

/// Head-to-head record between two decks
#[poise::command(slash_command, guild_only)]
pub async fn matchup(
    ctx: Context<'_>,
    #[description = "First deck"]
    #[autocomplete = "autocomplete_deck"]
    deck: String,
    #[description = "Second deck"]
    #[autocomplete = "autocomplete_deck"]
    against: String,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let matchup = ctx
        .data()
        .league
        .matchup(scope(ctx, format)?, &deck, &against)
        .await?;
    ctx.send(poise::CreateReply::default().embed(embeds::matchup_embed(&matchup)))
        .await?;
    Ok(())
}

/// Decks a deck performs best against
#[poise::command(slash_command, guild_only)]
pub async fn top(
    ctx: Context<'_>,
    #[description = "Deck name"]
    #[autocomplete = "autocomplete_deck"]
    name: String,
    #[description = "Minimum number of games per matchup"]
    #[min = 1]
    min_games: Option<u32>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let lines = ctx
        .data()
        .league
        .top_matchups(
            scope(ctx, format)?,
            &name,
            min_games.unwrap_or(MIN_MATCHUP_GAMES),
        )
        .await?;

    let description = if lines.is_empty() {
        "Not enough games against any deck yet.".to_string()
    } else {
        lines
            .iter()
            .map(|line| {
                format!(
                    "**{}** · {}W / {}D / {}L",
                    line.opponent, line.record.wins, line.record.draws, line.record.losses
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("{} · Matchups", name.trim()))
        .description(description)
        .color(BLUE);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Most played decks
#[poise::command(slash_command, guild_only)]
pub async fn popular(
    ctx: Context<'_>,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let usage = ctx
        .data()
        .league
        .most_played(scope(ctx, format)?, MOST_PLAYED_LIMIT)
        .await?;
    ctx.send(poise::CreateReply::default().embed(embeds::most_played_embed(&usage)))
        .await?;
    Ok(())
}

