use poise::serenity_prelude as serenity;
use tracing::instrument;

use super::deck::autocomplete_deck;
use super::{actor, scope, user_key};
use crate::discord::bot::Context;
use crate::discord::embeds;
use crate::error::{AppError, ValidationError};
use crate::league::{ConfirmOutcome, Format, MatchReport, Opponent, ReportedResult, Side, UserId};

/// Result of a match, from the point of view of whoever reports it.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ResultChoice {
    #[name = "Win"]
    Won,
    #[name = "Loss"]
    Lost,
    #[name = "Draw"]
    Draw,
}

impl From<ResultChoice> for ReportedResult {
    fn from(choice: ResultChoice) -> Self {
        match choice {
            ResultChoice::Won => ReportedResult::Win(Side::Reporter),
            ResultChoice::Lost => ReportedResult::Win(Side::Opponent),
            ResultChoice::Draw => ReportedResult::Draw,
        }
    }
}

fn opponent(user: &serenity::User) -> Opponent {
    Opponent {
        id: user_key(user),
        is_bot: user.bot,
    }
}

/// Both sides of an admin-recorded match. Neither may be a bot.
fn recorded_players(
    player: &serenity::User,
    against: &serenity::User,
) -> Result<(UserId, Opponent), AppError> {
    if player.bot {
        return Err(ValidationError::BotOpponent.into());
    }
    Ok((user_key(player), opponent(against)))
}

/// Report a match result. Your opponent has to confirm it.
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx, against), fields(user_id = %ctx.author().id, opponent_id = %against.id))]
pub async fn report(
    ctx: Context<'_>,
    #[description = "Who you played against"] against: serenity::User,
    #[description = "Your result"] result: ResultChoice,
    #[description = "Your deck"]
    #[autocomplete = "autocomplete_deck"]
    my_deck: String,
    #[description = "Your opponent's deck"]
    #[autocomplete = "autocomplete_deck"]
    their_deck: String,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let pending = ctx
        .data()
        .league
        .report_match(MatchReport {
            scope: scope(ctx, format)?,
            reporter: user_key(ctx.author()),
            opponent: opponent(&against),
            result: result.into(),
            reporter_deck: my_deck,
            opponent_deck: their_deck,
        })
        .await?;

    ctx.send(
        poise::CreateReply::default()
            .content(embeds::mention(pending.opponent_id))
            .embed(embeds::pending_embed(&pending))
            .components(embeds::pending_buttons(pending.id)),
    )
    .await?;
    Ok(())
}

/// Record a match directly, without confirmation
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[instrument(skip(ctx, player, against), fields(user_id = %ctx.author().id))]
pub async fn record(
    ctx: Context<'_>,
    #[description = "First player"] player: serenity::User,
    #[description = "Second player"] against: serenity::User,
    #[description = "Result of the first player"] result: ResultChoice,
    #[description = "Deck of the first player"]
    #[autocomplete = "autocomplete_deck"]
    player_deck: String,
    #[description = "Deck of the second player"]
    #[autocomplete = "autocomplete_deck"]
    against_deck: String,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    let (reporter, opponent) = recorded_players(&player, &against)?;
    let recorded = ctx
        .data()
        .league
        .record_match(
            actor(ctx).await?,
            MatchReport {
                scope: scope(ctx, format)?,
                reporter,
                opponent,
                result: result.into(),
                reporter_deck: player_deck,
                opponent_deck: against_deck,
            },
        )
        .await?;

    ctx.send(poise::CreateReply::default().embed(embeds::match_embed("Match recorded", &recorded)))
        .await?;
    Ok(())
}

/// Confirm a match reported against you
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn confirm(
    ctx: Context<'_>,
    #[description = "Pending match number"] id: i64,
) -> Result<(), AppError> {
    match ctx.data().league.confirm(user_key(ctx.author()), id).await? {
        ConfirmOutcome::Confirmed(played) => {
            ctx.send(
                poise::CreateReply::default().embed(embeds::match_embed("Match confirmed", &played)),
            )
            .await?;
        }
        ConfirmOutcome::Discarded(reason) => {
            ctx.say(format!("Match #{id} was discarded: {reason}."))
                .await?;
        }
    }
    Ok(())
}

/// Refuse a match reported against you
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn refuse(
    ctx: Context<'_>,
    #[description = "Pending match number"] id: i64,
) -> Result<(), AppError> {
    let pending = ctx.data().league.refuse(user_key(ctx.author()), id).await?;
    ctx.say(format!(
        "Match #{} reported by {} was refused.",
        pending.id,
        embeds::mention(pending.reporter_id)
    ))
    .await?;
    Ok(())
}

/// List the matches waiting for your confirmation
#[poise::command(slash_command, guild_only, ephemeral)]
pub async fn pending(ctx: Context<'_>) -> Result<(), AppError> {
    let pending = ctx.data().league.pending_for(user_key(ctx.author())).await?;
    ctx.send(poise::CreateReply::default().embed(embeds::pending_list_embed(&pending)))
        .await?;
    Ok(())
}
