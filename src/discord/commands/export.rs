use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

use super::scope;
use crate::discord::bot::Context;
use crate::error::AppError;
use crate::league::Format;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ExportKind {
    #[name = "Matches"]
    Matches,
    #[name = "Standings"]
    Standings,
}

/// Download the league data as CSV
#[poise::command(slash_command, guild_only, ephemeral)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn export(
    ctx: Context<'_>,
    #[description = "What to export"] kind: ExportKind,
    #[description = "Game format"] format: Option<Format>,
) -> Result<(), AppError> {
    ctx.defer_ephemeral().await?;

    let service = &ctx.data().league;
    let league = service.require_open_league(scope(ctx, format)?).await?;
    let (csv, name) = match kind {
        ExportKind::Matches => (service.export_matches(league.id).await?, "matches"),
        ExportKind::Standings => (service.export_standings(league.id).await?, "standings"),
    };

    let filename = format!("league-{}-{}.csv", league.id, name);
    ctx.send(
        poise::CreateReply::default()
            .content(format!("Export of **{}**", league.name))
            .attachment(serenity::CreateAttachment::bytes(csv.into_bytes(), filename.as_str())),
    )
    .await?;

    info!(league_id = league.id, kind = ?kind, "📤 League exported");
    Ok(())
}
