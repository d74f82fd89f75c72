use poise::serenity_prelude::{
    self as serenity, ComponentInteraction, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::league::ConfirmOutcome;

use super::Data;
use super::embeds::{self, CONFIRM_PREFIX, REFUSE_PREFIX};

enum Decision {
    Confirm(i64),
    Refuse(i64),
}

fn parse_custom_id(custom_id: &str) -> Option<Decision> {
    if let Some(id) = custom_id.strip_prefix(CONFIRM_PREFIX) {
        return id.parse().ok().map(Decision::Confirm);
    }
    if let Some(id) = custom_id.strip_prefix(REFUSE_PREFIX) {
        return id.parse().ok().map(Decision::Refuse);
    }
    None
}

/// Handles the Confirm / Refuse buttons attached to a reported match.
#[instrument(
    skip(ctx, component, data),
    fields(user_id = %component.user.id, custom_id = %component.data.custom_id)
)]
pub async fn handle_component(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &Data,
) -> Result<(), AppError> {
    let Some(decision) = parse_custom_id(&component.data.custom_id) else {
        return Ok(());
    };
    let actor = component.user.id.get() as i64;

    let result = match decision {
        Decision::Confirm(id) => data.league.confirm(actor, id).await.map(|outcome| match outcome {
            ConfirmOutcome::Confirmed(played) => CreateInteractionResponseMessage::new()
                .embed(embeds::match_embed("Match confirmed", &played))
                .components(Vec::new()),
            ConfirmOutcome::Discarded(reason) => CreateInteractionResponseMessage::new()
                .content(format!("Match #{id} was discarded: {reason}."))
                .embeds(Vec::new())
                .components(Vec::new()),
        }),
        Decision::Refuse(id) => data.league.refuse(actor, id).await.map(|pending| {
            CreateInteractionResponseMessage::new()
                .content(format!("Match #{} was refused.", pending.id))
                .embeds(Vec::new())
                .components(Vec::new())
        }),
    };

    let response = match result {
        Ok(message) => CreateInteractionResponse::UpdateMessage(message),
        Err(e) if e.is_user_facing() => {
            warn!(error = %e, "🎮 ⚠️ Button rejected");
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(format!("Error: {}", e))
                    .ephemeral(true),
            )
        }
        Err(e) => return Err(e),
    };

    component.create_response(&ctx.http, response).await?;
    info!("🎮 Button handled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_ids_round_trip() {
        assert!(matches!(
            parse_custom_id(&format!("{CONFIRM_PREFIX}12")),
            Some(Decision::Confirm(12))
        ));
        assert!(matches!(
            parse_custom_id(&format!("{REFUSE_PREFIX}7")),
            Some(Decision::Refuse(7))
        ));
        assert!(parse_custom_id("pending:confirm:abc").is_none());
        assert!(parse_custom_id("other").is_none());
    }
}
