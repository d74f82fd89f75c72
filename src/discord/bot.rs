use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::league::LeagueService;

use super::commands;
use super::interactions;

/// Shared data accessible in all commands
#[derive(Debug)]
pub struct Data {
    pub league: LeagueService,
    pub config: Config,
}

pub type Context<'a> = poise::Context<'a, Data, AppError>;

pub fn create_framework(data: Data) -> poise::Framework<Data, AppError> {
    poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::league(),
                commands::join(),
                commands::leave(),
                commands::report(),
                commands::record(),
                commands::confirm(),
                commands::refuse(),
                commands::pending(),
                commands::leaderboard(),
                commands::history(),
                commands::undo(),
                commands::rebuild(),
                commands::stats(),
                commands::h2h(),
                commands::deck(),
                commands::export(),
            ],
            on_error: |error| {
                Box::pin(async move {
                    handle_error(error).await;
                })
            },
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    if let serenity::FullEvent::InteractionCreate {
                        interaction: serenity::Interaction::Component(component),
                    } = event
                    {
                        interactions::handle_component(ctx, component, data).await?;
                    }
                    Ok(())
                })
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!(
                    bot_name = %ready.user.name,
                    guild_count = ready.guilds.len(),
                    "🎮 Bot is ready"
                );
                Ok(data)
            })
        })
        .build()
}

async fn handle_error(error: poise::FrameworkError<'_, Data, AppError>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let command_name = ctx.command().qualified_name.as_str();
            if error.is_user_facing() {
                warn!(
                    error = %error,
                    command = command_name,
                    user_id = %ctx.author().id,
                    "🎮 ⚠️ Command rejected"
                );
            } else {
                error!(
                    error = ?error,
                    command = command_name,
                    user_id = %ctx.author().id,
                    "🎮 ❌ Command execution failed"
                );
            }
            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .content(format!("Error: {}", error))
                        .ephemeral(true),
                )
                .await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            warn!(
                error = %error,
                command = ctx.command().name.as_str(),
                "🎮 ⚠️ Invalid command argument"
            );
            let _ = ctx.say(format!("Invalid argument: {}", error)).await;
        }
        poise::FrameworkError::MissingUserPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            if let Some(perms) = missing_permissions {
                warn!(
                    permissions = %perms,
                    user_id = %ctx.author().id,
                    command = ctx.command().name.as_str(),
                    "🎮 ⚠️ User missing permissions"
                );
                let _ = ctx
                    .say(format!("You need these permissions: {}", perms))
                    .await;
            }
        }
        poise::FrameworkError::GuildOnly { ctx, .. } => {
            let _ = ctx.say(AppError::GuildOnly.to_string()).await;
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(
                error = ?error,
                event = event.snake_case_name(),
                "🎮 ❌ Event handler failed"
            );
        }
        other => {
            error!(error = ?other, "🎮 ❌ Unhandled framework error");
        }
    }
}
