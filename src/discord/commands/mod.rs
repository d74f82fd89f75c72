mod deck;
mod export;
mod league;
mod report;
mod standings;

pub use deck::deck;
pub use export::export;
pub use league::{join, leave, league};
pub use report::{confirm, pending, record, refuse, report};
pub use standings::{h2h, history, leaderboard, rebuild, stats, undo};

use poise::serenity_prelude as serenity;

use crate::discord::bot::Context;
use crate::error::AppError;
use crate::league::{Actor, Format, Scope, UserId};

fn user_key(user: &serenity::User) -> UserId {
    user.id.get() as i64
}

fn scope(ctx: Context<'_>, format: Option<Format>) -> Result<Scope, AppError> {
    let guild_id = ctx.guild_id().ok_or(AppError::GuildOnly)?;
    Ok(Scope::new(guild_id.get() as i64, format.unwrap_or_default()))
}

/// The invoking member, flagged as admin when they can manage the server.
async fn actor(ctx: Context<'_>) -> Result<Actor, AppError> {
    let id = user_key(ctx.author());
    let member = ctx.author_member().await.ok_or(AppError::GuildOnly)?;
    let is_admin = member
        .permissions
        .is_some_and(|perms| perms.administrator() || perms.manage_guild());

    Ok(if is_admin {
        Actor::admin(id)
    } else {
        Actor::member(id)
    })
}
