mod bot;
pub mod commands;
mod embeds;
mod interactions;

pub use bot::{Data, create_framework};
