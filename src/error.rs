use thiserror::Error;

use crate::league::UserId;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Discord error: {0}")]
    Discord(Box<serenity::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("This command can only be used inside a server")]
    GuildOnly,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(#[from] NotFound),

    #[error("You are not allowed to do that")]
    Unauthorized,

    #[error("Standing of user {user_id} in league #{league_id} cannot be reverted, rebuild the standings")]
    CorruptStanding { league_id: i64, user_id: UserId },
}

impl AppError {
    /// Errors caused by the caller's input or permissions rather than by the
    /// bot itself.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::GuildOnly | Self::Validation(_) | Self::NotFound(_) | Self::Unauthorized
        )
    }
}

impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::Discord(Box::new(err))
    }
}

/// Rejected input. Nothing was written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("You cannot report a match against yourself")]
    SelfMatch,

    #[error("Matches cannot be reported against bot accounts")]
    BotOpponent,

    #[error("Deck name must not be empty")]
    EmptyDeckName,

    #[error("Deck name must be at most {max} characters long")]
    DeckNameTooLong { max: usize },

    #[error("League name must not be empty")]
    EmptyLeagueName,

    #[error("User {0} is not registered in this league")]
    NotRegistered(UserId),

    #[error("These two players already played {max} matches in this league")]
    PairLimit { max: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotFound {
    #[error("No open league for this server and format")]
    OpenLeague,

    #[error("League #{0} does not exist")]
    League(i64),

    #[error("Pending match #{0} does not exist or is no longer pending")]
    PendingMatch(i64),

    #[error("Nothing to undo")]
    MatchToUndo,

    #[error("Deck \"{0}\" is not registered")]
    Deck(String),

    #[error("You are not registered in this league")]
    Registration,
}
