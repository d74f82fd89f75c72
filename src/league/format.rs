use std::fmt;

use poise::ChoiceParameter;

use super::GuildId;

/// Game format a league, a match and a deck belong to.
///
/// `Untagged` covers single-format deployments that never pick a format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, ChoiceParameter, sqlx::Type,
)]
#[sqlx(rename_all = "lowercase")]
pub enum Format {
    #[name = "Genesys"]
    Genesys,
    #[name = "Advanced"]
    Advanced,
    #[name = "Traditional"]
    Traditional,
    #[name = "Untagged"]
    #[default]
    Untagged,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Genesys => "genesys",
            Self::Advanced => "advanced",
            Self::Traditional => "traditional",
            Self::Untagged => "untagged",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Genesys => "Genesys",
            Self::Advanced => "Advanced",
            Self::Traditional => "Traditional",
            Self::Untagged => "Untagged",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A `(guild, format)` pair. Leagues, the one-open-league rule and the deck
/// registry are all partitioned by scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub guild_id: GuildId,
    pub format: Format,
}

impl Scope {
    pub fn new(guild_id: GuildId, format: Format) -> Self {
        Self { guild_id, format }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_is_the_default_scope_format() {
        assert_eq!(Format::default(), Format::Untagged);
        assert_eq!(Format::Genesys.as_str(), "genesys");
        assert_eq!(Format::Genesys.to_string(), "Genesys");
    }
}
