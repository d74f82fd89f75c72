use poise::serenity_prelude::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
};

use crate::db::{League, Match, MatchResult, PendingMatch, Standing};
use crate::league::{
    DeckStats, DeckUsage, HeadToHead, LeagueOverview, Matchup, PlayerStats, UserId,
};

pub const GREEN: u32 = 0x00ff00;
pub const BLUE: u32 = 0x0099ff;
pub const ORANGE: u32 = 0xff6600;

pub const CONFIRM_PREFIX: &str = "pending:confirm:";
pub const REFUSE_PREFIX: &str = "pending:refuse:";

pub fn mention(user_id: UserId) -> String {
    format!("<@{user_id}>")
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn describe_match(played: &Match) -> String {
    match played.result {
        MatchResult::Win => format!(
            "{} ({}) beat {} ({})",
            mention(played.p1),
            played.p1_deck,
            mention(played.p2),
            played.p2_deck
        ),
        MatchResult::Draw => format!(
            "{} ({}) drew with {} ({})",
            mention(played.p1),
            played.p1_deck,
            mention(played.p2),
            played.p2_deck
        ),
    }
}

pub fn pending_embed(pending: &PendingMatch) -> CreateEmbed {
    let (p1, p2) = pending.sides();
    let result = match pending.result {
        MatchResult::Win => format!("{} beat {}", mention(p1), mention(p2)),
        MatchResult::Draw => format!("{} drew with {}", mention(p1), mention(p2)),
    };

    CreateEmbed::new()
        .title(format!("Match #{} awaiting confirmation", pending.id))
        .description(format!(
            "{}, {} reported this result. Please confirm or refuse it.",
            mention(pending.opponent_id),
            mention(pending.reporter_id)
        ))
        .color(ORANGE)
        .field("Result", result, false)
        .field("Decks", format!("{} vs {}", pending.p1_deck, pending.p2_deck), false)
        .field("Format", pending.format.to_string(), true)
}

pub fn pending_buttons(pending_id: i64) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(format!("{CONFIRM_PREFIX}{pending_id}"))
            .label("Confirm")
            .style(ButtonStyle::Success),
        CreateButton::new(format!("{REFUSE_PREFIX}{pending_id}"))
            .label("Refuse")
            .style(ButtonStyle::Danger),
    ])]
}

pub fn match_embed(title: &str, played: &Match) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(describe_match(played))
        .color(GREEN)
        .footer(CreateEmbedFooter::new(format!(
            "Match #{} · {}",
            played.id, played.format
        )))
}

pub fn overview_embed(overview: &LeagueOverview) -> CreateEmbed {
    let league = &overview.league;
    CreateEmbed::new()
        .title(league.name.clone())
        .color(BLUE)
        .field("Format", league.format.to_string(), true)
        .field("Players", overview.players.to_string(), true)
        .field("Matches", overview.matches.to_string(), true)
        .field("Pending", overview.pending.to_string(), true)
}

pub fn leaderboard_embed(league: &League, standings: &[Standing]) -> CreateEmbed {
    let description = if standings.is_empty() {
        "No match has been played yet.".to_string()
    } else {
        standings
            .iter()
            .enumerate()
            .map(|(rank, s)| {
                format!(
                    "**{}.** {} · **{}** pts ({}W / {}D / {}L)",
                    rank + 1,
                    mention(s.user_id),
                    s.points,
                    s.wins,
                    s.draws,
                    s.losses
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    CreateEmbed::new()
        .title(format!("{} · Leaderboard", league.name))
        .description(description)
        .color(BLUE)
}

pub fn history_embed(league: &League, matches: &[Match]) -> CreateEmbed {
    let description = if matches.is_empty() {
        "No match recorded.".to_string()
    } else {
        matches
            .iter()
            .map(|m| format!("`#{}` {}", m.id, describe_match(m)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    CreateEmbed::new()
        .title(format!("{} · Recent matches", league.name))
        .description(description)
        .color(BLUE)
}

pub fn pending_list_embed(pending: &[PendingMatch]) -> CreateEmbed {
    let description = if pending.is_empty() {
        "Nothing waiting for you.".to_string()
    } else {
        pending
            .iter()
            .map(|p| {
                format!(
                    "`#{}` from {} · {} ({} vs {})",
                    p.id,
                    mention(p.reporter_id),
                    p.result,
                    p.p1_deck,
                    p.p2_deck
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    CreateEmbed::new()
        .title(format!("Pending matches ({})", pending.len()))
        .description(description)
        .color(ORANGE)
}

pub fn player_embed(user_id: UserId, stats: &PlayerStats) -> CreateEmbed {
    let s = &stats.standing;
    let decks = if stats.decks.is_empty() {
        "-".to_string()
    } else {
        stats
            .decks
            .iter()
            .map(|(deck, games)| format!("{deck} ({games})"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    CreateEmbed::new()
        .description(mention(user_id))
        .title("Player stats")
        .color(BLUE)
        .field("Points", s.points.to_string(), true)
        .field("Record", format!("{}W / {}D / {}L", s.wins, s.draws, s.losses), true)
        .field("Decks", decks, false)
}

pub fn head_to_head_embed(a: UserId, b: UserId, h2h: &HeadToHead) -> CreateEmbed {
    CreateEmbed::new()
        .title("Head to head")
        .description(format!("{} vs {}", mention(a), mention(b)))
        .color(BLUE)
        .field("Games", h2h.games.to_string(), true)
        .field(
            "Score",
            format!("{} - {} ({} draws)", h2h.a_wins, h2h.b_wins, h2h.draws),
            true,
        )
}

pub fn deck_stats_embed(stats: &DeckStats) -> CreateEmbed {
    let record = stats.record;
    let mut embed = CreateEmbed::new()
        .title(format!("Deck · {}", stats.deck))
        .color(BLUE);

    if stats.games() == 0 {
        return embed.description("No games recorded with this deck.");
    }

    embed = embed
        .field("Games", stats.games().to_string(), true)
        .field(
            "Record",
            format!("{}W / {}D / {}L", record.wins, record.draws, record.losses),
            true,
        )
        .field("Win rate", percent(stats.win_rate()), true);

    if !stats.top_matchups.is_empty() {
        let lines = stats
            .top_matchups
            .iter()
            .take(5)
            .map(|line| {
                format!(
                    "{} · {} over {} games",
                    line.opponent,
                    percent(line.record.win_rate()),
                    line.record.games()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Best matchups", lines, false);
    }
    embed
}

pub fn matchup_embed(matchup: &Matchup) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("{} vs {}", matchup.deck_a, matchup.deck_b))
        .color(BLUE)
        .field("Games", matchup.games.to_string(), true)
        .field(
            "Score",
            format!(
                "{} - {} ({} draws)",
                matchup.a_wins, matchup.b_wins, matchup.draws
            ),
            true,
        )
}

pub fn most_played_embed(usage: &[DeckUsage]) -> CreateEmbed {
    let description = if usage.is_empty() {
        "No deck has been played yet.".to_string()
    } else {
        usage
            .iter()
            .enumerate()
            .map(|(rank, u)| {
                format!(
                    "**{}.** {} · {} games, {} win rate",
                    rank + 1,
                    u.deck,
                    u.record.games(),
                    percent(u.record.win_rate())
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    CreateEmbed::new()
        .title("Most played decks")
        .description(description)
        .color(BLUE)
}
