//! Deck repertoire and deck analytics.
//!
//! Every statistic is a fold over the match ledger of a scope. Nothing here
//! writes to the ledger or the standings.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::info;

use super::{Actor, LeagueService, MIN_MATCHUP_GAMES, Scope};
use crate::db::{Deck, Match, MatchResult, queries};
use crate::error::{AppError, NotFound};

/// Games of one deck, counted per side it appeared on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeckRecord {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl DeckRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    /// `wins / games`, `0.0` without games. Callers should show a deck with
    /// no games as having no data rather than 0%.
    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => f64::from(self.wins) / f64::from(games),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckStats {
    pub deck: String,
    pub record: DeckRecord,
    pub top_matchups: Vec<MatchupLine>,
}

impl DeckStats {
    pub fn games(&self) -> u32 {
        self.record.games()
    }

    pub fn win_rate(&self) -> f64 {
        self.record.win_rate()
    }
}

/// Head-to-head between two decks, independent of which one was `p1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub deck_a: String,
    pub deck_b: String,
    pub games: u32,
    pub a_wins: u32,
    pub b_wins: u32,
    pub draws: u32,
}

/// One opposing deck as seen from the deck being analysed.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupLine {
    pub opponent: String,
    pub record: DeckRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckUsage {
    pub deck: String,
    pub record: DeckRecord,
}

/// Per-deck records over the given matches.
///
/// A win counts for the `p1` deck and a loss for the `p2` deck. A draw counts
/// once for each distinct deck involved.
pub fn deck_records<'a>(ledger: impl IntoIterator<Item = &'a Match>) -> BTreeMap<&'a str, DeckRecord> {
    let mut records: BTreeMap<&str, DeckRecord> = BTreeMap::new();
    for played in ledger {
        let (p1, p2) = (played.p1_deck.as_str(), played.p2_deck.as_str());
        match played.result {
            MatchResult::Win => {
                records.entry(p1).or_default().wins += 1;
                records.entry(p2).or_default().losses += 1;
            }
            MatchResult::Draw => {
                records.entry(p1).or_default().draws += 1;
                if p2 != p1 {
                    records.entry(p2).or_default().draws += 1;
                }
            }
        }
    }
    records
}

pub fn deck_stats(ledger: &[Match], deck: &str, min_games: u32) -> DeckStats {
    let record = deck_records(ledger.iter().filter(|played| {
        played.p1_deck == deck || played.p2_deck == deck
    }))
    .get(deck)
    .copied()
    .unwrap_or_default();

    DeckStats {
        deck: deck.to_string(),
        record,
        top_matchups: top_matchups(ledger, deck, min_games),
    }
}

pub fn matchup(ledger: &[Match], deck_a: &str, deck_b: &str) -> Matchup {
    let mut line = Matchup {
        deck_a: deck_a.to_string(),
        deck_b: deck_b.to_string(),
        games: 0,
        a_wins: 0,
        b_wins: 0,
        draws: 0,
    };

    for played in ledger {
        let (p1, p2) = (played.p1_deck.as_str(), played.p2_deck.as_str());
        let a_first = p1 == deck_a && p2 == deck_b;
        let b_first = p1 == deck_b && p2 == deck_a;
        if !(a_first || b_first) {
            continue;
        }

        line.games += 1;
        match played.result {
            MatchResult::Draw => line.draws += 1,
            // A mirror win is a win for both names.
            MatchResult::Win if deck_a == deck_b => {
                line.a_wins += 1;
                line.b_wins += 1;
            }
            MatchResult::Win if a_first => line.a_wins += 1,
            MatchResult::Win => line.b_wins += 1,
        }
    }
    line
}

/// Opposing decks ranked by `deck`'s win rate against them, then by games
/// played, then by name. Mirror matches and matchups under `min_games` are
/// left out.
pub fn top_matchups(ledger: &[Match], deck: &str, min_games: u32) -> Vec<MatchupLine> {
    let mut by_opponent: BTreeMap<&str, DeckRecord> = BTreeMap::new();
    for played in ledger {
        let (p1, p2) = (played.p1_deck.as_str(), played.p2_deck.as_str());
        if p1 == p2 {
            continue;
        }
        let (opponent, won, lost) = if p1 == deck {
            (p2, played.result == MatchResult::Win, false)
        } else if p2 == deck {
            (p1, false, played.result == MatchResult::Win)
        } else {
            continue;
        };

        let record = by_opponent.entry(opponent).or_default();
        if won {
            record.wins += 1;
        } else if lost {
            record.losses += 1;
        } else {
            record.draws += 1;
        }
    }

    let mut lines: Vec<MatchupLine> = by_opponent
        .into_iter()
        .filter(|(_, record)| record.games() >= min_games)
        .map(|(opponent, record)| MatchupLine {
            opponent: opponent.to_string(),
            record,
        })
        .collect();

    lines.sort_by(|a, b| {
        b.record
            .win_rate()
            .partial_cmp(&a.record.win_rate())
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.record.games().cmp(&a.record.games()))
            .then_with(|| a.opponent.cmp(&b.opponent))
    });
    lines
}

/// Decks by total games, ties broken by name.
pub fn most_played(ledger: &[Match], limit: usize) -> Vec<DeckUsage> {
    let mut usage: Vec<DeckUsage> = deck_records(ledger)
        .into_iter()
        .map(|(deck, record)| DeckUsage {
            deck: deck.to_string(),
            record,
        })
        .collect();

    usage.sort_by(|a, b| {
        b.record
            .games()
            .cmp(&a.record.games())
            .then_with(|| a.deck.cmp(&b.deck))
    });
    usage.truncate(limit);
    usage
}

impl LeagueService {
    /// Registers a deck name for the scope. Returns `false` if it was known.
    pub async fn add_deck(&self, actor: Actor, scope: Scope, name: &str) -> Result<bool, AppError> {
        actor.require_admin()?;
        let name = self.deck_name(name)?;
        let added = queries::upsert_deck(self.repo.pool(), scope, &name).await?;
        if added {
            info!(guild_id = scope.guild_id, format = %scope.format, deck = %name, "🃏 Deck added");
        }
        Ok(added)
    }

    /// Removes a deck name from the registry. Past matches keep the name.
    pub async fn remove_deck(&self, actor: Actor, scope: Scope, name: &str) -> Result<(), AppError> {
        actor.require_admin()?;
        let name = name.trim();
        if !queries::delete_deck(self.repo.pool(), scope, name).await? {
            return Err(NotFound::Deck(name.to_string()).into());
        }
        info!(guild_id = scope.guild_id, format = %scope.format, deck = %name, "🃏 Deck removed");
        Ok(())
    }

    pub async fn list_decks(&self, scope: Scope) -> Result<Vec<Deck>, AppError> {
        queries::decks(self.repo.pool(), scope).await
    }

    pub async fn search_decks(
        &self,
        scope: Scope,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<String>, AppError> {
        queries::search_decks(self.repo.pool(), scope, prefix.trim(), limit).await
    }

    pub async fn deck_stats(&self, scope: Scope, deck: &str) -> Result<DeckStats, AppError> {
        let ledger = queries::scope_matches(self.repo.pool(), scope).await?;
        Ok(deck_stats(&ledger, deck.trim(), MIN_MATCHUP_GAMES))
    }

    pub async fn matchup(&self, scope: Scope, deck_a: &str, deck_b: &str) -> Result<Matchup, AppError> {
        let ledger = queries::scope_matches(self.repo.pool(), scope).await?;
        Ok(matchup(&ledger, deck_a.trim(), deck_b.trim()))
    }

    pub async fn top_matchups(
        &self,
        scope: Scope,
        deck: &str,
        min_games: u32,
    ) -> Result<Vec<MatchupLine>, AppError> {
        let ledger = queries::scope_matches(self.repo.pool(), scope).await?;
        Ok(top_matchups(&ledger, deck.trim(), min_games))
    }

    pub async fn most_played(&self, scope: Scope, limit: usize) -> Result<Vec<DeckUsage>, AppError> {
        let ledger = queries::scope_matches(self.repo.pool(), scope).await?;
        Ok(most_played(&ledger, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::test_support::{self, U1, U2, U3, admin, scope};
    use crate::league::{Format, MatchReport, Opponent, ReportedResult, Side};

    fn played(id: i64, p1_deck: &str, p2_deck: &str, result: MatchResult) -> Match {
        Match {
            id,
            league_id: 1,
            format: Format::Genesys,
            p1: 1,
            p2: 2,
            result,
            created_at: id,
            p1_deck: p1_deck.into(),
            p2_deck: p2_deck.into(),
        }
    }

    fn sample_ledger() -> Vec<Match> {
        vec![
            played(1, "Aggro", "Control", MatchResult::Win),
            played(2, "Aggro", "Control", MatchResult::Win),
            played(3, "Midrange", "Aggro", MatchResult::Win),
        ]
    }

    #[test]
    fn deck_stats_counts_wins_and_keeps_big_samples_only() {
        let stats = deck_stats(&sample_ledger(), "Aggro", MIN_MATCHUP_GAMES);

        assert_eq!((stats.games(), stats.record.wins, stats.record.losses), (3, 2, 1));
        assert!((stats.win_rate() - 0.667).abs() < 0.001);
        let opponents: Vec<_> = stats.top_matchups.iter().map(|l| l.opponent.as_str()).collect();
        assert_eq!(opponents, vec!["Control"]);
    }

    #[test]
    fn unknown_deck_has_no_games() {
        let stats = deck_stats(&sample_ledger(), "Burn", MIN_MATCHUP_GAMES);
        assert_eq!(stats.games(), 0);
        assert_eq!(stats.win_rate(), 0.0);
        assert!(stats.top_matchups.is_empty());
    }

    #[test]
    fn draws_count_on_both_sides() {
        let ledger = vec![
            played(1, "Aggro", "Control", MatchResult::Draw),
            played(2, "Control", "Control", MatchResult::Draw),
        ];
        let records = deck_records(&ledger);
        assert_eq!(records["Aggro"], DeckRecord { wins: 0, draws: 1, losses: 0 });
        assert_eq!(records["Control"], DeckRecord { wins: 0, draws: 2, losses: 0 });
    }

    #[test]
    fn matchup_is_symmetric() {
        let ledger = vec![
            played(1, "Aggro", "Control", MatchResult::Win),
            played(2, "Control", "Aggro", MatchResult::Win),
            played(3, "Control", "Aggro", MatchResult::Win),
            played(4, "Aggro", "Control", MatchResult::Draw),
            played(5, "Aggro", "Midrange", MatchResult::Win),
        ];

        let ab = matchup(&ledger, "Aggro", "Control");
        let ba = matchup(&ledger, "Control", "Aggro");

        assert_eq!((ab.games, ab.a_wins, ab.b_wins, ab.draws), (4, 1, 2, 1));
        assert_eq!(ab.games, ba.games);
        assert_eq!((ab.a_wins, ab.b_wins), (ba.b_wins, ba.a_wins));
        assert_eq!(ab.draws, ba.draws);
    }

    #[test]
    fn top_matchups_tie_breaks_by_games_then_name() {
        let ledger = vec![
            // Burn: 2-0
            played(1, "Aggro", "Burn", MatchResult::Win),
            played(2, "Aggro", "Burn", MatchResult::Win),
            // Control: 3-0
            played(3, "Aggro", "Control", MatchResult::Win),
            played(4, "Aggro", "Control", MatchResult::Win),
            played(5, "Control", "Aggro", MatchResult::Draw),
            played(6, "Aggro", "Control", MatchResult::Win),
            // Combo: 2-0
            played(7, "Aggro", "Combo", MatchResult::Win),
            played(8, "Aggro", "Combo", MatchResult::Win),
            // Midrange: 1-1
            played(9, "Aggro", "Midrange", MatchResult::Win),
            played(10, "Midrange", "Aggro", MatchResult::Win),
            // Mirror, ignored
            played(11, "Aggro", "Aggro", MatchResult::Win),
            played(12, "Aggro", "Aggro", MatchResult::Win),
        ];

        let lines = top_matchups(&ledger, "Aggro", 2);
        let order: Vec<_> = lines.iter().map(|l| l.opponent.as_str()).collect();
        assert_eq!(order, vec!["Burn", "Combo", "Control", "Midrange"]);
        assert_eq!(lines[2].record, DeckRecord { wins: 3, draws: 1, losses: 0 });
    }

    #[test]
    fn most_played_counts_both_sides() {
        let ledger = vec![
            played(1, "Aggro", "Control", MatchResult::Win),
            played(2, "Control", "Midrange", MatchResult::Win),
            played(3, "Burn", "Aggro", MatchResult::Draw),
        ];

        let usage = most_played(&ledger, 3);
        let order: Vec<_> = usage
            .iter()
            .map(|u| (u.deck.as_str(), u.record.games()))
            .collect();
        assert_eq!(order, vec![("Aggro", 2), ("Control", 2), ("Burn", 1)]);
    }

    #[tokio::test]
    async fn analytics_read_the_whole_scope_ledger() {
        let service = test_support::service().await;
        test_support::league_with(&service, &[U1, U2, U3]).await;

        let wins = [(U1, U2, "Control"), (U1, U3, "Control"), (U1, U2, "Midrange")];
        for (winner, loser, loser_deck) in wins {
            service
                .record_match(
                    admin(),
                    MatchReport {
                        scope: scope(),
                        reporter: winner,
                        opponent: Opponent::human(loser),
                        result: ReportedResult::Win(Side::Reporter),
                        reporter_deck: "Aggro".into(),
                        opponent_deck: loser_deck.into(),
                    },
                )
                .await
                .unwrap();
        }

        // A new league in the same scope keeps the deck history.
        test_support::league_with(&service, &[U1, U2]).await;

        let stats = service.deck_stats(scope(), "Aggro").await.unwrap();
        assert_eq!((stats.games(), stats.record.wins), (3, 3));
        let top: Vec<_> = stats.top_matchups.iter().map(|l| l.opponent.as_str()).collect();
        assert_eq!(top, vec!["Control"]);

        let other = Scope::new(scope().guild_id, Format::Advanced);
        assert_eq!(service.deck_stats(other, "Aggro").await.unwrap().games(), 0);

        let popular = service.most_played(scope(), 1).await.unwrap();
        assert_eq!(popular[0].deck, "Aggro");
    }

    #[tokio::test]
    async fn deck_registry_is_admin_managed() {
        let service = test_support::service().await;

        assert!(service.add_deck(admin(), scope(), " Aggro ").await.unwrap());
        assert!(!service.add_deck(admin(), scope(), "Aggro").await.unwrap());
        service.add_deck(admin(), scope(), "Control").await.unwrap();
        assert!(matches!(
            service.add_deck(Actor::member(U1), scope(), "Burn").await,
            Err(AppError::Unauthorized)
        ));

        let names: Vec<_> = service
            .list_decks(scope())
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Aggro", "Control"]);
        assert_eq!(service.search_decks(scope(), "ag", 25).await.unwrap(), vec!["Aggro"]);

        service.remove_deck(admin(), scope(), "Aggro").await.unwrap();
        let err = service.remove_deck(admin(), scope(), "Aggro").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(NotFound::Deck(_))));
    }
}
