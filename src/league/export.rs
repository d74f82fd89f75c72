//! CSV export of a league's ledger and standings.

use chrono::{DateTime, SecondsFormat};

use super::LeagueService;
use crate::db::{Match, Standing, queries};
use crate::error::AppError;

/// A row type that can be written as one CSV record.
pub trait CsvRecord {
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

impl CsvRecord for Match {
    const HEADER: &'static [&'static str] = &[
        "id", "created_at", "format", "result", "p1", "p1_deck", "p2", "p2_deck",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            timestamp(self.created_at),
            self.format.as_str().to_string(),
            self.result.to_string(),
            self.p1.to_string(),
            self.p1_deck.clone(),
            self.p2.to_string(),
            self.p2_deck.clone(),
        ]
    }
}

/// A standing with its leaderboard position, counted from 1.
struct RankedStanding<'a> {
    rank: usize,
    standing: &'a Standing,
}

impl CsvRecord for RankedStanding<'_> {
    const HEADER: &'static [&'static str] =
        &["rank", "user_id", "points", "wins", "draws", "losses"];

    fn fields(&self) -> Vec<String> {
        let s = self.standing;
        vec![
            self.rank.to_string(),
            s.user_id.to_string(),
            s.points.to_string(),
            s.wins.to_string(),
            s.draws.to_string(),
            s.losses.to_string(),
        ]
    }
}

fn timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| millis.to_string())
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_line<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line: Vec<String> = fields.into_iter().map(|f| quote(f.as_ref())).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// Serializes rows with a header line, CRLF line endings and quoting where a
/// field needs it.
pub fn to_csv<'a, R>(rows: impl IntoIterator<Item = &'a R>) -> String
where
    R: CsvRecord + 'a,
{
    let mut out = String::new();
    push_line(&mut out, R::HEADER.iter().copied());
    for row in rows {
        push_line(&mut out, row.fields());
    }
    out
}

impl LeagueService {
    /// The full ledger in commit order.
    pub async fn export_matches(&self, league_id: i64) -> Result<String, AppError> {
        self.league(league_id).await?;
        let ledger = queries::league_matches(self.repo.pool(), league_id).await?;
        Ok(to_csv(&ledger))
    }

    /// Standings in leaderboard order, numbered from 1.
    pub async fn export_standings(&self, league_id: i64) -> Result<String, AppError> {
        self.league(league_id).await?;
        let standings = self.leaderboard(league_id, None).await?;
        let rows: Vec<RankedStanding<'_>> = standings
            .iter()
            .enumerate()
            .map(|(i, standing)| RankedStanding {
                rank: i + 1,
                standing,
            })
            .collect();
        Ok(to_csv(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MatchResult;
    use crate::error::NotFound;
    use crate::league::test_support::{self, U1, U2, admin, scope};
    use crate::league::{Format, MatchReport, Opponent, ReportedResult, Side};

    #[test]
    fn fields_with_separators_are_quoted() {
        assert_eq!(quote("Aggro"), "Aggro");
        assert_eq!(quote("Red, Blue"), "\"Red, Blue\"");
        assert_eq!(quote("The \"Best\" Deck"), "\"The \"\"Best\"\" Deck\"");
        assert_eq!(quote("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn matches_are_written_with_a_header() {
        let played = Match {
            id: 7,
            league_id: 1,
            format: Format::Genesys,
            p1: 101,
            p2: 102,
            result: MatchResult::Win,
            created_at: 0,
            p1_deck: "Red, Blue".into(),
            p2_deck: "Control".into(),
        };

        let csv = to_csv([&played]);
        let lines: Vec<_> = csv.split("\r\n").collect();

        assert_eq!(lines[0], "id,created_at,format,result,p1,p1_deck,p2,p2_deck");
        assert_eq!(
            lines[1],
            "7,1970-01-01T00:00:00Z,genesys,win,101,\"Red, Blue\",102,Control"
        );
        assert_eq!(lines[2], "");
    }

    #[tokio::test]
    async fn standings_export_is_ranked() {
        let service = test_support::service().await;
        let league = test_support::league_with(&service, &[U1, U2]).await;

        service
            .record_match(
                admin(),
                MatchReport {
                    scope: scope(),
                    reporter: U1,
                    opponent: Opponent::human(U2),
                    result: ReportedResult::Win(Side::Opponent),
                    reporter_deck: "Aggro".into(),
                    opponent_deck: "Control".into(),
                },
            )
            .await
            .unwrap();

        let csv = service.export_standings(league.id).await.unwrap();
        assert_eq!(
            csv,
            format!(
                "rank,user_id,points,wins,draws,losses\r\n1,{U2},3,1,0,0\r\n2,{U1},0,0,0,1\r\n"
            )
        );

        let matches = service.export_matches(league.id).await.unwrap();
        assert_eq!(matches.lines().count(), 2);

        let err = service.export_matches(league.id + 100).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(NotFound::League(_))));
    }
}
