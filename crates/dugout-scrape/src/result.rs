// GameResultBuilder: a result page into GameInfo plus the two team box scores.
//
// Page layout:
//   div.game-status           Final / Scheduled / Cancelled / Forfeit
//   table.linescore           two tr.team-summary rows, visitor first, with
//                             td.team td.runs td.hits td.outcome
//   table.batting (x2)        header labels in th, one td row per batter
//   .maintenance-notice       present while the site is down for maintenance;
//                             a title, heading or .banner saying "under
//                             maintenance" counts too

use scraper::{ElementRef, Html};
use tracing::debug;

use dugout_core::model::{
    BattingLine, GameInfo, GameResult, GameStatus, LeagueIdentity, Outcome, PlayerLine,
    ResultState, ScheduledGame, Side, TeamResult,
};

use crate::dom::{has_class, parse_count, parse_date, selector, text_of};
use crate::error::ScrapeError;
use crate::retry::{retry_transient, RetryPolicy};
use crate::source::PageSource;

// ---------------------------------------------------------------------------
// Batting label dispatch
// ---------------------------------------------------------------------------

type FieldSetter = fn(&mut BattingLine, u32);

/// Column label to counting stat. Labels not listed here are ignored.
const BATTING_FIELDS: &[(&str, FieldSetter)] = &[
    ("AB", |l, v| l.at_bats = v),
    ("R", |l, v| l.runs = v),
    ("1B", |l, v| l.singles = v),
    ("2B", |l, v| l.doubles = v),
    ("3B", |l, v| l.triples = v),
    ("HR", |l, v| l.home_runs = v),
    ("BB", |l, v| l.bases_on_balls = v),
    ("SF", |l, v| l.sacrifice_flies = v),
];

fn field_for(label: &str) -> Option<FieldSetter> {
    BATTING_FIELDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(label.trim()))
        .map(|(_, setter)| *setter)
}

const MAINTENANCE_PHRASE: &str = "under maintenance";

/// Page chrome where a maintenance message can appear. Body text such as a
/// field note is not checked.
const MAINTENANCE_BANNERS: &str = "title, h1, h2, h3, .banner";

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct GameResultBuilder<'a> {
    source: &'a dyn PageSource,
    retry: RetryPolicy,
}

impl<'a> GameResultBuilder<'a> {
    pub fn new(source: &'a dyn PageSource, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// First fetch of a game's result. A game with no linked page, or whose
    /// page says it has not been played, comes back without a box score.
    pub async fn construct(
        &self,
        league: &LeagueIdentity,
        game: &ScheduledGame,
    ) -> Result<GameResult, ScrapeError> {
        let Some(url) = game.result_page.as_deref() else {
            return Ok(GameResult::without_box_score(schedule_info(league, game)));
        };
        debug!(url, "constructing game result");
        self.fetch(url, league, game).await
    }

    /// Re-fetch and re-parse a game that already has a result. Parsing the
    /// same page again produces an identical result. A game whose link has
    /// gone keeps the result on file; one never fetched is constructed.
    pub async fn update(
        &self,
        league: &LeagueIdentity,
        game: &ScheduledGame,
    ) -> Result<GameResult, ScrapeError> {
        let ResultState::Fetched(current) = &game.result else {
            return self.construct(league, game).await;
        };
        let Some(url) = game.result_page.as_deref() else {
            return Ok(current.clone());
        };
        debug!(url, "refreshing game result");
        self.fetch(url, league, game).await
    }

    async fn fetch(
        &self,
        url: &str,
        league: &LeagueIdentity,
        game: &ScheduledGame,
    ) -> Result<GameResult, ScrapeError> {
        let source = self.source;
        retry_transient(&self.retry, url, || async move {
            let body = source.fetch(url).await?;
            parse_result(url, &body, league, game)
        })
        .await
    }
}

fn schedule_info(league: &LeagueIdentity, game: &ScheduledGame) -> GameInfo {
    GameInfo {
        title: format!("{} at {}", game.visitor, game.home),
        id: String::new(),
        date: game.date,
        league: league.clone(),
        status: GameStatus::Scheduled,
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a result page body fetched from `url` for `game`.
pub fn parse_result(
    url: &str,
    body: &str,
    league: &LeagueIdentity,
    game: &ScheduledGame,
) -> Result<GameResult, ScrapeError> {
    let doc = Html::parse_document(body);

    let notice_sel = selector(".maintenance-notice")?;
    let banner_sel = selector(MAINTENANCE_BANNERS)?;
    let flagged = doc.select(&notice_sel).next().is_some()
        || doc
            .select(&banner_sel)
            .any(|el| text_of(&el).to_lowercase().contains(MAINTENANCE_PHRASE));
    if flagged {
        return Err(ScrapeError::SourceUnavailable {
            url: url.to_string(),
            reason: "page flagged under maintenance".into(),
        });
    }

    let summary_sel = selector("table.linescore tr.team-summary")?;
    let summaries: Vec<ElementRef> = doc.select(&summary_sel).collect();

    let status_sel = selector(".game-status")?;
    let status = match doc.select(&status_sel).next() {
        Some(el) => {
            let text = text_of(&el);
            GameStatus::from_str_status(&text)
                .ok_or_else(|| ScrapeError::page_format(url, format!("game status `{text}`")))?
        }
        None if summaries.is_empty() => GameStatus::Scheduled,
        None => GameStatus::Final,
    };

    let info = read_info(url, &doc, league, game, status)?;
    if status != GameStatus::Final {
        debug!(url, ?status, "no box score on result page");
        return Ok(GameResult::without_box_score(info));
    }

    if summaries.is_empty() {
        return Err(ScrapeError::missing(url, "team summary"));
    }
    if summaries.len() != 2 {
        return Err(ScrapeError::page_format(
            url,
            format!("team summary ({} rows)", summaries.len()),
        ));
    }
    let visitor = read_summary(url, &summaries[0])?;
    let home = read_summary(url, &summaries[1])?;

    let batting_sel = selector("table.batting")?;
    let tables: Vec<ElementRef> = doc.select(&batting_sel).collect();
    if tables.is_empty() {
        return Err(ScrapeError::missing(url, "batting"));
    }
    if tables.len() != 2 {
        return Err(ScrapeError::page_format(
            url,
            format!("batting ({} tables)", tables.len()),
        ));
    }
    let visitor_players = read_batting(url, &tables[0])?;
    let home_players = read_batting(url, &tables[1])?;

    let teams = [
        team_result(Side::from_row_index(0), &visitor, &home, visitor_players),
        team_result(Side::from_row_index(1), &home, &visitor, home_players),
    ];
    debug!(
        url,
        visitor = %teams[0].name,
        home = %teams[1].name,
        "parsed box score"
    );
    Ok(GameResult {
        info,
        teams: Some(teams),
    })
}

fn read_info(
    url: &str,
    doc: &Html,
    league: &LeagueIdentity,
    game: &ScheduledGame,
    status: GameStatus,
) -> Result<GameInfo, ScrapeError> {
    let title_sel = selector(".game-title")?;
    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| text_of(&el))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("{} at {}", game.visitor, game.home));

    let id_sel = selector("[data-game-id]")?;
    let id = doc
        .select(&id_sel)
        .next()
        .and_then(|el| el.value().attr("data-game-id"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| {
            url.trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    let date_sel = selector("[data-game-date]")?;
    let date = doc
        .select(&date_sel)
        .next()
        .and_then(|el| el.value().attr("data-game-date"))
        .and_then(parse_date)
        .unwrap_or(game.date);

    Ok(GameInfo {
        title,
        id,
        date,
        league: league.clone(),
        status,
    })
}

struct Summary {
    name: String,
    runs: u32,
    hits: u32,
    outcome: Option<Outcome>,
}

fn read_summary(url: &str, row: &ElementRef) -> Result<Summary, ScrapeError> {
    let cell = |class: &str| -> Result<String, ScrapeError> {
        let sel = selector(&format!("td.{class}"))?;
        row.select(&sel)
            .next()
            .map(|el| text_of(&el))
            .ok_or_else(|| ScrapeError::page_format(url, format!("team summary {class}")))
    };
    let name = cell("team")?;
    if name.is_empty() {
        return Err(ScrapeError::page_format(url, "team summary name"));
    }
    Ok(Summary {
        name,
        runs: parse_count(url, "team summary runs", &cell("runs")?)?,
        hits: parse_count(url, "team summary hits", &cell("hits")?)?,
        outcome: cell("outcome")
            .ok()
            .and_then(|t| Outcome::from_str_outcome(&t)),
    })
}

/// One team's batting table. The page's own totals row is skipped; a
/// synthesized totals row is appended instead.
fn read_batting(url: &str, table: &ElementRef) -> Result<Vec<PlayerLine>, ScrapeError> {
    let row_sel = selector("tr")?;
    let header_sel = selector("th")?;
    let cell_sel = selector("td")?;

    let mut columns: Option<Vec<Option<FieldSetter>>> = None;
    let mut players = Vec::new();

    for row in table.select(&row_sel) {
        let headers: Vec<ElementRef> = row.select(&header_sel).collect();
        if !headers.is_empty() && columns.is_none() {
            // First column is the player name.
            columns = Some(
                headers
                    .iter()
                    .skip(1)
                    .map(|h| field_for(&text_of(h)))
                    .collect(),
            );
            continue;
        }

        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.is_empty() || has_class(&row, "totals") {
            continue;
        }
        let Some(fields) = columns.as_ref() else {
            return Err(ScrapeError::page_format(url, "batting header"));
        };
        let name = text_of(&cells[0]);
        if name.is_empty() || name.eq_ignore_ascii_case("totals") || name.eq_ignore_ascii_case("team totals") {
            continue;
        }

        let mut line = BattingLine::default();
        for (setter, cell) in fields.iter().zip(cells.iter().skip(1)) {
            if let Some(set) = setter {
                set(&mut line, parse_count(url, "batting", &text_of(cell))?);
            }
        }
        players.push(PlayerLine::new(name, line));
    }

    if columns.is_none() {
        return Err(ScrapeError::missing(url, "batting header"));
    }
    let totals = PlayerLine::totals_for(&players);
    players.push(totals);
    Ok(players)
}

fn team_result(side: Side, team: &Summary, opponent: &Summary, players: Vec<PlayerLine>) -> TeamResult {
    TeamResult {
        name: team.name.clone(),
        side,
        runs_scored: team.runs,
        runs_against: opponent.runs,
        hits: team.hits,
        outcome: team
            .outcome
            .unwrap_or_else(|| Outcome::from_runs(team.runs, opponent.runs)),
        players,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
