// ScheduleBuilder: a league schedule page into the league identity plus one
// ScheduledGame stub per table row.
//
// The page carries its identity as a `data-league` token shaped like
// `tuesday-coed-summer-2024`: weekday first, season and year last, and the
// category in between (it may itself contain dashes).

use chrono::Weekday;
use reqwest::Url;
use scraper::Html;
use tracing::{debug, info};

use dugout_core::model::{Category, FinalScore, LeagueIdentity, LeagueSchedule, ScheduledGame, Season};

use crate::dom::{parse_date, selector, text_of};
use crate::error::ScrapeError;
use crate::retry::{retry_transient, RetryPolicy};
use crate::source::PageSource;

pub struct ScheduleBuilder<'a> {
    source: &'a dyn PageSource,
    retry: RetryPolicy,
}

impl<'a> ScheduleBuilder<'a> {
    pub fn new(source: &'a dyn PageSource, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Fetch and parse one schedule page. An empty `url` means the league has
    /// no schedule posted yet and yields `Ok(None)`.
    pub async fn build(&self, url: &str) -> Result<Option<LeagueSchedule>, ScrapeError> {
        if url.trim().is_empty() {
            debug!("empty schedule url, nothing to build");
            return Ok(None);
        }
        let source = self.source;
        let schedule = retry_transient(&self.retry, url, || async move {
            let body = source.fetch(url).await?;
            parse_schedule(url, &body)
        })
        .await?;
        info!(
            league = %schedule.identity,
            url,
            games = schedule.scheduled_games.len(),
            "scraped schedule"
        );
        Ok(Some(schedule))
    }
}

/// Parse a schedule page body fetched from `url`.
pub fn parse_schedule(url: &str, body: &str) -> Result<LeagueSchedule, ScrapeError> {
    let doc = Html::parse_document(body);

    let token_sel = selector("[data-league]")?;
    let token = doc
        .select(&token_sel)
        .next()
        .and_then(|el| el.value().attr("data-league"))
        .ok_or_else(|| ScrapeError::page_format(url, "league token"))?;
    let identity = parse_league_token(token, url)
        .ok_or_else(|| ScrapeError::page_format(url, format!("league token `{token}`")))?;

    let table_sel = selector("table.schedule")?;
    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScrapeError::page_format(url, "schedule table"))?;

    let base = Url::parse(url).map_err(|_| ScrapeError::page_format(url, "schedule url"))?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a[href]")?;

    let mut schedule = LeagueSchedule::new(identity);
    for (row_no, row) in table.select(&row_sel).enumerate() {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.is_empty() {
            // Header row.
            continue;
        }
        let stage = |what: &str| format!("schedule row {row_no} {what}");
        if cells.len() < 3 {
            return Err(ScrapeError::page_format(url, stage("cells")));
        }

        let date_text = text_of(&cells[0]);
        let date = parse_date(&date_text)
            .ok_or_else(|| ScrapeError::page_format(url, stage(&format!("date `{date_text}`"))))?;
        let visitor = text_of(&cells[1]);
        let home = text_of(&cells[2]);
        if visitor.is_empty() || home.is_empty() {
            return Err(ScrapeError::page_format(url, stage("team names")));
        }

        let mut game = ScheduledGame::new(visitor, home, date);
        game.scores = cells.get(3).and_then(|c| parse_score(&text_of(c)));
        if let Some(href) = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            let resolved = base
                .join(href.trim())
                .map_err(|_| ScrapeError::page_format(url, stage("result link")))?;
            game.result_page = Some(resolved.to_string());
        }
        schedule.scheduled_games.push(game);
    }

    debug!(url, rows = schedule.scheduled_games.len(), "parsed schedule table");
    Ok(schedule)
}

/// Parse a `day-category-season-year` token.
pub fn parse_league_token(token: &str, source: &str) -> Option<LeagueIdentity> {
    let parts: Vec<&str> = token
        .trim()
        .split('-')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 4 {
        return None;
    }
    let n = parts.len();
    let day: Weekday = parts[0].parse().ok()?;
    let season: Season = parts[n - 2].parse().ok()?;
    let year: u16 = parts[n - 1].parse().ok()?;
    let category = parts[1..n - 2]
        .iter()
        .map(|p| capitalize(p))
        .collect::<Vec<_>>()
        .join(" ");

    Some(LeagueIdentity {
        category: Category::new(category),
        day,
        season,
        year,
        source: source.to_string(),
    })
}

/// `"6 - 3"` style score cell. Anything else (blank, "vs", "Rainout") means
/// no final score has been posted.
fn parse_score(text: &str) -> Option<FinalScore> {
    let (visitor, home) = text.split_once(['-', '\u{2013}'])?;
    Some(FinalScore {
        visitor: visitor.trim().parse().ok()?,
        home: home.trim().parse().ok()?,
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
