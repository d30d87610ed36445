// Plain-text tables for the CLI.

use dugout_core::container::{SaveOutcome, StoreCounts};
use dugout_core::model::PlayerStatsView;
use dugout_core::query::{PlayerGameLine, PlayerSummary, RankingTable, Standing, TeamStanding};
use dugout_core::stats::ordinal;
use dugout_scrape::PassReport;

/// Baseball-style rate: three decimals, no leading zero below 1.
pub fn fmt_rate(value: f64) -> String {
    let text = format!("{value:.3}");
    match text.strip_prefix("0.") {
        Some(rest) => format!(".{rest}"),
        None => text,
    }
}

pub fn counts(counts: &StoreCounts) -> String {
    let rows = [
        ("Leagues", counts.leagues),
        ("Scheduled games", counts.scheduled_games),
        ("Played", counts.played_games),
        ("Cancelled", counts.cancelled_games),
        ("Forfeited", counts.forfeited_games),
        ("Unplayed", counts.unplayed_games),
        ("Teams", counts.teams),
        ("Players", counts.players),
    ];
    let mut lines = vec!["Season".to_string(), "─".repeat(24)];
    lines.extend(rows.iter().map(|(label, n)| format!("  {label:<16}{n:>6}")));
    lines.join("\n")
}

pub fn players(rows: &[PlayerSummary]) -> String {
    if rows.iter().all(PlayerSummary::is_totals) {
        return "No played games in scope.".into();
    }
    let mut lines = vec![format!(
        "{:<24}{:>4}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>7}{:>7}{:>7}{:>7}",
        "Player", "G", "PA", "AB", "R", "H", "1B", "2B", "3B", "HR", "BB", "SF", "AVG", "OBP", "SLG", "OPS"
    )];
    for row in rows {
        if row.is_totals() {
            lines.push("─".repeat(110));
        }
        let view = row.view();
        let line = view.line();
        lines.push(format!(
            "{:<24}{:>4}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>7}{:>7}{:>7}{:>7}",
            truncate(&row.name, 23),
            row.games,
            view.plate_appearances(),
            line.at_bats,
            line.runs,
            view.hits(),
            line.singles,
            line.doubles,
            line.triples,
            line.home_runs,
            line.bases_on_balls,
            line.sacrifice_flies,
            fmt_rate(view.average()),
            fmt_rate(view.on_base()),
            fmt_rate(view.slugging()),
            fmt_rate(view.ops()),
        ));
    }
    lines.join("\n")
}

pub fn standings(rows: &[TeamStanding]) -> String {
    if rows.is_empty() {
        return "No decided games in scope.".into();
    }
    let mut lines = vec![format!(
        "{:<24}{:>4}{:>4}{:>4}{:>7}{:>6}{:>6}{:>6}",
        "Team", "W", "L", "T", "PCT", "RF", "RA", "DIFF"
    )];
    lines.extend(rows.iter().map(|t| {
        format!(
            "{:<24}{:>4}{:>4}{:>4}{:>7}{:>6}{:>6}{:>+6}",
            truncate(&t.name, 23),
            t.wins,
            t.losses,
            t.ties,
            fmt_rate(t.win_pct()),
            t.runs_for,
            t.runs_against,
            t.run_differential(),
        )
    }));
    lines.join("\n")
}

pub fn ranking(table: &RankingTable) -> String {
    if table.players.is_empty() {
        return "No players in scope.".into();
    }
    let pool = &table.pool;
    let mut lines = vec![
        format!(
            "{} ranking, weighted by {:?}, more than {} PA to qualify",
            table.stat, table.weight, table.min_plate_appearances
        ),
        format!(
            "Pool: {} players, mean {}, median {}, std dev {}",
            pool.count,
            fmt_rate(pool.mean),
            fmt_rate(pool.median),
            fmt_rate(pool.std_dev)
        ),
        String::new(),
        format!(
            "{:>5}  {:<24}{:>4}{:>5}{:>7}{:>7}{:>8}",
            "Rank", "Player", "G", "PA", table.stat.display_str(), "Z", "Pctl"
        ),
    ];
    for p in &table.players {
        let (rank, pctl) = match p.standing {
            Standing::Ranked(placement) => (placement.rank.to_string(), ordinal(placement.percentile)),
            Standing::InsufficientData => ("-".to_string(), "n/a".to_string()),
        };
        lines.push(format!(
            "{:>5}  {:<24}{:>4}{:>5}{:>7}{:>7.2}{:>8}",
            rank,
            truncate(&p.name, 23),
            p.games,
            p.plate_appearances,
            fmt_rate(p.value),
            p.z_score,
            pctl,
        ));
    }
    lines.join("\n")
}

pub fn game_log(player: &str, rows: &[PlayerGameLine]) -> String {
    if rows.is_empty() {
        return format!("No games found for {player}.");
    }
    let mut lines = vec![
        player.to_string(),
        format!(
            "{:<12}{:<20}{:<20}{:>5}{:>5}{:>5}{:>5}{:>5}",
            "Date", "Team", "Opponent", "AB", "R", "H", "HR", "BB"
        ),
    ];
    for row in rows {
        lines.push(format!(
            "{:<12}{:<20}{:<20}{:>5}{:>5}{:>5}{:>5}{:>5}",
            row.date.format("%Y-%m-%d").to_string(),
            truncate(&row.team, 19),
            truncate(&row.opponent, 19),
            row.line.at_bats,
            row.line.runs,
            PlayerStatsView::new(row.line).hits(),
            row.line.home_runs,
            row.line.bases_on_balls,
        ));
    }
    lines.join("\n")
}

pub fn pass(report: &PassReport, saved: &SaveOutcome) -> String {
    let mut lines = vec![report.to_string(), format!("Saved {}", saved.path.display())];
    if let Some(backup) = &saved.backup {
        lines.push(format!("Previous store backed up to {}", backup.display()));
    }
    lines.join("\n")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
