// Build, update, and query commands against in-memory pages and a temp store.

use std::fs;
use std::path::Path;

use dugout_app::cli::{Cli, Command};
use dugout_app::commands::{self, PassOutcome};
use dugout_app::config::{load_config_file, Config};
use dugout_core::{ContainerSlot, StoreError};
use dugout_scrape::StaticPageSource;

use clap::Parser;

const SCHEDULE: &str = "https://league.example/schedules/tuesday-coed";
const RESULT_1: &str = "https://league.example/results/201";
const RESULT_2: &str = "https://league.example/results/202";

// ===========================================================================
// Fixtures
// ===========================================================================

fn config_in(dir: &Path) -> Config {
    let text = format!(
        r#"
[store]
path = "{store}"
backup_dir = "{backups}"

[fetch]
timeout_secs = 5
max_attempts = 1
base_backoff_ms = 0
max_backoff_ms = 0
concurrency = 2
user_agent = "dugout-test"

[stats]
min_plate_appearances = 2
weight = "plate_appearances"

[[leagues]]
label = "Tuesday Coed"
url = "{SCHEDULE}"
"#,
        store = dir.join("data/season.json").display(),
        backups = dir.join("data/backups").display(),
    );
    let path = dir.join("dugout.toml");
    fs::write(&path, text).unwrap();
    load_config_file(&path).unwrap()
}

fn schedule_page(second_score: &str) -> String {
    format!(
        r#"<div data-league="tuesday-coed-summer-2024"></div>
        <table class="schedule">
          <tr><th>Date</th><th>Visitor</th><th>Home</th><th>Score</th><th></th></tr>
          <tr><td>06/04/2024</td><td>Bats</td><td>Gloves</td><td>6 - 3</td><td><a href="/results/201">Box</a></td></tr>
          <tr><td>06/11/2024</td><td>Gloves</td><td>Bats</td><td>{second_score}</td><td><a href="/results/202">Box</a></td></tr>
        </table>"#
    )
}

/// Final page where each side has two batters.
fn final_page(id: &str, visitor: (&str, u32), home: (&str, u32)) -> String {
    let summary = |(team, runs): (&str, u32)| {
        format!(
            "<tr class=\"team-summary\"><td class=\"team\">{team}</td><td class=\"runs\">{runs}</td>\
             <td class=\"hits\">3</td><td class=\"outcome\"></td></tr>"
        )
    };
    let batting = |team: &str| {
        let (a, b) = if team == "Bats" {
            ("Doe, Avery", "Roe, Dana")
        } else {
            ("Poe, Casey", "Moe, Jules")
        };
        format!(
            "<table class=\"batting\"><tr><th>Player</th><th>AB</th><th>R</th><th>1B</th><th>HR</th><th>BB</th></tr>\
             <tr><td>{a}</td><td>3</td><td>2</td><td>1</td><td>1</td><td>1</td></tr>\
             <tr><td>{b}</td><td>3</td><td>0</td><td>1</td><td>0</td><td>0</td></tr></table>"
        )
    };
    format!(
        r#"<div data-game-id="{id}"></div><div class="game-status">Final</div>
           <table class="linescore">{}{}</table>{}{}"#,
        summary(visitor),
        summary(home),
        batting(visitor.0),
        batting(home.0),
    )
}

fn source() -> StaticPageSource {
    StaticPageSource::new()
        .with_page(SCHEDULE, schedule_page(""))
        .with_page(RESULT_1, final_page("201", ("Bats", 6), ("Gloves", 3)))
        .with_page(
            RESULT_2,
            r#"<div data-game-id="202"></div><div class="game-status">Scheduled</div>"#,
        )
}

fn never() -> std::future::Pending<()> {
    std::future::pending()
}

fn backups(config: &Config) -> usize {
    fs::read_dir(&config.store.backup_dir).map_or(0, |d| d.count())
}

fn query(config: &Config, args: &[&str]) -> String {
    let mut argv = vec!["dugout"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    commands::query(config, &mut ContainerSlot::new(), &cli.command).unwrap()
}

// ===========================================================================
// Passes
// ===========================================================================

#[tokio::test]
async fn build_saves_a_queryable_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let outcome = commands::build(&config, &mut ContainerSlot::new(), &source(), never()).await.unwrap();
    let PassOutcome::Completed { report, saved } = outcome else {
        panic!("build was interrupted");
    };
    assert_eq!(report.leagues_built, 1);
    assert_eq!(saved.path, config.store.path);
    assert_eq!(saved.backup, None);
    assert!(config.store.path.exists());

    let counts = query(&config, &["counts"]);
    assert!(counts.contains("Played"));
    assert!(counts.lines().any(|l| l.contains("Scheduled games") && l.ends_with('2')));

    let players = query(&config, &["players", "--team", "Bats"]);
    assert!(players.contains("Doe, Avery"));
    assert!(!players.contains("Poe, Casey"));

    let standings = query(&config, &["standings", "--day", "tue"]);
    let bats = standings.lines().find(|l| l.starts_with("Bats")).unwrap();
    assert!(bats.contains("1.000"));

    let ranking = query(&config, &["rank", "--stat", "avg"]);
    assert!(ranking.starts_with("AVG ranking"));
    assert!(ranking.contains("more than 2 PA"));

    let log = query(&config, &["log", "--player", "Doe, Avery"]);
    assert!(log.contains("2024-06-04"));
    assert!(log.contains("Gloves"));
}

#[tokio::test]
async fn scope_that_matches_nothing_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    commands::build(&config, &mut ContainerSlot::new(), &source(), never()).await.unwrap();

    assert_eq!(
        query(&config, &["standings", "--category", "coed", "--day", "fri"]),
        "No decided games in scope."
    );
    assert_eq!(
        query(&config, &["players", "--year", "1999"]),
        "No played games in scope."
    );
}

#[tokio::test]
async fn update_backs_up_the_previous_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mut pages = source();
    commands::build(&config, &mut ContainerSlot::new(), &pages, never()).await.unwrap();
    assert_eq!(backups(&config), 0);

    pages.insert(SCHEDULE, schedule_page("5 - 4"));
    pages.insert(RESULT_2, final_page("202", ("Gloves", 5), ("Bats", 4)));

    let outcome = commands::update(&config, &mut ContainerSlot::new(), &pages, never()).await.unwrap();
    let PassOutcome::Completed { report, saved } = outcome else {
        panic!("update was interrupted");
    };
    assert_eq!(report.games_fetched, 1);
    assert!(saved.backup.is_some());
    assert_eq!(backups(&config), 1);

    let standings = query(&config, &["standings"]);
    let gloves = standings.lines().find(|l| l.starts_with("Gloves")).unwrap();
    assert!(gloves.contains(".500"));
}

#[tokio::test]
async fn rebuild_over_existing_store_keeps_a_backup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    commands::build(&config, &mut ContainerSlot::new(), &source(), never()).await.unwrap();
    let outcome = commands::build(&config, &mut ContainerSlot::new(), &source(), never()).await.unwrap();
    assert!(matches!(
        outcome,
        PassOutcome::Completed { saved, .. } if saved.backup.is_some()
    ));
    assert_eq!(backups(&config), 1);
}

#[tokio::test]
async fn interrupted_passes_never_save() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let outcome = commands::build(&config, &mut ContainerSlot::new(), &source(), std::future::ready(()))
        .await
        .unwrap();
    assert!(matches!(outcome, PassOutcome::Interrupted));
    assert!(!config.store.path.exists());

    commands::build(&config, &mut ContainerSlot::new(), &source(), never()).await.unwrap();
    let before = fs::read(&config.store.path).unwrap();
    let outcome = commands::update(&config, &mut ContainerSlot::new(), &source(), std::future::ready(()))
        .await
        .unwrap();
    assert!(matches!(outcome, PassOutcome::Interrupted));
    assert_eq!(fs::read(&config.store.path).unwrap(), before);
    assert_eq!(backups(&config), 0);
}

#[tokio::test]
async fn failed_update_leaves_the_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mut pages = source();
    commands::build(&config, &mut ContainerSlot::new(), &pages, never()).await.unwrap();
    let before = fs::read(&config.store.path).unwrap();

    pages.insert(SCHEDULE, schedule_page("5 - 4"));
    pages.insert(RESULT_2, r#"<div class="game-status">Final</div>"#);

    let err = commands::update(&config, &mut ContainerSlot::new(), &pages, never()).await.unwrap_err();
    assert!(format!("{err:#}").contains("team summary"));
    assert_eq!(fs::read(&config.store.path).unwrap(), before);
}

// ===========================================================================
// Store errors
// ===========================================================================

#[tokio::test]
async fn update_without_a_store_asks_for_a_build() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let err = commands::update(&config, &mut ContainerSlot::new(), &source(), never()).await.unwrap_err();
    assert!(err.to_string().contains("dugout build"));
}

#[test]
fn corrupt_store_is_a_data_integrity_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::create_dir_all(config.store.path.parent().unwrap()).unwrap();
    fs::write(&config.store.path, "{ not json").unwrap();

    let mut slot = ContainerSlot::new();
    let err = commands::open_store(&config, &mut slot).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::DataIntegrity { .. })
    ));

    let cli = Cli::try_parse_from(["dugout", "counts"]).unwrap();
    assert!(matches!(cli.command, Command::Counts));
    assert!(commands::query(&config, &mut slot, &cli.command).is_err());
    assert!(slot.current().is_none());
}

#[tokio::test]
async fn one_slot_carries_the_store_between_commands() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mut slot = ContainerSlot::new();
    let mut pages = source();

    commands::build(&config, &mut slot, &pages, never()).await.unwrap();
    assert_eq!(
        slot.current().and_then(|c| c.path()),
        Some(config.store.path.as_path())
    );

    pages.insert(SCHEDULE, schedule_page("5 - 4"));
    pages.insert(RESULT_2, final_page("202", ("Gloves", 5), ("Bats", 4)));
    commands::update(&config, &mut slot, &pages, never()).await.unwrap();

    // The file is gone but the slot still holds the updated season.
    fs::remove_file(&config.store.path).unwrap();
    let cli = Cli::try_parse_from(["dugout", "standings"]).unwrap();
    let standings = commands::query(&config, &mut slot, &cli.command).unwrap();
    let gloves = standings.lines().find(|l| l.starts_with("Gloves")).unwrap();
    assert!(gloves.contains(".500"));

    slot.reset();
    assert!(commands::query(&config, &mut slot, &cli.command).is_err());
}
