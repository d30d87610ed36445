// End-to-end tests of the build and update passes against in-memory pages.

use std::time::Duration;

use reqwest::StatusCode;

use dugout_core::model::{GameClass, GameStatus, ResultState};
use dugout_core::DataStoreContainer;
use dugout_scrape::{
    CatalogEntry, LeagueCatalog, PassOptions, Pipeline, RetryPolicy, ScrapeError,
    StaticPageSource,
};

// ===========================================================================
// Fixtures
// ===========================================================================

const SCHEDULE: &str = "https://league.example/schedules/tuesday-coed";
const RESULT_1: &str = "https://league.example/results/101";
const RESULT_2: &str = "https://league.example/results/102";
const RESULT_3: &str = "https://league.example/results/103";
const RESULT_4: &str = "https://league.example/results/104";

fn options() -> PassOptions {
    PassOptions {
        retry: RetryPolicy::new(2, Duration::ZERO, Duration::ZERO),
        concurrency: 3,
    }
}

fn catalog() -> LeagueCatalog {
    LeagueCatalog::new(vec![
        CatalogEntry {
            label: "Tuesday Coed".into(),
            url: SCHEDULE.into(),
        },
        CatalogEntry {
            label: "Thursday Coed".into(),
            url: String::new(),
        },
    ])
}

/// `(date, visitor, home, score, result path)` rows.
fn schedule_page(rows: &[(&str, &str, &str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(date, visitor, home, score, link)| {
            format!(
                "<tr><td>{date}</td><td>{visitor}</td><td>{home}</td><td>{score}</td>\
                 <td><a href=\"{link}\">Box</a></td></tr>"
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <div class="league-header" data-league="tuesday-coed-summer-2024"></div>
        <table class="schedule">
          <tr><th>Date</th><th>Visitor</th><th>Home</th><th>Score</th><th></th></tr>
          {body}
        </table></body></html>"#
    )
}

fn status_page(id: &str, status: &str) -> String {
    format!(
        r#"<div class="game-meta" data-game-id="{id}"></div>
           <div class="game-status">{status}</div>"#
    )
}

/// Final page with one batter per side: `(team, runs, batter, at_bats, singles)`.
fn final_page(id: &str, visitor: (&str, u32, &str, u32, u32), home: (&str, u32, &str, u32, u32)) -> String {
    let summary = |(team, runs, _, _, singles): (&str, u32, &str, u32, u32)| {
        format!(
            "<tr class=\"team-summary\"><td class=\"team\">{team}</td>\
             <td class=\"runs\">{runs}</td><td class=\"hits\">{singles}</td><td class=\"outcome\"></td></tr>"
        )
    };
    let batting = |(_, _, batter, ab, singles): (&str, u32, &str, u32, u32)| {
        format!(
            "<table class=\"batting\"><tr><th>Player</th><th>AB</th><th>1B</th></tr>\
             <tr><td>{batter}</td><td>{ab}</td><td>{singles}</td></tr></table>"
        )
    };
    format!(
        r#"<div class="game-meta" data-game-id="{id}"></div>
           <div class="game-status">Final</div>
           <table class="linescore">{}{}</table>
           {}{}"#,
        summary(visitor),
        summary(home),
        batting(visitor),
        batting(home),
    )
}

fn season_source() -> StaticPageSource {
    StaticPageSource::new()
        .with_page(
            SCHEDULE,
            schedule_page(&[
                ("06/04/2024", "Bats", "Gloves", "6 - 3", "/results/101"),
                ("06/11/2024", "Gloves", "Bats", "", "/results/102"),
                ("06/18/2024", "Bats", "Gloves", "0 - 0", "/results/103"),
            ]),
        )
        .with_page(
            RESULT_1,
            final_page("101", ("Bats", 6, "Doe, Avery", 4, 3), ("Gloves", 3, "Poe, Casey", 3, 1)),
        )
        .with_page(RESULT_2, status_page("102", "Scheduled"))
        .with_page(RESULT_3, status_page("103", "Rained out"))
}

// ===========================================================================
// Build
// ===========================================================================

#[tokio::test]
async fn build_discovers_season_and_classifies_games() {
    let source = season_source();
    let (store, report) = Pipeline::new(&source, options())
        .build(&catalog())
        .await
        .unwrap();

    assert_eq!(report.leagues_built, 1);
    assert_eq!(report.leagues_skipped, 1);
    assert_eq!(report.games_added, 3);
    assert_eq!(report.games_fetched, 3);

    let games = &store.league_schedules[0].scheduled_games;
    assert_eq!(games[0].classify(), GameClass::Played);
    assert_eq!(games[1].classify(), GameClass::Unplayed);
    assert_eq!(games[2].classify(), GameClass::Cancelled);
    assert_eq!(
        games[2].result.result().map(|r| r.info.status),
        Some(GameStatus::Cancelled)
    );

    // Score symmetry on the played game.
    let [visitor, home] = games[0].box_score().unwrap();
    assert_eq!(visitor.runs_against, home.runs_scored);
    assert_eq!(home.runs_against, visitor.runs_scored);
}

#[tokio::test]
async fn unavailable_schedule_is_retried_then_skipped() {
    let mut source = season_source();
    source.take_down(SCHEDULE);
    let (store, report) = Pipeline::new(&source, options())
        .build(&catalog())
        .await
        .unwrap();
    assert!(store.league_schedules.is_empty());
    assert_eq!(report.leagues_skipped, 2);
    assert_eq!(source.request_count(SCHEDULE), 2);
}

#[tokio::test]
async fn throttled_and_refused_pages_are_skipped() {
    let mut source = season_source();
    source.respond_with(RESULT_2, StatusCode::TOO_MANY_REQUESTS);
    source.respond_with(RESULT_3, StatusCode::FORBIDDEN);
    let (store, report) = Pipeline::new(&source, options())
        .build(&catalog())
        .await
        .unwrap();

    assert_eq!(report.leagues_built, 1);
    assert_eq!(report.games_unavailable, 2);
    let games = &store.league_schedules[0].scheduled_games;
    assert!(games[0].is_played());
    assert!(matches!(games[1].result, ResultState::Unavailable { .. }));
    assert!(matches!(games[2].result, ResultState::Unavailable { .. }));
    // Throttling is retried, a refusal is not.
    assert_eq!(source.request_count(RESULT_2), 2);
    assert_eq!(source.request_count(RESULT_3), 1);

    source.respond_with(SCHEDULE, StatusCode::UNAUTHORIZED);
    let (store, report) = Pipeline::new(&source, options())
        .build(&catalog())
        .await
        .unwrap();
    assert!(store.league_schedules.is_empty());
    assert_eq!(report.leagues_skipped, 2);
}

#[tokio::test]
async fn maintenance_page_leaves_game_incomplete() {
    let mut source = season_source();
    source.insert(
        RESULT_2,
        r#"<div class="maintenance-notice">Scheduled maintenance in progress</div>"#,
    );
    let (store, report) = Pipeline::new(&source, options())
        .build(&catalog())
        .await
        .unwrap();

    let game = &store.league_schedules[0].scheduled_games[1];
    assert!(matches!(game.result, ResultState::Unavailable { .. }));
    assert!(!game.is_complete());
    assert_eq!(report.games_unavailable, 1);
    assert_eq!(source.request_count(RESULT_2), 2);

    // Site back up with the game played: the next update finishes it.
    source.insert(
        SCHEDULE,
        schedule_page(&[
            ("06/04/2024", "Bats", "Gloves", "6 - 3", "/results/101"),
            ("06/11/2024", "Gloves", "Bats", "4 - 5", "/results/102"),
            ("06/18/2024", "Bats", "Gloves", "0 - 0", "/results/103"),
        ]),
    );
    source.insert(
        RESULT_2,
        final_page("102", ("Gloves", 4, "Poe, Casey", 4, 2), ("Bats", 5, "Doe, Avery", 3, 2)),
    );
    let (updated, _) = Pipeline::new(&source, options()).update(&store).await.unwrap();
    assert!(updated.league_schedules[0].scheduled_games[1].is_played());
}

#[tokio::test]
async fn format_drift_aborts_the_build() {
    let mut source = season_source();
    source.insert(RESULT_1, r#"<div class="game-status">Final</div>"#);
    let err = Pipeline::new(&source, options())
        .build(&catalog())
        .await
        .unwrap_err();
    match err {
        ScrapeError::MissingSection { url, section } => {
            assert_eq!(url, RESULT_1);
            assert_eq!(section, "team summary");
        }
        other => panic!("expected missing section, got {other:?}"),
    }
}

// ===========================================================================
// Update
// ===========================================================================

#[tokio::test]
async fn update_without_new_results_is_idempotent() {
    let source = season_source();
    let pipeline = Pipeline::new(&source, options());
    let (built, _) = pipeline.build(&catalog()).await.unwrap();
    let result_requests = source.total_requests() - source.request_count(SCHEDULE);

    let (first, report) = pipeline.update(&built).await.unwrap();
    let (second, _) = pipeline.update(&first).await.unwrap();

    assert_eq!(first, built);
    assert_eq!(second, first);
    assert_eq!(report.leagues_refreshed, 1);
    assert_eq!(report.games_fetched, 0);
    assert_eq!(
        source.total_requests() - source.request_count(SCHEDULE),
        result_requests
    );

    // Persisted bytes match too, apart from the build timestamp.
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    DataStoreContainer::new(first).save(Some(&a), false, dir.path()).unwrap();
    DataStoreContainer::new(second).save(Some(&b), false, dir.path()).unwrap();
    assert_eq!(
        std::fs::read_to_string(&a).unwrap(),
        std::fs::read_to_string(&b).unwrap()
    );
}

#[tokio::test]
async fn update_touches_only_newly_completed_games() {
    let mut source = season_source();
    let (built, _) = Pipeline::new(&source, options())
        .build(&catalog())
        .await
        .unwrap();

    source.insert(
        SCHEDULE,
        schedule_page(&[
            ("06/04/2024", "Bats", "Gloves", "6 - 3", "/results/101"),
            ("06/11/2024", "Gloves", "Bats", "4 - 5", "/results/102"),
            ("06/18/2024", "Bats", "Gloves", "0 - 0", "/results/103"),
            ("06/25/2024", "Mitts", "Bats", "", "/results/104"),
        ]),
    );
    source.insert(
        RESULT_2,
        final_page("102", ("Gloves", 4, "Poe, Casey", 4, 2), ("Bats", 5, "Doe, Avery", 3, 2)),
    );
    source.insert(RESULT_4, status_page("104", "Scheduled"));

    let (updated, report) = Pipeline::new(&source, options()).update(&built).await.unwrap();

    assert_eq!(report.games_added, 1);
    assert_eq!(report.games_fetched, 2);
    assert_eq!(report.games_changed, 2);
    assert_eq!(source.request_count(RESULT_1), 1);
    assert_eq!(source.request_count(RESULT_3), 1);

    let games = &updated.league_schedules[0].scheduled_games;
    assert_eq!(games.len(), 4);
    assert_eq!(games[0], built.league_schedules[0].scheduled_games[0]);
    assert!(games[1].is_played());
    assert_eq!(games[1].scores.map(|s| (s.visitor, s.home)), Some((4, 5)));
    assert_eq!(games[3].classify(), GameClass::Unplayed);
}

#[tokio::test]
async fn failed_update_leaves_store_untouched() {
    let mut source = season_source();
    let (built, _) = Pipeline::new(&source, options())
        .build(&catalog())
        .await
        .unwrap();
    let snapshot = built.clone();

    source.insert(
        SCHEDULE,
        schedule_page(&[
            ("06/04/2024", "Bats", "Gloves", "6 - 3", "/results/101"),
            ("06/11/2024", "Gloves", "Bats", "4 - 5", "/results/102"),
        ]),
    );
    source.insert(RESULT_2, r#"<div class="game-status">Final</div><table class="linescore"></table>"#);

    let result = Pipeline::new(&source, options()).update(&built).await;
    assert!(matches!(result, Err(ScrapeError::MissingSection { .. })));
    assert_eq!(built, snapshot);
}
