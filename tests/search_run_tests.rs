//! End-to-end runs over static result pages and a JSON history file

mod common;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use common::{StaticHtmlSession, temp_context};
use sell_through_lib::commands::{self, run_search_with_session};
use sell_through_lib::domain::events::RunStatus;

#[tokio::test]
async fn run_persists_results_and_ranks_them() {
    let (_dir, ctx) = temp_context().await;
    let search = ctx.config.search_config(vec!["2015 Honda Civic".into(), "2018 Ford F-150".into()]);
    let session = StaticHtmlSession::new()
        .with_item(&search, "2015 Honda Civic", "front bumper", "1,234", "2,000")
        .with_item(&search, "2018 Ford F-150", "front bumper", "450", "500");

    let report = run_search_with_session(&ctx, &search, "front bumper", Arc::new(session), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.processed, 2);
    // 62% and 90%
    assert_eq!(report.average_percentage, Some(76));

    let history = commands::history_report(&ctx).await.unwrap();
    assert_eq!(history.stats.entries, 2);
    assert_eq!(history.ranked[0].search_term.as_str(), "2018 Ford F-150 front bumper");
    assert_eq!(history.ranked[0].sell_through_percentage, 90);
    assert_eq!(history.ranked[1].sold_count, 1234);
    assert_eq!(history.ranked[1].sell_through_percentage, 62);

    assert!(ctx.config.storage.history_path().unwrap().exists());
}

#[tokio::test]
async fn pages_without_a_count_record_zero() {
    let (_dir, ctx) = temp_context().await;
    let search = ctx.config.search_config(vec!["Rare Car".into()]);

    let report =
        run_search_with_session(&ctx, &search, "mirror", Arc::new(StaticHtmlSession::new()), CancellationToken::new())
            .await
            .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    let history = commands::history_report(&ctx).await.unwrap();
    let entry = &history.ranked[0];
    assert_eq!((entry.sold_count, entry.live_count, entry.sell_through_percentage), (0, 0, 0));
}

#[tokio::test]
async fn second_run_replaces_matching_entries() {
    let (_dir, ctx) = temp_context().await;
    let search = ctx.config.search_config(vec!["CarA".into()]);

    let first = StaticHtmlSession::new().with_item(&search, "CarA", "bumper", "3", "10");
    run_search_with_session(&ctx, &search, "bumper", Arc::new(first), CancellationToken::new()).await.unwrap();

    let second = StaticHtmlSession::new().with_item(&search, "CarA", "bumper", "5", "10");
    run_search_with_session(&ctx, &search, "bumper", Arc::new(second), CancellationToken::new()).await.unwrap();

    let history = commands::history_report(&ctx).await.unwrap();
    assert_eq!(history.stats.entries, 1);
    assert_eq!(history.ranked[0].sell_through_percentage, 50);
}

#[tokio::test]
async fn blank_qualifier_is_rejected_before_touching_history() {
    let (_dir, ctx) = temp_context().await;
    let search = ctx.config.search_config(vec!["CarA".into()]);

    let result =
        run_search_with_session(&ctx, &search, " ", Arc::new(StaticHtmlSession::new()), CancellationToken::new()).await;

    assert!(result.is_err());
    assert!(!ctx.config.storage.history_path().unwrap().exists());
}

#[tokio::test]
async fn run_sets_unreadable_history_aside_and_starts_fresh() {
    let (_dir, ctx) = temp_context().await;
    let path = ctx.config.storage.history_path().unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not history").unwrap();
    let search = ctx.config.search_config(vec!["CarA".into()]);
    let session = StaticHtmlSession::new().with_item(&search, "CarA", "bumper", "3", "10");

    let report = run_search_with_session(&ctx, &search, "bumper", Arc::new(session), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(std::fs::read_to_string(path.with_extension("json.corrupted")).unwrap(), "{ not history");
    assert_eq!(commands::history_report(&ctx).await.unwrap().stats.entries, 1);
}
