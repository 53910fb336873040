//! Tests for download orchestration against a fake download client.
//!
//! This file covers:
//! - Cache correctness across runs
//! - Variant selection (revision, file type fallback, updates)
//! - Partial-failure isolation and retries
//! - Cancellation
//! - Cache persistence

use nxbrew_dl::cache::DownloadCache;
use nxbrew_dl::orchestrator::{select_variants, Outcome};
use nxbrew_dl::FileType;

use std::sync::{Arc, Mutex};

mod common;
use common::helpers::*;

#[tokio::test]
async fn test_download_records_cache() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let prefs = preferences(FileType::Nsp, dir.path());
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(["super game"], &catalog, &prefs, &mut cache)
        .await
        .unwrap();

    assert_eq!(report.get("super game"), Some(&Outcome::Downloaded));
    let selection = select_variants(catalog.get("super game").unwrap(), &prefs, None).unwrap();
    assert!(cache.is_satisfied("super game", &selection.key));
    assert!(!cache.is_satisfied("super game", "some other key"));
}

#[tokio::test]
async fn test_higher_revision_is_downloaded() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();

    orchestrator
        .run(
            ["super game"],
            &catalog,
            &preferences(FileType::Nsp, dir.path()),
            &mut cache,
        )
        .await
        .unwrap();

    assert_eq!(client.submissions(), vec![SUPER_GAME_US_LINK.to_string()]);
}

#[tokio::test]
async fn test_second_run_skips_downloaded_title() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let prefs = preferences(FileType::Nsp, dir.path());
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();

    orchestrator
        .run(["super game"], &catalog, &prefs, &mut cache)
        .await
        .unwrap();
    let report = orchestrator
        .run(["super game"], &catalog, &prefs, &mut cache)
        .await
        .unwrap();

    assert_eq!(
        report.get("super game"),
        Some(&Outcome::skipped("already downloaded"))
    );
    assert_eq!(client.submissions().len(), 1);
}

#[tokio::test]
async fn test_new_selection_is_downloaded_again() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let mut prefs = preferences(FileType::Nsp, dir.path());
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();

    orchestrator
        .run(["super game"], &catalog, &prefs, &mut cache)
        .await
        .unwrap();

    prefs.include_updates = true;
    let report = orchestrator
        .run(["super game"], &catalog, &prefs, &mut cache)
        .await
        .unwrap();

    assert_eq!(report.get("super game"), Some(&Outcome::Downloaded));
    assert_eq!(client.submission_count(SUPER_GAME_UPDATE_LINK), 1);
    let selection = select_variants(catalog.get("super game").unwrap(), &prefs, None).unwrap();
    assert!(cache.is_satisfied("super game", &selection.key));
}

#[tokio::test]
async fn test_falls_back_to_xci() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(
            ["other game"],
            &catalog,
            &preferences(FileType::Nsp, dir.path()),
            &mut cache,
        )
        .await
        .unwrap();

    assert_eq!(report.get("other game"), Some(&Outcome::Downloaded));
    assert_eq!(client.submissions(), vec![OTHER_GAME_LINK.to_string()]);
}

#[tokio::test]
async fn test_failing_title_does_not_block_the_rest() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let client = Arc::new(FakeClient::new().broken(OTHER_GAME_LINK));
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();
    cache.record("third game", "stale key");

    let report = orchestrator
        .run(
            ["super game", "other game", "third game"],
            &catalog,
            &preferences(FileType::Nsp, dir.path()),
            &mut cache,
        )
        .await
        .unwrap();

    assert_eq!(report.get("super game"), Some(&Outcome::Downloaded));
    assert!(report.get("other game").unwrap().is_failed());
    assert_eq!(report.get("third game"), Some(&Outcome::Downloaded));
    assert_eq!(report.failed(), 1);
    // First attempt plus two retries.
    assert_eq!(client.submission_count(OTHER_GAME_LINK), 3);
    assert!(cache.get("other game").is_none());
}

#[tokio::test]
async fn test_transient_client_failure_is_retried() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let client = Arc::new(FakeClient::new().flaky(OTHER_GAME_LINK, 2));
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(
            ["other game"],
            &catalog,
            &preferences(FileType::Xci, dir.path()),
            &mut cache,
        )
        .await
        .unwrap();

    assert_eq!(report.get("other game"), Some(&Outcome::Downloaded));
    assert_eq!(client.submission_count(OTHER_GAME_LINK), 3);
}

#[tokio::test]
async fn test_completed_links_are_not_resubmitted_on_retry() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let mut prefs = preferences(FileType::Nsp, dir.path());
    prefs.include_updates = true;
    let client = Arc::new(FakeClient::new().flaky(SUPER_GAME_UPDATE_LINK, 1));
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(["super game"], &catalog, &prefs, &mut cache)
        .await
        .unwrap();

    assert_eq!(report.get("super game"), Some(&Outcome::Downloaded));
    assert_eq!(client.submission_count(SUPER_GAME_US_LINK), 1);
    assert_eq!(client.submission_count(SUPER_GAME_UPDATE_LINK), 2);
}

#[tokio::test]
async fn test_unknown_and_empty_titles_are_skipped() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client.clone()).build();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(
            ["zelda", "broken game", "zelda"],
            &catalog,
            &preferences(FileType::Nsp, dir.path()),
            &mut cache,
        )
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.get("zelda"), Some(&Outcome::skipped("not in catalog")));
    assert_eq!(
        report.get("broken game"),
        Some(&Outcome::skipped("no eligible variant"))
    );
    assert!(client.submissions().is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start_submits_nothing() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client.clone()).build();
    orchestrator.cancel();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(
            ["super game", "other game"],
            &catalog,
            &preferences(FileType::Nsp, dir.path()),
            &mut cache,
        )
        .await
        .unwrap();

    assert!(report
        .outcomes
        .values()
        .all(|o| *o == Outcome::skipped("cancelled")));
    assert!(client.submissions().is_empty());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_cancel_between_titles() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let client = Arc::new(FakeClient::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let builder = fast_orchestrator(client.clone());
    let token = tokio_util::sync::CancellationToken::new();
    let cancel_after_first = token.clone();
    let seen_in_callback = seen.clone();
    let orchestrator = builder
        .cancellation_token(token)
        .on_outcome(move |name, outcome| {
            seen_in_callback
                .lock()
                .unwrap()
                .push((name.to_string(), outcome.clone()));
            cancel_after_first.cancel();
        })
        .build();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(
            ["super game", "other game", "third game"],
            &catalog,
            &preferences(FileType::Nsp, dir.path()),
            &mut cache,
        )
        .await
        .unwrap();

    assert_eq!(report.get("super game"), Some(&Outcome::Downloaded));
    assert_eq!(report.get("other game"), Some(&Outcome::skipped("cancelled")));
    assert_eq!(report.get("third game"), Some(&Outcome::skipped("cancelled")));
    assert_eq!(client.submissions().len(), 1);
    assert_eq!(seen.lock().unwrap().len(), 3);
    assert!(cache.get("super game").is_some());
}

#[tokio::test]
async fn test_cache_is_persisted_after_download() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let cache_path = dir.path().join("state").join("cache.json");
    let prefs = preferences(FileType::Nsp, dir.path());
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client)
        .cache_path(cache_path.clone())
        .build();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(["super game", "other game"], &catalog, &prefs, &mut cache)
        .await
        .unwrap();
    assert!(report.warnings.is_empty());

    let reloaded = DownloadCache::load(&cache_path).unwrap();
    assert_eq!(reloaded, cache);
    assert_eq!(reloaded.len(), 2);
}

#[tokio::test]
async fn test_cache_save_failure_is_a_warning() {
    let catalog = fixture_catalog().await;
    let dir = create_temp_dir();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let client = Arc::new(FakeClient::new());
    let orchestrator = fast_orchestrator(client)
        .cache_path(blocker.join("cache.json"))
        .build();
    let mut cache = DownloadCache::new();

    let report = orchestrator
        .run(
            ["super game"],
            &catalog,
            &preferences(FileType::Nsp, dir.path()),
            &mut cache,
        )
        .await
        .unwrap();

    assert_eq!(report.get("super game"), Some(&Outcome::Downloaded));
    assert_eq!(report.warnings.len(), 1);
    assert!(cache.get("super game").is_some());
}
