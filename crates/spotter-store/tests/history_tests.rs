use chrono::DateTime;
use spotter_store::{HistoryFile, RepCounts, SessionSummary, SummaryStore};
use std::collections::BTreeMap;

fn summary(score: u8) -> SessionSummary {
    let at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
    SessionSummary::new("Squat", at, RepCounts::default(), BTreeMap::new(), score, vec![])
}

#[tokio::test]
async fn test_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let history = HistoryFile::new(dir.path().join("history.json"));
    assert!(history.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_append_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let history = HistoryFile::new(dir.path().join("nested").join("history.json"));
    history.save(&summary(10)).await.unwrap();
    history.save(&summary(20)).await.unwrap();

    let entries = history.load().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].performance_score, 10);
    assert_eq!(entries[1].performance_score, 20);
    assert!(!dir.path().join("nested").join("history.tmp").exists());
}

#[tokio::test]
async fn test_keeps_only_last_entries() {
    let dir = tempfile::tempdir().unwrap();
    let history = HistoryFile::new(dir.path().join("history.json")).with_limit(3);
    for score in 1..=5 {
        history.append(&summary(score)).await.unwrap();
    }
    let scores: Vec<u8> = history
        .load()
        .await
        .unwrap()
        .iter()
        .map(|s| s.performance_score)
        .collect();
    assert_eq!(scores, vec![3, 4, 5]);
}

#[tokio::test]
async fn test_corrupt_file_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "{not json").unwrap();

    let history = HistoryFile::new(&path);
    assert!(history.load().await.is_err());
    history.append(&summary(42)).await.unwrap();

    let entries = history.load().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].performance_score, 42);
}
