use log::Log;
use spotter_base::logging::{
    format_record, init_file_logger, init_stdout_logger, FileLogger, StdoutLogger,
};
use std::fs;

fn record_args() -> log::Record<'static> {
    log::RecordBuilder::new()
        .level(log::Level::Warn)
        .target("spotter_form::trainer")
        .file(Some("trainer.rs"))
        .line(Some(42))
        .build()
}

#[test]
fn test_format_record_contains_level_target_and_location() {
    let line = format_record(
        &log::RecordBuilder::new()
            .level(log::Level::Warn)
            .target("spotter_form::trainer")
            .file(Some("trainer.rs"))
            .line(Some(42))
            .args(format_args!("detection lost"))
            .build(),
    );

    assert!(line.contains("[WARN]"));
    assert!(line.contains("spotter_form::trainer"));
    assert!(line.contains("trainer.rs:42"));
    assert!(line.ends_with("detection lost"));
}

#[test]
fn test_stdout_logger_does_not_panic() {
    let logger = StdoutLogger;
    logger.log(&record_args());
    logger.flush();
}

#[test]
fn test_file_logger_creates_directory_and_file() {
    let dir = std::env::temp_dir().join(format!("spotter-log-test-{}-create", std::process::id()));
    let _ = fs::remove_dir_all(&dir);

    let _logger = FileLogger::new(&dir).expect("create logger");

    assert!(dir.is_dir());
    let entries: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(|e| e.ok()).collect();
    assert_eq!(entries.len(), 1);
    let name = entries[0].file_name().into_string().unwrap();
    assert!(name.starts_with("spotter-") && name.ends_with(".log"), "unexpected {name}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_file_logger_writes_enabled_records() {
    let dir = std::env::temp_dir().join(format!("spotter-log-test-{}-write", std::process::id()));
    let _ = fs::remove_dir_all(&dir);

    let logger = FileLogger::new(&dir).expect("create logger");
    log::set_max_level(log::LevelFilter::Debug);
    logger.log(
        &log::RecordBuilder::new()
            .level(log::Level::Error)
            .target("spotter_store")
            .file(Some("persister.rs"))
            .line(Some(100))
            .args(format_args!("remote save failed"))
            .build(),
    );
    logger.flush();

    let entries: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(|e| e.ok()).collect();
    let content = fs::read_to_string(entries[0].path()).unwrap();
    assert!(content.contains("[ERROR]"));
    assert!(content.contains("persister.rs:100"));
    assert!(content.contains("remote save failed"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_init_stdout_logger_is_idempotent() {
    init_stdout_logger();
    init_stdout_logger();
    log::info!("logger installed");
}

#[test]
fn test_init_file_logger_invalid_dir_returns_error() {
    assert!(init_file_logger("/proc/nonexistent/spotter").is_err());
}

#[test]
fn test_timestamp_shape() {
    let ts = spotter_base::logging::format_timestamp();
    assert_eq!(ts.len(), 23);
    assert_eq!(&ts[10..11], "T");
    assert_eq!(&ts[19..20], ".");
    assert!(ts.starts_with(&spotter_base::logging::format_today()));
}
