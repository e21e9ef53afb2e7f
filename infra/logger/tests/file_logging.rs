use keel_logger::{LevelFilter, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn file_logging_writes_rolling_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("nested").join("logs");

    let logger = Logger::builder()
        .name("keel-file-logging")
        .console(false)
        .path(&log_dir)
        .level(LevelFilter::INFO)
        .init()?;
    assert!(logger.has_file_output());

    tracing::info!(bucket = "docs", "opened store");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    assert!(contents.contains("opened store"), "{contents}");
    assert!(contents.contains("bucket"), "{contents}");

    Ok(())
}
