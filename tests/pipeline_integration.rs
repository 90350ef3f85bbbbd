//! End-to-end tests of the shipping pipeline against real processes

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use s4log::app::{exit_code, run_agent, AgentConfig};
use s4log::storage::Destination;
use tempfile::TempDir;

fn config_for(dir: &Path) -> AgentConfig {
    AgentConfig {
        destination: Destination::File {
            dir: dir.to_path_buf(),
        },
        ..Default::default()
    }
}

/// Artifact paths in name order, which is commit-time order
fn artifact_paths(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_quiet_output_is_committed_by_deadline() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("logs");
    let config = AgentConfig {
        period: Duration::from_millis(200),
        ..config_for(&dir)
    };

    let report = run_agent(&config, &["sh", "-c", "echo one; sleep 1; echo two"])
        .await
        .unwrap();

    assert_eq!(exit_code(&report), 0);
    let contents: Vec<Vec<u8>> = artifact_paths(&dir)
        .iter()
        .map(|p| fs::read(p).unwrap())
        .collect();
    assert_eq!(contents, vec![b"one\n".to_vec(), b"two\n".to_vec()]);
    assert_eq!(report.stats.batches_committed, 2);
    assert_eq!(report.stats.bytes_committed, 8);
}

#[tokio::test]
async fn test_large_output_is_shipped_in_whole_lines() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("logs");
    let config = AgentConfig {
        buffer_size: 4096,
        concurrency: 1,
        ..config_for(&dir)
    };
    let script = "i=0; while [ $i -lt 5000 ]; do echo line-$i; i=$((i+1)); done";

    let report = run_agent(&config, &["sh", "-c", script]).await.unwrap();

    let expected: String = (0..5000).map(|i| format!("line-{}\n", i)).collect();
    let paths = artifact_paths(&dir);
    assert!(paths.len() > 1);

    let mut shipped = Vec::new();
    for path in &paths {
        let data = fs::read(path).unwrap();
        assert!(data.len() <= 4096);
        assert_eq!(data.last(), Some(&b'\n'), "{} ends mid-line", path.display());
        shipped.extend_from_slice(&data);
    }
    assert_eq!(String::from_utf8(shipped).unwrap(), expected);
    assert_eq!(report.stats.bytes_committed, expected.len() as u64);
    assert_eq!(report.stats.bytes_dropped, 0);
}

#[tokio::test]
async fn test_failing_command_still_ships_output() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("logs");

    let report = run_agent(&config_for(&dir), &["sh", "-c", "echo last words >&2; exit 42"])
        .await
        .unwrap();

    assert_eq!(exit_code(&report), 42);
    let paths = artifact_paths(&dir);
    assert_eq!(paths.len(), 1);
    assert_eq!(fs::read(&paths[0]).unwrap(), b"last words\n");
}

#[tokio::test]
async fn test_silent_command_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("logs");

    let report = run_agent(&config_for(&dir), &["true"]).await.unwrap();

    assert_eq!(exit_code(&report), 0);
    assert!(artifact_paths(&dir).is_empty());
    assert_eq!(report.stats.batches_committed, 0);
}

#[tokio::test]
async fn test_directory_with_trailing_slash() {
    let temp = TempDir::new().unwrap();
    let dir = PathBuf::from(format!("{}/logs/", temp.path().display()));

    run_agent(&config_for(&dir), &["echo", "kept"]).await.unwrap();

    let paths = artifact_paths(&temp.path().join("logs"));
    assert_eq!(paths.len(), 1);
    assert_eq!(fs::read(&paths[0]).unwrap(), b"kept\n");
}

#[tokio::test]
async fn test_unknown_command_fails_to_start() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("logs");

    let err = run_agent(&config_for(&dir), &["definitely_not_a_real_command_xyz123"])
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("definitely_not_a_real_command_xyz123"));
}
