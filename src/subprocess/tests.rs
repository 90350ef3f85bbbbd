use super::*;
use tokio::io::AsyncReadExt;

async fn read_all(mut output: ChildOutput) -> String {
    let mut buf = Vec::new();
    output.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn test_spawn_captures_stdout() {
    let command = ProcessCommandBuilder::new("echo").arg("hello world").build();

    let ChildStream { output, process } = spawn(&command).unwrap();
    let text = read_all(output).await;
    let status = process.wait().await.unwrap();

    assert_eq!(text, "hello world\n");
    assert!(status.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_spawn_merges_stderr() {
    let command = ProcessCommandBuilder::new("sh")
        .arg("-c")
        .arg("echo out; echo err >&2")
        .build();

    let ChildStream { output, process } = spawn(&command).unwrap();
    let text = read_all(output).await;
    process.wait().await.unwrap();

    assert!(text.contains("out\n"));
    assert!(text.contains("err\n"));
}

#[tokio::test]
async fn test_spawn_without_merge_leaves_stderr_out() {
    let command = ProcessCommandBuilder::new("sh")
        .arg("-c")
        .arg("echo out; echo err >&2")
        .merge_stderr(false)
        .build();

    let ChildStream { output, process } = spawn(&command).unwrap();
    let text = read_all(output).await;
    process.wait().await.unwrap();

    assert_eq!(text, "out\n");
}

#[tokio::test]
async fn test_wait_reports_exit_code() {
    let command = ProcessCommandBuilder::new("sh").arg("-c").arg("exit 3").build();

    let ChildStream { output, process } = spawn(&command).unwrap();
    drop(output);
    let status = process.wait().await.unwrap();

    assert_eq!(status, ExitStatus::Error(3));
    assert_eq!(status.code(), Some(3));
    assert!(!status.success());
}

#[tokio::test]
async fn test_spawn_command_not_found() {
    let command = ProcessCommandBuilder::new("nonexistent-command-12345").build();

    let result = spawn(&command);

    assert!(matches!(result, Err(ProcessError::CommandNotFound(_))));
}

#[test]
fn test_builder_from_argv() {
    let command = ProcessCommandBuilder::from_argv(&["tail", "-f", "/var/log/syslog"])
        .unwrap()
        .build();

    assert_eq!(command.program, "tail");
    assert_eq!(command.args, vec!["-f", "/var/log/syslog"]);
    assert!(command.merge_stderr);
    assert_eq!(command.display(), "tail -f /var/log/syslog");

    let empty: [&str; 0] = [];
    assert!(ProcessCommandBuilder::from_argv(&empty).is_none());
}
