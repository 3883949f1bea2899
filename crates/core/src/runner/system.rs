//! Runner backed by real subprocesses.
//!
//! Each command is spawned with [`tokio::process::Command`]; stderr (and
//! stdout when requested) is captured while the process runs. Redirection
//! targets are opened before spawning, so a missing input file surfaces as
//! [`RunnerError::Redirect`] rather than a tool failure.

use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use super::command::{
    PipelineOutput, ProcessRunner, RunnerError, StdoutTarget, ToolCommand, ToolOutput,
};

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Anything beyond the cap is drained and dropped so the child never blocks
/// on a full pipe.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Executes tools as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput, RunnerError> {
        tracing::debug!(command = %cmd, "Running tool");

        let start = Instant::now();
        let mut command = base_command(cmd);
        command.stdin(stdin_for(cmd).await?);
        command.stdout(stdout_for(cmd).await?);

        let child = spawn(&mut command, cmd)?;
        let output = wait_with_output(&cmd.program, child, start).await?;
        log_finished(&output);
        Ok(output)
    }

    async fn run_piped(
        &self,
        producer: &ToolCommand,
        consumer: &ToolCommand,
    ) -> Result<PipelineOutput, RunnerError> {
        tracing::debug!(producer = %producer, consumer = %consumer, "Running pipeline");

        let start = Instant::now();

        let mut producer_cmd = base_command(producer);
        producer_cmd.stdin(stdin_for(producer).await?);
        producer_cmd.stdout(Stdio::piped());
        let mut producer_child = spawn(&mut producer_cmd, producer)?;

        let producer_stdout = producer_child.stdout.take().ok_or_else(|| RunnerError::Io {
            program: producer.program.clone(),
            source: std::io::Error::other("producer stdout was not piped"),
        })?;
        let pipe = TryInto::<Stdio>::try_into(producer_stdout).map_err(|source: std::io::Error| {
            RunnerError::Io {
                program: producer.program.clone(),
                source,
            }
        })?;

        // If anything below fails, dropping `producer_child` kills the
        // producer because `kill_on_drop(true)` is set.
        let mut consumer_cmd = base_command(consumer);
        consumer_cmd.stdin(pipe);
        consumer_cmd.stdout(stdout_for(consumer).await?);
        let consumer_child = spawn(&mut consumer_cmd, consumer)?;
        // The builder still owns the pipe's read end; close it so the producer
        // sees EPIPE once the consumer exits.
        drop(consumer_cmd);

        let (producer_out, consumer_out) = tokio::join!(
            wait_with_output(&producer.program, producer_child, start),
            wait_with_output(&consumer.program, consumer_child, start),
        );

        let output = PipelineOutput {
            producer: producer_out?,
            consumer: consumer_out?,
        };
        log_finished(&output.producer);
        log_finished(&output.consumer);
        Ok(output)
    }
}

fn base_command(cmd: &ToolCommand) -> Command {
    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command
}

fn spawn(command: &mut Command, cmd: &ToolCommand) -> Result<Child, RunnerError> {
    command.spawn().map_err(|source| RunnerError::Spawn {
        program: cmd.program.clone(),
        source,
    })
}

async fn stdin_for(cmd: &ToolCommand) -> Result<Stdio, RunnerError> {
    match &cmd.stdin {
        None => Ok(Stdio::null()),
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| RunnerError::Redirect {
                    path: path.clone(),
                    source,
                })?;
            Ok(Stdio::from(file.into_std().await))
        }
    }
}

async fn stdout_for(cmd: &ToolCommand) -> Result<Stdio, RunnerError> {
    match &cmd.stdout {
        StdoutTarget::Discard => Ok(Stdio::null()),
        StdoutTarget::Capture => Ok(Stdio::piped()),
        StdoutTarget::File(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .map_err(|source| RunnerError::Redirect {
                    path: path.clone(),
                    source,
                })?;
            Ok(Stdio::from(file.into_std().await))
        }
    }
}

/// Wait for `child` to exit while draining its piped streams.
async fn wait_with_output(
    program: &str,
    mut child: Child,
    start: Instant,
) -> Result<ToolOutput, RunnerError> {
    // Read the streams on separate tasks so `child.wait()` can borrow the
    // child mutably at the same time.
    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let status: ExitStatus = child.wait().await.map_err(|source| RunnerError::Io {
        program: program.to_string(),
        source,
    })?;

    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();

    Ok(ToolOutput {
        program: program.to_string(),
        exit_code: status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}

fn log_finished(output: &ToolOutput) {
    if output.success() {
        tracing::debug!(
            program = %output.program,
            duration_ms = output.duration_ms,
            "Tool finished",
        );
    } else {
        tracing::warn!(
            program = %output.program,
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            stderr = %output.stderr.trim(),
            "Tool exited with non-zero status",
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_capture_stdout_and_stderr() {
        let output = SystemRunner
            .run(&sh("echo out; echo err >&2").capture_stdout())
            .await
            .expect("run");
        assert!(output.success());
        assert_eq!(output.program, "sh");
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_stdout_discarded_by_default() {
        let output = SystemRunner.run(&sh("echo hidden")).await.expect("run");
        assert!(output.success());
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let output = SystemRunner.run(&sh("exit 42")).await.expect("run");
        assert_eq!(output.exit_code, 42);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let result = SystemRunner
            .run(&ToolCommand::new("sqlvault-definitely-missing-binary"))
            .await;
        assert_matches!(result, Err(RunnerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_stdin_and_stdout_files() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let input = dir.path().join("in.txt");
        let output_path = dir.path().join("out.txt");
        std::fs::write(&input, "hello file\n").expect("write input");

        let output = SystemRunner
            .run(
                &ToolCommand::new("cat")
                    .stdin_file(&input)
                    .stdout_file(&output_path),
            )
            .await
            .expect("run");
        assert!(output.success());
        assert_eq!(
            std::fs::read_to_string(&output_path).expect("read output"),
            "hello file\n"
        );
    }

    #[tokio::test]
    async fn test_missing_stdin_file_is_redirect_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = SystemRunner
            .run(&ToolCommand::new("cat").stdin_file(dir.path().join("absent.sql")))
            .await;
        assert_matches!(result, Err(RunnerError::Redirect { .. }));
    }

    #[tokio::test]
    async fn test_pipeline_streams_between_stages() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output_path = dir.path().join("upper.txt");

        let output = SystemRunner
            .run_piped(
                &sh("printf 'abc\\n'"),
                &ToolCommand::new("tr")
                    .args(["a-z", "A-Z"])
                    .stdout_file(&output_path),
            )
            .await
            .expect("run pipeline");
        assert!(output.success());
        assert_eq!(
            std::fs::read_to_string(&output_path).expect("read output"),
            "ABC\n"
        );
    }

    #[tokio::test]
    async fn test_pipeline_fails_when_producer_fails() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output_path = dir.path().join("out.txt");

        let output = SystemRunner
            .run_piped(
                &sh("echo partial; exit 3"),
                &ToolCommand::new("cat").stdout_file(&output_path),
            )
            .await
            .expect("run pipeline");
        assert!(!output.success());
        assert_eq!(output.producer.exit_code, 3);
        assert_eq!(output.consumer.exit_code, 0);
        assert_eq!(
            output.first_failure().map(|o| o.program.as_str()),
            Some("sh")
        );
    }

    #[tokio::test]
    async fn test_pipeline_returns_when_consumer_exits_early() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output_path = dir.path().join("out.gz");

        // More than a pipe buffer, so the producer blocks unless the read end
        // is closed once the consumer is gone.
        let producer = sh("head -c 2000000 /dev/zero");
        let consumer = sh("exit 5").stdout_file(&output_path);
        let pipeline = SystemRunner.run_piped(&producer, &consumer);
        let output = tokio::time::timeout(std::time::Duration::from_secs(20), pipeline)
            .await
            .expect("pipeline finished")
            .expect("run pipeline");

        assert!(!output.success());
        assert_eq!(output.consumer.exit_code, 5);
        assert_ne!(output.producer.exit_code, 0);
    }
}
