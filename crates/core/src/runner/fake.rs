//! Recording runner for tests, available to other crates through the
//! `test-util` feature.
//!
//! Mimics the filesystem effects of the real tools so the orchestrator's
//! output-file checks behave as they would in production:
//!
//! - a command with a stdout file creates that file,
//! - `gzip -d <path>.gz` replaces the archive with the decompressed file,
//! - `s3cmd ... get ... <dest>` creates `<dest>`.
//!
//! Exit codes are scripted per program name; unscripted programs exit 0.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::command::{
    PipelineOutput, ProcessRunner, RunnerError, StdoutTarget, ToolCommand, ToolOutput,
};

#[derive(Debug, Default)]
pub struct FakeRunner {
    exit_codes: HashMap<String, i32>,
    stdout: HashMap<String, String>,
    /// Programs that run successfully but leave no output file behind.
    no_output: Vec<String>,
    calls: Mutex<Vec<ToolCommand>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_code(mut self, program: &str, code: i32) -> Self {
        self.exit_codes.insert(program.to_string(), code);
        self
    }

    pub fn stdout(mut self, program: &str, stdout: &str) -> Self {
        self.stdout.insert(program.to_string(), stdout.to_string());
        self
    }

    pub fn without_output(mut self, program: &str) -> Self {
        self.no_output.push(program.to_string());
        self
    }

    /// Every command run so far, in order. Pipelines record both stages.
    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    fn execute(&self, cmd: &ToolCommand) -> ToolOutput {
        self.calls.lock().expect("calls lock").push(cmd.clone());

        let exit_code = self.exit_codes.get(&cmd.program).copied().unwrap_or(0);
        if exit_code == 0 && !self.no_output.contains(&cmd.program) {
            simulate_effects(cmd);
        }

        let stdout = match cmd.stdout {
            StdoutTarget::Capture => self.stdout.get(&cmd.program).cloned().unwrap_or_default(),
            _ => String::new(),
        };

        ToolOutput {
            program: cmd.program.clone(),
            exit_code,
            stdout,
            stderr: if exit_code == 0 {
                String::new()
            } else {
                format!("{} failed", cmd.program)
            },
            duration_ms: 0,
        }
    }
}

fn simulate_effects(cmd: &ToolCommand) {
    if let StdoutTarget::File(path) = &cmd.stdout {
        std::fs::write(path, b"fake output").expect("write fake stdout file");
    }

    match cmd.program.as_str() {
        "gzip" if cmd.args.first().map(String::as_str) == Some("-d") => {
            if let Some(archive) = cmd.args.last() {
                let archive = Path::new(archive);
                if let Some(plain) = archive.to_str().and_then(|s| s.strip_suffix(".gz")) {
                    std::fs::write(plain, b"-- fake sql").expect("write decompressed file");
                    let _ = std::fs::remove_file(archive);
                }
            }
        }
        "s3cmd" if cmd.args.iter().any(|a| a == "get") => {
            if let Some(dest) = cmd.args.last() {
                std::fs::write(dest, b"fake archive").expect("write downloaded file");
            }
        }
        _ => {}
    }
}

impl ProcessRunner for FakeRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput, RunnerError> {
        Ok(self.execute(cmd))
    }

    async fn run_piped(
        &self,
        producer: &ToolCommand,
        consumer: &ToolCommand,
    ) -> Result<PipelineOutput, RunnerError> {
        let producer = self.execute(producer);
        let consumer = self.execute(consumer);
        Ok(PipelineOutput { producer, consumer })
    }
}
