//! Running an external tool with a deadline.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::NormalizeError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A program plus arguments, built before it is run so it can be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        let s = path.to_string_lossy().into_owned();
        self.arg(s)
    }

    /// Runs the command, killing it once `timeout` elapses.
    /// Non-zero exit is an error carrying the tool's stderr.
    pub fn run(&self, timeout: Duration) -> Result<ToolOutput, NormalizeError> {
        tracing::debug!(program = %self.program, args = ?self.args, "running image tool");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| NormalizeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain pipes on threads so a chatty tool never blocks on a full pipe.
        let stdout = child.stdout.take().map(|mut s| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = s.read_to_end(&mut buf);
                buf
            })
        });
        let stderr = child.stderr.take().map(|mut s| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = s.read_to_end(&mut buf);
                buf
            })
        });

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(program = %self.program, "image tool timed out; killed");
                return Err(NormalizeError::TimedOut {
                    program: self.program.clone(),
                    secs: timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();

        if !status.success() {
            return Err(NormalizeError::Failed {
                program: self.program.clone(),
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        Ok(ToolOutput { stdout })
    }
}
