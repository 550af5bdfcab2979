//! Bounded subprocess execution.
//!
//! Every external tool call (git, performance scripts) goes through
//! [`run_bounded`], which kills the child once the timeout elapses. Callers
//! treat any error here as soft.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, TrackerError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `cmd` to completion or until `timeout`, capturing its output.
///
/// Spawn failures and timeouts are `ExternalTool` errors; a non-zero exit is
/// reported through [`CommandOutput::code`].
pub fn run_bounded(mut cmd: Command, timeout: Duration) -> Result<CommandOutput> {
    let tool = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| TrackerError::external(&tool, e.to_string()))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_handle = thread::spawn(move || read_pipe(stdout));
    let err_handle = thread::spawn(move || read_pipe(stderr));

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(TrackerError::external(
                    &tool,
                    format!("timed out after {}ms", timeout.as_millis()),
                ));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(TrackerError::external(&tool, e.to_string())),
        }
    };

    Ok(CommandOutput {
        code: status.code(),
        stdout: out_handle.join().unwrap_or_default(),
        stderr: err_handle.join().unwrap_or_default(),
    })
}

fn read_pipe(pipe: Option<impl Read>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_output_and_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = run_bounded(cmd, Duration::from_secs(5)).unwrap();
        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn missing_binary_is_external_failure() {
        let cmd = Command::new("definitely-not-a-real-binary-pt");
        assert!(matches!(
            run_bounded(cmd, Duration::from_secs(1)),
            Err(TrackerError::ExternalTool { .. })
        ));
    }

    #[test]
    fn slow_commands_are_killed() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let started = Instant::now();
        let err = run_bounded(cmd, Duration::from_millis(100)).unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
