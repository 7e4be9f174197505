//! Process execution with bounded waits.
//!
//! Every probe and remediation that talks to an external tool goes through
//! [`execute`]. Output is captured on helper threads so a child that writes
//! a lot cannot fill its pipe and stall, and the wait is bounded by
//! [`CommandOptions::timeout`]. A child that outlives its timeout is killed
//! and reported as [`ReadyError::CommandTimedOut`]. The same deadline covers
//! collecting output, so a background process that inherited the pipes
//! cannot hold the caller past it.

use crate::error::{ReadyError, Result};
use std::collections::HashMap;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }

    /// First non-empty line of stdout, trimmed.
    pub fn first_line(&self) -> &str {
        self.stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }

    /// The most useful single line explaining a failure.
    ///
    /// Prefers the last non-empty stderr line, then stdout, then the exit code.
    pub fn error_summary(&self) -> String {
        let last = |s: &str| {
            s.lines()
                .map(str::trim)
                .rfind(|l| !l.is_empty())
                .map(str::to_string)
        };

        last(&self.stderr)
            .or_else(|| last(&self.stdout))
            .unwrap_or_else(|| match self.exit_code {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by signal".to_string(),
            })
    }

    /// Last `n` non-empty lines of stderr (or stdout when stderr is empty).
    pub fn output_tail(&self, n: usize) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].join("\n")
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Upper bound on the wait (None = wait forever).
    pub timeout: Option<Duration>,
}

impl CommandOptions {
    /// Options with only a timeout set.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }
}

/// Something that can run external programs.
///
/// Production code uses [`SystemRunner`]; tests substitute canned runners so
/// remediation logic can be exercised without touching the host.
pub trait CommandRunner {
    /// Run `program` with `args`, capturing output.
    fn run(&self, program: &str, args: &[&str], options: &CommandOptions)
        -> Result<CommandResult>;
}

/// Runs commands on the real system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
    ) -> Result<CommandResult> {
        execute(program, args, options)
    }
}

/// Render a program and its arguments as a single display string.
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Execute a program, capturing stdout and stderr.
pub fn execute(program: &str, args: &[&str], options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let command_line = display_command(program, args);
    debug!(command = %command_line, timeout = ?options.timeout, "spawning command");

    let mut cmd = build_command(program, args);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ReadyError::CommandNotFound {
            program: program.to_string(),
        },
        _ => ReadyError::CommandFailed {
            command: command_line.clone(),
            code: None,
        },
    })?;

    let (tx, rx) = mpsc::channel();
    let mut pipes = 0;
    if let Some(out) = child.stdout.take() {
        spawn_reader(out, Pipe::Stdout, tx.clone());
        pipes += 1;
    }
    if let Some(err) = child.stderr.take() {
        spawn_reader(err, Pipe::Stderr, tx.clone());
        pipes += 1;
    }
    drop(tx);

    let deadline = options.timeout.map(|limit| Instant::now() + limit);
    let timed_out = |command: String| {
        let seconds = options.timeout.map(|l| l.as_secs()).unwrap_or_default();
        ReadyError::CommandTimedOut { command, seconds }
    };

    let status = match deadline {
        Some(deadline) => match wait_until(&mut child, deadline)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                debug!(command = %command_line, "command timed out");
                // Readers are left detached: a grandchild may still hold the pipes.
                return Err(timed_out(command_line));
            }
        },
        None => child.wait()?,
    };

    let Some((stdout, stderr)) = collect_output(&rx, pipes, deadline) else {
        debug!(command = %command_line, "output still open at deadline");
        return Err(timed_out(command_line));
    };
    let duration = start.elapsed();

    debug!(
        command = %command_line,
        code = ?status.code(),
        elapsed_ms = duration.as_millis() as u64,
        "command finished"
    );

    if status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else if is_shell_not_found(status.code(), &stderr) {
        Err(ReadyError::CommandNotFound {
            program: program.to_string(),
        })
    } else {
        Ok(CommandResult::failure(status.code(), stdout, stderr, duration))
    }
}

/// Build the platform command.
///
/// On Windows, tools such as `npm` are `.cmd` shims that `CreateProcess`
/// cannot start directly, so everything goes through `cmd /C`.
fn build_command(program: &str, args: &[&str]) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(program).args(args);
        cmd
    } else {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    }
}

/// `cmd /C` reports a missing program as exit code 9009 instead of a spawn error.
fn is_shell_not_found(code: Option<i32>, stderr: &str) -> bool {
    cfg!(target_os = "windows")
        && (code == Some(9009) || stderr.contains("is not recognized as an internal or external"))
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R, which: Pipe, tx: Sender<(Pipe, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((which, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Wait for every reader to finish, or `None` once the deadline passes.
fn collect_output(
    rx: &Receiver<(Pipe, String)>,
    pipes: usize,
    deadline: Option<Instant>,
) -> Option<(String, String)> {
    let mut stdout = String::new();
    let mut stderr = String::new();
    for _ in 0..pipes {
        let received = match deadline {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok((Pipe::Stdout, text)) => stdout = text,
            Ok((Pipe::Stderr, text)) => stderr = text,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Some((stdout, stderr))
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stdout: &str, stderr: &str, code: Option<i32>) -> CommandResult {
        CommandResult::failure(
            code,
            stdout.to_string(),
            stderr.to_string(),
            Duration::ZERO,
        )
    }

    #[test]
    fn display_command_joins_args() {
        assert_eq!(display_command("node", &["--version"]), "node --version");
        assert_eq!(display_command("mysql", &[]), "mysql");
    }

    #[test]
    fn error_summary_prefers_last_stderr_line() {
        let r = result("out\n", "warning: x\nERROR 1045: Access denied\n\n", Some(1));
        assert_eq!(r.error_summary(), "ERROR 1045: Access denied");
    }

    #[test]
    fn error_summary_falls_back_to_stdout_then_code() {
        assert_eq!(result("only stdout\n", "", Some(1)).error_summary(), "only stdout");
        assert_eq!(result("", "  \n", Some(3)).error_summary(), "exited with code 3");
        assert_eq!(result("", "", None).error_summary(), "terminated by signal");
    }

    #[test]
    fn first_line_skips_blank_lines() {
        let r = result("\n\n  v20.11.0  \nmore\n", "", Some(0));
        assert_eq!(r.first_line(), "v20.11.0");
    }

    #[test]
    fn output_tail_limits_lines() {
        let r = result("", "a\nb\n\nc\nd\n", Some(1));
        assert_eq!(r.output_tail(2), "c\nd");
        assert_eq!(r.output_tail(10), "a\nb\nc\nd");
    }

    #[cfg(unix)]
    #[test]
    fn execute_captures_stdout() {
        let r = execute("sh", &["-c", "echo hello"], &CommandOptions::default()).unwrap();
        assert!(r.success);
        assert_eq!(r.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn execute_reports_failure_with_stderr() {
        let r = execute(
            "sh",
            &["-c", "echo broken >&2; exit 3"],
            &CommandOptions::default(),
        )
        .unwrap();
        assert!(!r.success);
        assert_eq!(r.exit_code, Some(3));
        assert_eq!(r.error_summary(), "broken");
    }

    #[cfg(unix)]
    #[test]
    fn execute_missing_program_is_not_found() {
        let err = execute(
            "readycheck-definitely-not-a-program",
            &[],
            &CommandOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReadyError::CommandNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn execute_kills_on_timeout() {
        let start = Instant::now();
        let err = execute(
            "sh",
            &["-c", "sleep 5"],
            &CommandOptions::with_timeout(Duration::from_millis(200)),
        )
        .unwrap_err();
        assert!(matches!(err, ReadyError::CommandTimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn background_process_holding_output_cannot_outlast_timeout() {
        let start = Instant::now();
        let err = execute(
            "sh",
            &["-c", "sleep 4 & echo started"],
            &CommandOptions::with_timeout(Duration::from_millis(300)),
        )
        .unwrap_err();
        assert!(matches!(err, ReadyError::CommandTimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn output_is_collected_within_timeout() {
        let result = execute(
            "sh",
            &["-c", "echo out; echo err >&2"],
            &CommandOptions::with_timeout(Duration::from_secs(10)),
        )
        .unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn execute_applies_env_and_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut options = CommandOptions::default();
        options.cwd = Some(temp.path().to_path_buf());
        options
            .env
            .insert("READYCHECK_TEST_VAR".to_string(), "42".to_string());

        let r = execute("sh", &["-c", "echo $READYCHECK_TEST_VAR; pwd"], &options).unwrap();
        assert!(r.stdout.starts_with("42"));
        let expected = temp.path().canonicalize().unwrap();
        let printed = PathBuf::from(r.stdout.lines().nth(1).unwrap().trim());
        assert_eq!(printed.canonicalize().unwrap(), expected);
    }
}
