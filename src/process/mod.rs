//! Running external tools with a timeout and captured output

use log::{debug, warn};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often a running child is polled for completion
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long to wait for output readers after killing a timed-out child
const KILL_GRACE: Duration = Duration::from_millis(250);

/// Errors that can occur when running an external tool
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0} is not installed or not on PATH")]
    ToolNotFound(String),

    #[error("Failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut {
        program: String,
        timeout: Duration,
        output: Box<ToolOutput>,
    },

    #[error("{} exited with {}", .0.program, .0.describe_status())]
    Failed(Box<ToolOutput>),

    #[error("IO error while waiting for {program}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Captured output of the tool, when it got far enough to produce any
    pub fn output(&self) -> Option<&ToolOutput> {
        match self {
            ProcessError::TimedOut { output, .. } | ProcessError::Failed(output) => {
                Some(&**output)
            }
            _ => None,
        }
    }
}

/// Result of a finished external process
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Program that was run
    pub program: String,

    /// Exit code (`None` when terminated by a signal or killed on timeout)
    pub exit_code: Option<i32>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Wall-clock time the process ran for
    pub elapsed: Duration,
}

impl ToolOutput {
    /// Did the process exit with status zero?
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn describe_status(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "no exit code (terminated by signal)".to_string(),
        }
    }

    /// Log captured streams: stdout at debug level, stderr as a warning
    pub fn log_streams(&self) {
        if !self.stdout.trim().is_empty() {
            debug!("{} stdout: {}", self.program, self.stdout.trim_end());
        }
        if !self.stderr.trim().is_empty() {
            warn!("{} stderr: {}", self.program, self.stderr.trim_end());
        }
    }
}

/// A command line for an external tool
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a command for the given executable
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append one argument
    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Kill the tool if it runs longer than `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Name used in logs and errors
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Run the tool to completion.
    ///
    /// Returns `ProcessError::Failed` for a non-zero exit and
    /// `ProcessError::TimedOut` when the timeout expires; both carry the
    /// output captured so far.
    pub fn run(&self) -> Result<ToolOutput, ProcessError> {
        let program = self.program_name();
        debug!("Running {} {:?}", self.program.display(), self.args);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ProcessError::ToolNotFound(program.clone())
            } else {
                ProcessError::Spawn {
                    program: program.clone(),
                    source,
                }
            }
        })?;

        // Drain both pipes concurrently so the child never blocks on a full pipe
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let status = wait_with_deadline(&mut child, self.timeout).map_err(|source| {
            ProcessError::Wait {
                program: program.clone(),
                source,
            }
        })?;
        let elapsed = start.elapsed();

        // Grandchildren of a killed tool can keep the pipes open, so only
        // wait briefly for the readers in that case
        let grace = if status.is_none() {
            Some(KILL_GRACE)
        } else {
            None
        };
        let result = ToolOutput {
            program: program.clone(),
            exit_code: status.and_then(|s| s.code()),
            stdout: collect(stdout_reader, grace),
            stderr: collect(stderr_reader, grace),
            elapsed,
        };

        match (status, self.timeout) {
            (None, Some(timeout)) => Err(ProcessError::TimedOut {
                program,
                timeout,
                output: Box::new(result),
            }),
            (Some(status), _) if status.success() => Ok(result),
            _ => Err(ProcessError::Failed(Box::new(result))),
        }
    }
}

/// Wait for the child, killing it once the deadline passes.
///
/// Returns `Ok(None)` if the child had to be killed.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            // The child may exit between try_wait and kill
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>, grace: Option<Duration>) -> String {
    let reader = reader.filter(|handle| match grace {
        Some(grace) => {
            let deadline = Instant::now() + grace;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(POLL_INTERVAL);
            }
            handle.is_finished()
        }
        None => true,
    });

    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
