//! Execution harness: runs the target once per input.
//!
//! The map goes into a single input artifact that is overwritten on every
//! call, so executions must never overlap. The controller guarantees this by
//! running everything on one thread.
//!
//! On Unix the target leads its own process group. A timeout kills the whole
//! group, and so does an exit that leaves descendants holding the output
//! pipes past the drain deadline.

use crate::config::{FuzzConfig, INPUT_PLACEHOLDER};
use crate::input::{CommandSequence, MapString};
use crate::{FuzzError, FuzzResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Minimum time output readers may lag behind a finished or killed target
const KILLED_OUTPUT_GRACE: Duration = Duration::from_millis(100);

/// Classified result of one execution
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum Outcome {
    /// The target exited on its own with this status
    Exited(i32),
    /// The target exceeded the timeout and was killed
    Timeout,
    /// The target was terminated without an exit status (e.g. by a signal)
    Crashed,
}

impl Outcome {
    /// Exit status 0: the target ran without reporting a problem
    pub fn is_clean_exit(&self) -> bool {
        matches!(self, Outcome::Exited(0))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Exited(code) => write!(f, "{}", code),
            Outcome::Timeout => write!(f, "timeout"),
            Outcome::Crashed => write!(f, "crash"),
        }
    }
}

/// Everything observed from one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub outcome: Outcome,
    /// stdout followed by stderr
    pub output: String,
    pub duration: Duration,
}

/// Runs the target against one input
///
/// Implemented by [`ProcessHarness`] for real targets; tests substitute
/// in-process fakes.
pub trait Executor {
    fn execute(&mut self, map: &MapString, commands: &CommandSequence) -> FuzzResult<Execution>;
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&mut self, map: &MapString, commands: &CommandSequence) -> FuzzResult<Execution> {
        (**self).execute(map, commands)
    }
}

/// Executes the target as a child process
#[derive(Debug, Clone)]
pub struct ProcessHarness {
    program: String,
    args: Vec<String>,
    input_path: PathBuf,
    timeout: Duration,
}

impl ProcessHarness {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        input_path: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            input_path: input_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &FuzzConfig) -> Self {
        Self::new(
            config.target.program.clone(),
            config.target.args.clone(),
            config.input_path(),
            config.target.timeout(),
        )
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn write_input(&self, map: &MapString) -> FuzzResult<()> {
        if let Some(parent) = self.input_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| FuzzError::io(parent, e))?;
                debug!("Created input directory {}", parent.display());
            }
        }
        std::fs::write(&self.input_path, map.as_str())
            .map_err(|e| FuzzError::io(&self.input_path, e))
    }

    fn command(&self, commands: &CommandSequence) -> Command {
        let input = self.input_path.to_string_lossy();
        let mut command = Command::new(&self.program);
        for arg in &self.args {
            if arg == INPUT_PLACEHOLDER {
                command.arg(input.as_ref());
            } else {
                command.arg(arg);
            }
        }
        command
            .arg(commands.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        command
    }

    fn spawn(&self, commands: &CommandSequence) -> FuzzResult<Child> {
        self.command(commands)
            .spawn()
            .map_err(|source| FuzzError::Launch {
                program: self.program.clone(),
                source,
            })
    }
}

impl Executor for ProcessHarness {
    fn execute(&mut self, map: &MapString, commands: &CommandSequence) -> FuzzResult<Execution> {
        self.write_input(map)?;

        let started = Instant::now();
        let mut child = self.spawn(commands)?;
        let output = OutputCollector::attach(&mut child);

        let status = child
            .wait_timeout(self.timeout)
            .map_err(|e| FuzzError::io(&self.program, e))?;

        let (outcome, output) = match status {
            Some(status) => {
                let outcome = match status.code() {
                    Some(code) => Outcome::Exited(code),
                    None => Outcome::Crashed,
                };
                // descendants may keep the pipes open after the target exits
                let drain = self
                    .timeout
                    .saturating_sub(started.elapsed())
                    .max(KILLED_OUTPUT_GRACE);
                let (output, complete) = output.finish(Instant::now() + drain);
                if !complete {
                    debug!("Output still open after exit, killing process group");
                    if let Err(e) = kill_process_group(&mut child) {
                        debug!("Killing leftover descendants failed: {}", e);
                    }
                }
                (outcome, output)
            }
            None => {
                warn!(
                    "Target timed out after {:?}, killing process group {}",
                    self.timeout,
                    child.id()
                );
                if let Err(e) = kill_process_group(&mut child) {
                    debug!("Kill after timeout failed: {}", e);
                }
                child.wait().map_err(|e| FuzzError::io(&self.program, e))?;
                let (output, _) = output.finish(Instant::now() + KILLED_OUTPUT_GRACE);
                (Outcome::Timeout, output)
            }
        };

        let duration = started.elapsed();
        debug!("Target finished with {} in {:?}", outcome, duration);

        Ok(Execution {
            outcome,
            output,
            duration,
        })
    }
}

/// Kill the target and everything it spawned. The target leads its own
/// process group, so its pid is the group id.
#[cfg(unix)]
fn kill_process_group(child: &mut Child) -> std::io::Result<()> {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: killpg only sends a signal; the group id comes from our own child
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        return Ok(());
    }
    let error = std::io::Error::last_os_error();
    // the group is already gone; the child itself may still need a signal
    match child.try_wait() {
        Ok(Some(_)) => Err(error),
        _ => child.kill(),
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}

#[derive(Copy, Clone)]
enum Stream {
    Stdout,
    Stderr,
}

enum Chunk {
    Data(Stream, Vec<u8>),
    Closed,
}

/// Drains stdout and stderr on helper threads so a chatty target cannot
/// block on a full pipe
struct OutputCollector {
    receiver: mpsc::Receiver<Chunk>,
    open: usize,
}

impl OutputCollector {
    fn attach(child: &mut Child) -> Self {
        let (sender, receiver) = mpsc::channel();
        let mut open = 0;

        if let Some(stdout) = child.stdout.take() {
            open += 1;
            spawn_reader(Stream::Stdout, stdout, sender.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            open += 1;
            spawn_reader(Stream::Stderr, stderr, sender);
        }

        Self { receiver, open }
    }

    /// Collect output until both streams close or `deadline` passes.
    /// Streams still open at the deadline are abandoned; the flag is false then.
    fn finish(mut self, deadline: Instant) -> (String, bool) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        while self.open > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(Chunk::Data(Stream::Stdout, bytes)) => stdout.extend_from_slice(&bytes),
                Ok(Chunk::Data(Stream::Stderr, bytes)) => stderr.extend_from_slice(&bytes),
                Ok(Chunk::Closed) => self.open -= 1,
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.open = 0;
                }
            }
        }

        let mut output = String::from_utf8_lossy(&stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&stderr));
        (output, self.open == 0)
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    stream: Stream,
    mut reader: R,
    sender: mpsc::Sender<Chunk>,
) {
    thread::spawn(move || {
        let mut buffer = [0u8; 8192];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => {
                    if sender.send(Chunk::Data(stream, buffer[..read].to_vec())).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Reading target output failed: {}", e);
                    break;
                }
            }
        }
        let _ = sender.send(Chunk::Closed);
    });
}
