//! Subprocess execution with combined output capture
//!
//! The builder, the sys-patch collaborator and ocvalidate are all external
//! programs. They share one runner: stdout and stderr are drained on reader
//! threads into a single buffer in arrival order, and the child is polled so
//! an optional deadline can kill it.

use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::timeout::{Deadline, POLL_INTERVAL};

/// Result of one external run
#[derive(Debug, Clone)]
pub struct CapturedRun {
    /// Exit code; `None` when killed by a signal or the deadline
    pub exit_code: Option<i32>,

    /// stdout and stderr interleaved as they arrived
    pub output: String,

    pub duration: Duration,

    /// Deadline expired and the child was killed
    pub timed_out: bool,
}

impl CapturedRun {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `command` to completion, feeding `stdin` if given.
///
/// With a `limit`, the child is killed once it runs past it and the run is
/// reported with `timed_out` set. Output read before the kill is kept.
pub fn run_captured(
    mut command: Command,
    stdin: Option<&[u8]>,
    limit: Option<Duration>,
) -> io::Result<CapturedRun> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let start = Instant::now();
    let mut child = command.spawn()?;

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let readers = [
        drain(child.stdout.take(), Arc::clone(&buffer)),
        drain(child.stderr.take(), Arc::clone(&buffer)),
    ];

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        // A child that exits without reading stdin is not an error here
        if let Err(e) = pipe.write_all(input) {
            if e.kind() != io::ErrorKind::BrokenPipe {
                tracing::debug!(error = %e, "failed to write child stdin");
            }
        }
    }

    let deadline = limit.map(Deadline::new);
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Some(status);
        }
        if deadline.map(|d| d.check().is_timeout()).unwrap_or(false) {
            kill(&mut child);
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    // After a kill, grandchildren may still hold the pipes open; don't wait on
    // the readers in that case.
    if status.is_some() {
        for handle in readers.into_iter().flatten() {
            let _ = handle.join();
        }
    }

    let output = buffer
        .lock()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    Ok(CapturedRun {
        exit_code: status.and_then(|s| s.code()),
        output,
        duration: start.elapsed(),
        timed_out: status.is_none(),
    })
}

fn drain<R>(pipe: Option<R>, buffer: Arc<Mutex<Vec<u8>>>) -> Option<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(&chunk[..n]);
                    }
                }
            }
        }
    }))
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
