//! Synchronous execution of platform mixer commands
//!
//! Every driver operation that reaches the OS audio subsystem goes through
//! [`run`]. The call blocks until the command exits; there is no timeout.

use crate::MixerError;
use std::process::{Command, Stdio};

/// Stderr shorter than this is treated as noise and not logged.
const STDERR_NOISE_LEN: usize = 2;

/// Run a command synchronously and return its decoded standard output.
///
/// A failed spawn is an error; anything the command itself complains about
/// (non-empty stderr, non-zero exit) is logged at warn level and the captured
/// stdout is still returned, so callers decide via parsing whether the
/// invocation was useful.
pub fn run(program: &str, args: &[&str]) -> Result<String, MixerError> {
    tracing::debug!("exec: {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().len() > STDERR_NOISE_LEN {
        tracing::warn!("{}: {}", program, stderr.trim());
    }
    if !output.status.success() {
        tracing::warn!("{} exited with {}", program, output.status);
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
