//! Blocking probes shared by several blocks: sysfs reads and one-shot
//! commands. Callers run these from `update()`, off the async threads.

use std::fs;
use std::path::Path;
use std::process::Command;

use chrono::Timelike;

use crate::error::{io_err, BlockError};

pub fn read_trimmed(path: &Path) -> Result<String, BlockError> {
    fs::read_to_string(path)
        .map(|raw| raw.trim().to_string())
        .map_err(|e| io_err(path, e))
}

pub fn read_int(path: &Path) -> Result<i64, BlockError> {
    let raw = read_trimmed(path)?;
    raw.parse().map_err(|_| BlockError::Parse {
        what: "integer",
        input: raw,
    })
}

/// Run a command to completion and return its stdout. A non-zero exit is
/// an error.
pub fn run_command(program: &str, args: &[&str]) -> Result<String, BlockError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|err| BlockError::Command {
            program: program.to_string(),
            reason: err.to_string(),
        })?;

    if !output.status.success() {
        return Err(BlockError::Command {
            program: program.to_string(),
            reason: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Same as [`run_command`] but only reports whether the command succeeded.
pub fn command_succeeds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

pub fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning!",
        12..=16 => "Good afternoon!",
        _ => "Good evening!",
    }
}

pub fn greeting() -> &'static str {
    greeting_for_hour(chrono::Local::now().hour())
}

/// `min(percent * len / 100, len - 1)`, for picking a glyph out of a
/// level table.
pub fn level_index(percent: u32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (percent as usize * len / 100).min(len - 1)
}
