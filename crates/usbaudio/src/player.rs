//! External player handoff
//!
//! Once the input source is known, the process is replaced by a player
//! (VLC by default) capturing `pulse://<index>`.

use common::Error;
use std::os::unix::process::CommandExt;
use std::process::Command;
use tracing::info;

/// Environment variable overriding the player executable
pub const PLAYER_ENV: &str = "VLC";

/// Locator of a PulseAudio source understood by the player
pub fn source_url(source_index: u32) -> String {
    format!("pulse://{}", source_index)
}

/// Player invocation for one input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub live_caching_ms: u32,
    pub source_index: u32,
}

impl PlayerCommand {
    pub fn new(program: String, live_caching_ms: u32, source_index: u32) -> Self {
        Self {
            program,
            live_caching_ms,
            source_index,
        }
    }

    /// Pick the executable: `override_program` if set and non-empty, else the configured one
    pub fn resolve_program(override_program: Option<String>, configured: &str) -> String {
        override_program
            .filter(|program| !program.is_empty())
            .unwrap_or_else(|| shellexpand::tilde(configured).into_owned())
    }

    /// Arguments after the program name
    pub fn args(&self) -> Vec<String> {
        vec![
            "-Idummy".to_string(),
            format!("--live-caching={}", self.live_caching_ms),
            "--play-and-exit".to_string(),
            source_url(self.source_index),
        ]
    }

    /// Replace the current process with the player
    ///
    /// Only returns if the player could not be started.
    pub fn exec(self) -> Error {
        info!("Playing {}", source_url(self.source_index));
        let err = Command::new(&self.program).args(self.args()).exec();
        Error::Io(std::io::Error::new(
            err.kind(),
            format!("Could not start {}: {}", self.program, err),
        ))
    }
}
