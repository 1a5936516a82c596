// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level configuration (component J): resolves the filesystem layout
//! the rest of the daemon needs before it can build a `Supervisor` — state
//! directory, logs directory, socket directory and the static instance
//! config document. Distinct from the instance config tree itself, which
//! `sv_adapters::FileConfigAdapter` owns.

use std::path::PathBuf;

use thiserror::Error;

use crate::env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve a state directory (set SV_STATE_DIR)")]
    NoStateDir,
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub sockets_dir: PathBuf,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = env::state_dir().ok_or(ConfigError::NoStateDir)?;
        let logs_dir = state_dir.join("logs");
        let sockets_dir = state_dir.join("sockets");
        let config_path = env::config_path(&state_dir);

        Ok(Self {
            state_dir,
            logs_dir,
            sockets_dir,
            config_path,
        })
    }

    /// Creates `logs_dir`, `logs_dir/instances` and `sockets_dir` with mode
    /// 0777 (umask applies), matching the filesystem layout contract.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        for dir in [
            &self.logs_dir,
            &self.logs_dir.join("instances"),
            &self.sockets_dir,
        ] {
            create_dir_all_0777(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

fn create_dir_all_0777(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    if path.is_dir() {
        return Ok(());
    }
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o777)
        .create(path)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
