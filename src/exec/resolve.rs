// src/exec/resolve.rs

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{KapoError, Result};

/// Resolve `command` to an executable file.
///
/// A command containing a path separator is checked as given; a bare name
/// is searched for in each `PATH` entry in order.
pub fn resolve_executable(command: &str) -> Result<PathBuf> {
    if command.trim().is_empty() {
        return Err(KapoError::launch(command, "empty command"));
    }

    if has_separator(command) {
        let path = PathBuf::from(command);
        return check_executable(&path).map(|()| path);
    }

    let search_path = env::var_os("PATH").unwrap_or_default();
    env::split_paths(&search_path)
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| KapoError::launch(command, "executable file not found in $PATH"))
}

fn has_separator(command: &str) -> bool {
    command.contains('/') || command.contains(std::path::MAIN_SEPARATOR)
}

fn check_executable(path: &Path) -> Result<()> {
    let command = path.display().to_string();
    let meta = fs::metadata(path).map_err(|e| KapoError::launch(&command, e.to_string()))?;

    if !meta.is_file() {
        return Err(KapoError::launch(command, "not a regular file"));
    }
    if !has_exec_bit(&meta) {
        return Err(KapoError::launch(command, "permission denied (not executable)"));
    }
    Ok(())
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && has_exec_bit(&meta))
        .unwrap_or(false)
}

#[cfg(unix)]
fn has_exec_bit(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_bit(_meta: &fs::Metadata) -> bool {
    true
}
