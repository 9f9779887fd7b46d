//! The opaque `capture() -> png_path | error` boundary (§1 non-goal: screen
//! capture itself is out of scope). This module exists only so the worker
//! loop (§4.E) has something concrete to call; it is a thin wrapper over the
//! `screenshots` crate, not a feature of the system this crate specifies.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{Error, Result};

/// Capture the primary display and save it as `screenshot_YYYYMMDD-HHMMSS.png`
/// under `dir` (§6 filesystem layout). Returns the path on success.
pub fn capture(dir: &Path) -> Result<PathBuf> {
    let screens = screenshots::Screen::all().map_err(|e| Error::Capture(e.to_string()))?;
    let screen = screens
        .into_iter()
        .next()
        .ok_or_else(|| Error::Capture("no display found".to_string()))?;
    let image = screen.capture().map_err(|e| Error::Capture(e.to_string()))?;

    let filename = format!("screenshot_{}.png", Local::now().format("%Y%m%d-%H%M%S"));
    let path = dir.join(filename);
    image
        .save(&path)
        .map_err(|e| Error::Capture(format!("failed to write {}: {e}", path.display())))?;
    Ok(path)
}
