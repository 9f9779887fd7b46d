//! Filesystem sentinel files: the out-of-process UI's control plane for the
//! worker (§4.E, §6). Presence checks are polled, not watched — intentional,
//! to avoid a cross-platform filesystem-notification dependency (§5).

use std::path::{Path, PathBuf};

pub const PAUSE_SENTINEL: &str = "signal_pause_capture";
pub const RELOAD_SENTINEL: &str = "reload_frequency";

pub struct Sentinels {
    pub pause_file: PathBuf,
    pub reload_file: PathBuf,
}

impl Sentinels {
    pub fn new(dir: &Path) -> Self {
        Sentinels {
            pause_file: dir.join(PAUSE_SENTINEL),
            reload_file: dir.join(RELOAD_SENTINEL),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_file.exists()
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_file.exists()
    }

    /// Consume the reload request. Missing file is not an error — another
    /// cycle may have already removed it.
    pub fn clear_reload(&self) {
        let _ = std::fs::remove_file(&self.reload_file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_presence_and_absence() {
        let dir = tempfile::tempdir().unwrap();
        let sentinels = Sentinels::new(dir.path());
        assert!(!sentinels.is_paused());
        std::fs::write(&sentinels.pause_file, b"").unwrap();
        assert!(sentinels.is_paused());
    }

    #[test]
    fn clear_reload_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let sentinels = Sentinels::new(dir.path());
        std::fs::write(&sentinels.reload_file, b"").unwrap();
        assert!(sentinels.reload_requested());
        sentinels.clear_reload();
        assert!(!sentinels.reload_requested());
        sentinels.clear_reload();
    }
}
