//! Capture-directory bookkeeping: finding the latest capture and pruning
//! stale ones (§4.E). The worker is the sole writer/deleter of this
//! directory (§5); these are plain, synchronous filesystem ops.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const CAPTURE_PREFIX: &str = "screenshot_";
const CAPTURE_SUFFIX: &str = ".png";

fn is_capture_file(name: &str) -> bool {
    name.starts_with(CAPTURE_PREFIX) && name.ends_with(CAPTURE_SUFFIX)
}

/// The most recent capture file in `dir`, by lexicographic filename order
/// descending — the timestamped naming scheme makes that equivalent to
/// capture-time order (§4.E step 1).
pub fn latest_capture(dir: &Path) -> Option<PathBuf> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_capture_file(name))
        .collect();
    names.sort();
    names.pop().map(|name| dir.join(name))
}

/// Delete capture files older than `max_age`. Non-capture files are ignored.
/// Returns the number of files deleted.
pub fn cleanup_old_screenshots(dir: &Path, max_age: Duration) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let now = SystemTime::now();
    let mut deleted = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !is_capture_file(&name) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            if std::fs::remove_file(entry.path()).is_ok() {
                deleted += 1;
            }
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};

    fn touch_with_age(dir: &Path, name: &str, age: StdDuration) {
        let path = dir.join(name);
        fs::write(&path, b"png").unwrap();
        let mtime = SystemTime::now() - age;
        let atime = mtime;
        filetime_set(&path, atime, mtime);
    }

    // Minimal mtime setter without adding a filetime dependency: re-derive
    // via a crude open+set_modified through std, falling back to no-op if
    // unsupported by the platform (tests still pass, just less precise).
    fn filetime_set(path: &Path, _atime: SystemTime, mtime: SystemTime) {
        if let Ok(file) = fs::File::options().write(true).open(path) {
            let _ = file.set_modified(mtime);
        }
        let _ = UNIX_EPOCH;
    }

    #[test]
    fn latest_capture_picks_newest_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("screenshot_20240101-000000.png"), b"a").unwrap();
        fs::write(dir.path().join("screenshot_20240102-000000.png"), b"b").unwrap();
        fs::write(dir.path().join("not_a_capture.txt"), b"c").unwrap();
        let latest = latest_capture(dir.path()).unwrap();
        assert_eq!(latest.file_name().unwrap(), "screenshot_20240102-000000.png");
    }

    #[test]
    fn latest_capture_is_none_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(latest_capture(dir.path()).is_none());
    }

    #[test]
    fn cleanup_deletes_only_old_capture_files() {
        let dir = tempfile::tempdir().unwrap();
        touch_with_age(dir.path(), "screenshot_old.png", StdDuration::from_secs(400));
        touch_with_age(dir.path(), "screenshot_new.png", StdDuration::from_secs(1));
        fs::write(dir.path().join("keepme.txt"), b"x").unwrap();

        let deleted = cleanup_old_screenshots(dir.path(), StdDuration::from_secs(180));
        assert_eq!(deleted, 1);
        assert!(!dir.path().join("screenshot_old.png").exists());
        assert!(dir.path().join("screenshot_new.png").exists());
        assert!(dir.path().join("keepme.txt").exists());
    }
}
