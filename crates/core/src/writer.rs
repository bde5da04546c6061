//! Dump persistence: open, write, report.
//!
//! Failures are reported on stderr and swallowed. The capture state machine
//! never sees them: a frame whose write failed still counts as done, and
//! nothing is retried.

use std::path::Path;

/// Write a finished dump to disk. Returns whether the write succeeded, for
/// callers that care; the ripper itself only logs the outcome.
pub fn write_dump(path: &Path, data: &[u8]) -> bool {
    match std::fs::write(path, data) {
        Ok(()) => {
            println!("melonrip: ripped frame to {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("melonrip: i/o error writing {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_back() {
        let dir = std::env::temp_dir().join(format!("melonrip-writer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("t.dump");
        assert!(write_dump(&path, b"melon ripper v2"));
        assert_eq!(std::fs::read(&path).unwrap(), b"melon ripper v2");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_failure_is_reported_not_fatal() {
        let path = std::env::temp_dir()
            .join("melonrip-no-such-dir")
            .join("missing")
            .join("t.dump");
        assert!(!write_dump(&path, b"x"));
    }
}
