//! Pid file helpers for the launched server.
//!
//! The server publishes its real pid by writing it to a file. The shell
//! wrapper pid the shuttle holds is not trustworthy for targeting the
//! server, because the launcher can fork away from the wrapper; the file is
//! the single source of truth.

use std::io;
use std::path::Path;

/// Delete a leftover pid file from an earlier run (idempotent, no error if
/// missing).
pub async fn remove_stale(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Read the server pid from `path`.
///
/// Returns `None` while the file is missing, unreadable, or not yet a
/// parsable pid. A half-written file looks the same as a missing one, so
/// pollers just keep waiting.
pub async fn read(path: &Path) -> Option<u32> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    content.trim().parse().ok()
}

/// Check if a pid exists (without verifying which program it runs).
///
/// Uses `kill` with the null signal, which checks existence without
/// delivering anything.
#[cfg(unix)]
pub fn pid_exists(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal;
    use nix::unistd::Pid;

    match signal::kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false, // no such process
        Err(_) => true,             // process exists but we lack permission
    }
}

#[cfg(not(unix))]
pub fn pid_exists(_pid: u32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn read_parses_a_plain_pid() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("seg.pid");
        tokio::fs::write(&path, "12345\n").await.expect("write");

        assert_eq!(read(&path).await, Some(12345));
    }

    #[tokio::test]
    async fn read_tolerates_surrounding_whitespace() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("seg.pid");
        tokio::fs::write(&path, "  678  \n\n").await.expect("write");

        assert_eq!(read(&path).await, Some(678));
    }

    #[tokio::test]
    async fn read_treats_garbage_as_not_ready() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("seg.pid");
        tokio::fs::write(&path, "not-a-pid").await.expect("write");

        assert_eq!(read(&path).await, None);
    }

    #[tokio::test]
    async fn read_treats_missing_file_as_not_ready() {
        let dir = tempdir().expect("tempdir");
        assert_eq!(read(&dir.path().join("absent.pid")).await, None);
    }

    #[tokio::test]
    async fn remove_stale_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("seg.pid");
        tokio::fs::write(&path, "1\n").await.expect("write");

        remove_stale(&path).await.expect("first removal");
        assert!(!path.exists());
        remove_stale(&path).await.expect("second removal");
    }

    #[test]
    #[cfg(unix)]
    fn pid_exists_for_self() {
        assert!(pid_exists(std::process::id()));
    }

    #[test]
    #[cfg(unix)]
    fn pid_exists_false_for_impossible_pid() {
        assert!(!pid_exists(999_999));
    }
}
