//! Force-kill helpers for the launched server.
//!
//! The segmenter server is stateless, so teardown is a straight SIGKILL
//! with no graceful phase. A pid that is already gone counts as success:
//! the goal is "not running", not "we delivered a signal".

use anyhow::Result;

/// Send SIGKILL to `pid`. Already-exited processes are fine (ESRCH maps to
/// `Ok`); the caller cannot reap, so zombies are the owner's problem.
#[cfg(unix)]
pub fn kill_pid(pid: u32) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    match signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Ok(()), // already gone
        Err(e) => Err(anyhow::anyhow!("failed to SIGKILL pid {pid}: {e}")),
    }
}

#[cfg(not(unix))]
pub fn kill_pid(_pid: u32) -> Result<()> {
    anyhow::bail!("force-killing by pid is not supported on this platform")
}
