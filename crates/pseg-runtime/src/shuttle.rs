//! Supervisor for the external segmenter server process.
//!
//! [`ServerShuttle`] launches the server through a shell, discovers the real
//! server pid from the pid file (the launcher may fork away from the shell
//! wrapper), probes the segment endpoint until it answers, and watches for
//! the wrapper dying behind our back. [`stop`](ServerShuttle::stop)
//! force-kills both the server and the wrapper and can be called at any
//! time, any number of times.
//!
//! One shuttle handles one run. After a failed or stopped run, build a new
//! shuttle to retry; the internal latches resolve once and stay resolved.

use crate::config::ShuttleConfig;
use crate::error::{ShuttleError, ShuttleResult};
use crate::latch::StatusLatch;
use crate::monitor::spawn_line_monitor;
use crate::pidfile;
use crate::probe::ReadinessProbe;
use crate::shutdown::kill_pid;
use pseg_core::segment_url;
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Orchestrates one launch-probe-serve-kill cycle of the segmenter server.
pub struct ServerShuttle {
    inner: Arc<Inner>,
}

struct Inner {
    config: ShuttleConfig,
    segment_url: String,
    state: Mutex<ProcessState>,
    pid_latch: StatusLatch,
    ready_latch: StatusLatch,
    /// Cancelled by `stop`; parks the run task at its next suspension point.
    cancel: CancellationToken,
    /// Cancelled by the crash watcher when the wrapper exits on its own.
    fatal: CancellationToken,
    /// Cancelled by `stop`; ends both output monitors.
    monitor_cancel: CancellationToken,
}

#[derive(Default)]
struct ProcessState {
    /// Shell wrapper handle, held until the crash watcher takes it over.
    child: Option<Child>,
    wrapper_pid: Option<u32>,
    server_pid: Option<u32>,
}

impl ServerShuttle {
    pub fn new(config: ShuttleConfig) -> Self {
        let segment_url = segment_url(&config.host, config.port);
        Self {
            inner: Arc::new(Inner {
                config,
                segment_url,
                state: Mutex::new(ProcessState::default()),
                pid_latch: StatusLatch::new(),
                ready_latch: StatusLatch::new(),
                cancel: CancellationToken::new(),
                fatal: CancellationToken::new(),
                monitor_cancel: CancellationToken::new(),
            }),
        }
    }

    /// Launch the server and block until it is verified serving.
    ///
    /// Launch failures surface immediately; pid discovery and readiness
    /// run in the background and are awaited through the phase latches.
    ///
    /// # Errors
    ///
    /// [`ShuttleError::InvalidConfig`] for unusable budgets,
    /// [`ShuttleError::Launch`] if the process cannot be spawned (or this
    /// shuttle already ran), [`ShuttleError::PidRetrieval`] if the pid file
    /// never appears, [`ShuttleError::ReadinessFailed`] if the probe budget
    /// runs out. On error the caller should still `stop` the shuttle.
    pub async fn start(&self) -> ShuttleResult<()> {
        self.inner.config.validate()?;

        {
            let mut state = self.inner.state.lock().await;
            if state.child.is_some() || state.wrapper_pid.is_some() {
                return Err(ShuttleError::Launch(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "shuttle already started",
                )));
            }
            if self.inner.cancel.is_cancelled() {
                return Err(ShuttleError::Launch(io::Error::other(
                    "shuttle already stopped",
                )));
            }

            pidfile::remove_stale(&self.inner.config.pid_file).await?;

            let command_line = self.inner.config.command_line();
            info!(command = %command_line, "launching segmenter server");

            let mut child = Command::new("sh")
                .arg("-c")
                .arg(&command_line)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()?;

            let wrapper_pid = child.id();
            debug!(wrapper_pid, "segmenter wrapper spawned");

            if let Some(stdout) = child.stdout.take() {
                spawn_line_monitor(stdout, "stdout", self.inner.monitor_cancel.clone());
            }
            if let Some(stderr) = child.stderr.take() {
                spawn_line_monitor(stderr, "stderr", self.inner.monitor_cancel.clone());
            }

            state.child = Some(child);
            state.wrapper_pid = wrapper_pid;
        }

        let runner = Arc::clone(&self.inner);
        tokio::spawn(async move { runner.run().await });

        if !self.inner.pid_latch.wait().await {
            return Err(ShuttleError::PidRetrieval {
                attempts: self.inner.config.read_pid_max_attempts,
            });
        }
        if !self.inner.ready_latch.wait().await {
            return Err(ShuttleError::ReadinessFailed {
                attempts: self.inner.config.test_max_attempts,
            });
        }
        Ok(())
    }

    /// Force-kill everything this shuttle launched.
    ///
    /// Never fails, safe to call at any time, and a second call is a no-op.
    /// Also the cleanup path the crash watcher runs, so an unexpected exit
    /// reclaims resources without caller involvement.
    pub async fn stop(&self) {
        self.inner.stop().await;
    }

    /// Pid read from the pid file, while this run holds one. Cleared by
    /// `stop`.
    pub async fn server_pid(&self) -> Option<u32> {
        self.inner.state.lock().await.server_pid
    }

    /// Token cancelled when the wrapper exits without `stop` being asked.
    /// Await its `cancelled()` to react to crashes.
    pub fn fatal_signal(&self) -> CancellationToken {
        self.inner.fatal.clone()
    }
}

impl Drop for ServerShuttle {
    fn drop(&mut self) {
        // Best effort: a dropped shuttle should not leave the server
        // running. `stop` is the real teardown; this only narrows the
        // orphan window and cannot reap.
        if let Ok(state) = self.inner.state.try_lock() {
            if let Some(pid) = state.server_pid {
                let _ = kill_pid(pid);
            }
            if let Some(pid) = state.wrapper_pid {
                let _ = kill_pid(pid);
            }
        }
    }
}

impl Inner {
    /// Background phases of `start`: pid discovery, crash watcher handoff,
    /// settle delay, readiness probing. Publishes outcomes through the
    /// latches; `cancel` aborts at every suspension point, resolving the
    /// pending latch to `false` so no `start` caller is left hanging.
    async fn run(self: Arc<Self>) {
        let pid = tokio::select! {
            () = self.cancel.cancelled() => {
                self.pid_latch.resolve(false);
                return;
            }
            pid = self.poll_pid_file() => pid,
        };

        let Some(pid) = pid else {
            error!(
                attempts = self.config.read_pid_max_attempts,
                pid_file = %self.config.pid_file.display(),
                "segmenter server never published its pid"
            );
            self.pid_latch.resolve(false);
            return;
        };

        {
            // Checked under the lock: stop cancels before it sweeps the
            // state, so a pid recorded here is guaranteed to be seen by it.
            let mut state = self.state.lock().await;
            if self.cancel.is_cancelled() {
                drop(state);
                // Stop's sweep may already be over and will not revisit
                // this pid; the server it names still has to die.
                debug!(pid, "killing segmenter server discovered during stop");
                if let Err(e) = kill_pid(pid) {
                    warn!(pid, error = %e, "failed to kill segmenter server");
                }
                self.pid_latch.resolve(false);
                return;
            }
            state.server_pid = Some(pid);
        }

        info!(pid, "segmenter server pid read from pid file");
        self.pid_latch.resolve(true);

        // From here the wrapper handle belongs to the crash watcher.
        let child = self.state.lock().await.child.take();
        if let Some(child) = child {
            let watcher = Arc::clone(&self);
            tokio::spawn(async move { watcher.watch_wrapper(child).await });
        }

        tokio::select! {
            () = self.cancel.cancelled() => {
                self.ready_latch.resolve(false);
                return;
            }
            () = sleep(self.config.delay_before_test) => {}
        }

        let probe = ReadinessProbe::new(self.segment_url.clone(), &self.config);
        tokio::select! {
            () = self.cancel.cancelled() => {
                self.ready_latch.resolve(false);
            }
            outcome = probe.wait_until_ready() => match outcome {
                Ok(attempts) => {
                    info!(attempts, "segmenter server is ready");
                    self.ready_latch.resolve(true);
                }
                Err(e) => {
                    error!("segmenter readiness testing gave up: {e:#}");
                    self.ready_latch.resolve(false);
                }
            },
        }
    }

    /// Poll the pid file on the configured budget. `None` means the budget
    /// ran out.
    async fn poll_pid_file(&self) -> Option<u32> {
        for attempt in 1..=self.config.read_pid_max_attempts {
            if let Some(pid) = pidfile::read(&self.config.pid_file).await {
                return Some(pid);
            }
            debug!(attempt, "pid file not readable yet");
            if attempt < self.config.read_pid_max_attempts {
                sleep(self.config.read_pid_delay_between_attempts).await;
            }
        }
        None
    }

    /// Wait for the wrapper to exit. An exit nobody asked for is a crash:
    /// flag it and reclaim whatever is still running.
    async fn watch_wrapper(self: Arc<Self>, mut child: Child) {
        let outcome = child.wait().await;

        if self.cancel.is_cancelled() {
            // Expected: stop signalled the wrapper and we only reaped it.
            match outcome {
                Ok(status) => debug!(%status, "segmenter wrapper exited after stop"),
                Err(e) => debug!(error = %e, "segmenter wrapper wait failed after stop"),
            }
            return;
        }

        match outcome {
            Ok(status) => warn!(%status, "segmenter server exited unexpectedly"),
            Err(e) => warn!(error = %e, "lost track of the segmenter wrapper"),
        }

        // The wrapper is reaped at this point; drop its pid so the cleanup
        // below cannot signal a recycled pid.
        self.state.lock().await.wrapper_pid = None;
        self.fatal.cancel();
        self.stop().await;
    }

    async fn stop(&self) {
        self.cancel.cancel();
        self.monitor_cancel.cancel();

        let mut state = self.state.lock().await;

        if let Some(pid) = state.server_pid.take() {
            debug!(pid, "killing segmenter server");
            if let Err(e) = kill_pid(pid) {
                warn!(pid, error = %e, "failed to kill segmenter server");
            }
        }

        if let Some(mut child) = state.child.take() {
            // The crash watcher never took the handle, so reaping is on us.
            state.wrapper_pid = None;
            match child.try_wait() {
                Ok(Some(status)) => debug!(%status, "segmenter wrapper already exited"),
                _ => {
                    debug!("killing segmenter wrapper");
                    if let Err(e) = child.start_kill() {
                        debug!(error = %e, "segmenter wrapper kill failed");
                    }
                    if let Err(e) = child.wait().await {
                        warn!(error = %e, "failed to reap segmenter wrapper");
                    }
                }
            }
        } else if let Some(pid) = state.wrapper_pid.take() {
            // The watcher owns the handle; signal by pid and let it reap.
            debug!(pid, "killing segmenter wrapper");
            if let Err(e) = kill_pid(pid) {
                warn!(pid, error = %e, "failed to kill segmenter wrapper");
            }
        }
    }
}
