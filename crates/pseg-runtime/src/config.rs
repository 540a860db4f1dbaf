//! Shuttle configuration.

use crate::error::{ShuttleError, ShuttleResult};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SERVER_BIN: &str = "rackup";
const DEFAULT_PID_FILE: &str = "segmenter_server.pid";
const DEFAULT_DELAY_BEFORE_TEST: Duration = Duration::from_millis(200);
const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_TEST_MAX_ATTEMPTS: u32 = 100;
const DEFAULT_TEST_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_READ_PID_MAX_ATTEMPTS: u32 = 100;
const DEFAULT_READ_PID_DELAY: Duration = Duration::from_millis(100);

/// Configuration for launching and supervising one segmenter server.
#[derive(Debug, Clone)]
pub struct ShuttleConfig {
    /// Host the server binds to and the probe connects to.
    pub host: String,
    /// Port the server listens on.
    pub port: u16,
    /// Rack application file handed to the server (`config.ru`).
    pub rack_config: PathBuf,
    /// Launcher binary, resolved through `PATH` by the shell.
    pub server_bin: String,
    /// Where the server is told to write its pid. Stored absolute so the
    /// value stays meaningful no matter what the subprocess does with its
    /// working directory.
    pub pid_file: PathBuf,
    /// Settle time between pid discovery and the first readiness probe.
    pub delay_before_test: Duration,
    /// Per-attempt probe timeout, connect through body read.
    pub test_timeout: Duration,
    /// Readiness probe attempt budget.
    pub test_max_attempts: u32,
    /// Pause between probe attempts.
    pub test_delay_between_attempts: Duration,
    /// Pid file poll budget.
    pub read_pid_max_attempts: u32,
    /// Pause between pid file polls.
    pub read_pid_delay_between_attempts: Duration,
}

impl ShuttleConfig {
    /// Create a configuration with the standard timings and the default
    /// `rackup` launcher.
    pub fn new(host: impl Into<String>, port: u16, rack_config: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port,
            rack_config: rack_config.into(),
            server_bin: DEFAULT_SERVER_BIN.to_string(),
            pid_file: absolutize(PathBuf::from(DEFAULT_PID_FILE)),
            delay_before_test: DEFAULT_DELAY_BEFORE_TEST,
            test_timeout: DEFAULT_TEST_TIMEOUT,
            test_max_attempts: DEFAULT_TEST_MAX_ATTEMPTS,
            test_delay_between_attempts: DEFAULT_TEST_DELAY,
            read_pid_max_attempts: DEFAULT_READ_PID_MAX_ATTEMPTS,
            read_pid_delay_between_attempts: DEFAULT_READ_PID_DELAY,
        }
    }

    /// Set the launcher binary (tests substitute shell stubs here).
    #[must_use]
    pub fn with_server_bin(mut self, server_bin: impl Into<String>) -> Self {
        self.server_bin = server_bin.into();
        self
    }

    /// Set the pid file location. Relative paths are resolved against the
    /// current working directory immediately.
    #[must_use]
    pub fn with_pid_file(mut self, pid_file: impl Into<PathBuf>) -> Self {
        self.pid_file = absolutize(pid_file.into());
        self
    }

    /// Set the settle time before the first readiness probe.
    #[must_use]
    pub const fn with_delay_before_test(mut self, delay: Duration) -> Self {
        self.delay_before_test = delay;
        self
    }

    /// Set the per-attempt probe timeout.
    #[must_use]
    pub const fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Set the readiness probe attempt budget.
    #[must_use]
    pub const fn with_test_max_attempts(mut self, attempts: u32) -> Self {
        self.test_max_attempts = attempts;
        self
    }

    /// Set the pause between probe attempts.
    #[must_use]
    pub const fn with_test_delay_between_attempts(mut self, delay: Duration) -> Self {
        self.test_delay_between_attempts = delay;
        self
    }

    /// Set the pid file poll budget.
    #[must_use]
    pub const fn with_read_pid_max_attempts(mut self, attempts: u32) -> Self {
        self.read_pid_max_attempts = attempts;
        self
    }

    /// Set the pause between pid file polls.
    #[must_use]
    pub const fn with_read_pid_delay_between_attempts(mut self, delay: Duration) -> Self {
        self.read_pid_delay_between_attempts = delay;
        self
    }

    /// Reject configurations that can never bring a server up.
    pub fn validate(&self) -> ShuttleResult<()> {
        if self.test_max_attempts == 0 {
            return Err(ShuttleError::InvalidConfig(
                "test_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.read_pid_max_attempts == 0 {
            return Err(ShuttleError::InvalidConfig(
                "read_pid_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.test_timeout.is_zero() {
            return Err(ShuttleError::InvalidConfig(
                "test_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Shell command line used to launch the server.
    ///
    /// Rendered as a single string and run through `sh -c` so the launcher
    /// resolves via `PATH` and shebang scripts work as launchers.
    pub fn command_line(&self) -> String {
        format!(
            "{} -p {} --host {} --pid \"{}\" \"{}\"",
            self.server_bin,
            self.port,
            self.host,
            self.pid_file.display(),
            self.rack_config.display()
        )
    }
}

/// Resolve against the current working directory. If the working directory
/// is unavailable the path is kept as given.
fn absolutize(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ShuttleConfig {
        ShuttleConfig::new("127.0.0.1", 5000, "config.ru")
    }

    #[test]
    fn defaults_match_the_server_invocation() {
        let config = config();
        assert_eq!(config.server_bin, "rackup");
        assert_eq!(config.delay_before_test, Duration::from_millis(200));
        assert_eq!(config.test_timeout, Duration::from_secs(2));
        assert_eq!(config.test_max_attempts, 100);
        assert_eq!(config.test_delay_between_attempts, Duration::from_millis(100));
        assert_eq!(config.read_pid_max_attempts, 100);
        assert_eq!(
            config.read_pid_delay_between_attempts,
            Duration::from_millis(100)
        );
    }

    #[test]
    fn pid_file_is_absolute() {
        assert!(config().pid_file.is_absolute());
        assert!(
            config()
                .with_pid_file("relative.pid")
                .pid_file
                .is_absolute()
        );
    }

    #[test]
    fn builders_override_defaults() {
        let config = config()
            .with_server_bin("/tmp/fake_server.sh")
            .with_test_max_attempts(3)
            .with_test_delay_between_attempts(Duration::from_millis(10))
            .with_read_pid_max_attempts(2)
            .with_read_pid_delay_between_attempts(Duration::from_millis(5))
            .with_delay_before_test(Duration::ZERO)
            .with_test_timeout(Duration::from_millis(250));

        assert_eq!(config.server_bin, "/tmp/fake_server.sh");
        assert_eq!(config.test_max_attempts, 3);
        assert_eq!(config.read_pid_max_attempts, 2);
        assert_eq!(config.delay_before_test, Duration::ZERO);
        assert_eq!(config.test_timeout, Duration::from_millis(250));
    }

    #[test]
    fn command_line_matches_rackup_invocation() {
        let config = config().with_pid_file("/tmp/seg.pid");
        assert_eq!(
            config.command_line(),
            "rackup -p 5000 --host 127.0.0.1 --pid \"/tmp/seg.pid\" \"config.ru\""
        );
    }

    #[test]
    fn validate_rejects_zero_budgets() {
        assert!(config().validate().is_ok());
        assert!(config().with_test_max_attempts(0).validate().is_err());
        assert!(config().with_read_pid_max_attempts(0).validate().is_err());
        assert!(config().with_test_timeout(Duration::ZERO).validate().is_err());
    }
}
