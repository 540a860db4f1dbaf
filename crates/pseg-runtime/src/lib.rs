//! Process lifecycle management for the pragmatic_segmenter server.
//!
//! The segmenter is an external Rack application served by `rackup`; this
//! crate launches it, discovers its real pid through a pid file, probes the
//! segment endpoint until it answers, re-logs the subprocess output, detects
//! unexpected exits, and force-kills everything on stop.
//!
//! [`ServerShuttle`] is the entry point; the remaining modules are its
//! building blocks and are public for reuse and testing.

pub mod config;
pub mod error;
pub mod latch;
pub mod monitor;
pub mod pidfile;
pub mod probe;
pub mod shutdown;
pub mod shuttle;

pub use config::ShuttleConfig;
pub use error::{ShuttleError, ShuttleResult};
pub use latch::StatusLatch;
pub use probe::ReadinessProbe;
pub use shuttle::ServerShuttle;
