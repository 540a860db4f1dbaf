//! Cancellable output-stream monitor (non-UTF8-safe).
//!
//! The launched server can emit arbitrary bytes on stdout/stderr. Using
//! `BufReader::lines()` would terminate the drain task on the first invalid
//! UTF-8 sequence, so lines are read as bytes and decoded lossily. Every
//! line is re-logged at debug level under the supervised stream's name.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Spawn a task draining `stream` line by line.
///
/// The task ends on EOF (the normal ending: the process closed its end), on
/// a read error, or when `cancel` fires during shutdown.
pub fn spawn_line_monitor(
    stream: impl AsyncRead + Unpin + Send + 'static,
    stream_name: &'static str,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(stream = %stream_name, "output monitor cancelled");
                    break;
                }
                read = reader.read_until(b'\n', &mut buf) => match read {
                    Ok(0) => {
                        debug!(stream = %stream_name, "output monitor reached end of stream");
                        break;
                    }
                    Ok(_) => {
                        // Trim trailing newline(s)
                        if buf.last() == Some(&b'\n') {
                            buf.pop();
                            if buf.last() == Some(&b'\r') {
                                buf.pop();
                            }
                        }
                        let line = String::from_utf8_lossy(&buf);
                        debug!(stream = %stream_name, "{}", line);
                    }
                    Err(e) => {
                        debug!(stream = %stream_name, error = %e, "output monitor exiting due to read error");
                        break;
                    }
                },
            }
        }
    })
}
