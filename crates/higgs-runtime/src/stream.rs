//! Worker output readers.
//!
//! PyTorch and the CUDA libraries the worker loads do not always write valid
//! UTF-8, and `BufReader::lines()` gives up on the first bad byte. Lines are
//! read as raw bytes and decoded lossily instead. The stdout reader can also
//! watch for the readiness marker.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Which stream a reader is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }

    fn log(self, line: &str) {
        match self {
            Self::Stdout => debug!(stream = self.as_str(), "worker: {line}"),
            Self::Stderr => warn!(stream = self.as_str(), "worker: {line}"),
        }
    }
}

/// Fires once when a line containing `needle` is read.
pub struct MarkerWatch {
    pub needle: &'static str,
    pub found: oneshot::Sender<()>,
}

impl MarkerWatch {
    /// Consume the watch if `line` carries the marker.
    fn check(slot: &mut Option<Self>, line: &str) {
        if slot.as_ref().is_some_and(|m| line.contains(m.needle)) {
            if let Some(watch) = slot.take() {
                let _ = watch.found.send(());
            }
        }
    }
}

fn strip_line_ending(line: &mut Vec<u8>) {
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
}

/// Forward every line of `stream` to the log until EOF.
///
/// Dropping the marker sender at EOF tells the waiter the marker never came.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: StreamKind,
    mut marker: Option<MarkerWatch>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::with_capacity(1024);

        let end = loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break None,
                Ok(_) => {
                    strip_line_ending(&mut raw);
                    let line = String::from_utf8_lossy(&raw);
                    kind.log(&line);
                    MarkerWatch::check(&mut marker, &line);
                }
                Err(e) => break Some(e),
            }
        };

        match end {
            Some(e) => debug!(stream = kind.as_str(), error = %e, "Worker stream closed with error"),
            None => debug!(stream = kind.as_str(), "Worker stream closed"),
        }
    });
}
