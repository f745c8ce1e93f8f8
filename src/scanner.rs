//! Barcode scan sessions
//!
//! Hardware barcode scanners act as keyboards: each scan arrives as a line of
//! digits. A session reads lines from any async source on a background task
//! and hands out decoded barcodes or per-line failures until it is stopped or
//! the source ends.

use std::io;
use std::path::Path;

use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::food_api;

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Decoded(String),
    Failure(ScanFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFailure {
    /// The source cannot be read at all. Fatal for the session.
    PermissionDenied(String),
    /// A single unreadable scan; later scans may succeed
    Transient(String),
}

impl std::fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanFailure::PermissionDenied(msg) => write!(f, "permission denied: {msg}"),
            ScanFailure::Transient(msg) => write!(f, "scan failed: {msg}"),
        }
    }
}

pub struct ScanSession {
    events: mpsc::Receiver<ScanEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ScanSession {
    /// Start reading scans from `reader`
    pub fn start<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(read_scans(reader, tx, cancel.clone()));

        Self {
            events,
            cancel,
            task,
        }
    }

    /// Start a session on stdin
    pub fn from_stdin() -> Self {
        Self::start(BufReader::new(tokio::io::stdin()))
    }

    /// Start a session on a scanner device or capture file
    pub async fn from_device(path: &Path) -> Result<Self, ScanFailure> {
        match tokio::fs::File::open(path).await {
            Ok(file) => Ok(Self::start(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(
                ScanFailure::PermissionDenied(format!("{}: {e}", path.display())),
            ),
            Err(e) => Err(ScanFailure::Transient(format!("{}: {e}", path.display()))),
        }
    }

    /// Wait for the next scan. `None` once the session is over.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    /// Stop reading and wait for the background task to finish
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("Scan task ended abnormally: {e}");
        }
    }
}

async fn read_scans<R>(reader: R, tx: mpsc::Sender<ScanEvent>, cancel: CancellationToken)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };

        let (event, fatal) = match line {
            Ok(Some(line)) => match classify(&line) {
                Some(event) => (event, false),
                None => continue,
            },
            Ok(None) => break,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                (ScanEvent::Failure(ScanFailure::PermissionDenied(e.to_string())), true)
            }
            Err(e) => (ScanEvent::Failure(ScanFailure::Transient(e.to_string())), true),
        };

        if let ScanEvent::Failure(failure) = &event {
            debug!("{failure}");
        }
        if tx.send(event).await.is_err() || fatal {
            break;
        }
    }
}

/// Turn one scanned line into an event; blank lines yield nothing
fn classify(line: &str) -> Option<ScanEvent> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }

    Some(if food_api::is_valid_barcode(text) {
        ScanEvent::Decoded(text.to_string())
    } else {
        ScanEvent::Failure(ScanFailure::Transient(format!("unreadable barcode '{text}'")))
    })
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};

    use super::*;

    struct DeniedReader;

    impl AsyncRead for DeniedReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::from(io::ErrorKind::PermissionDenied)))
        }
    }

    async fn collect(mut session: ScanSession) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Some(event) = session.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn decodes_lines_and_skips_blanks() {
        let input: &'static [u8] = b"5449000000996\n\n  3017620422003 \r\n";
        let events = collect(ScanSession::start(BufReader::new(input))).await;

        assert_eq!(
            events,
            vec![
                ScanEvent::Decoded("5449000000996".to_string()),
                ScanEvent::Decoded("3017620422003".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn garbage_is_transient_and_scanning_continues() {
        let input: &'static [u8] = b"hello\n123\n96385074\n";
        let events = collect(ScanSession::start(BufReader::new(input))).await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ScanEvent::Failure(ScanFailure::Transient(_))));
        assert!(matches!(events[1], ScanEvent::Failure(ScanFailure::Transient(_))));
        assert_eq!(events[2], ScanEvent::Decoded("96385074".to_string()));
    }

    #[tokio::test]
    async fn permission_denied_ends_the_session() {
        let events = collect(ScanSession::start(BufReader::new(DeniedReader))).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ScanEvent::Failure(ScanFailure::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn stop_cancels_a_pending_read() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut session = ScanSession::start(BufReader::new(reader));

        writer.write_all(b"5449000000996\n").await.unwrap();
        assert_eq!(
            session.next_event().await,
            Some(ScanEvent::Decoded("5449000000996".to_string()))
        );

        // writer stays open, so the reader would wait forever without stop
        session.stop().await;
        drop(writer);
    }

    #[tokio::test]
    async fn missing_device_is_not_a_permission_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ScanSession::from_device(&dir.path().join("no-such-scanner")).await;
        assert!(matches!(result, Err(ScanFailure::Transient(_))));
    }
}
