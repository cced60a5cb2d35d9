use bytes::Bytes;
use futures_util::{Stream, StreamExt as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Receives upload percentages in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Progress of a single upload attempt.
///
/// Percentages only ever go up. While bytes are being handed to the transport
/// the value is capped at 99; 100 is reported by [`UploadProgress::finish`]
/// once the server has accepted the file.
pub struct UploadProgress {
    total: u64,
    sent: AtomicU64,
    last: AtomicU8,
    callback: ProgressFn,
}

impl UploadProgress {
    pub fn new(total: u64, callback: ProgressFn) -> Self {
        Self {
            total,
            sent: AtomicU64::new(0),
            last: AtomicU8::new(0),
            callback,
        }
    }

    pub fn advance(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.report(percent(sent, self.total).min(99));
    }

    pub fn finish(&self) {
        self.report(100);
    }

    /// Last percentage handed to the callback.
    pub fn last(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }

    fn report(&self, pct: u8) {
        let prev = self.last.fetch_max(pct, Ordering::SeqCst);
        if pct > prev {
            (self.callback)(pct);
        }
    }
}

fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = sent.min(total).saturating_mul(100) / total;
    u8::try_from(pct).unwrap_or(100)
}

/// Splits `bytes` into a body stream that advances `progress` as each chunk is
/// pulled by the HTTP client.
pub(crate) fn chunked_body(
    bytes: Bytes,
    chunk_size: usize,
    progress: Arc<UploadProgress>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    let len = bytes.len();
    let chunks: Vec<Bytes> = (0..len)
        .step_by(chunk_size)
        .map(|start| bytes.slice(start..(start + chunk_size).min(len)))
        .collect();

    futures_util::stream::iter(chunks).map(move |chunk| {
        progress.advance(chunk.len() as u64);
        Ok(chunk)
    })
}
