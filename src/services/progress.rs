use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

/// Receives progress observations from a [`ProgressWriter`].
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, transferred: u64, total: Option<u64>);
}

impl<F> ProgressObserver for F
where
    F: Fn(u64, Option<u64>) + Send + Sync,
{
    fn on_progress(&self, transferred: u64, total: Option<u64>) {
        self(transferred, total)
    }
}

/// Default observer: one debug line per chunk.
pub struct LogProgress {
    name: String,
}

impl LogProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ProgressObserver for LogProgress {
    fn on_progress(&self, transferred: u64, total: Option<u64>) {
        match total {
            Some(total) => tracing::debug!(
                "File upload in progress: {} {}/{} bytes",
                self.name,
                transferred,
                total
            ),
            None => tracing::debug!("File upload in progress: {} {} bytes", self.name, transferred),
        }
    }
}

/// Counters for one in-flight upload. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    total_size: Option<u64>,
    bytes_transferred: Arc<AtomicU64>,
}

impl TransferProgress {
    pub fn new(total_size: Option<u64>) -> Self {
        Self {
            total_size,
            bytes_transferred: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::Acquire)
    }

    fn advance(&self, n: u64) -> u64 {
        self.bytes_transferred.fetch_add(n, Ordering::AcqRel) + n
    }
}

/// Pass-through writer that counts every byte the inner writer accepts.
///
/// After each accepted chunk the observer is told the running total, except
/// for the chunk that brings the count exactly to the declared total:
/// completion is signalled by the caller shutting the writer down.
pub struct ProgressWriter<W> {
    inner: W,
    progress: TransferProgress,
    observer: Arc<dyn ProgressObserver>,
}

impl<W> ProgressWriter<W> {
    pub fn new(inner: W, progress: TransferProgress, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            inner,
            progress,
            observer,
        }
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for ProgressWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(Ok(n)) => {
                if n > 0 {
                    let transferred = this.progress.advance(n as u64);
                    if this.progress.total_size != Some(transferred) {
                        this.observer
                            .on_progress(transferred, this.progress.total_size);
                    }
                }
                Poll::Ready(Ok(n))
            }
            other => other,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
