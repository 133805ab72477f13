//! Bounded in-memory byte pipe between one producer and one consumer.
//!
//! The read end implements [`std::io::Read`] so it can feed the synchronous
//! `tar` and `flate2` decoders from a blocking thread. The write end accepts
//! chunks from async code ([`PipeWriter::send`]) or from a plain thread via
//! [`std::io::Write`].
//!
//! Dropping the writer closes the pipe and the reader sees end-of-stream.
//! Dropping the reader makes every further write fail with
//! [`io::ErrorKind::BrokenPipe`], so a producer never blocks on a consumer
//! that has gone away.

use std::io::{self, Read, Write};

use bytes::{Buf, Bytes};
use tokio::sync::mpsc;

/// Number of chunks that may be in flight before the writer blocks.
pub const DEFAULT_CAPACITY: usize = 16;

/// Create a pipe that buffers at most `capacity` chunks.
pub fn pipe(capacity: usize) -> (PipeReader, PipeWriter) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        PipeReader {
            rx,
            current: Bytes::new(),
        },
        PipeWriter { tx },
    )
}

/// Read end of a [`pipe`].
///
/// Reads block the calling thread, so this must not be read from inside an
/// async task. Use `spawn_blocking` or a dedicated thread.
#[derive(Debug)]
pub struct PipeReader {
    rx: mpsc::Receiver<Bytes>,
    current: Bytes,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while !self.current.has_remaining() {
            match self.rx.blocking_recv() {
                Some(chunk) => self.current = chunk,
                // All writers dropped.
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}

/// Write end of a [`pipe`]. The pipe closes when this is dropped.
#[derive(Debug)]
pub struct PipeWriter {
    tx: mpsc::Sender<Bytes>,
}

impl PipeWriter {
    /// Queue a chunk, waiting for room if the pipe is full.
    pub async fn send(&self, chunk: Bytes) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx.send(chunk).await.map_err(|_| reader_closed())
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .blocking_send(Bytes::copy_from_slice(buf))
            .map_err(|_| reader_closed())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn reader_closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed")
}
