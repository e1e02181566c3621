//! Module defining the bounded, pull-based reading of lines from a byte stream.
//!
//! A producer task reads the input and splits it into lines. It hands them to the consumer
//! through a bounded channel, reserving a slot before reading each line, so the input is only
//! read while the consumer has room for more. The number of lines held in memory therefore
//! never exceeds the channel capacity plus the lines of one request.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Error;


type LineResult = std::io::Result<String>;

/// Pull-based source of lines with bounded read-ahead.
#[derive(Debug)]
pub struct LineSource {
    state: Mutex<Receiving>,
    gauge: Arc<BufferGauge>,
    producer: JoinHandle<()>,
}

#[derive(Debug)]
struct Receiving {
    rx: mpsc::Receiver<LineResult>,
    buffer: VecDeque<String>,
    exhausted: bool,
}

impl LineSource {
    /// Starts reading `reader` on a background task, keeping at most `capacity` lines read ahead.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<R>(reader: R, capacity: NonZeroUsize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.get());
        let gauge = Arc::new(BufferGauge::default());
        let producer = tokio::spawn(produce_lines(reader, tx, Arc::clone(&gauge)));

        Self {
            state: Mutex::new(Receiving {
                rx,
                buffer: VecDeque::new(),
                exhausted: false,
            }),
            gauge,
            producer,
        }
    }

    /// Opens the file at `path` as a line source.
    pub async fn open(path: &Path, capacity: NonZeroUsize) -> Result<Self, Error> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(file, capacity))
    }

    /// Waits until `n` lines are available or the input is exhausted, then returns up to `n`
    /// lines. Returns `Ok(None)` once the input is exhausted and every line was handed out.
    ///
    /// Fails with [`Error::InvalidArgument`] for `n == 0`, with [`Error::ConcurrentAccess`] if
    /// another request is still in flight, and with [`Error::Stream`] (once) if reading the
    /// input failed. Lines buffered before a read failure are still handed out afterwards.
    pub async fn request_lines(&self, n: usize) -> Result<Option<Vec<String>>, Error> {
        if n == 0 {
            return Err(Error::InvalidArgument(
                "the number of requested lines must be positive".to_string(),
            ));
        }
        let mut state = self.state.try_lock().map_err(|_| Error::ConcurrentAccess)?;

        while state.buffer.len() < n && !state.exhausted {
            match state.rx.recv().await {
                Some(Ok(line)) => state.buffer.push_back(line),
                Some(Err(e)) => return Err(Error::Stream(e)),
                None => state.exhausted = true,
            }
        }

        if state.buffer.is_empty() {
            return Ok(None);
        }
        let take = n.min(state.buffer.len());
        let lines: Vec<String> = state.buffer.drain(..take).collect();
        self.gauge.release(take);
        Ok(Some(lines))
    }

    /// Highest number of lines that were read from the input but not yet handed out
    pub fn peak_buffered(&self) -> usize {
        self.gauge.peak.load(Ordering::Relaxed)
    }
}

impl Drop for LineSource {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

#[derive(Debug, Default)]
struct BufferGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl BufferGauge {
    fn acquire(&self) {
        let now = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak.fetch_max(now, Ordering::Relaxed);
    }

    fn release(&self, n: usize) {
        self.current.fetch_sub(n, Ordering::Relaxed);
    }
}

async fn produce_lines<R>(reader: R, tx: mpsc::Sender<LineResult>, gauge: Arc<BufferGauge>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut produced = 0usize;

    loop {
        // Only read once the consumer has room for the line
        let Ok(permit) = tx.reserve().await else {
            debug!(produced, "line consumer dropped, stopping producer");
            return;
        };

        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                debug!(produced, "input exhausted");
                return;
            }
            Ok(_) => {
                gauge.acquire();
                permit.send(Ok(decode_line(&buf)));
                produced += 1;
            }
            Err(e) => {
                permit.send(Err(e));
                return;
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// A group of consecutive lines together with the 1-based number of its first line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub first_line_number: usize,
    pub lines: Vec<String>,
}

/// Groups the lines of a [`LineSource`] into chunks of a fixed size.
///
/// Lines read past a chunk boundary stay buffered in the source for the next chunk.
pub struct ChunkReader {
    source: LineSource,
    chunk_size: NonZeroUsize,
    next_line_number: usize,
}

impl ChunkReader {
    pub fn new(source: LineSource, chunk_size: NonZeroUsize) -> Self {
        Self {
            source,
            chunk_size,
            next_line_number: 1,
        }
    }

    /// Returns the next chunk, or `None` once the input is exhausted.
    /// Only the last chunk may hold fewer than `chunk_size` lines.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, Error> {
        let Some(lines) = self.source.request_lines(self.chunk_size.get()).await? else {
            return Ok(None);
        };

        let chunk = Chunk {
            first_line_number: self.next_line_number,
            lines,
        };
        self.next_line_number += chunk.lines.len();
        Ok(Some(chunk))
    }

    pub fn source(&self) -> &LineSource {
        &self.source
    }
}
