//! Segmenting of raw child output.
//!
//! Progress bars redraw a single line with `\r` and rarely print `\n`, so
//! both bytes end a segment. `\r\n` counts as one terminator.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Longest segment kept before it is flushed without a terminator.
pub const MAX_SEGMENT_LEN: usize = 8 * 1024;

const READ_CHUNK: usize = 4096;

/// Splits a byte stream into `\n`/`\r` terminated segments.
#[derive(Debug, Default)]
pub struct SegmentSplitter {
    pending: Vec<u8>,
    after_cr: bool,
}

impl SegmentSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `bytes` and return every segment completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut segments = Vec::new();
        for &byte in bytes {
            let after_cr = std::mem::replace(&mut self.after_cr, false);
            match byte {
                b'\n' if after_cr => {}
                b'\n' => segments.push(std::mem::take(&mut self.pending)),
                b'\r' => {
                    segments.push(std::mem::take(&mut self.pending));
                    self.after_cr = true;
                }
                _ => {
                    self.pending.push(byte);
                    if self.pending.len() >= MAX_SEGMENT_LEN {
                        segments.push(std::mem::take(&mut self.pending));
                    }
                }
            }
        }
        segments
    }

    /// Unterminated trailing bytes, if any.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        self.after_cr = false;
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

/// Reads one child pipe and yields batches of completed segments.
pub struct SegmentReader<R> {
    reader: R,
    splitter: SegmentSplitter,
    buf: Vec<u8>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> SegmentReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            splitter: SegmentSplitter::new(),
            buf: vec![0; READ_CHUNK],
            eof: false,
        }
    }

    /// Next batch of segments, `Ok(None)` once the pipe is closed.
    ///
    /// Cancel safe: state only changes after the read completes.
    pub async fn next_batch(&mut self) -> std::io::Result<Option<Vec<Vec<u8>>>> {
        if self.eof {
            return Ok(None);
        }
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            self.eof = true;
            return Ok(Some(self.splitter.finish().into_iter().collect()));
        }
        Ok(Some(self.splitter.push(&self.buf[..n])))
    }
}
