use std::fs::File;
use std::io::{self, Read};
use std::os::fd::OwnedFd;
use std::thread;
use std::time::Duration;

use crate::context::RunContext;

/// Capacity of the line buffer, one byte reserved for the terminator. A
/// line that fills the buffer before a newline is yielded as-is, marked
/// incomplete.
pub const LINE_BUFFER: usize = 8 * 1024;

/// One line of child output, trailing newline stripped. `complete` is
/// false when the buffer filled before a newline was seen.
#[derive(Debug, Clone)]
pub struct Line {
    pub text: String,
    pub complete: bool,
}

impl Line {
    pub fn complete(text: impl Into<String>) -> Self {
        Line {
            text: text.into(),
            complete: true,
        }
    }
}

/// Byte-at-a-time reader over the child's pipe. The descriptor is expected
/// to be open non-blocking; a would-block read sleeps one second and
/// retries, up to `ctx.blocking_time` times (or forever under the
/// `readblock` pragma). Owns the fd; dropping the reader closes it.
pub struct LineReader {
    src: File,
    buf: Vec<u8>,
}

impl LineReader {
    pub fn new(fd: OwnedFd) -> Self {
        LineReader {
            src: File::from(fd),
            buf: Vec::with_capacity(LINE_BUFFER),
        }
    }

    /// Read the next line. `Ok(None)` is end of stream: clean EOF, or the
    /// retry budget ran out; either way a partial trailing line is
    /// discarded, matching the driver contract. Any read error other than
    /// would-block is surfaced as `Err`.
    pub fn next_line(&mut self, ctx: &RunContext) -> io::Result<Option<Line>> {
        self.buf.clear();
        let mut byte = [0u8; 1];
        let mut retries: u32 = 0;

        while self.buf.len() < LINE_BUFFER - 1 {
            match self.src.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if ctx.readblock.get() || retries < ctx.blocking_time {
                        retries = retries.saturating_add(1);
                        thread::sleep(Duration::from_secs(1));
                        continue;
                    }
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
            // A successful read resets the retry counter.
            retries = 0;
            self.buf.push(byte[0]);
            if byte[0] == b'\n' {
                return Ok(Some(self.take(true)));
            }
        }
        Ok(Some(self.take(false)))
    }

    fn take(&mut self, complete: bool) -> Line {
        let mut bytes = self.buf.as_slice();
        if complete {
            bytes = &bytes[..bytes.len() - 1];
        }
        Line {
            text: String::from_utf8_lossy(bytes).into_owned(),
            complete,
        }
    }
}
