//! In-memory stand-ins for a terminal's stdout and stdin.
//!
//! Both buffers are cheap handles over shared storage: the suite keeps one
//! handle and gives a clone to each root command it builds, so whatever the
//! command writes is visible to the test after the call returns.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

/// Append-only sink for everything a command prints.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    inner: Rc<RefCell<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything captured so far.
    pub fn reset(&self) {
        self.inner.borrow_mut().clear();
    }

    /// A copy of the captured bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.borrow().clone()
    }

    /// The captured bytes decoded as UTF-8, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow()).into_owned()
    }

    /// The captured output split into lines.
    pub fn lines(&self) -> Vec<String> {
        split_lines(&self.inner.borrow())
    }

    /// Number of captured bytes.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Source of synthetic stdin. Bytes written by the test are consumed by the
/// command's reads, front to back.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    inner: Rc<RefCell<VecDeque<u8>>>,
}

impl InputBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the next reads.
    pub fn push(&self, data: impl AsRef<[u8]>) {
        self.inner.borrow_mut().extend(data.as_ref());
    }

    /// Discard all unread input.
    pub fn reset(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether all input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl Read for InputBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.borrow_mut().read(buf)
    }
}

impl Write for InputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that forwards every write to two writers.
///
/// The primary writer sees each chunk first; a failure on either side fails
/// the write.
#[derive(Debug)]
pub struct TeeWriter<A, B> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    /// Fan writes out to `primary` and `secondary`.
    pub const fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    /// Recover the two writers.
    pub fn into_inner(self) -> (A, B) {
        (self.primary, self.secondary)
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.primary.write_all(buf)?;
        self.secondary.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.secondary.flush()
    }
}

/// Split output into newline-delimited lines, dropping a trailing `\r` from
/// each line and the empty remainder after a final newline.
pub fn split_lines(output: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(output);
    text.lines().map(str::to_string).collect()
}
