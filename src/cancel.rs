//! Cooperative cancellation for in-flight `add` calls.
//!
//! A [`CancelToken`] is a shared flag. The store checks it between
//! compositing steps, and [`CancellableReader`] checks it on every read so
//! a slow remote body stops streaming as soon as the caller gives up.

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Reader that fails with [`Cancelled`] once its token fires.
pub struct CancellableReader<R> {
    inner: R,
    token: CancelToken,
}

impl<R: Read> CancellableReader<R> {
    pub fn new(inner: R, token: CancelToken) -> Self {
        Self { inner, token }
    }
}

impl<R: Read> Read for CancellableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.token.is_cancelled() {
            return Err(io::Error::other(Cancelled));
        }
        self.inner.read(buf)
    }
}

/// Whether an I/O error was produced by a [`CancellableReader`].
pub fn is_cancellation(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<Cancelled>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(Cancelled));
    }

    #[test]
    fn reader_passes_through_until_cancelled() {
        let token = CancelToken::new();
        let mut reader = CancellableReader::new(&b"abcdef"[..], token.clone());

        let mut buf = [0u8; 3];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");

        token.cancel();
        let err = reader.read(&mut buf).unwrap_err();
        assert!(is_cancellation(&err));
    }

    #[test]
    fn plain_io_errors_are_not_cancellation() {
        let err = io::Error::other("disk on fire");
        assert!(!is_cancellation(&err));
    }
}
