//! Format probing on non-seekable streams.
//!
//! Uploads and HTTP bodies cannot be rewound, so the probe never seeks:
//!
//! ```text
//! source ──take(SNIFF_LEN)──▶ header ──▶ Format::sniff
//!    │                          │
//!    └──────────┐   ┌───────────┘
//!               ▼   ▼
//!        chain(Cursor(header), source)   ← Replay: header bytes first, then the live rest
//!               │
//!               ▼
//!        TeeReader ──▶ original/<id>.<ext>  (every byte, in order, + SHA-256)
//! ```
//!
//! The header buffer moves into the replay reader exactly once; nothing is
//! read from the source twice.

use crate::imaging::{Format, SNIFF_LEN};
use sha2::{Digest, Sha256};
use std::io::{self, Chain, Cursor, Read, Write};

/// Probed bytes followed by the untouched remainder of the source.
pub type Replay<R> = Chain<Cursor<Vec<u8>>, R>;

/// Read the leading bytes of `source` and identify its container.
///
/// Returns the sniffed format (`None` if unrecognised) and a reader that
/// yields the complete original stream. Short sources are fine: the probe
/// stops at end of stream.
pub fn probe<R: Read>(mut source: R) -> io::Result<(Option<Format>, Replay<R>)> {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    source.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    let format = Format::sniff(&header);
    Ok((format, Cursor::new(header).chain(source)))
}

/// Reader that copies everything it yields into `sink` and a SHA-256 digest.
pub struct TeeReader<R, W> {
    inner: R,
    sink: W,
    hasher: Sha256,
    written: u64,
    sink_failed: bool,
}

impl<R: Read, W: Write> TeeReader<R, W> {
    pub fn new(inner: R, sink: W) -> Self {
        Self {
            inner,
            sink,
            hasher: Sha256::new(),
            written: 0,
            sink_failed: false,
        }
    }

    /// Bytes copied to the sink so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Whether the last error came from writing to the sink rather than
    /// reading the source.
    pub fn sink_failed(&self) -> bool {
        self.sink_failed
    }

    /// Flush the sink and return it with the hex digest of everything copied.
    pub fn finish(mut self) -> io::Result<(W, String)> {
        self.sink.flush()?;
        Ok((self.sink, format!("{:x}", self.hasher.finalize())))
    }
}

impl<R: Read, W: Write> Read for TeeReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Err(e) = self.sink.write_all(&buf[..n]) {
            self.sink_failed = true;
            return Err(e);
        }
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `chunk` bytes per read, like a network body.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn probe_replays_header_before_rest() {
        let data: Vec<u8> = b"GIF89a".iter().copied().chain(0..200u8).collect();
        let (format, mut replay) = probe(&data[..]).unwrap();
        assert_eq!(format, Some(Format::Gif));

        let mut all = Vec::new();
        replay.read_to_end(&mut all).unwrap();
        assert_eq!(all, data);
    }

    #[test]
    fn probe_handles_trickling_source() {
        let data: Vec<u8> = b"\x89PNG\r\n\x1a\n".iter().copied().chain(0..100u8).collect();
        let (format, mut replay) = probe(Trickle {
            data: &data,
            chunk: 3,
        })
        .unwrap();
        assert_eq!(format, Some(Format::Png));

        let mut all = Vec::new();
        replay.read_to_end(&mut all).unwrap();
        assert_eq!(all, data);
    }

    #[test]
    fn probe_short_and_empty_sources() {
        let (format, mut replay) = probe(&b"GIF"[..]).unwrap();
        assert_eq!(format, None);
        let mut all = Vec::new();
        replay.read_to_end(&mut all).unwrap();
        assert_eq!(all, b"GIF");

        let (format, _) = probe(&b""[..]).unwrap();
        assert_eq!(format, None);
    }

    #[test]
    fn tee_copies_bytes_and_hashes() {
        let mut sink = Vec::new();
        let mut tee = TeeReader::new(&b"hello world"[..], &mut sink);
        let mut out = Vec::new();
        tee.read_to_end(&mut out).unwrap();
        assert_eq!(tee.written(), 11);
        let (_, digest) = tee.finish().unwrap();

        assert_eq!(out, b"hello world");
        assert_eq!(sink, b"hello world");
        assert_eq!(
            digest,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn tee_reports_sink_failures() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("no space left on device"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut tee = TeeReader::new(&b"data"[..], Full);
        assert!(tee.read_to_end(&mut Vec::new()).is_err());
        assert!(tee.sink_failed());
    }

    #[test]
    fn tee_keeps_bytes_seen_before_a_read_error() {
        struct FailAfter<'a>(&'a [u8]);
        impl Read for FailAfter<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() {
                    return Err(io::Error::other("connection reset"));
                }
                let n = buf.len().min(self.0.len());
                buf[..n].copy_from_slice(&self.0[..n]);
                self.0 = &self.0[n..];
                Ok(n)
            }
        }

        let mut sink = Vec::new();
        let mut tee = TeeReader::new(FailAfter(b"partial"), &mut sink);
        assert!(tee.read_to_end(&mut Vec::new()).is_err());
        assert!(!tee.sink_failed());
        drop(tee);
        assert_eq!(sink, b"partial");
    }
}
