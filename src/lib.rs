//! # Image Store
//!
//! Ingests arbitrary user-submitted raster images and keeps three things on
//! disk for each one: the original bytes, a medium "feed" rendition and a
//! small "thumbnail" rendition.
//!
//! # Architecture: One Call, Three Files
//!
//! ```text
//! bytes ─▶ probe ─▶ tee ─▶ original/<id>.<ext>
//!                    │
//!                    ▼
//!                 decode ─┬─ still ─────▶ resize ×2 ─▶ WebP  ─▶ feed/ thumb/
//!                         └─ animation ─▶ composite + resize ×2 ─▶ WebP ─▶ feed/ thumb/
//! ```
//!
//! [`Store::add`] takes a byte stream and an identifier and returns the
//! derived filename and detected format. Recording that in a database,
//! authenticating uploads and serving the files are the caller's business.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | `Store::open` / `Store::add`, the orchestrator |
//! | [`sniff`] | Magic-byte probe with replay, tee of the original into a file + SHA-256 |
//! | [`imaging`] | Codecs, registry, frame compositor, resizer |
//! | [`sandbox`] | Directory roots that only accept single-component, write-once names |
//! | [`id`] | Validated image identifiers (UUID v4 by default) |
//! | [`cancel`] | Cooperative cancellation token and cancellable reader |
//! | [`fetch`] | Streaming GET for `http(s)://` sources |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sniff Without Seeking
//!
//! Upload bodies and HTTP responses cannot be rewound. The first
//! [`SNIFF_LEN`](imaging::SNIFF_LEN) bytes are read into a buffer, the format
//! is decided from magic bytes alone, and the buffer is chained back in front
//! of the live stream. Every byte is read from the source exactly once.
//!
//! ## Recomposite, Then Resize
//!
//! GIF frames are often sub-rectangles that only make sense drawn over the
//! frames before them. Each frame is composited onto a persistent canvas per
//! its disposal rule, and the full canvas is resized. Resizing raw frames
//! instead produces the familiar smeared, flickering thumbnails.
//!
//! ## WebP Out, Still or Animated
//!
//! Stills are lossless WebP. Animations (GIF or animated WebP) stay animated
//! and are written as animated WebP under the same `<id>.webp` name, keeping
//! loop count and per-frame delays. One-frame animations are treated as
//! stills.
//!
//! ## Write-Once Files
//!
//! Originals are created with `create_new`; renditions are staged in a
//! temporary file and persisted without clobbering. Reusing an identifier
//! is an error, never an overwrite.

pub mod cancel;
pub mod config;
pub mod fetch;
pub mod id;
pub mod imaging;
pub mod output;
pub mod sandbox;
pub mod sniff;
pub mod store;

pub use id::ImageId;
pub use store::{AddOutcome, Store, StoreError};

#[cfg(test)]
pub(crate) mod test_helpers;
