//! The image store: one call turns a byte stream into three files.
//!
//! ## Output Structure
//!
//! ```text
//! <base>/
//! ├── original/
//! │   └── <id>.<source-ext>    # byte-identical copy of the input
//! ├── feed/
//! │   └── <id>.webp            # ≤ 600px wide
//! └── thumb/
//!     └── <id>.webp            # ≤ 100px wide
//! ```
//!
//! Still sources (and one-frame animations) become lossless WebP; animations
//! with more than one frame stay animated and become animated WebP. Feed and
//! thumbnail share one filename so the serving side only needs the stem.
//!
//! ## Failure Semantics
//!
//! Nothing is transactional. The original is streamed to disk before the
//! full decode, so it stays behind when decoding fails. Each rendition is
//! persisted atomically, but if one fails its sibling may already exist.
//! Callers treat missing renditions as repairable, not as corruption.
//!
//! WebP caps each side at 16384 pixels. Renditions are only bounded in
//! width, so a narrow, very tall source (50×17000, say) decodes fine and then
//! fails with [`StoreError::Encode`], leaving its original behind.
//!
//! ## Parallel Processing
//!
//! Feed and thumbnail are produced concurrently with [`rayon::join`] and
//! joined before [`Store::add`] returns.

use crate::cancel::{CancelToken, CancellableReader, Cancelled, is_cancellation};
use crate::config::RenditionsConfig;
use crate::id::{ImageId, InvalidId};
use crate::imaging::{
    Animation, CodecError, Decoded, Format, Registry, fit_width, flatten, render_animation,
};
use crate::sandbox::Sandbox;
use crate::sniff::{TeeReader, probe};
use image::RgbaImage;
use serde::Serialize;
use std::io::{self, BufWriter, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read source: {0}")]
    SourceFetch(String),
    #[error("Unrecognized image format")]
    UnrecognizedFormat,
    #[error("Failed to decode image: {0}")]
    Decode(#[source] CodecError),
    #[error("Failed to write {rendition} rendition {filename}: {source}")]
    Encode {
        rendition: &'static str,
        filename: String,
        #[source]
        source: CodecError,
    },
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Operation cancelled")]
    Cancelled(#[from] Cancelled),
}

impl StoreError {
    /// Header or full decode failures: the source is not a usable image.
    pub fn is_decode(&self) -> bool {
        matches!(self, StoreError::UnrecognizedFormat | StoreError::Decode(_))
    }
}

/// What a successful [`Store::add`] produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub id: String,
    /// Shared name of the feed and thumbnail renditions.
    pub filename: String,
    /// Detected source format.
    pub format: Format,
    /// Name of the original under `original/`.
    pub original: String,
    /// Hex SHA-256 of the original bytes.
    pub original_sha256: String,
    pub animated: bool,
    pub frames: usize,
}

/// Which sandbox a rendition goes to and how wide it may be.
#[derive(Debug, Clone, Copy)]
struct Rendition<'a> {
    name: &'static str,
    sandbox: &'a Sandbox,
    max_width: u32,
}

/// Handle on the three sandboxes. Dropping it releases them; [`Store::close`]
/// does the same explicitly.
#[derive(Debug)]
pub struct Store {
    original: Sandbox,
    feed: Sandbox,
    thumb: Sandbox,
    registry: Registry,
    renditions: RenditionsConfig,
}

impl Store {
    /// Open (creating as needed) the three sandboxes under `base`.
    pub fn open(
        base: &Path,
        registry: Registry,
        renditions: RenditionsConfig,
    ) -> Result<Self, StoreError> {
        std::fs::create_dir_all(base)?;
        let store = Self {
            original: Sandbox::open(base, "original")?,
            feed: Sandbox::open(base, "feed")?,
            thumb: Sandbox::open(base, "thumb")?,
            registry,
            renditions,
        };
        debug!(base = %base.display(), "store opened");
        Ok(store)
    }

    /// Release the sandboxes. Files already written stay on disk.
    pub fn close(self) {
        debug!(original = %self.original.path().display(), "store closed");
    }

    pub fn original_dir(&self) -> &Path {
        self.original.path()
    }

    pub fn feed_dir(&self) -> &Path {
        self.feed.path()
    }

    pub fn thumb_dir(&self) -> &Path {
        self.thumb.path()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Ingest `reader` under `id`.
    pub fn add(&self, id: &ImageId, reader: impl Read) -> Result<AddOutcome, StoreError> {
        self.add_cancellable(id, reader, &CancelToken::new())
    }

    /// Ingest `reader` under `id`, giving up once `cancel` fires.
    ///
    /// The token is checked on every read from the source and between
    /// compositing steps.
    pub fn add_cancellable(
        &self,
        id: &ImageId,
        reader: impl Read,
        cancel: &CancelToken,
    ) -> Result<AddOutcome, StoreError> {
        let reader = CancellableReader::new(reader, cancel.clone());
        let (format, replay) = probe(reader).map_err(source_error)?;
        let format = format.ok_or(StoreError::UnrecognizedFormat)?;
        let decode = self.registry.decoder(format).map_err(StoreError::Decode)?;

        let original = format!("{id}.{format}");
        let file = self.original.create_new(&original)?;
        let mut tee = TeeReader::new(replay, BufWriter::new(file));
        let mut bytes = Vec::new();
        if let Err(e) = tee.read_to_end(&mut bytes) {
            warn!(%id, written = tee.written(), "original only partially persisted");
            return Err(if tee.sink_failed() {
                StoreError::Io(e)
            } else {
                source_error(e)
            });
        }
        let (writer, original_sha256) = tee.finish()?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        debug!(%id, %format, bytes = bytes.len(), "original persisted");

        cancel.check()?;
        let decoded = decode(&bytes).map_err(StoreError::Decode)?;
        drop(bytes);

        let (filename, frames) = match decoded {
            Decoded::Animated(animation) if animation.frames.len() > 1 => {
                let frames = animation.frames.len();
                (self.write_animated(id, &animation, cancel)?, frames)
            }
            Decoded::Animated(animation) => {
                let still = flatten(&animation).ok_or_else(|| {
                    StoreError::Decode(CodecError::Decode {
                        format,
                        message: "no frames".into(),
                    })
                })?;
                (self.write_still(id, &still)?, 1)
            }
            Decoded::Still(raster) => (self.write_still(id, &raster)?, 1),
        };

        info!(%id, %format, %filename, frames, "image added");
        Ok(AddOutcome {
            id: id.to_string(),
            filename,
            format,
            original,
            original_sha256,
            animated: frames > 1,
            frames,
        })
    }

    fn feed(&self) -> Rendition<'_> {
        Rendition {
            name: "feed",
            sandbox: &self.feed,
            max_width: self.renditions.feed_width,
        }
    }

    fn thumb(&self) -> Rendition<'_> {
        Rendition {
            name: "thumb",
            sandbox: &self.thumb,
            max_width: self.renditions.thumb_width,
        }
    }

    /// Resize and encode one raster into both renditions.
    fn write_still(&self, id: &ImageId, raster: &RgbaImage) -> Result<String, StoreError> {
        let (format, encode) = self.registry.still_encoder().map_err(|source| {
            StoreError::Encode {
                rendition: "still",
                filename: id.to_string(),
                source,
            }
        })?;
        let filename = format!("{id}.{format}");

        let write = |rendition: Rendition<'_>| {
            let resized = fit_width(raster, rendition.max_width);
            debug!(
                %id,
                rendition = rendition.name,
                width = resized.width(),
                height = resized.height(),
                "encoding still"
            );
            persist(rendition, &filename, |out| encode(&*resized, out))
        };
        let (feed, thumb) = rayon::join(|| write(self.feed()), || write(self.thumb()));
        feed?;
        thumb?;

        Ok(filename)
    }

    /// Composite, resize and encode every frame into both renditions.
    fn write_animated(
        &self,
        id: &ImageId,
        animation: &Animation,
        cancel: &CancelToken,
    ) -> Result<String, StoreError> {
        let (format, encode) = self.registry.animation_encoder().map_err(|source| {
            StoreError::Encode {
                rendition: "animation",
                filename: id.to_string(),
                source,
            }
        })?;
        let filename = format!("{id}.{format}");

        let write = |rendition: Rendition<'_>| -> Result<(), StoreError> {
            let rendered = render_animation(animation, rendition.max_width, cancel)?;
            debug!(
                %id,
                rendition = rendition.name,
                frames = rendered.frames.len(),
                "encoding animation"
            );
            persist(rendition, &filename, |out| encode(&rendered, out))
        };
        let (feed, thumb) = rayon::join(|| write(self.feed()), || write(self.thumb()));
        feed?;
        thumb?;

        Ok(filename)
    }
}

fn persist<F>(rendition: Rendition<'_>, filename: &str, encode: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut dyn io::Write) -> Result<(), CodecError>,
{
    rendition
        .sandbox
        .write_new(filename, encode)
        .map(|_| ())
        .map_err(|source| StoreError::Encode {
            rendition: rendition.name,
            filename: filename.to_string(),
            source,
        })
}

fn source_error(err: io::Error) -> StoreError {
    if is_cancellation(&err) {
        StoreError::Cancelled(Cancelled)
    } else {
        StoreError::SourceFetch(err.to_string())
    }
}
