//! Image processing in pure Rust, no external tools.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Sniff** | `image::guess_format` on the first bytes |
//! | **Decode** | `image` (stills), `gif` (raw animated frames), `image-webp` (animated WebP) |
//! | **Resize** | `imageops::resize` with `CatmullRom`, never upscaling |
//! | **Composite** | `imageops::overlay` onto a running RGBA canvas |
//! | **Encode** | lossless WebP, still or animated |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Frames**: The animation model shared by decoder, compositor and encoder
//! - **Codecs** + **Registry**: Which formats can be read and written, and how
//! - **Resize** + **Compositor**: The pixel work behind every rendition

mod calculations;
pub mod codecs;
pub mod compositor;
pub mod format;
pub mod frames;
pub mod registry;
pub mod resize;

pub use calculations::calculate_fit_dimensions;
pub use codecs::{CodecError, Decoded};
pub use compositor::{CanvasState, Compositor, flatten, render_animation, resolve_frames};
pub use format::{Format, SNIFF_LEN};
pub use frames::{Animation, Disposal, Frame, Repeat};
pub use registry::{Codec, Registry};
pub use resize::fit_width;
