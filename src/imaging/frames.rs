//! Decoded animation model.
//!
//! Frames are kept exactly as the source container stores them: a pixel
//! rectangle positioned somewhere on the logical canvas, plus the timing
//! and disposal metadata that travels through to the animated encoder.

use image::RgbaImage;

/// What happens to the canvas after a frame has been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposal {
    /// Leave the drawn frame in place (GIF "unspecified" and "do not dispose").
    Keep,
    /// Clear the canvas before the next frame.
    Background,
    /// Restore the canvas to what it was before this frame was drawn.
    Previous,
}

impl Disposal {
    /// Collapse onto the two-value vocabulary used for rendition output.
    ///
    /// Renditions carry fully resolved frames, so only "keep" and "clear"
    /// remain meaningful.
    pub fn collapsed(self) -> Self {
        match self {
            Disposal::Background => Disposal::Background,
            Disposal::Keep | Disposal::Previous => Disposal::Keep,
        }
    }
}

/// Loop behaviour of an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Infinite,
    /// Loop count as stored by the source. `Finite(0)` means the source
    /// carried no loop information at all and plays once.
    Finite(u16),
}

/// One source frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixels of the frame's own sub-rectangle, not of the whole canvas.
    pub raster: RgbaImage,
    pub left: u32,
    pub top: u32,
    /// Display time in milliseconds.
    pub delay_ms: u32,
    pub disposal: Disposal,
}

/// A decoded multi-frame image.
#[derive(Debug, Clone)]
pub struct Animation {
    pub repeat: Repeat,
    pub frames: Vec<Frame>,
}

impl Animation {
    /// Canvas bounds: the first frame's extent, measured from the origin.
    pub fn canvas_dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|f| (f.left + f.raster.width(), f.top + f.raster.height()))
            .unwrap_or((0, 0))
    }
}
