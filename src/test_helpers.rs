//! Shared test utilities: in-memory fixture images.
//!
//! Fixtures are built on the fly instead of checked in, so each test states
//! the exact geometry and timing it relies on.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let png = encode_png(&RgbaImage::new(400, 400));
//! let gif = make_gif((8, 8), Some(0), &[
//!     GifFrameSpec::full(8, 8, [255, 0, 0], 5, gif::DisposalMethod::Keep),
//! ]);
//! ```

use image::{ImageFormat, RgbaImage};
use std::borrow::Cow;
use std::io::Cursor;

pub fn encode_png(raster: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// One solid-colour GIF frame.
#[derive(Debug, Clone, Copy)]
pub struct GifFrameSpec {
    pub width: u16,
    pub height: u16,
    pub left: u16,
    pub top: u16,
    pub color: [u8; 3],
    /// Hundredths of a second.
    pub delay: u16,
    pub dispose: gif::DisposalMethod,
}

impl GifFrameSpec {
    /// A frame anchored at the top-left corner.
    pub fn full(
        width: u16,
        height: u16,
        color: [u8; 3],
        delay: u16,
        dispose: gif::DisposalMethod,
    ) -> Self {
        Self {
            width,
            height,
            left: 0,
            top: 0,
            color,
            delay,
            dispose,
        }
    }
}

/// Encode a GIF with a logical screen of `screen` and one local palette per frame.
///
/// `repeat`: `None` writes no loop extension, `Some(0)` loops forever,
/// `Some(n)` loops `n` times.
pub fn make_gif(screen: (u16, u16), repeat: Option<u16>, frames: &[GifFrameSpec]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut buf, screen.0, screen.1, &[]).unwrap();
        match repeat {
            None => {}
            Some(0) => encoder.set_repeat(gif::Repeat::Infinite).unwrap(),
            Some(n) => encoder.set_repeat(gif::Repeat::Finite(n)).unwrap(),
        }
        for spec in frames {
            let pixels = usize::from(spec.width) * usize::from(spec.height);
            let frame = gif::Frame {
                width: spec.width,
                height: spec.height,
                left: spec.left,
                top: spec.top,
                delay: spec.delay,
                dispose: spec.dispose,
                palette: Some(spec.color.to_vec()),
                buffer: Cow::Owned(vec![0; pixels]),
                ..gif::Frame::default()
            };
            encoder.write_frame(&frame).unwrap();
        }
    }
    buf
}

#[test]
fn make_gif_round_trips_through_gif_decoder() {
    let bytes = make_gif(
        (6, 6),
        Some(2),
        &[GifFrameSpec {
            left: 1,
            top: 2,
            ..GifFrameSpec::full(4, 3, [10, 20, 30], 9, gif::DisposalMethod::Background)
        }],
    );
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(&bytes[..]).unwrap();
    let frame = decoder.read_next_frame().unwrap().unwrap();
    assert_eq!((frame.left, frame.top, frame.width, frame.height), (1, 2, 4, 3));
    assert_eq!(frame.delay, 9);
    assert_eq!(&frame.buffer[..4], &[10, 20, 30, 255]);
}
