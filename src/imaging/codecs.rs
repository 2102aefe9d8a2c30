//! Decoders and encoders.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, TIFF, still WebP) | `image::load_from_memory_with_format` |
//! | Decode (animated WebP, every frame) | `image_webp::WebPDecoder::read_frame` |
//! | Decode (GIF, every frame) | `gif::Decoder` with RGBA output |
//! | Encode still → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode animation → WebP | `image_webp::WebPEncoder` per frame, ANMF container written here |
//!
//! GIF frames are decoded raw (sub-rectangle + disposal) rather than through
//! `image::codecs::gif`, which already composites and hides the disposal
//! tags the compositor needs.
//!
//! `image` has no animated WebP encoder. Each frame is encoded as a lossless
//! VP8L bitstream by `image-webp` (the backend `image` itself uses) and the
//! bitstreams are wrapped in the extended container:
//!
//! ```text
//! RIFF <size> WEBP
//!   VP8X  flags (alpha | animation), canvas width-1, height-1
//!   ANIM  background color, loop count
//!   ANMF  x/2, y/2, width-1, height-1, duration ms, flags
//!     VP8L  frame bitstream
//!   ANMF  ...
//! ```

use super::format::Format;
use super::frames::{Animation, Disposal, Frame, Repeat};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, RgbImage, RgbaImage};
use image_webp::LoopCount;
use std::io::{self, Cursor, Write};
use thiserror::Error;

/// VP8L stores `dimension - 1` in 14 bits.
const WEBP_MAX_DIMENSION: u32 = 16384;
/// ANMF durations are 24-bit milliseconds.
const WEBP_MAX_DURATION_MS: u32 = 0x00ff_ffff;

const VP8X_ALPHA: u8 = 0b0001_0000;
const VP8X_ANIMATION: u8 = 0b0000_0010;
const ANMF_NO_BLEND: u8 = 0b0000_0010;
const ANMF_DISPOSE_BACKGROUND: u8 = 0b0000_0001;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to decode {format}: {message}")]
    Decode { format: Format, message: String },
    #[error("Failed to encode {format}: {message}")]
    Encode { format: Format, message: String },
    #[error("No {operation} registered for {format}")]
    Unsupported {
        format: Format,
        operation: &'static str,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    fn decode(format: Format, err: impl std::fmt::Display) -> Self {
        CodecError::Decode {
            format,
            message: err.to_string(),
        }
    }

    fn encode(format: Format, err: impl std::fmt::Display) -> Self {
        CodecError::Encode {
            format,
            message: err.to_string(),
        }
    }
}

/// Result of fully decoding a source.
#[derive(Debug, Clone)]
pub enum Decoded {
    Still(RgbaImage),
    Animated(Animation),
}

fn decode_still(format: Format, bytes: &[u8]) -> Result<Decoded, CodecError> {
    let image = image::load_from_memory_with_format(bytes, format.to_image_format())
        .map_err(|e| CodecError::decode(format, e))?;
    Ok(Decoded::Still(image.into_rgba8()))
}

pub fn decode_png(bytes: &[u8]) -> Result<Decoded, CodecError> {
    decode_still(Format::Png, bytes)
}

pub fn decode_jpeg(bytes: &[u8]) -> Result<Decoded, CodecError> {
    decode_still(Format::Jpeg, bytes)
}

/// Still WebP goes through `image`; animated WebP yields every frame.
///
/// `image-webp` hands back each frame already composited onto the full
/// canvas, so frames come out at the origin with background disposal: each
/// one replaces the canvas outright.
pub fn decode_webp(bytes: &[u8]) -> Result<Decoded, CodecError> {
    let mut decoder = image_webp::WebPDecoder::new(Cursor::new(bytes))
        .map_err(|e| CodecError::decode(Format::WebP, e))?;
    if !decoder.is_animated() {
        return decode_still(Format::WebP, bytes);
    }

    let (width, height) = decoder.dimensions();
    let repeat = match decoder.loop_count() {
        LoopCount::Forever => Repeat::Infinite,
        LoopCount::Times(n) => Repeat::Finite(n.get()),
    };
    let buffer_len = decoder
        .output_buffer_size()
        .ok_or_else(|| CodecError::decode(Format::WebP, "canvas too large"))?;

    let mut frames = Vec::with_capacity(decoder.num_frames() as usize);
    for _ in 0..decoder.num_frames() {
        let mut buf = vec![0; buffer_len];
        let duration = decoder
            .read_frame(&mut buf)
            .map_err(|e| CodecError::decode(Format::WebP, e))?;
        let raster = if decoder.has_alpha() {
            RgbaImage::from_raw(width, height, buf)
        } else {
            RgbImage::from_raw(width, height, buf)
                .map(|rgb| DynamicImage::ImageRgb8(rgb).into_rgba8())
        }
        .ok_or_else(|| CodecError::decode(Format::WebP, "frame buffer size mismatch"))?;

        frames.push(Frame {
            raster,
            left: 0,
            top: 0,
            delay_ms: duration,
            disposal: Disposal::Background,
        });
    }

    if frames.is_empty() {
        return Err(CodecError::decode(Format::WebP, "no frames"));
    }
    Ok(Decoded::Animated(Animation { repeat, frames }))
}

pub fn decode_tiff(bytes: &[u8]) -> Result<Decoded, CodecError> {
    decode_still(Format::Tiff, bytes)
}

/// Decode every GIF frame with its position, delay and disposal.
///
/// GIF delays are hundredths of a second and are converted to milliseconds.
///
/// Always yields [`Decoded::Animated`], even for a single frame; the store
/// decides how to treat one-frame animations.
pub fn decode_gif(bytes: &[u8]) -> Result<Decoded, CodecError> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options
        .read_info(bytes)
        .map_err(|e| CodecError::decode(Format::Gif, e))?;

    let mut frames = Vec::new();
    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| CodecError::decode(Format::Gif, e))?
    {
        let raster = RgbaImage::from_raw(
            u32::from(frame.width),
            u32::from(frame.height),
            frame.buffer.to_vec(),
        )
        .ok_or_else(|| CodecError::decode(Format::Gif, "frame buffer size mismatch"))?;

        frames.push(Frame {
            raster,
            left: u32::from(frame.left),
            top: u32::from(frame.top),
            delay_ms: u32::from(frame.delay) * 10,
            disposal: match frame.dispose {
                gif::DisposalMethod::Any | gif::DisposalMethod::Keep => Disposal::Keep,
                gif::DisposalMethod::Background => Disposal::Background,
                gif::DisposalMethod::Previous => Disposal::Previous,
            },
        });
    }

    if frames.is_empty() {
        return Err(CodecError::decode(Format::Gif, "no frames"));
    }

    let repeat = match decoder.repeat() {
        gif::Repeat::Infinite => Repeat::Infinite,
        gif::Repeat::Finite(n) => Repeat::Finite(n),
    };

    Ok(Decoded::Animated(Animation { repeat, frames }))
}

/// Static encoder: one raster as lossless WebP.
pub fn encode_webp(raster: &RgbaImage, out: &mut dyn Write) -> Result<(), CodecError> {
    raster
        .write_with_encoder(WebPEncoder::new_lossless(out))
        .map_err(|e| CodecError::encode(Format::WebP, e))
}

fn webp_dimension(value: u32) -> Result<u32, CodecError> {
    if (1..=WEBP_MAX_DIMENSION).contains(&value) {
        Ok(value)
    } else {
        Err(CodecError::encode(
            Format::WebP,
            format!("dimension {value} outside 1..={WEBP_MAX_DIMENSION}"),
        ))
    }
}

fn put_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

fn put_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) -> Result<(), CodecError> {
    let size = u32::try_from(payload.len())
        .map_err(|_| CodecError::encode(Format::WebP, "chunk exceeds 4 GiB"))?;
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    Ok(())
}

/// Lossless VP8L bitstream for one frame, lifted out of a simple-format still.
fn vp8l_bitstream(raster: &RgbaImage) -> Result<Vec<u8>, CodecError> {
    let mut still = Vec::new();
    image_webp::WebPEncoder::new(&mut still)
        .encode(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            image_webp::ColorType::Rgba8,
        )
        .map_err(|e| CodecError::encode(Format::WebP, e))?;

    // RIFF <size> WEBP VP8L <size> <bitstream>
    let header = still
        .get(12..20)
        .filter(|h| &h[..4] == b"VP8L")
        .ok_or_else(|| CodecError::encode(Format::WebP, "unexpected still layout"))?;
    let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    still
        .get(20..20 + len)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| CodecError::encode(Format::WebP, "truncated VP8L chunk"))
}

/// Animated encoder: resolved frames plus timing, disposal and loop metadata
/// as animated WebP.
///
/// Frames are written without alpha blending, so each one replaces its
/// rectangle on the canvas. `Disposal::Background` clears that rectangle
/// afterwards; every other disposal keeps it. `Repeat::Finite(0)` (no loop
/// information in the source) is written as a single play.
pub fn encode_webp_animation(animation: &Animation, out: &mut dyn Write) -> Result<(), CodecError> {
    if animation.frames.is_empty() {
        return Err(CodecError::encode(Format::WebP, "no frames"));
    }
    let (width, height) = animation.canvas_dimensions();
    webp_dimension(width)?;
    webp_dimension(height)?;

    let loop_count: u16 = match animation.repeat {
        Repeat::Infinite => 0,
        Repeat::Finite(0) => 1,
        Repeat::Finite(n) => n,
    };

    let mut body = Vec::new();
    let mut vp8x = vec![VP8X_ALPHA | VP8X_ANIMATION, 0, 0, 0];
    put_u24(&mut vp8x, width - 1);
    put_u24(&mut vp8x, height - 1);
    put_chunk(&mut body, b"VP8X", &vp8x)?;

    // Transparent background, then the loop count
    let mut anim = vec![0; 4];
    anim.extend_from_slice(&loop_count.to_le_bytes());
    put_chunk(&mut body, b"ANIM", &anim)?;

    for frame in &animation.frames {
        let (w, h) = frame.raster.dimensions();
        webp_dimension(w)?;
        webp_dimension(h)?;
        if frame.left % 2 == 1 || frame.top % 2 == 1 {
            return Err(CodecError::encode(
                Format::WebP,
                format!("odd frame offset ({}, {})", frame.left, frame.top),
            ));
        }
        if frame.left + w > width || frame.top + h > height {
            return Err(CodecError::encode(Format::WebP, "frame outside canvas"));
        }

        let mut anmf = Vec::new();
        put_u24(&mut anmf, frame.left / 2);
        put_u24(&mut anmf, frame.top / 2);
        put_u24(&mut anmf, w - 1);
        put_u24(&mut anmf, h - 1);
        put_u24(&mut anmf, frame.delay_ms.min(WEBP_MAX_DURATION_MS));
        anmf.push(match frame.disposal {
            Disposal::Background => ANMF_NO_BLEND | ANMF_DISPOSE_BACKGROUND,
            _ => ANMF_NO_BLEND,
        });
        put_chunk(&mut anmf, b"VP8L", &vp8l_bitstream(&frame.raster)?)?;
        put_chunk(&mut body, b"ANMF", &anmf)?;
    }

    let riff_size = u32::try_from(body.len() + 4)
        .map_err(|_| CodecError::encode(Format::WebP, "animation exceeds 4 GiB"))?;
    out.write_all(b"RIFF")?;
    out.write_all(&riff_size.to_le_bytes())?;
    out.write_all(b"WEBP")?;
    out.write_all(&body)?;
    Ok(())
}
