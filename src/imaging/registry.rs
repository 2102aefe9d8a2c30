//! Explicit codec registry.
//!
//! Supported formats are whatever has been registered here, nothing more.
//! The registry is built once (usually [`Registry::standard`]) and handed to
//! the [`Store`](crate::store::Store), which looks up a decoder by the
//! sniffed source format and the encoders by the two rendition formats.

use super::codecs::{self, CodecError, Decoded};
use super::format::Format;
use super::frames::Animation;
use image::RgbaImage;
use std::collections::HashMap;
use std::io::Write;

pub type DecodeFn = fn(&[u8]) -> Result<Decoded, CodecError>;
pub type StillEncodeFn = fn(&RgbaImage, &mut dyn Write) -> Result<(), CodecError>;
pub type AnimationEncodeFn = fn(&Animation, &mut dyn Write) -> Result<(), CodecError>;

/// Operations available for one format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    pub decode: Option<DecodeFn>,
    pub encode_still: Option<StillEncodeFn>,
    pub encode_animation: Option<AnimationEncodeFn>,
}

impl Codec {
    pub fn decoder(decode: DecodeFn) -> Self {
        Self {
            decode: Some(decode),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    codecs: HashMap<Format, Codec>,
    still_output: Format,
    animated_output: Format,
}

impl Registry {
    /// A registry with no codecs, writing renditions in the given formats
    /// once encoders for them are registered.
    pub fn empty(still_output: Format, animated_output: Format) -> Self {
        Self {
            codecs: HashMap::new(),
            still_output,
            animated_output,
        }
    }

    /// PNG, JPEG, GIF, WebP and TIFF in; WebP out, still or animated.
    pub fn standard() -> Self {
        let mut registry = Self::empty(Format::WebP, Format::WebP);
        registry
            .register(Format::Png, Codec::decoder(codecs::decode_png))
            .register(Format::Jpeg, Codec::decoder(codecs::decode_jpeg))
            .register(Format::Tiff, Codec::decoder(codecs::decode_tiff))
            .register(Format::Gif, Codec::decoder(codecs::decode_gif))
            .register(
                Format::WebP,
                Codec {
                    decode: Some(codecs::decode_webp),
                    encode_still: Some(codecs::encode_webp),
                    encode_animation: Some(codecs::encode_webp_animation),
                },
            );
        registry
    }

    /// Register (or replace) the codec for `format`.
    pub fn register(&mut self, format: Format, codec: Codec) -> &mut Self {
        self.codecs.insert(format, codec);
        self
    }

    pub fn decoder(&self, format: Format) -> Result<DecodeFn, CodecError> {
        self.codecs
            .get(&format)
            .and_then(|c| c.decode)
            .ok_or(CodecError::Unsupported {
                format,
                operation: "decoder",
            })
    }

    /// Output format and encoder for single-frame renditions.
    pub fn still_encoder(&self) -> Result<(Format, StillEncodeFn), CodecError> {
        let format = self.still_output;
        self.codecs
            .get(&format)
            .and_then(|c| c.encode_still)
            .map(|encode| (format, encode))
            .ok_or(CodecError::Unsupported {
                format,
                operation: "still encoder",
            })
    }

    /// Output format and encoder for animated renditions.
    pub fn animation_encoder(&self) -> Result<(Format, AnimationEncodeFn), CodecError> {
        let format = self.animated_output;
        self.codecs
            .get(&format)
            .and_then(|c| c.encode_animation)
            .map(|encode| (format, encode))
            .ok_or(CodecError::Unsupported {
                format,
                operation: "animation encoder",
            })
    }

    /// Formats that can be ingested, in a stable order.
    pub fn decodable_formats(&self) -> Vec<Format> {
        let mut formats: Vec<Format> = self
            .codecs
            .iter()
            .filter(|(_, c)| c.decode.is_some())
            .map(|(f, _)| *f)
            .collect();
        formats.sort_by_key(|f| f.name());
        formats
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
