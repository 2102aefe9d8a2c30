//! Source container formats, identified by content rather than file name.

use serde::Serialize;
use std::fmt;

/// Number of leading bytes needed to tell every supported container apart.
///
/// WebP is the longest signature (`RIFF????WEBP`, 12 bytes).
pub const SNIFF_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Png,
    Jpeg,
    Gif,
    WebP,
    Tiff,
}

impl Format {
    /// Canonical lowercase name, also used as the file extension.
    pub fn name(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpeg",
            Format::Gif => "gif",
            Format::WebP => "webp",
            Format::Tiff => "tiff",
        }
    }

    /// Identify a container from its leading bytes.
    ///
    /// Returns `None` for empty input, unknown signatures, and formats the
    /// `image` crate recognises but this crate does not ingest.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        image::guess_format(header)
            .ok()
            .and_then(Self::from_image_format)
    }

    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Format::Png),
            image::ImageFormat::Jpeg => Some(Format::Jpeg),
            image::ImageFormat::Gif => Some(Format::Gif),
            image::ImageFormat::WebP => Some(Format::WebP),
            image::ImageFormat::Tiff => Some(Format::Tiff),
            _ => None,
        }
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Format::Png => image::ImageFormat::Png,
            Format::Jpeg => image::ImageFormat::Jpeg,
            Format::Gif => image::ImageFormat::Gif,
            Format::WebP => image::ImageFormat::WebP,
            Format::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_known_signatures() {
        assert_eq!(Format::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), Some(Format::Png));
        assert_eq!(Format::sniff(b"\xff\xd8\xff\xe0\0\x10JFIF"), Some(Format::Jpeg));
        assert_eq!(Format::sniff(b"GIF89a\x10\0\x10\0"), Some(Format::Gif));
        assert_eq!(Format::sniff(b"GIF87a\x10\0\x10\0"), Some(Format::Gif));
        assert_eq!(Format::sniff(b"RIFF\x24\0\0\0WEBPVP8L"), Some(Format::WebP));
        assert_eq!(Format::sniff(b"II*\0\x08\0\0\0"), Some(Format::Tiff));
    }

    #[test]
    fn sniff_rejects_unknown_and_empty() {
        assert_eq!(Format::sniff(b""), None);
        assert_eq!(Format::sniff(b"not an image at all"), None);
    }

    #[test]
    fn sniff_rejects_unsupported_containers() {
        // BMP is recognised by the image crate but not ingested
        assert_eq!(Format::sniff(b"BM\x36\0\0\0\0\0\0\0\x36\0\0\0"), None);
    }

    #[test]
    fn names_are_lowercase_extensions() {
        assert_eq!(Format::Png.to_string(), "png");
        assert_eq!(Format::Jpeg.to_string(), "jpeg");
        assert_eq!(Format::WebP.to_string(), "webp");
    }

    #[test]
    fn image_format_mapping_roundtrips() {
        for format in [Format::Png, Format::Jpeg, Format::Gif, Format::WebP, Format::Tiff] {
            assert_eq!(Format::from_image_format(format.to_image_format()), Some(format));
        }
    }

    #[test]
    fn serializes_as_name() {
        assert_eq!(serde_json::to_string(&Format::WebP).unwrap(), "\"webp\"");
    }
}
