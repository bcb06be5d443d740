//! In-memory image sources carried by layers and mockups.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// WebP image.
    WebP,
    /// GIF image.
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// Canonical MIME type, if the format is known.
    #[must_use]
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            Self::Png => Some("image/png"),
            Self::Jpeg => Some("image/jpeg"),
            Self::WebP => Some("image/webp"),
            Self::Gif => Some("image/gif"),
            Self::Unknown => None,
        }
    }
}

/// Encoded image bytes plus their MIME type.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    /// MIME type of the encoded bytes, e.g. `image/png`.
    pub mime_type: String,
    /// Encoded image bytes (base64 in serialized form).
    #[serde(with = "base64_bytes")]
    data: Arc<[u8]>,
}

impl ImageSource {
    /// Wrap encoded bytes with an explicit MIME type.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Wrap encoded bytes, sniffing the MIME type from magic bytes and falling
    /// back to `fallback_mime` when the format is not recognized.
    #[must_use]
    pub fn sniffed(data: impl Into<Arc<[u8]>>, fallback_mime: &str) -> Self {
        let data = data.into();
        let mime = ImageFormat::from_magic_bytes(&data)
            .mime_type()
            .unwrap_or(fallback_mime)
            .to_string();
        Self { mime_type: mime, data }
    }

    /// Decode a base64 payload.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidImageData`] if the payload is not valid base64.
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> CoreResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| CoreError::InvalidImageData(format!("Failed to decode base64: {e}")))?;
        Ok(Self::new(mime_type, bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidImageData`] if the URI is malformed or not base64.
    pub fn from_data_uri(uri: &str) -> CoreResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| CoreError::InvalidImageData("Not a data URI".to_string()))?;
        let (metadata, payload) = rest.split_once(',').ok_or_else(|| {
            CoreError::InvalidImageData("Invalid data URI: missing comma".to_string())
        })?;
        let Some(mime) = metadata.strip_suffix(";base64") else {
            return Err(CoreError::InvalidImageData(
                "Only base64 data URIs are supported".to_string(),
            ));
        };
        Self::from_base64(mime, payload)
    }

    /// Encode as a base64 payload.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Encode as a `data:` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// The encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of encoded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the source carries no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Format detected from the bytes themselves.
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        ImageFormat::from_magic_bytes(&self.data)
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

mod base64_bytes {
    use std::sync::Arc;

    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<[u8]>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(Arc::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_mime() {
        assert_eq!(ImageFormat::from_mime("image/png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_mime("IMAGE/JPEG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_mime("text/html"), ImageFormat::Unknown);
    }

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(&[1, 2]), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_parsing() {
        let source =
            ImageSource::from_data_uri(&format!("data:image/png;base64,{PNG_1X1}")).expect("uri");
        assert_eq!(source.mime_type, "image/png");
        assert_eq!(source.format(), ImageFormat::Png);
        assert!(source.to_data_uri().ends_with(PNG_1X1));
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(ImageSource::from_data_uri("not a data uri").is_err());
        assert!(ImageSource::from_data_uri("data:image/png").is_err());
        assert!(ImageSource::from_data_uri("data:image/png,abc").is_err());
    }

    #[test]
    fn test_sniffed_prefers_magic_bytes() {
        let source = ImageSource::from_base64("application/octet-stream", PNG_1X1).expect("b64");
        let sniffed = ImageSource::sniffed(source.bytes().to_vec(), "image/jpeg");
        assert_eq!(sniffed.mime_type, "image/png");
    }

    #[test]
    fn test_serde_roundtrip_uses_base64() {
        let source = ImageSource::from_base64("image/png", PNG_1X1).expect("b64");
        let json = serde_json::to_string(&source).expect("serialize");
        assert!(json.contains(PNG_1X1));
        let back: ImageSource = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, source);
    }
}
