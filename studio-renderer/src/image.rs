//! Image decoding.
//!
//! Every render decodes layer sources from their encoded bytes, so filters
//! never compound across renders.

use image::RgbaImage;
use studio_core::ImageSource;

use crate::error::{RenderError, RenderResult};

/// Decode an image source to straight-alpha RGBA.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the bytes are not a supported image, and
/// [`RenderError::ZeroDimension`] if the image is empty.
pub fn decode(source: &ImageSource) -> RenderResult<RgbaImage> {
    let img = image::load_from_memory(source.bytes())
        .map_err(|e| RenderError::Decode(format!("{} ({}): {e}", source.mime_type, source.len())))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::ZeroDimension { width, height });
    }
    Ok(rgba)
}

/// Fully decode a source and return its natural dimensions.
///
/// # Errors
///
/// See [`decode`].
pub fn decoded_dimensions(source: &ImageSource) -> RenderResult<(u32, u32)> {
    decode(source).map(|rgba| rgba.dimensions())
}

/// Convert straight-alpha RGBA into a premultiplied tiny-skia pixmap.
pub(crate) fn to_pixmap(image: &RgbaImage) -> RenderResult<tiny_skia::Pixmap> {
    let (width, height) = image.dimensions();
    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let premul = |c: u8| -> u8 {
            // (c * a + 127) / 255, exact in u16 and always <= 255.
            let v = (u16::from(c) * u16::from(a) + 127) / 255;
            u8::try_from(v).unwrap_or(u8::MAX)
        };
        data.extend_from_slice(&[premul(r), premul(g), premul(b), a]);
    }
    let size = tiny_skia::IntSize::from_wh(width, height)
        .ok_or(RenderError::ZeroDimension { width, height })?;
    tiny_skia::Pixmap::from_vec(data, size)
        .ok_or_else(|| RenderError::Surface(format!("cannot wrap {width}x{height} image")))
}
