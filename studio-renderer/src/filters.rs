//! Pixel implementations of the layer filter stack.

use image::RgbaImage;
use studio_core::{FilterStack, ImageFilter};

/// Apply every filter in the stack, in order, to straight-alpha pixels.
/// Alpha is never touched.
pub fn apply(stack: &FilterStack, image: &mut RgbaImage) {
    for filter in stack.iter() {
        apply_one(*filter, image);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn apply_one(filter: ImageFilter, image: &mut RgbaImage) {
    match filter.clamped() {
        ImageFilter::Brightness { amount } => {
            let shift = amount * 255.0;
            map_rgb(image, |c| c + shift);
        }
        ImageFilter::Contrast { amount } => {
            let c = (amount * 255.0).floor();
            let factor = 259.0 * (c + 255.0) / (255.0 * (259.0 - c));
            map_rgb(image, |v| factor * (v - 128.0) + 128.0);
        }
        ImageFilter::Saturation { amount } => {
            let adjust = -amount;
            for pixel in image.pixels_mut() {
                let [r, g, b, _] = pixel.0;
                let max = f32::from(r.max(g).max(b));
                for channel in &mut pixel.0[..3] {
                    let v = f32::from(*channel);
                    *channel = to_channel(v + (max - v) * adjust);
                }
            }
        }
        ImageFilter::Tint { color, strength } => {
            let t = strength * color.opacity();
            let target = [f32::from(color.r), f32::from(color.g), f32::from(color.b)];
            for pixel in image.pixels_mut() {
                for (channel, goal) in pixel.0[..3].iter_mut().zip(target) {
                    let v = f32::from(*channel);
                    *channel = to_channel(v + (goal - v) * t);
                }
            }
        }
    }
}

fn map_rgb(image: &mut RgbaImage, f: impl Fn(f32) -> f32) {
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = to_channel(f(f32::from(*channel)));
        }
    }
}
