use image::RgbImage;
use rayon::prelude::*;

use crate::error::{ForensicsError, Result};

/// Per-channel absolute difference of two equally sized RGB images.
pub fn abs_difference(a: &RgbImage, b: &RgbImage, parallel: bool) -> Result<RgbImage> {
    if a.dimensions() != b.dimensions() {
        return Err(ForensicsError::AnalysisFailed(format!(
            "dimension mismatch: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }

    let (width, height) = a.dimensions();
    let raw = if parallel {
        a.as_raw()
            .par_iter()
            .zip(b.as_raw().par_iter())
            .map(|(&x, &y)| x.abs_diff(y))
            .collect::<Vec<u8>>()
    } else {
        a.as_raw()
            .iter()
            .zip(b.as_raw().iter())
            .map(|(&x, &y)| x.abs_diff(y))
            .collect::<Vec<u8>>()
    };

    RgbImage::from_raw(width, height, raw)
        .ok_or_else(|| ForensicsError::AnalysisFailed("difference buffer has wrong length".into()))
}

/// Highest sample value across every pixel and channel.
pub fn channel_max(image: &RgbImage) -> u8 {
    image.as_raw().iter().copied().max().unwrap_or(0)
}

pub fn channel_mean(image: &RgbImage) -> f64 {
    let raw = image.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    raw.iter().map(|&v| v as f64).sum::<f64>() / raw.len() as f64
}

/// Stretches `image` so that `max` maps to 255. Integer arithmetic keeps the
/// brightest sample at exactly 255 and truncates the rest.
pub fn stretch_to_full_range(image: &RgbImage, max: u8) -> RgbImage {
    let max = max.max(1) as u32;
    let mut out = image.clone();

    for value in out.iter_mut() {
        *value = ((*value as u32 * 255) / max).min(255) as u8;
    }

    out
}
