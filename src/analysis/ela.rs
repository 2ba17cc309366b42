use std::{env, io::Cursor, path::PathBuf};

use image::{DynamicImage, ImageReader, RgbImage, codecs::jpeg::JpegEncoder};

use crate::{
    ElaResult,
    error::{ForensicsError, Result},
    image_utils::{abs_difference, channel_max, channel_mean, stretch_to_full_range},
    scoped::{CleanupPolicy, ScopedTempFile},
};

pub const DEFAULT_QUALITY: u8 = 91;

pub const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

pub struct ElaAnalyzer {
    quality: u8,
    scratch_dir: PathBuf,
    parallel: bool,
}

impl ElaAnalyzer {
    pub fn new(quality: u8) -> Self {
        Self {
            quality,
            scratch_dir: env::temp_dir(),
            parallel: true,
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn analyze(&self, image: &DynamicImage) -> Result<ElaResult> {
        if !(1..=100).contains(&self.quality) {
            return Err(ForensicsError::InvalidParameter(format!(
                "JPEG quality must be in 1..=100, got {}",
                self.quality
            )));
        }

        let (width, height) = (image.width(), image.height());
        if width > MAX_JPEG_DIMENSION || height > MAX_JPEG_DIMENSION {
            return Err(ForensicsError::InvalidInput(format!(
                "image is {}x{}, JPEG recompression supports at most {} px per side",
                width, height, MAX_JPEG_DIMENSION
            )));
        }

        let rgb_image = image.to_rgb8();
        let recompressed = self.recompress_jpeg(&rgb_image)?;

        let difference = abs_difference(&rgb_image, &recompressed, self.parallel)?;

        Ok(Self::normalize_difference(&difference))
    }

    pub fn normalize_difference(difference: &RgbImage) -> ElaResult {
        // A perfectly reproducible image has no error level at all.
        let max_difference = channel_max(difference).max(1);
        let scale = 255.0 / max_difference as f64;

        ElaResult {
            image: stretch_to_full_range(difference, max_difference),
            max_difference,
            mean_difference: channel_mean(difference),
            scale,
        }
    }

    fn recompress_jpeg(&self, image: &RgbImage) -> Result<RgbImage> {
        let mut buffer = Cursor::new(Vec::new());

        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
            encoder
                .encode_image(image)
                .map_err(|e| {
                    ForensicsError::AnalysisFailed(format!("JPEG recompression failed: {}", e))
                })?;
        }

        let mut scratch = ScopedTempFile::create(
            &self.scratch_dir,
            "temp_ela_",
            ".jpg",
            CleanupPolicy::BestEffort,
        )?;
        scratch.write_all(buffer.get_ref())?;

        let recompressed = ImageReader::open(scratch.path())?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                ForensicsError::AnalysisFailed(format!("could not read recompressed image: {}", e))
            })?;

        scratch.finish()?;

        Ok(recompressed.to_rgb8())
    }
}

impl Default for ElaAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY)
    }
}
