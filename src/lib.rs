use std::{fs, path::{Path, PathBuf}};

use image::RgbImage;
use serde::Deserialize;

use crate::error::{ForensicsError, Result};

pub mod error;
pub mod image_utils;
pub mod scoped;
pub mod analysis;
pub mod model;
pub mod report;
pub mod detection;

pub use analysis::{ela::ElaAnalyzer, features::{FeaturePreparer, FeatureTensor}};
pub use detection::{Verdict, tampering::TamperingDetector};
pub use model::{
    Classifier, ModelLabel, ModelLoader, Prediction,
    state::{ModelState, ModelStatus},
};
pub use report::{HealthReport, PredictionResult, artifact::{ArtifactStore, StoredArtifact}};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    pub input_size: u32,
    pub ela_quality: u8,
    pub artifact_quality: u8,
    pub artifact_dir: PathBuf,
    pub public_prefix: String,
    pub temp_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/model_casia_run1.onnx"),
            input_size: 128,
            ela_quality: 91,
            artifact_quality: 75,
            artifact_dir: PathBuf::from("static/ela"),
            public_prefix: "/static/ela".into(),
            temp_dir: None,
            max_upload_bytes: 10 * 1024 * 1024,
            parallel: true,
        }
    }
}

impl DetectorConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let qualities = [
            ("ela_quality", self.ela_quality),
            ("artifact_quality", self.artifact_quality),
        ];
        for (name, quality) in qualities {
            if !(1..=100).contains(&quality) {
                return Err(ForensicsError::InvalidParameter(format!(
                    "{} must be in 1..=100, got {}",
                    name, quality
                )));
            }
        }

        if self.input_size == 0 {
            return Err(ForensicsError::InvalidParameter("input_size must be non-zero".into()));
        }

        if self.max_upload_bytes == 0 {
            return Err(ForensicsError::InvalidParameter(
                "max_upload_bytes must be non-zero".into(),
            ));
        }

        Ok(())
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Output of the error-level-analysis transform.
#[derive(Debug, Clone)]
pub struct ElaResult {
    pub image: RgbImage,
    /// Largest per-channel difference before scaling, clamped to at least 1.
    pub max_difference: u8,
    pub mean_difference: f64,
    pub scale: f64,
}

impl ElaResult {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save(path).map_err(|e| ForensicsError::AnalysisFailed(e.to_string()))?;
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
