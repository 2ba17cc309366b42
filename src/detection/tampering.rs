use std::{fs, path::Path, sync::Arc, time::Instant};

use image::ImageReader;

use crate::{
    DetectorConfig, ElaResult,
    analysis::{ela::ElaAnalyzer, features::FeaturePreparer},
    detection::Verdict,
    error::{ForensicsError, Result},
    model::{ModelLoader, Prediction, onnx::OnnxModelLoader, state::ModelState},
    report::{HealthReport, PredictionResult, artifact::ArtifactStore},
    scoped::{CleanupPolicy, ScopedTempFile},
};

pub struct TamperingDetector {
    config: DetectorConfig,
    model: Arc<ModelState>,
    ela: ElaAnalyzer,
    features: FeaturePreparer,
    store: ArtifactStore,
}

impl TamperingDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let loader = OnnxModelLoader::new(&config.model_path, config.input_size);
        Self::with_loader(config, loader)
    }

    pub fn with_loader(
        config: DetectorConfig,
        loader: impl ModelLoader + 'static,
    ) -> Result<Self> {
        Self::with_model_state(config, Arc::new(ModelState::new(loader)))
    }

    pub fn with_model_state(config: DetectorConfig, model: Arc<ModelState>) -> Result<Self> {
        config.validate()?;

        let ela = ElaAnalyzer::new(config.ela_quality)
            .with_scratch_dir(config.temp_dir())
            .with_parallel(config.parallel);
        let features = FeaturePreparer::new(config.input_size);
        let store = ArtifactStore::new(&config.artifact_dir, config.public_prefix.clone())
            .with_quality(config.artifact_quality);
        store.ensure_dir()?;
        fs::create_dir_all(config.temp_dir())?;

        Ok(Self { config, model, ela, features, store })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn model_state(&self) -> &Arc<ModelState> {
        &self.model
    }

    /// Starts the best-effort startup load of the model.
    pub fn start(&self) -> Result<()> {
        self.model.spawn_initial_load()?;
        Ok(())
    }

    pub fn health(&self) -> HealthReport {
        HealthReport::from_status(self.model.status())
    }

    pub fn predict_tampering(&self, bytes: &[u8], content_type: &str) -> Result<PredictionResult> {
        self.validate_upload(bytes, content_type)?;

        let upload = ScopedTempFile::with_contents(
            &self.config.temp_dir(),
            "upload_",
            ".img",
            CleanupPolicy::Required,
            bytes,
        )?;

        let start = Instant::now();
        let classified = self.classify_upload(upload.path());

        // The upload is gone before anything is written to the artifact directory.
        let released = upload.finish();
        let (ela, prediction) = classified?;
        released?;

        let artifact = self.store.persist(&ela)?;
        let verdict = Verdict::from(prediction.label);
        let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        log::debug!(
            "Predicted {} ({:.3}) for {}x{} upload in {:.1} ms, artifact {}",
            verdict.as_str(),
            prediction.confidence,
            ela.image.width(),
            ela.image.height(),
            processing_time_ms,
            artifact.id
        );

        Ok(PredictionResult {
            prediction: verdict,
            confidence: prediction.confidence as f64,
            ela_image: artifact.data_uri,
            ela_path: artifact.public_path,
            processing_time_ms,
        })
    }

    fn validate_upload(&self, bytes: &[u8], content_type: &str) -> Result<()> {
        let is_image = content_type
            .trim()
            .split_once('/')
            .is_some_and(|(top, sub)| top.eq_ignore_ascii_case("image") && !sub.is_empty());
        if !is_image {
            return Err(ForensicsError::InvalidInput(format!(
                "File must be an image, got content type '{}'",
                content_type
            )));
        }

        if bytes.is_empty() {
            return Err(ForensicsError::InvalidInput("No file uploaded".into()));
        }

        if bytes.len() > self.config.max_upload_bytes {
            return Err(ForensicsError::InvalidInput(format!(
                "File size {} exceeds the {} byte limit",
                bytes.len(),
                self.config.max_upload_bytes
            )));
        }

        Ok(())
    }

    fn classify_upload(&self, upload_path: &Path) -> Result<(ElaResult, Prediction)> {
        let source = ImageReader::open(upload_path)?
            .with_guessed_format()?
            .decode()
            .map_err(ForensicsError::Decode)?;

        let ela = self.ela.analyze(&source)?;
        let tensor = self.features.prepare(&ela)?;
        let prediction = self.model.predict(&tensor)?;

        Ok((ela, prediction))
    }
}
