use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::{
    analysis::features::FeatureTensor,
    error::{ForensicsError, Result},
    model::{Classifier, ModelLoader, Prediction},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

struct Slot {
    status: ModelStatus,
    model: Option<Arc<dyn Classifier>>,
    last_error: Option<String>,
}

// Inference runs on a cloned `Arc`, outside every lock. The loader runs under
// `load_gate` only.
pub struct ModelState {
    loader: Box<dyn ModelLoader>,
    slot: RwLock<Slot>,
    load_gate: Mutex<()>,
}

impl ModelState {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            slot: RwLock::new(Slot {
                status: ModelStatus::Unloaded,
                model: None,
                last_error: None,
            }),
            load_gate: Mutex::new(()),
        }
    }

    pub fn status(&self) -> ModelStatus {
        self.slot.read().status
    }

    pub fn is_loaded(&self) -> bool {
        self.status() == ModelStatus::Ready
    }

    pub fn last_error(&self) -> Option<String> {
        self.slot.read().last_error.clone()
    }

    /// Kicks off the startup load on a background thread. A failure is
    /// logged and left for the first request to retry.
    pub fn spawn_initial_load(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let state = Arc::clone(self);
        log::info!("Loading model from {} in the background", state.loader.describe());

        let handle = thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                if let Err(e) = state.ensure_loaded() {
                    log::warn!("Startup model load failed, will retry on first request: {}", e);
                }
            })?;

        Ok(handle)
    }

    /// Returns the ready model, loading it inline if no load has succeeded yet.
    pub fn ensure_loaded(&self) -> Result<Arc<dyn Classifier>> {
        if let Some(model) = self.ready_model() {
            return Ok(model);
        }

        let _gate = self.load_gate.lock();

        // Someone else may have finished loading while we waited on the gate.
        if let Some(model) = self.ready_model() {
            return Ok(model);
        }

        self.slot.write().status = ModelStatus::Loading;

        match self.loader.load() {
            Ok(model) => {
                log::info!("Model loaded successfully: {}", model.name());
                let mut slot = self.slot.write();
                slot.status = ModelStatus::Ready;
                slot.model = Some(Arc::clone(&model));
                slot.last_error = None;
                Ok(model)
            }
            Err(e) => {
                log::warn!("Error loading model from {}: {}", self.loader.describe(), e);
                let mut slot = self.slot.write();
                slot.status = ModelStatus::Failed;
                slot.last_error = Some(e.to_string());
                Err(ForensicsError::ModelUnavailable(e.to_string()))
            }
        }
    }

    pub fn predict(&self, input: &FeatureTensor) -> Result<Prediction> {
        let model = self.ensure_loaded()?;
        let probabilities = model.predict(input)?;
        Prediction::from_probabilities(&probabilities)
    }

    fn ready_model(&self) -> Option<Arc<dyn Classifier>> {
        let slot = self.slot.read();
        match slot.status {
            ModelStatus::Ready => slot.model.clone(),
            _ => None,
        }
    }
}
