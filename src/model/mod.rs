pub mod onnx;
pub mod state;

use std::sync::Arc;

use serde::Serialize;

use crate::{
    analysis::features::FeatureTensor,
    error::{ForensicsError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelLabel {
    Fake,
    Real,
}

impl ModelLabel {
    pub const CLASSES: [ModelLabel; 2] = [ModelLabel::Fake, ModelLabel::Real];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelLabel::Fake => "fake",
            ModelLabel::Real => "real",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::CLASSES.get(index).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: ModelLabel,
    pub confidence: f32,
}

impl Prediction {
    pub fn from_probabilities(probabilities: &[f32]) -> Result<Self> {
        if probabilities.len() != ModelLabel::CLASSES.len() {
            return Err(ForensicsError::ShapeMismatch {
                expected: format!("{} class probabilities", ModelLabel::CLASSES.len()),
                actual: format!("{} values", probabilities.len()),
            });
        }

        let (index, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        if !confidence.is_finite() {
            return Err(ForensicsError::Inference("model produced non-finite probabilities".into()));
        }

        let label = ModelLabel::from_index(index).ok_or_else(|| {
            ForensicsError::Inference(format!("no label for class index {}", index))
        })?;

        Ok(Self { label, confidence })
    }
}

pub trait Classifier: Send + Sync {
    fn predict(&self, input: &FeatureTensor) -> Result<Vec<f32>>;

    fn name(&self) -> &str;
}

pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Classifier>>;

    fn describe(&self) -> String;
}
