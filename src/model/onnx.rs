use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tract_onnx::prelude::*;

use crate::{
    analysis::features::FeatureTensor,
    error::{ForensicsError, Result},
    model::{Classifier, ModelLoader},
};

type Plan = TypedRunnableModel<TypedModel>;

/// Pre-trained tampering classifier exported to ONNX, executed with tract.
pub struct OnnxClassifier {
    plan: Plan,
    input_size: usize,
    name: String,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(path: P, input_size: u32) -> Result<Self> {
        let path = path.as_ref();
        let side = input_size as usize;

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, side, side, 3]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                ForensicsError::ModelUnavailable(format!("{}: {:#}", path.display(), e))
            })?;

        Ok(Self {
            plan,
            input_size: side,
            name: path.display().to_string(),
        })
    }

    fn to_tract_tensor(&self, input: &FeatureTensor) -> Result<Tensor> {
        let expected = [1, self.input_size, self.input_size, 3];
        if input.shape() != expected {
            return Err(ForensicsError::ShapeMismatch {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", input.shape()),
            });
        }

        let samples = input
            .as_slice()
            .ok_or_else(|| ForensicsError::Inference("feature tensor is not contiguous".into()))?;

        Tensor::from_shape(&expected, samples)
            .map_err(|e| ForensicsError::Inference(format!("{:#}", e)))
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &FeatureTensor) -> Result<Vec<f32>> {
        let tensor = self.to_tract_tensor(input)?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ForensicsError::Inference(format!("{:#}", e)))?;

        let first = outputs
            .first()
            .ok_or_else(|| ForensicsError::Inference("model returned no outputs".into()))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| ForensicsError::Inference(format!("{:#}", e)))?;

        Ok(view.iter().copied().collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    path: PathBuf,
    input_size: u32,
}

impl OnnxModelLoader {
    pub fn new(path: impl Into<PathBuf>, input_size: u32) -> Self {
        Self {
            path: path.into(),
            input_size,
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<Arc<dyn Classifier>> {
        if !self.path.exists() {
            return Err(ForensicsError::ModelUnavailable(format!(
                "model file {} not found",
                self.path.display()
            )));
        }

        let classifier = OnnxClassifier::load(&self.path, self.input_size)?;
        Ok(Arc::new(classifier))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
