use image::imageops::{self, FilterType};
use ndarray::{Array4, ArrayView4};

use crate::{
    ElaResult,
    error::{ForensicsError, Result},
};

pub const DEFAULT_INPUT_SIZE: u32 = 128;

/// Batch-of-one, height, width, channel tensor with values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct FeatureTensor {
    data: Array4<f32>,
}

impl FeatureTensor {
    pub fn shape(&self) -> [usize; 4] {
        let (n, h, w, c) = self.data.dim();
        [n, h, w, c]
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// Contiguous row-major samples, in NHWC order.
    pub fn as_slice(&self) -> Option<&[f32]> {
        self.data.as_slice()
    }
}

pub struct FeaturePreparer {
    size: u32,
    filter: FilterType,
}

impl FeaturePreparer {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            filter: FilterType::CatmullRom,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn prepare(&self, ela: &ElaResult) -> Result<FeatureTensor> {
        if self.size == 0 {
            return Err(ForensicsError::InvalidParameter("input size must be non-zero".into()));
        }

        let resized = imageops::resize(&ela.image, self.size, self.size, self.filter);
        let side = self.size as usize;

        let samples = resized
            .as_raw()
            .iter()
            .map(|&v| v as f32 / 255.0)
            .collect::<Vec<f32>>();

        let data = Array4::from_shape_vec((1, side, side, 3), samples).map_err(|e| {
            ForensicsError::ShapeMismatch {
                expected: format!("[1, {}, {}, 3]", side, side),
                actual: e.to_string(),
            }
        })?;

        Ok(FeatureTensor { data })
    }
}

impl Default for FeaturePreparer {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}
