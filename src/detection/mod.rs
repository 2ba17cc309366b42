pub mod tampering;

use serde::{Deserialize, Serialize};

use crate::model::ModelLabel;

/// Externally visible verdict. Maps one-to-one onto [`ModelLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Tampered,
    Authentic,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Tampered => "tampered",
            Verdict::Authentic => "authentic",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Verdict::Tampered => {
                concat!(
                    "This image shows signs of digital manipulation. ",
                    "Consider verifying its authenticity through additional means."
                )
            }
            Verdict::Authentic => {
                "No significant signs of tampering detected. The image appears to be authentic."
            }
        }
    }
}

impl From<ModelLabel> for Verdict {
    fn from(label: ModelLabel) -> Self {
        match label {
            ModelLabel::Fake => Verdict::Tampered,
            ModelLabel::Real => Verdict::Authentic,
        }
    }
}

impl From<Verdict> for ModelLabel {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Tampered => ModelLabel::Fake,
            Verdict::Authentic => ModelLabel::Real,
        }
    }
}
