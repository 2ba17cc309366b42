pub mod artifact;

use serde::Serialize;

use crate::{detection::Verdict, error::ForensicsError, model::state::ModelStatus};

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub prediction: Verdict,
    pub confidence: f64,
    pub ela_image: String,
    pub ela_path: String,
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_status: ModelStatus,
}

impl HealthReport {
    pub fn from_status(model_status: ModelStatus) -> Self {
        Self {
            status: "ok",
            model_loaded: model_status == ModelStatus::Ready,
            model_status,
        }
    }
}

/// Error body handed to the HTTP boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: &'static str,
    pub detail: String,
    pub status: u16,
}

impl From<&ForensicsError> for ErrorReport {
    fn from(error: &ForensicsError) -> Self {
        Self {
            error: error.kind(),
            detail: error.to_string(),
            status: error.status_code(),
        }
    }
}

impl PredictionResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl HealthReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_prediction_json_shape() {
        let result = PredictionResult {
            prediction: Verdict::Tampered,
            confidence: 0.75,
            ela_image: "data:image/jpeg;base64,AAAA".into(),
            ela_path: "/static/ela/ela_0.jpg".into(),
            processing_time_ms: 12.5,
        };

        let json: Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["prediction"], "tampered");
        assert_eq!(json["confidence"], 0.75);
        assert_eq!(json["ela_path"], "/static/ela/ela_0.jpg");
        assert_eq!(json["processing_time_ms"], 12.5);
    }

    #[test]
    fn test_health_report() {
        let json: Value = serde_json::from_str(
            &HealthReport::from_status(ModelStatus::Failed).to_json().unwrap(),
        ).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model_loaded"], false);
        assert_eq!(json["model_status"], "failed");

        assert!(HealthReport::from_status(ModelStatus::Ready).model_loaded);
    }

    #[test]
    fn test_error_report_status() {
        let error = ForensicsError::InvalidInput("File must be an image".into());
        let report = ErrorReport::from(&error);
        assert_eq!(report.status, 400);
        assert_eq!(report.error, "invalid_input");
        assert!(report.detail.contains("File must be an image"));
    }
}
