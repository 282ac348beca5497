use serde::{Deserialize, Serialize};

pub const PREDICT_ROUTE: &str = "/api/predict-server";
pub const UPLOAD_FIELD: &str = "file";
pub const SERVER_MODE: &str = "server-side";

/// JSON body returned by the server-side prediction route.
///
/// `latency_ms` is the server's own measurement of decode, preprocessing and
/// inference; it excludes the time spent receiving the upload and sending
/// the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub class_id: u32,
    pub probability: f32,
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PredictResponse {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(format!(
                "probability {} is outside [0, 1]",
                self.probability
            ));
        }
        if !self.latency_ms.is_finite() || self.latency_ms < 0.0 {
            return Err(format!("latency_ms {} is not a valid duration", self.latency_ms));
        }
        Ok(())
    }
}
