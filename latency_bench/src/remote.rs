use crate::{
    config::RemoteConfig,
    error::BenchError,
    latency::{elapsed_ms, LatencyMeasurement},
    selection::SelectedImage,
};
use classify_core::{PredictResponse, UPLOAD_FIELD};
use reqwest::multipart::{Form, Part};
use std::time::{Duration, Instant};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq)]
pub struct RemotePrediction {
    pub class_id: u32,
    pub probability: f32,
    pub label: Option<String>,
    pub latency: LatencyMeasurement,
}

impl RemotePrediction {
    pub fn from_response(response: PredictResponse, total_ms: f64) -> Self {
        Self {
            class_id: response.class_id,
            probability: response.probability,
            label: response.label,
            latency: LatencyMeasurement::remote(total_ms, response.latency_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteClient {
    pub fn new(remote_config: &RemoteConfig) -> Result<Self, BenchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(remote_config.timeout_ms))
            .build()
            .map_err(|e| BenchError::RemoteInference(format!("failed to build client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: remote_config.get_endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Uploads the original bytes and times the round trip from just before
    /// the request until the response is parsed.
    #[instrument(skip_all, fields(image = %image.name))]
    pub async fn classify(&self, image: &SelectedImage) -> Result<RemotePrediction, BenchError> {
        let form = upload_form(image);

        let start = Instant::now();
        let response = self.send(form).await?;
        let total_ms = elapsed_ms(start);

        tracing::debug!(
            "Remote prediction: class_id={}, probability={:.4}, total={:.2}ms, server={:.2}ms",
            response.class_id,
            response.probability,
            total_ms,
            response.latency_ms
        );

        Ok(RemotePrediction::from_response(response, total_ms))
    }

    async fn send(&self, form: Form) -> Result<PredictResponse, BenchError> {
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BenchError::RemoteInference(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BenchError::RemoteInference(format!(
                "server returned {}: {}",
                status,
                body.trim()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BenchError::RemoteInference(format!("failed to read body: {}", e)))?;

        parse_response(&body)
    }
}

fn upload_form(image: &SelectedImage) -> Form {
    let part = Part::bytes(image.bytes.to_vec()).file_name(image.name.clone());
    Form::new().part(UPLOAD_FIELD, part)
}

pub fn parse_response(body: &[u8]) -> Result<PredictResponse, BenchError> {
    let response: PredictResponse = serde_json::from_slice(body)
        .map_err(|e| BenchError::RemoteInference(format!("malformed response: {}", e)))?;
    response
        .validate()
        .map_err(|e| BenchError::RemoteInference(format!("invalid response: {}", e)))?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_is_total_minus_server_latency() {
        let body = br#"{"class_id": 7, "probability": 0.82, "latency_ms": 15.0}"#;
        let response = parse_response(body).unwrap();
        let prediction = RemotePrediction::from_response(response, 40.0);

        assert_eq!(prediction.class_id, 7);
        assert_eq!(prediction.probability, 0.82);
        assert_eq!(prediction.latency.total_ms, 40.0);
        assert_eq!(prediction.latency.network_ms(), 25.0);
        assert_eq!(prediction.latency.inference_ms(), 15.0);
    }

    #[test]
    fn test_malformed_json_is_a_remote_error() {
        for body in [
            &b"{\"class_id\": 7, \"probability\": 0.8"[..],
            b"<html>502 Bad Gateway</html>",
            br#"{"class_id": 7, "latency_ms": 1.0}"#,
            br#"{"class_id": 7, "probability": 3.0, "latency_ms": 1.0}"#,
        ] {
            assert!(matches!(
                parse_response(body),
                Err(BenchError::RemoteInference(_))
            ));
        }
    }

    #[test]
    fn test_endpoint_from_config() {
        let client = RemoteClient::new(&RemoteConfig {
            base_url: "http://127.0.0.1:8000/".to_string(),
            timeout_ms: 1000,
        })
        .unwrap();

        assert_eq!(client.endpoint(), "http://127.0.0.1:8000/api/predict-server");
    }
}
