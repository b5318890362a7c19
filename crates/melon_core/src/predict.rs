//! The `/predict` round trip: request building, reply parsing, display formatting.

use crate::upload::{SelectedFile, UploadError};
use reqwest::Url;
use reqwest::blocking::{Client, multipart};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Fixed endpoint path on the classification server.
pub const PREDICT_PATH: &str = "/predict";
/// Multipart field carrying the image bytes.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("response is missing prediction fields: {0}")]
    MalformedPrediction(#[source] serde_json::Error),
    #[error("prediction worker stopped before reporting")]
    Interrupted,
}

/// Successful classification as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub label: String,
    /// Fraction in [0,1].
    pub confidence: f64,
    pub details: String,
    /// URL or server-relative path of the annotated image.
    pub image_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictReply {
    Prediction(Prediction),
    /// The server answered with an `error` member.
    Rejected(String),
}

/// Interprets a `/predict` response body.
///
/// The `error` member decides the branch: when it is truthy the reply is a
/// rejection carrying its text, otherwise the body must hold a complete
/// [`Prediction`].
pub fn parse_reply(body: &str) -> Result<PredictReply, PredictError> {
    let value: Value = serde_json::from_str(body).map_err(PredictError::Decode)?;
    if let Some(message) = value.get("error").and_then(error_message) {
        return Ok(PredictReply::Rejected(message));
    }
    serde_json::from_value(value)
        .map(PredictReply::Prediction)
        .map_err(PredictError::MalformedPrediction)
}

fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Renders a confidence fraction as a percentage with two decimals.
///
/// Exact ties round away from zero on the exact binary value, so `0.00125`
/// shows as `0.13%`; negative zero shows as `0.00%`.
pub fn format_confidence(confidence: f64) -> String {
    let scaled = confidence * 100.0;
    let scaled = if scaled == 0.0 { 0.0 } else { scaled };
    match Decimal::from_f64_retain(scaled) {
        Some(d) => {
            let rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.2}%")
        }
        None => format!("{scaled:.2}%"),
    }
}

/// Remote classification backend.
pub trait Classifier: Send + Sync {
    fn predict(&self, file: &SelectedFile) -> Result<PredictReply, PredictError>;
    /// Downloads the annotated image referenced by [`Prediction::image_path`].
    fn fetch_image(&self, image_path: &str) -> Result<Vec<u8>, PredictError>;
}

/// [`Classifier`] talking to the HTTP server.
pub struct HttpClassifier {
    client: Client,
    base: Url,
}

impl HttpClassifier {
    /// `timeout` of `None` lets the request run until it completes or fails.
    pub fn new(server_url: &str, timeout: Option<Duration>) -> Result<Self, PredictError> {
        let base = Url::parse(server_url).map_err(|e| PredictError::InvalidUrl {
            url: server_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn resolve(&self, path: &str) -> Result<Url, PredictError> {
        self.base.join(path).map_err(|e| PredictError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Classifier for HttpClassifier {
    #[tracing::instrument(skip(self, file), fields(file = %file.name))]
    fn predict(&self, file: &SelectedFile) -> Result<PredictReply, PredictError> {
        let bytes = file.read_bytes()?;
        let part = multipart::Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = multipart::Form::new().part(FILE_FIELD, part);

        let url = self.resolve(PREDICT_PATH)?;
        let response = self.client.post(url).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;
        tracing::info!(%status, len = body.len(), "predict response received");
        parse_reply(&body)
    }

    fn fetch_image(&self, image_path: &str) -> Result<Vec<u8>, PredictError> {
        let url = self.resolve(image_path)?;
        let bytes = self.client.get(url).send()?.error_for_status()?.bytes()?;
        Ok(bytes.to_vec())
    }
}
