use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{SummarizationClient, SummarizationClientError, SummarizationRequest, http_client};

const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";

/// Client for Hugging Face style inference endpoints running a summarization pipeline.
///
/// Requests go to `{base_url}/models/{model}` with `min_length`, `max_length` and
/// `do_sample = false`, so the same endpoint works against the hosted API or a self-hosted
/// inference server.
pub struct HuggingFaceClient {
    http: Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
}

impl HuggingFaceClient {
    /// Construct a client; `base_url` defaults to the hosted inference API.
    pub fn new(
        base_url: Option<String>,
        model: String,
        api_token: Option<String>,
    ) -> Result<Self, SummarizationClientError> {
        Ok(Self {
            http: http_client("pdfsum/summary")?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
            model,
            api_token,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<SummaryItem>),
    Single(SummaryItem),
}

#[async_trait]
impl SummarizationClient for HuggingFaceClient {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "inputs": request.text,
            "parameters": {
                "min_length": request.min_length,
                "max_length": request.max_length,
                "do_sample": false,
            },
            "options": {
                "wait_for_model": true,
            }
        });

        let mut builder = self.http.post(self.endpoint()).json(&payload);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to reach inference endpoint at {}: {error}",
                self.base_url
            ))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "model {} unavailable ({status}): {body}",
                self.model
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "inference endpoint returned {status}: {body}"
            )));
        }

        let body: InferenceResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode inference response: {error}"
            ))
        })?;

        let item = match body {
            InferenceResponse::Single(item) => item,
            InferenceResponse::Batch(items) => items.into_iter().next().ok_or_else(|| {
                SummarizationClientError::InvalidResponse("inference response was empty".into())
            })?,
        };

        Ok(item.summary_text.trim().to_string())
    }
}
