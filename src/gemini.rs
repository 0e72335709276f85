use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::{ApiKey, GeminiConfig, GenerationConfig};
use crate::error::PredictionError;
use crate::prediction::PredictionResult;

// Structures matching Gemini's generateContent endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Client for the hosted text-generation model.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: ApiKey,
    generation: GenerationConfig,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, PredictionError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
            generation: config.generation.clone(),
        })
    }

    /// Sends `prompt` and returns the validated prediction found in the reply.
    ///
    /// One request, no retries.
    #[instrument(skip(self, prompt), fields(endpoint = %self.endpoint))]
    pub async fn predict(&self, prompt: &str) -> Result<PredictionResult, PredictionError> {
        let text = self.generate_text(prompt).await?;
        debug!(response = %text, "Received model response");

        PredictionResult::from_model_text(&text).map_err(|e| {
            error!(error = %e, "Model response could not be turned into a prediction");
            e
        })
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, PredictionError> {
        let request_payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: &self.generation,
        };

        debug!(prompt_len = prompt.len(), "Sending prediction request");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose())])
            .json(&request_payload)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the URL, which includes the key
                let e = e.without_url();
                error!(error = %e, "Failed to reach the prediction API");
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Prediction API request failed");
            return Err(PredictionError::HttpStatus { status, body });
        }

        let payload = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(reqwest::Error::without_url)?;

        payload
            .into_first_text()
            .filter(|text| !text.trim().is_empty())
            .ok_or(PredictionError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let generation = GenerationConfig::default();
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: &generation,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["topK"], 32);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn test_first_text_extraction() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "first" }, { "text": "second" }] } },
                { "content": { "parts": [{ "text": "other candidate" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.into_first_text().as_deref(), Some("first"));
    }

    #[test]
    fn test_missing_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();
        assert_eq!(response.into_first_text(), None);

        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] }))
                .unwrap();
        assert_eq!(response.into_first_text(), None);
    }
}
