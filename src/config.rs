use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::constants;

/// Credential for the Gemini API. Resolved once at startup and passed in;
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Sampling parameters sent with every request. The defaults favour short,
/// deterministic JSON over creative text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: 32,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: ApiKey,
    /// Base URL without the `/v1beta/...` path.
    pub api_url: String,
    pub model: String,
    /// `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
    pub generation: GenerationConfig,
}

impl GeminiConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            api_url: constants::GEMINI_API_URL.clone(),
            model: constants::GEMINI_MODEL.clone(),
            request_timeout: None,
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Settings for the web UI.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub templates_dir: String,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            templates_dir: constants::TEMPLATES_DIR.clone(),
            static_dir: constants::STATIC_DIR.clone(),
        }
    }
}
