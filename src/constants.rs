// Defaults for configuration values, overridable from the environment.

use std::env;

lazy_static::lazy_static! {
    pub static ref GEMINI_API_URL: String = env::var("GEMINI_API_URL").unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    pub static ref GEMINI_MODEL: String = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
    pub static ref TEMPLATES_DIR: String = env::var("PRICE_WHISPERER_TEMPLATES").unwrap_or_else(|_| "templates".to_string());
    pub static ref STATIC_DIR: String = env::var("PRICE_WHISPERER_STATIC").unwrap_or_else(|_| "static".to_string());
}

pub const DEFAULT_PORT: u16 = 9900;

// Shown whenever the fallback prediction replaces a failed request.
pub const FALLBACK_NOTICE: &str =
    "Failed to get a price prediction. Please try again. The figures shown are placeholder values.";

// Shown when the model returned a valid prediction.
pub const SUCCESS_NOTICE: &str = "Prediction complete. The price prediction was retrieved successfully.";

// Cookie carrying the browser's prediction session id.
pub const SESSION_COOKIE: &str = "price_whisperer_session";
