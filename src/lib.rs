pub mod config;
pub mod constants;
pub mod error;
pub mod fallback;
pub mod gemini;
pub mod locale;
pub mod prediction;
pub mod product;
pub mod prompt;
pub mod render;
pub mod session;
pub mod web_server;

pub use config::{ApiKey, GeminiConfig, GenerationConfig, ServerConfig};
pub use error::{ErrorKind, PredictionError, SessionError};
pub use fallback::fallback_prediction;
pub use gemini::GeminiClient;
pub use locale::Locale;
pub use prediction::{PredictionResult, PriceRange, PriceTier};
pub use product::{Category, ProductAttributes};
pub use prompt::build_prompt;
pub use render::PredictionView;
pub use session::{PredictionOutcome, PredictionSession, SessionStore, Submission};
