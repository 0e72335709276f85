use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PredictionError;

/// Price tier of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Low,
    Medium,
    High,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Low => "low",
            PriceTier::Medium => "medium",
            PriceTier::High => "high",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(PriceTier::Low),
            "medium" => Some(PriceTier::Medium),
            "high" => Some(PriceTier::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: String,
    pub max: String,
}

/// A complete price prediction, always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub predicted_price: String,
    pub price_range: PriceRange,
    pub confidence: u8,
    pub price_type: PriceTier,
    pub factors: Vec<String>,
}

impl PredictionResult {
    /// Parses model output text into a validated prediction.
    pub fn from_model_text(text: &str) -> Result<Self, PredictionError> {
        let json = extract_json_object(text).ok_or(PredictionError::NoJsonObject)?;
        let value: Value = serde_json::from_str(json).map_err(PredictionError::InvalidJson)?;
        Self::from_value(&value)
    }

    /// Checks every named field of `value` and builds the prediction from it.
    ///
    /// Values are copied as-is: prices stay the strings the model produced.
    pub fn from_value(value: &Value) -> Result<Self, PredictionError> {
        let object = value
            .as_object()
            .ok_or_else(|| schema_error("expected a JSON object"))?;

        let predicted_price = price_field(object.get("predictedPrice"), "predictedPrice")?;

        let range = object
            .get("priceRange")
            .and_then(Value::as_object)
            .ok_or_else(|| schema_error("priceRange must be an object"))?;
        let price_range = PriceRange {
            min: price_field(range.get("min"), "priceRange.min")?,
            max: price_field(range.get("max"), "priceRange.max")?,
        };

        let confidence = object
            .get("confidence")
            .and_then(Value::as_u64)
            .filter(|confidence| *confidence <= 100)
            .ok_or_else(|| schema_error("confidence must be an integer between 0 and 100"))?
            as u8;

        let price_type = object
            .get("priceType")
            .and_then(Value::as_str)
            .and_then(PriceTier::parse)
            .ok_or_else(|| schema_error("priceType must be one of low, medium, high"))?;

        let factors = object
            .get("factors")
            .and_then(Value::as_array)
            .ok_or_else(|| schema_error("factors must be an array"))?
            .iter()
            .map(|factor| {
                factor
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| schema_error("factors must contain only strings"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if factors.is_empty() {
            return Err(schema_error("factors must not be empty"));
        }

        Ok(Self {
            predicted_price,
            price_range,
            confidence,
            price_type,
            factors,
        })
    }
}

fn price_field(value: Option<&Value>, field: &str) -> Result<String, PredictionError> {
    value
        .and_then(Value::as_str)
        .filter(|price| !price.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| schema_error(&format!("{} must be a non-empty string", field)))
}

fn schema_error(message: &str) -> PredictionError {
    PredictionError::Schema(message.to_string())
}

/// Returns the span from the first `{` to the last `}` of `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
