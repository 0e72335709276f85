use serde::{Deserialize, Serialize};
use std::fmt;

/// Product categories offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Smartphone,
    Laptop,
    Clothing,
    Electronics,
    Furniture,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Smartphone,
        Category::Laptop,
        Category::Clothing,
        Category::Electronics,
        Category::Furniture,
        Category::Other,
    ];

    /// Wire value, also used verbatim in the prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Smartphone => "smartphone",
            Category::Laptop => "laptop",
            Category::Clothing => "clothing",
            Category::Electronics => "electronics",
            Category::Furniture => "furniture",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Smartphone => "Smartphone",
            Category::Laptop => "Laptop",
            Category::Clothing => "Clothing",
            Category::Electronics => "Electronics",
            Category::Furniture => "Furniture",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the user submits for one prediction.
///
/// Field names on the wire match the web form (`historicalPrices`), so the same
/// type backs both the url-encoded form and the JSON API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttributes {
    pub name: String,
    pub category: Category,
    pub brand: String,
    pub features: String,
    #[serde(default)]
    pub historical_prices: Option<String>,
}

impl ProductAttributes {
    /// Historical price data, if the user provided any non-blank text.
    pub fn historical_prices(&self) -> Option<&str> {
        self.historical_prices
            .as_deref()
            .map(str::trim)
            .filter(|prices| !prices.is_empty())
    }
}
