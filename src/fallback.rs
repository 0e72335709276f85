use crate::locale::Locale;
use crate::prediction::{PredictionResult, PriceRange, PriceTier};

/// Placeholder prediction shown when the model request fails.
///
/// The figures are illustrative only. Every surface that shows them also shows
/// the failure notice.
pub fn fallback_prediction(locale: Locale) -> PredictionResult {
    let (predicted, min, max, factors) = match locale {
        Locale::EnUs => (
            "$2,499.00",
            "$2,299.00",
            "$2,799.00",
            [
                "Standard specifications for this category",
                "Brand holds a mid-market position",
                "Offered features are in line with the price",
            ],
        ),
        Locale::IdId => (
            "Rp 2.499.000",
            "Rp 2.299.000",
            "Rp 2.799.000",
            [
                "Spesifikasi standar untuk kategori ini",
                "Merek memiliki posisi menengah di pasar",
                "Fitur yang ditawarkan sesuai dengan harga",
            ],
        ),
    };

    PredictionResult {
        predicted_price: predicted.to_string(),
        price_range: PriceRange {
            min: min.to_string(),
            max: max.to_string(),
        },
        confidence: 75,
        price_type: PriceTier::Medium,
        factors: factors.iter().map(|f| f.to_string()).collect(),
    }
}
