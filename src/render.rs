use serde::Serialize;

use crate::locale::Locale;
use crate::prediction::{PredictionResult, PriceTier};

const AXIS_TICKS: usize = 5;

/// Everything the result card and chart need, already formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub product_name: String,
    pub predicted_price: String,
    pub range_text: String,
    pub confidence: u8,
    pub tier_label: &'static str,
    pub tier_class: &'static str,
    pub factors: Vec<Factor>,
    pub chart: Chart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Factor {
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub bars: Vec<Bar>,
    /// Highest tick first.
    pub ticks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: &'static str,
    pub value: f64,
    pub value_text: String,
    /// Height relative to the tallest bar, 0..=100.
    pub height_percent: f64,
}

impl PredictionView {
    pub fn new(result: &PredictionResult, product_name: &str, locale: Locale) -> Self {
        Self {
            product_name: product_name.to_string(),
            predicted_price: result.predicted_price.clone(),
            range_text: format!("{} - {}", result.price_range.min, result.price_range.max),
            confidence: result.confidence,
            tier_label: tier_label(result.price_type),
            tier_class: tier_class(result.price_type),
            factors: result
                .factors
                .iter()
                .enumerate()
                .map(|(i, text)| Factor {
                    number: i + 1,
                    text: text.clone(),
                })
                .collect(),
            chart: Chart::new(result, locale),
        }
    }

    /// Plain-text card for terminal output.
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "Prediction: {}\n{} (confidence {}%)\n\nPredicted price: {}\nRange: {}\n\nFactors influencing price:\n",
            self.product_name, self.tier_label, self.confidence, self.predicted_price, self.range_text
        );
        for factor in &self.factors {
            out.push_str(&format!("  {}. {}\n", factor.number, factor.text));
        }
        out.push('\n');
        for bar in &self.chart.bars {
            let width = (bar.height_percent / 5.0).round() as usize;
            out.push_str(&format!(
                "{:<10} {:<20} {}\n",
                bar.label,
                "#".repeat(width),
                bar.value_text
            ));
        }
        out
    }
}

impl Chart {
    fn new(result: &PredictionResult, locale: Locale) -> Self {
        let amounts = [
            ("Minimum", &result.price_range.min),
            ("Predicted", &result.predicted_price),
            ("Maximum", &result.price_range.max),
        ];
        let values: Vec<(&'static str, f64)> = amounts
            .iter()
            .map(|(label, text)| (*label, locale.parse_amount(text).unwrap_or(0.0)))
            .collect();

        let max = values.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);

        let bars = values
            .iter()
            .map(|(label, value)| Bar {
                label: *label,
                value: *value,
                value_text: locale.format_currency(*value),
                height_percent: if max > 0.0 {
                    (value / max * 1000.0).round() / 10.0
                } else {
                    0.0
                },
            })
            .collect();

        let ticks = (0..AXIS_TICKS)
            .rev()
            .map(|i| locale.format_currency(max * i as f64 / (AXIS_TICKS - 1) as f64))
            .collect();

        Self { bars, ticks }
    }
}

pub fn tier_label(tier: PriceTier) -> &'static str {
    match tier {
        PriceTier::Low => "Low Price",
        PriceTier::Medium => "Medium Price",
        PriceTier::High => "High Price",
    }
}

fn tier_class(tier: PriceTier) -> &'static str {
    match tier {
        PriceTier::Low => "price-low",
        PriceTier::Medium => "price-medium",
        PriceTier::High => "price-high",
    }
}
