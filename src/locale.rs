use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market the prediction is made for. Drives the prompt language, the fallback
/// figures and how currency amounts are parsed and formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "id-ID")]
    IdId,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::IdId => "id-ID",
        }
    }

    pub fn currency_symbol(&self) -> &'static str {
        match self {
            Locale::EnUs => "$",
            Locale::IdId => "Rp ",
        }
    }

    pub fn grouping_separator(&self) -> char {
        match self {
            Locale::EnUs => ',',
            Locale::IdId => '.',
        }
    }

    pub fn decimal_separator(&self) -> char {
        match self {
            Locale::EnUs => '.',
            Locale::IdId => ',',
        }
    }

    /// Parses a currency string such as `$2,499.00` or `Rp 2.499.000`.
    ///
    /// Symbols and grouping separators are dropped; only digits and the first
    /// decimal separator are kept. Returns `None` when no digit is present.
    pub fn parse_amount(&self, text: &str) -> Option<f64> {
        let mut normalized = String::with_capacity(text.len());
        let mut seen_decimal = false;
        for c in text.chars() {
            if c.is_ascii_digit() {
                normalized.push(c);
            } else if c == self.decimal_separator() && !seen_decimal && !normalized.is_empty() {
                normalized.push('.');
                seen_decimal = true;
            }
        }
        if normalized.is_empty() {
            return None;
        }
        normalized.trim_end_matches('.').parse().ok()
    }

    /// Formats a whole-unit amount with the locale symbol and grouping,
    /// e.g. `$2,499` or `Rp 2.499.000`.
    pub fn format_currency(&self, value: f64) -> String {
        let rounded = value.max(0.0).round() as u64;
        let digits = rounded.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.grouping_separator());
            }
            grouped.push(c);
        }
        format!("{}{}", self.currency_symbol(), grouped)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(Locale::EnUs),
            "id-id" | "id" => Ok(Locale::IdId),
            other => Err(format!("unsupported locale '{}' (expected en-US or id-ID)", other)),
        }
    }
}
