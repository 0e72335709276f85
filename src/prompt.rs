use crate::locale::Locale;
use crate::product::ProductAttributes;

/// Builds the instruction sent to the text-generation model.
///
/// The product attributes are embedded verbatim, followed by a literal example of
/// the JSON object the model must answer with. The historical-price line is left
/// out entirely when no price history was given.
pub fn build_prompt(attrs: &ProductAttributes, locale: Locale) -> String {
    let labels = PromptLabels::for_locale(locale);

    let mut details = vec![
        format!("{}: {}", labels.name, attrs.name),
        format!("{}: {}", labels.category, attrs.category.as_str()),
        format!("{}: {}", labels.brand, attrs.brand),
        format!("{}: {}", labels.features, attrs.features),
    ];
    if let Some(prices) = attrs.historical_prices() {
        details.push(format!("{}: {}", labels.historical_prices, prices));
    }

    format!(
        "{intro}\n\n{details}\n\n{format_intro}\n{schema}\n\n{closing}",
        intro = labels.intro,
        details = details.join("\n"),
        format_intro = labels.format_intro,
        schema = json_schema_example(locale, labels.factor),
        closing = labels.closing,
    )
}

fn json_schema_example(locale: Locale, factor: &str) -> String {
    let price = match locale {
        Locale::EnUs => "$X,XXX.XX",
        Locale::IdId => "Rp X.XXX.XXX",
    };
    format!(
        r#"{{
  "predictedPrice": "{price}",
  "priceRange": {{
    "min": "{price}",
    "max": "{price}"
  }},
  "confidence": 85,
  "priceType": "low|medium|high",
  "factors": ["{factor} 1", "{factor} 2", "{factor} 3"]
}}"#
    )
}

struct PromptLabels {
    intro: &'static str,
    name: &'static str,
    category: &'static str,
    brand: &'static str,
    features: &'static str,
    historical_prices: &'static str,
    format_intro: &'static str,
    factor: &'static str,
    closing: &'static str,
}

impl PromptLabels {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::EnUs => Self {
                intro: "You are an AI assistant that analyzes product prices. Please predict the price of the following product based on its details:",
                name: "Product Name",
                category: "Category",
                brand: "Brand",
                features: "Features/Specifications",
                historical_prices: "Historical Price Data",
                format_intro: "Respond in the following JSON format:",
                factor: "factor",
                closing: "Give a reasonable prediction based on current market trends in the United States.",
            },
            Locale::IdId => Self {
                intro: "Kamu adalah asisten AI yang menganalisis harga produk. Tolong prediksi harga produk berikut berdasarkan detailnya:",
                name: "Nama Produk",
                category: "Kategori",
                brand: "Merek",
                features: "Fitur/Spesifikasi",
                historical_prices: "Data Harga Historis",
                format_intro: "Berikan respons dalam format JSON berikut:",
                factor: "faktor",
                closing: "Berikan prediksi yang masuk akal berdasarkan tren pasar Indonesia saat ini.",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Category;

    fn phone(historical_prices: Option<&str>) -> ProductAttributes {
        ProductAttributes {
            name: "Phone X".to_string(),
            category: Category::Smartphone,
            brand: "Acme".to_string(),
            features: "6GB RAM, 128GB storage".to_string(),
            historical_prices: historical_prices.map(str::to_string),
        }
    }

    #[test]
    fn test_prompt_embeds_attributes_verbatim() {
        let prompt = build_prompt(&phone(None), Locale::EnUs);
        assert!(prompt.contains("Product Name: Phone X"));
        assert!(prompt.contains("Category: smartphone"));
        assert!(prompt.contains("Brand: Acme"));
        assert!(prompt.contains("Features/Specifications: 6GB RAM, 128GB storage"));
    }

    #[test]
    fn test_prompt_contains_schema_keys() {
        let prompt = build_prompt(&phone(None), Locale::EnUs);
        for key in ["\"predictedPrice\"", "\"priceRange\"", "\"min\"", "\"max\"", "\"confidence\"", "\"priceType\"", "\"factors\""] {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(prompt.contains("low|medium|high"));
    }

    #[test]
    fn test_historical_prices_included_when_present() {
        let prompt = build_prompt(&phone(Some("$2,500 (Jan), $2,400 (Feb)")), Locale::EnUs);
        assert!(prompt.contains("Historical Price Data: $2,500 (Jan), $2,400 (Feb)"));
    }

    #[test]
    fn test_historical_prices_omitted_when_absent_or_empty() {
        for history in [None, Some(""), Some("  ")] {
            let prompt = build_prompt(&phone(history), Locale::EnUs);
            assert!(!prompt.contains("Historical Price Data"));
        }
    }

    #[test]
    fn test_empty_name_passed_through() {
        let mut attrs = phone(None);
        attrs.name = String::new();
        let prompt = build_prompt(&attrs, Locale::EnUs);
        assert!(prompt.contains("Product Name: \n"));
    }

    #[test]
    fn test_indonesian_prompt() {
        let prompt = build_prompt(&phone(Some("Rp 2.500.000")), Locale::IdId);
        assert!(prompt.contains("Nama Produk: Phone X"));
        assert!(prompt.contains("Data Harga Historis: Rp 2.500.000"));
        assert!(prompt.contains("Rp X.XXX.XXX"));
        assert!(prompt.contains("tren pasar Indonesia"));
    }
}
