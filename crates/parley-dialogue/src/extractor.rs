//! Pattern-based entity extraction.
//!
//! Independent per-type matchers over the raw message text. At most one
//! value per entity type; when a pattern matches more than once the
//! leftmost match wins. Types with no match are omitted from the result.

use regex::Regex;
use std::sync::LazyLock;

use parley_core::types::{EntityMap, EntityType};

static ORDER_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:#|\border\s*#?\s*)(\d+)").unwrap());

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d+(?:\.\d{2})?").unwrap());

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{4}\b").unwrap());

/// Known product keywords, matched on token boundaries. When several
/// match, the longest keyword wins; ties go to the leftmost occurrence.
static PRODUCT_KEYWORDS: &[&str] = &[
    "laptop",
    "phone",
    "keyboard",
    "mouse",
    "monitor",
    "headphones",
    "tablet",
    "charger",
    "camera",
    "speaker",
];

/// Extracts structured entities from free text. Pure; total; each matcher
/// is independent of the others.
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> EntityMap {
        let mut entities = EntityMap::new();

        if let Some(caps) = ORDER_NUMBER_RE.captures(text) {
            entities.insert(EntityType::OrderNumber, caps[1].to_string());
        }
        if let Some(product) = self.match_product(text) {
            entities.insert(EntityType::ProductName, product);
        }
        if let Some(m) = AMOUNT_RE.find(text) {
            entities.insert(EntityType::Amount, m.as_str().to_string());
        }
        if let Some(m) = EMAIL_RE.find(text) {
            entities.insert(EntityType::Email, m.as_str().to_string());
        }
        if let Some(m) = DATE_RE.find(text) {
            entities.insert(EntityType::Date, m.as_str().to_string());
        }

        entities
    }

    fn match_product(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        let mut best: Option<(&str, usize)> = None;
        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            if let Some(kw) = PRODUCT_KEYWORDS.iter().find(|kw| **kw == token) {
                let longer = match best {
                    Some((current, _)) => kw.len() > current.len(),
                    None => true,
                };
                if longer {
                    best = Some((kw, kw.len()));
                }
            }
        }
        best.map(|(kw, _)| kw.to_string())
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> EntityMap {
        EntityExtractor::new().extract(text)
    }

    // ---- Order numbers ----

    #[test]
    fn test_order_number_from_hash() {
        let entities = extract("What's the status of order #12345?");
        assert_eq!(entities.get(&EntityType::OrderNumber).unwrap(), "12345");
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn test_order_number_from_word() {
        let entities = extract("my order 98765 has not arrived");
        assert_eq!(entities.get(&EntityType::OrderNumber).unwrap(), "98765");
    }

    #[test]
    fn test_order_number_leftmost_wins() {
        let entities = extract("order #111 and also order #222");
        assert_eq!(entities.get(&EntityType::OrderNumber).unwrap(), "111");
    }

    #[test]
    fn test_bare_word_order_without_digits_no_match() {
        let entities = extract("where is my order");
        assert!(entities.get(&EntityType::OrderNumber).is_none());
    }

    // ---- Products ----

    #[test]
    fn test_product_name_match() {
        let entities = extract("I want to buy a laptop");
        assert_eq!(entities.get(&EntityType::ProductName).unwrap(), "laptop");
    }

    #[test]
    fn test_product_longest_match_wins() {
        let entities = extract("my phone and my headphones both broke");
        assert_eq!(
            entities.get(&EntityType::ProductName).unwrap(),
            "headphones"
        );
    }

    #[test]
    fn test_product_token_boundary() {
        // "headphones" contains "phone" but the token is "headphones".
        let entities = extract("these headphones crackle");
        assert_eq!(
            entities.get(&EntityType::ProductName).unwrap(),
            "headphones"
        );
    }

    // ---- Amounts, emails, dates ----

    #[test]
    fn test_amount() {
        let entities = extract("I was charged $49.99 twice");
        assert_eq!(entities.get(&EntityType::Amount).unwrap(), "$49.99");

        let entities = extract("it costs $100");
        assert_eq!(entities.get(&EntityType::Amount).unwrap(), "$100");
    }

    #[test]
    fn test_email_only() {
        let entities = extract("email me at a@b.com");
        assert_eq!(entities.get(&EntityType::Email).unwrap(), "a@b.com");
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn test_date_slash_and_dash() {
        let entities = extract("I ordered it on 03/15/2026");
        assert_eq!(entities.get(&EntityType::Date).unwrap(), "03/15/2026");

        let entities = extract("delivery was promised for 3-9-2026");
        assert_eq!(entities.get(&EntityType::Date).unwrap(), "3-9-2026");
    }

    // ---- Combinations and totality ----

    #[test]
    fn test_multiple_entity_types() {
        let entities =
            extract("Refund $25.00 for order #777 to me at jane.doe@example.org");
        assert_eq!(entities.get(&EntityType::OrderNumber).unwrap(), "777");
        assert_eq!(entities.get(&EntityType::Amount).unwrap(), "$25.00");
        assert_eq!(
            entities.get(&EntityType::Email).unwrap(),
            "jane.doe@example.org"
        );
    }

    #[test]
    fn test_no_entities_yields_empty_map() {
        assert!(extract("hello there").is_empty());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let text = "order #42 for my laptop, refund $10.00";
        assert_eq!(extract(text), extract(text));
    }
}
