//! Keyword-based intent classification.
//!
//! Each intent owns a static table of (keyword-or-phrase, weight) pairs.
//! Single words match on token boundaries; multi-word phrases match as
//! substrings of the whitespace-normalized text. Confidence is the
//! matched weight over the table's total weight, so a message hitting
//! every keyword of an intent scores 1.0.

use std::collections::HashSet;

use parley_core::types::Intent;

/// Weighted keyword table for one intent. Strongest discriminators carry
/// the highest weights.
type KeywordTable = &'static [(&'static str, u32)];

const ORDER_STATUS_KEYWORDS: KeywordTable = &[
    ("order", 3),
    ("status", 3),
    ("track", 2),
    ("shipped", 2),
    ("deliver", 1),
    ("where", 1),
];

const PRODUCT_INFO_KEYWORDS: KeywordTable = &[
    ("product", 3),
    ("price", 3),
    ("specs", 2),
    ("feature", 2),
    ("cost", 2),
    ("buy", 2),
    ("available", 1),
];

const RETURN_REFUND_KEYWORDS: KeywordTable = &[
    ("return", 3),
    ("refund", 3),
    ("exchange", 2),
    ("money back", 2),
    ("send it back", 2),
];

const TROUBLESHOOTING_KEYWORDS: KeywordTable = &[
    ("broken", 3),
    ("not work", 3),
    ("issue", 2),
    ("problem", 2),
    ("error", 2),
    ("fix", 2),
    ("help", 1),
];

const SHIPPING_KEYWORDS: KeywordTable = &[
    ("shipping", 3),
    ("delivery", 3),
    ("address", 2),
    ("destination", 1),
    ("transport", 1),
];

const GENERAL_INQUIRY_KEYWORDS: KeywordTable = &[
    ("hello", 2),
    ("hi", 2),
    ("thanks", 2),
    ("thank you", 2),
    ("hey", 1),
];

fn keyword_table(intent: Intent) -> KeywordTable {
    match intent {
        Intent::OrderStatus => ORDER_STATUS_KEYWORDS,
        Intent::ProductInfo => PRODUCT_INFO_KEYWORDS,
        Intent::ReturnRefund => RETURN_REFUND_KEYWORDS,
        Intent::Troubleshooting => TROUBLESHOOTING_KEYWORDS,
        Intent::Shipping => SHIPPING_KEYWORDS,
        Intent::GeneralInquiry => GENERAL_INQUIRY_KEYWORDS,
    }
}

/// Deterministic rule-table classifier. Total: every input yields exactly
/// one (intent, confidence) pair and never fails.
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify `text`, returning the winning intent and its confidence
    /// in [0, 1].
    ///
    /// Ties resolve to the earlier intent in [`Intent::ALL`]. A zero
    /// score everywhere collapses to `GeneralInquiry` at confidence 0.
    pub fn classify(&self, text: &str) -> (Intent, f32) {
        let lowered = text.to_lowercase();
        let tokens: HashSet<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut winner = Intent::GeneralInquiry;
        let mut winner_confidence = 0.0f32;
        let mut winner_score = 0u32;

        for intent in Intent::ALL {
            let table = keyword_table(intent);
            let total: u32 = table.iter().map(|(_, w)| w).sum();
            let score: u32 = table
                .iter()
                .filter(|(kw, _)| {
                    if kw.contains(' ') {
                        lowered.contains(kw)
                    } else {
                        tokens.contains(kw)
                    }
                })
                .map(|(_, w)| w)
                .sum();

            let confidence = (score as f32 / total as f32).clamp(0.0, 1.0);
            // Strict comparison keeps the earlier (higher-priority) intent
            // on ties.
            if confidence > winner_confidence {
                winner = intent;
                winner_confidence = confidence;
                winner_score = score;
            }
        }

        if winner_score == 0 {
            return (Intent::GeneralInquiry, 0.0);
        }
        (winner, winner_confidence)
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
