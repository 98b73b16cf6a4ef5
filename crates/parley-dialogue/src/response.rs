//! Deterministic response generation.
//!
//! Composes the bot reply from the classified intent, extracted
//! entities, and the context signals. Every template family is a static
//! table and variant selection is a pure function of the inputs, so the
//! same turn always produces the same reply.

use parley_core::types::{EntityMap, EntityType, Intent};

/// Template family for one intent. `with_order_number` templates carry an
/// `{order}` placeholder and are only selected when the entity is present.
struct TemplateFamily {
    first_ask: &'static [&'static str],
    followup: &'static [&'static str],
    with_order_number: &'static [&'static str],
}

const ORDER_STATUS_TEMPLATES: TemplateFamily = TemplateFamily {
    first_ask: &[
        "I'd be happy to help you track your order! Could you please provide your order number?",
        "Let me help you check the status of your order. What's your order number?",
    ],
    followup: &[
        "Thank you! Your order has been shipped and is on its way to you.",
        "Your order is being prepared for shipment. We'll send you a tracking number as soon as it ships!",
    ],
    with_order_number: &[
        "Order #{order} is currently in transit. Expected delivery is within 3-5 business days.",
        "I found order #{order}. It's been shipped and you should see it arrive soon.",
    ],
};

const PRODUCT_INFO_TEMPLATES: TemplateFamily = TemplateFamily {
    first_ask: &[
        "I'd be happy to help! Which product would you like to learn more about?",
        "What product interests you? I can give you all the details.",
    ],
    followup: &[
        "That product is in stock and ready to ship! Is there anything specific you'd like to know about it?",
        "We have several options available. Would you like pricing information or details about features?",
    ],
    with_order_number: &[],
};

const RETURN_REFUND_TEMPLATES: TemplateFamily = TemplateFamily {
    first_ask: &[
        "I'm sorry you'd like to return something. I can definitely help with that. What's your order number?",
        "I can help process a return for you. Could you provide your order number?",
    ],
    followup: &[
        "Thank you for that information. You're within our 30-day return window, so I can help process this for you.",
        "Your return request is approved. You'll receive a return label via email, and your refund will be processed within 5-7 business days of receipt.",
    ],
    with_order_number: &[
        "I've started a return for order #{order}. You'll receive a return label via email shortly.",
        "Order #{order} is eligible for return. Once we receive the item back, your refund will be processed within 5-7 business days.",
    ],
};

const TROUBLESHOOTING_TEMPLATES: TemplateFamily = TemplateFamily {
    first_ask: &[
        "I'm sorry you're experiencing an issue. What exactly is happening?",
        "I'd like to help fix this. Can you describe what's going wrong?",
    ],
    followup: &[
        "I understand. Let's troubleshoot this together. First, have you tried refreshing the page or restarting your device?",
        "This might be a technical issue on our end. Let me escalate this to our support team. You'll hear back within 24 hours.",
    ],
    with_order_number: &[],
};

const SHIPPING_TEMPLATES: TemplateFamily = TemplateFamily {
    first_ask: &[
        "I can help with shipping questions! What would you like to know?",
        "Do you have a question about shipping? I'm here to help.",
    ],
    followup: &[
        "We offer standard shipping (5-7 days) and express shipping (2-3 days). Which option works best for you?",
        "We typically ship within 1-2 business days. Standard delivery is 5-7 days, or you can choose express for 2-3 days.",
    ],
    with_order_number: &[],
};

const GENERAL_INQUIRY_TEMPLATES: TemplateFamily = TemplateFamily {
    first_ask: &[
        "Hello! How can I assist you today?",
        "Welcome! What can I help you with?",
    ],
    followup: &[
        "I understand. Let me help you with that.",
        "Thanks for asking! Is there anything else I can help you with?",
    ],
    with_order_number: &[],
};

/// Used when classification found no signal at all.
const LOW_CONFIDENCE_FALLBACK: &str =
    "I'm not quite sure what you're looking for. Could you rephrase that, or tell me whether it's about an order, a product, a return, or shipping?";

fn templates(intent: Intent) -> &'static TemplateFamily {
    match intent {
        Intent::OrderStatus => &ORDER_STATUS_TEMPLATES,
        Intent::ProductInfo => &PRODUCT_INFO_TEMPLATES,
        Intent::ReturnRefund => &RETURN_REFUND_TEMPLATES,
        Intent::Troubleshooting => &TROUBLESHOOTING_TEMPLATES,
        Intent::Shipping => &SHIPPING_TEMPLATES,
        Intent::GeneralInquiry => &GENERAL_INQUIRY_TEMPLATES,
    }
}

/// Composes bot replies. Pure and total; no randomness, no hidden state.
pub struct ResponseGenerator;

impl ResponseGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate the reply for one resolved turn.
    ///
    /// `confidence` is the classifier's output; a `general_inquiry` at
    /// exactly zero confidence gets the distinct low-confidence fallback
    /// instead of the normal greeting family.
    pub fn generate(
        &self,
        intent: Intent,
        confidence: f32,
        entities: &EntityMap,
        is_followup: bool,
        topic_shift: bool,
    ) -> String {
        if intent == Intent::GeneralInquiry && confidence == 0.0 {
            return LOW_CONFIDENCE_FALLBACK.to_string();
        }

        let family = templates(intent);
        let order_number = entities.get(&EntityType::OrderNumber);

        let variants = match order_number {
            Some(_) if !family.with_order_number.is_empty() => family.with_order_number,
            _ if is_followup => family.followup,
            _ => family.first_ask,
        };

        // Variant index derives from the entity count so selection stays a
        // pure function of the generator's inputs.
        let index = entities.len() % variants.len();
        let mut reply = variants[index].to_string();

        if let Some(number) = order_number {
            reply = reply.replace("{order}", number);
        }

        if topic_shift {
            reply = format!("Happy to switch over to {}. {}", intent.label(), reply);
        }

        reply
    }
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new()
    }
}
