//! Core data model: sessions, messages, intents, and entities.
//!
//! Sessions and messages are owned by the persistence layer; the dialogue
//! core operates on them by value per call and never caches them across
//! requests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed set of user-goal categories, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    OrderStatus,
    ProductInfo,
    ReturnRefund,
    Troubleshooting,
    Shipping,
    GeneralInquiry,
}

impl Intent {
    /// All intents in classification priority order (used for tie-breaks).
    pub const ALL: [Intent; 6] = [
        Intent::OrderStatus,
        Intent::ProductInfo,
        Intent::ReturnRefund,
        Intent::Troubleshooting,
        Intent::Shipping,
        Intent::GeneralInquiry,
    ];

    /// Stable wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::OrderStatus => "order_status",
            Intent::ProductInfo => "product_info",
            Intent::ReturnRefund => "return_refund",
            Intent::Troubleshooting => "troubleshooting",
            Intent::Shipping => "shipping",
            Intent::GeneralInquiry => "general_inquiry",
        }
    }

    /// Parse the wire/storage name back into an intent.
    pub fn parse(s: &str) -> Option<Intent> {
        match s {
            "order_status" => Some(Intent::OrderStatus),
            "product_info" => Some(Intent::ProductInfo),
            "return_refund" => Some(Intent::ReturnRefund),
            "troubleshooting" => Some(Intent::Troubleshooting),
            "shipping" => Some(Intent::Shipping),
            "general_inquiry" => Some(Intent::GeneralInquiry),
            _ => None,
        }
    }

    /// Human-readable topic name for response text.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::OrderStatus => "your order status",
            Intent::ProductInfo => "product information",
            Intent::ReturnRefund => "returns and refunds",
            Intent::Troubleshooting => "troubleshooting",
            Intent::Shipping => "shipping",
            Intent::GeneralInquiry => "your question",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured value categories extracted from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    OrderNumber,
    ProductName,
    Amount,
    Email,
    Date,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::OrderNumber => "order_number",
            EntityType::ProductName => "product_name",
            EntityType::Amount => "amount",
            EntityType::Email => "email",
            EntityType::Date => "date",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most one value per entity type per message; absent types are omitted.
pub type EntityMap = BTreeMap<EntityType, String>;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    pub fn parse(s: &str) -> Option<Sender> {
        match s {
            "user" => Some(Sender::User),
            "bot" => Some(Sender::Bot),
            _ => None,
        }
    }
}

/// End-user rating of a bot message. Set at most once per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Positive => "positive",
            Feedback::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<Feedback> {
        match s {
            "positive" => Some(Feedback::Positive),
            "negative" => Some(Feedback::Negative),
            _ => None,
        }
    }
}

/// Session lifecycle state. Expiry is computed at read time; the core never
/// deletes sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<SessionStatus> {
        match s {
            "active" => Some(SessionStatus::Active),
            "expired" => Some(SessionStatus::Expired),
            _ => None,
        }
    }
}

/// A multi-turn support conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,
    /// Count of user-sender messages in the session.
    pub interaction_count: u64,
    pub status: SessionStatus,
    /// Latest intent category, if any turn has been classified.
    pub current_topic: Option<Intent>,
    /// Append-only set of intent categories seen so far, in first-seen order.
    pub topics_discussed: Vec<Intent>,
    /// Optimistic-concurrency version, bumped on every metadata update.
    #[serde(default)]
    pub version: u64,
}

impl Session {
    /// A fresh session with no turns.
    pub fn new(session_id: String, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            created_at: now,
            last_interaction: now,
            interaction_count: 0,
            status: SessionStatus::Active,
            current_topic: None,
            topics_discussed: Vec::new(),
            version: 0,
        }
    }
}

/// One turn (user or bot) within a session.
///
/// Immutable once written except for the feedback pair, which an external
/// actor may set exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub session_id: String,
    pub sender: Sender,
    pub text: String,
    /// None for non-classified bot turns.
    pub intent: Option<Intent>,
    /// Classifier certainty in [0, 1]; None for bot turns.
    pub confidence: Option<f32>,
    pub entities: Option<EntityMap>,
    pub feedback: Option<Feedback>,
    pub feedback_timestamp: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

/// Fields of a session metadata update, checked against `expected_version`.
#[derive(Debug, Clone)]
pub struct SessionPatch {
    pub last_interaction: DateTime<Utc>,
    pub interaction_count: u64,
    pub current_topic: Option<Intent>,
    pub topics_discussed: Vec<Intent>,
    /// The version the caller read; the update fails with Conflict if the
    /// stored row has moved on.
    pub expected_version: u64,
}

/// Generate an opaque session identifier (`session_` + 16 hex chars).
pub fn new_session_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("session_{}", &hex[..16])
}

/// Generate an opaque message identifier (`msg_` + 12 hex chars).
pub fn new_message_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("msg_{}", &hex[..12])
}
