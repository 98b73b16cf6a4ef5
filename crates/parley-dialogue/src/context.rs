//! Conversation context tracking.
//!
//! Computes followup and topic-shift signals for a new turn from the
//! session's recent messages and metadata. Topic relatedness is a static
//! cluster table compared by Jaccard overlap.

use std::collections::HashSet;

use parley_core::types::{EntityMap, EntityType, Intent, Message, Sender, Session};

/// Intents related to each intent, including itself. Order-fulfilment
/// intents cluster together; the rest stand alone.
fn related_cluster(intent: Intent) -> &'static [Intent] {
    match intent {
        Intent::OrderStatus => &[Intent::OrderStatus, Intent::Shipping, Intent::ReturnRefund],
        Intent::Shipping => &[Intent::Shipping, Intent::OrderStatus],
        Intent::ReturnRefund => &[Intent::ReturnRefund, Intent::OrderStatus],
        Intent::ProductInfo => &[Intent::ProductInfo],
        Intent::Troubleshooting => &[Intent::Troubleshooting],
        Intent::GeneralInquiry => &[Intent::GeneralInquiry],
    }
}

/// Entity types that carry context forward for each intent. A bare
/// question after one of these was supplied reads as a followup.
fn entity_affinity(intent: Intent) -> &'static [EntityType] {
    match intent {
        Intent::OrderStatus => &[EntityType::OrderNumber, EntityType::Date],
        Intent::ProductInfo => &[EntityType::ProductName, EntityType::Amount],
        Intent::ReturnRefund => &[EntityType::OrderNumber, EntityType::Amount],
        Intent::Shipping => &[EntityType::OrderNumber, EntityType::Date],
        Intent::Troubleshooting => &[EntityType::ProductName],
        Intent::GeneralInquiry => &[],
    }
}

fn jaccard(a: &[Intent], b: &[Intent]) -> f32 {
    let a: HashSet<Intent> = a.iter().copied().collect();
    let b: HashSet<Intent> = b.iter().copied().collect();
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f32 / union as f32
}

/// The resolved context signals for one new turn, plus the session topic
/// fields after applying it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextUpdate {
    pub is_followup: bool,
    pub topic_shift: bool,
    /// Number of stored messages consulted.
    pub context_messages_used: usize,
    pub current_topic: Option<Intent>,
    pub topics_discussed: Vec<Intent>,
}

/// Resolves followup and topic-shift state for incoming turns.
pub struct ContextTracker {
    topic_overlap_threshold: f32,
}

impl ContextTracker {
    pub fn new(topic_overlap_threshold: f32) -> Self {
        Self {
            topic_overlap_threshold,
        }
    }

    /// Resolve the new turn against the session's recent history.
    ///
    /// `recent` is the context window, chronological, oldest first. The
    /// returned topic fields are the session's values with this turn
    /// applied; `topics_discussed` stays append-only.
    pub fn resolve(
        &self,
        session: &Session,
        recent: &[Message],
        intent: Intent,
        entities: &EntityMap,
    ) -> ContextUpdate {
        let previous_user = recent.iter().rev().find(|m| m.sender == Sender::User);

        let is_followup = match previous_user {
            Some(prev) => {
                prev.intent == Some(intent)
                    || (entities.is_empty() && Self::carries_context(prev, intent))
            }
            None => false,
        };

        let topic_shift = match session.current_topic {
            Some(current) if current != intent => {
                let overlap = jaccard(related_cluster(intent), related_cluster(current));
                overlap < self.topic_overlap_threshold
            }
            _ => false,
        };

        let mut topics_discussed = session.topics_discussed.clone();
        if !topics_discussed.contains(&intent) {
            topics_discussed.push(intent);
        }

        ContextUpdate {
            is_followup,
            topic_shift,
            context_messages_used: recent.len(),
            current_topic: Some(intent),
            topics_discussed,
        }
    }

    /// Did the previous user turn supply entities the new intent cares
    /// about?
    fn carries_context(previous: &Message, intent: Intent) -> bool {
        let affinity = entity_affinity(intent);
        previous
            .entities
            .as_ref()
            .is_some_and(|e| e.keys().any(|t| affinity.contains(t)))
    }
}
