//! Dialogue engine: orchestrates the pipeline for each inbound message.
//!
//! Per message: validate, classify and extract, resolve context against
//! the stored history, generate the reply, then persist the whole turn
//! (user message, bot message, session patch) as one unit. A version
//! conflict or transient storage failure is retried once with fresh
//! state before the turn fails.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use parley_core::config::DialogueConfig;
use parley_core::types::{
    EntityMap, Feedback, Intent, Message, Sender, Session, SessionPatch, new_message_id,
};
use parley_storage::{SessionGateway, StoreError};

use crate::classifier::IntentClassifier;
use crate::context::ContextTracker;
use crate::error::EngineError;
use crate::extractor::EntityExtractor;
use crate::response::ResponseGenerator;
use crate::validator::MessageValidator;

/// The result of one completed turn, as returned to callers.
///
/// Field names are part of the wire contract; do not rename.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub session_id: String,
    /// The sanitized user message as stored.
    pub message: String,
    pub bot_response: String,
    pub bot_message_id: String,
    pub intent: Intent,
    pub confidence: f32,
    pub entities: EntityMap,
    pub is_followup: bool,
    /// Number of stored messages consulted for context.
    pub context_messages: usize,
}

/// Orchestrates validation, classification, context, response, and
/// persistence for a conversation turn.
pub struct DialogueEngine<G: SessionGateway> {
    gateway: Arc<G>,
    validator: MessageValidator,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    tracker: ContextTracker,
    generator: ResponseGenerator,
    context_window_size: usize,
}

impl<G: SessionGateway> DialogueEngine<G> {
    pub fn new(gateway: Arc<G>, config: &DialogueConfig) -> Self {
        Self {
            gateway,
            validator: MessageValidator::new(
                config.min_message_length,
                config.max_message_length,
            ),
            classifier: IntentClassifier::new(),
            extractor: EntityExtractor::new(),
            tracker: ContextTracker::new(config.topic_overlap_threshold),
            generator: ResponseGenerator::new(),
            context_window_size: config.context_window_size,
        }
    }

    /// Create a fresh session.
    pub fn create_session(&self) -> Result<String, EngineError> {
        self.gateway
            .create_session()
            .map_err(EngineError::from_session_store)
    }

    /// Handle one inbound user message.
    ///
    /// With no `session_id` a new session is created; an unknown id fails
    /// `SessionNotFound`. Validation failures surface before any
    /// persistence call is attempted.
    pub fn handle_message(
        &self,
        session_id: Option<&str>,
        raw_text: &str,
    ) -> Result<TurnOutcome, EngineError> {
        let sanitized = self.validator.validate(raw_text)?;

        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.create_session()?,
        };

        let (intent, confidence) = self.classifier.classify(&sanitized);
        let entities = self.extractor.extract(&sanitized);
        debug!(
            session_id = %session_id,
            intent = %intent,
            confidence,
            entity_count = entities.len(),
            "Classified message"
        );

        // Context resolution and the persistence write share the session
        // snapshot; a stale version gets one retry with fresh state.
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.run_turn(&session_id, &sanitized, intent, confidence, &entities) {
                Ok(outcome) => {
                    info!(
                        session_id = %session_id,
                        intent = %intent,
                        is_followup = outcome.is_followup,
                        "Turn completed"
                    );
                    return Ok(outcome);
                }
                Err(StoreError::NotFound(id)) => {
                    return Err(EngineError::SessionNotFound(id));
                }
                Err(err) if attempts < 2 => {
                    warn!(session_id = %session_id, error = %err, "Turn write failed, retrying");
                }
                Err(err) => {
                    return Err(EngineError::Storage(err.to_string()));
                }
            }
        }
    }

    /// One attempt at resolving context, generating the reply, and
    /// persisting the turn against the current session version.
    fn run_turn(
        &self,
        session_id: &str,
        sanitized: &str,
        intent: Intent,
        confidence: f32,
        entities: &EntityMap,
    ) -> Result<TurnOutcome, StoreError> {
        let session = self.gateway.session_metadata(session_id)?;
        let recent = self
            .gateway
            .recent_messages(session_id, self.context_window_size as u64)?;

        let update = self.tracker.resolve(&session, &recent, intent, entities);
        let bot_response = self.generator.generate(
            intent,
            confidence,
            entities,
            update.is_followup,
            update.topic_shift,
        );

        let now = Utc::now();
        let user_message = Message {
            message_id: new_message_id(),
            session_id: session_id.to_string(),
            sender: Sender::User,
            text: sanitized.to_string(),
            intent: Some(intent),
            confidence: Some(confidence),
            entities: (!entities.is_empty()).then(|| entities.clone()),
            feedback: None,
            feedback_timestamp: None,
            timestamp: now,
        };
        let bot_message = Message {
            message_id: new_message_id(),
            session_id: session_id.to_string(),
            sender: Sender::Bot,
            text: bot_response.clone(),
            intent: None,
            confidence: None,
            entities: None,
            feedback: None,
            feedback_timestamp: None,
            timestamp: now,
        };
        let patch = SessionPatch {
            last_interaction: now,
            interaction_count: session.interaction_count + 1,
            current_topic: update.current_topic,
            topics_discussed: update.topics_discussed,
            expected_version: session.version,
        };

        self.gateway
            .persist_turn(&user_message, &bot_message, &patch)?;

        Ok(TurnOutcome {
            session_id: session_id.to_string(),
            message: sanitized.to_string(),
            bot_response,
            bot_message_id: bot_message.message_id,
            intent,
            confidence,
            entities: entities.clone(),
            is_followup: update.is_followup,
            context_messages: update.context_messages_used,
        })
    }

    /// The most recent `limit` messages of a session, oldest first.
    pub fn conversation_history(
        &self,
        session_id: &str,
        limit: u64,
    ) -> Result<Vec<Message>, EngineError> {
        // Distinguish an empty history from an unknown session.
        self.gateway
            .session_metadata(session_id)
            .map_err(EngineError::from_session_store)?;
        self.gateway
            .recent_messages(session_id, limit)
            .map_err(EngineError::from_session_store)
    }

    /// Session metadata with expiry computed at read time.
    pub fn session_context(&self, session_id: &str) -> Result<Session, EngineError> {
        self.gateway
            .session_metadata(session_id)
            .map_err(EngineError::from_session_store)
    }

    /// Record feedback on a bot message, exactly once.
    pub fn record_feedback(
        &self,
        message_id: &str,
        feedback: Feedback,
    ) -> Result<(), EngineError> {
        match self.gateway.record_feedback(message_id, feedback) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(id)) => Err(EngineError::MessageNotFound(id)),
            Err(StoreError::Conflict(_)) => {
                Err(EngineError::FeedbackConflict(message_id.to_string()))
            }
            Err(err) => Err(EngineError::Storage(err.to_string())),
        }
    }
}
