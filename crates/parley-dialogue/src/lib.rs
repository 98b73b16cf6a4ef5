//! The Parley dialogue pipeline.
//!
//! Turns a raw user message into a bot reply: validation, intent
//! classification, entity extraction, context tracking against the
//! session's recent turns, and deterministic response generation.
//! [`DialogueEngine`] orchestrates the pipeline and drives persistence
//! through the storage gateway.

pub mod classifier;
pub mod context;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod response;
pub mod validator;

pub use classifier::IntentClassifier;
pub use context::{ContextTracker, ContextUpdate};
pub use engine::{DialogueEngine, TurnOutcome};
pub use error::{EngineError, ValidationError};
pub use extractor::EntityExtractor;
pub use response::ResponseGenerator;
pub use validator::MessageValidator;
