//! Shared types, configuration, and errors for the Parley dialogue system.
//!
//! Every other Parley crate depends on this one for the Session/Message
//! data model, the intent and entity vocabularies, and TOML configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ApiConfig, DialogueConfig, GeneralConfig, ParleyConfig};
pub use error::{ParleyError, Result};
pub use types::{
    EntityMap, EntityType, Feedback, Intent, Message, Sender, Session, SessionPatch,
    SessionStatus, new_message_id, new_session_id,
};
