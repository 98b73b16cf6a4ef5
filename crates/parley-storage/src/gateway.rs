//! The persistence gateway consumed by the dialogue engine.
//!
//! [`SessionGateway`] is the narrow contract the core depends on;
//! [`SqliteGateway`] implements it with raw SQL over [`Database`].

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use parley_core::types::{
    EntityMap, Feedback, Intent, Message, Sender, Session, SessionPatch, SessionStatus,
    new_session_id,
};

use crate::db::Database;
use crate::error::StoreError;

/// Capability set the dialogue core needs from persistence.
///
/// Implementations must never leave a turn partially visible:
/// [`SessionGateway::persist_turn`] writes the user message, the bot
/// message, and the session metadata patch as one atomic unit.
pub trait SessionGateway: Send + Sync {
    /// Create a fresh session and return its id.
    fn create_session(&self) -> Result<String, StoreError>;

    /// Append one message to an existing session.
    ///
    /// Fails `NotFound` if the session does not exist.
    fn append_message(&self, message: &Message) -> Result<String, StoreError>;

    /// The most recent `limit` messages of a session, chronological,
    /// oldest first.
    fn recent_messages(&self, session_id: &str, limit: u64) -> Result<Vec<Message>, StoreError>;

    /// Session metadata, with expiry status computed at read time.
    fn session_metadata(&self, session_id: &str) -> Result<Session, StoreError>;

    /// Version-checked session metadata update.
    ///
    /// Fails `Conflict` when the stored version no longer matches
    /// `patch.expected_version`, `NotFound` when the session is absent.
    fn update_session(&self, session_id: &str, patch: &SessionPatch) -> Result<(), StoreError>;

    /// Set the feedback pair on a message, exactly once.
    ///
    /// Fails `NotFound` for an unknown message id and `Conflict` if
    /// feedback was already recorded; neither leaves the store changed.
    fn record_feedback(&self, message_id: &str, feedback: Feedback) -> Result<(), StoreError>;

    /// Write a full turn (user message, bot message, session patch) as one
    /// transaction with the same version check as `update_session`.
    fn persist_turn(
        &self,
        user: &Message,
        bot: &Message,
        patch: &SessionPatch,
    ) -> Result<(), StoreError>;
}

/// SQLite implementation of the session gateway.
pub struct SqliteGateway {
    db: Arc<Database>,
    /// Sessions idle longer than this many hours read back as expired.
    session_timeout_hours: u32,
}

impl SqliteGateway {
    pub fn new(db: Arc<Database>, session_timeout_hours: u32) -> Self {
        Self {
            db,
            session_timeout_hours,
        }
    }

    fn session_exists(conn: &Connection, session_id: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM sessions WHERE session_id = ?1",
                rusqlite::params![session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)?;
        Ok(found.is_some())
    }

    fn insert_message(conn: &Connection, message: &Message) -> Result<(), StoreError> {
        let entities_json = message
            .entities
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Connection(format!("Failed to encode entities: {}", e)))?;

        conn.execute(
            "INSERT INTO messages
                 (message_id, session_id, sender, text, intent, confidence, entities,
                  feedback, feedback_timestamp, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, NULL, ?8)",
            rusqlite::params![
                message.message_id,
                message.session_id,
                message.sender.as_str(),
                message.text,
                message.intent.map(|i| i.as_str()),
                message.confidence.map(f64::from),
                entities_json,
                message.timestamp.timestamp(),
            ],
        )
        .map_err(|e| StoreError::Connection(format!("Failed to insert message: {}", e)))?;
        Ok(())
    }

    /// Apply the version-checked session update. Returns Conflict/NotFound
    /// without modifying the row when the check fails.
    fn apply_patch(
        conn: &Connection,
        session_id: &str,
        patch: &SessionPatch,
    ) -> Result<(), StoreError> {
        let topics_json = serde_json::to_string(&patch.topics_discussed)
            .map_err(|e| StoreError::Connection(format!("Failed to encode topics: {}", e)))?;

        let updated = conn
            .execute(
                "UPDATE sessions
                 SET last_interaction = ?1,
                     interaction_count = ?2,
                     current_topic = ?3,
                     topics_discussed = ?4,
                     version = version + 1
                 WHERE session_id = ?5 AND version = ?6",
                rusqlite::params![
                    patch.last_interaction.timestamp(),
                    patch.interaction_count,
                    patch.current_topic.map(|i| i.as_str()),
                    topics_json,
                    session_id,
                    patch.expected_version,
                ],
            )
            .map_err(|e| StoreError::Connection(format!("Failed to update session: {}", e)))?;

        if updated == 1 {
            return Ok(());
        }
        if Self::session_exists(conn, session_id)? {
            Err(StoreError::Conflict(format!(
                "session {} moved past version {}",
                session_id, patch.expected_version
            )))
        } else {
            Err(StoreError::NotFound(session_id.to_string()))
        }
    }

    fn row_to_message(row: &Row<'_>) -> rusqlite::Result<RawMessage> {
        Ok(RawMessage {
            message_id: row.get(0)?,
            session_id: row.get(1)?,
            sender: row.get(2)?,
            text: row.get(3)?,
            intent: row.get(4)?,
            confidence: row.get(5)?,
            entities: row.get(6)?,
            feedback: row.get(7)?,
            feedback_timestamp: row.get(8)?,
            timestamp: row.get(9)?,
        })
    }
}

/// Intermediate row shape before JSON/enum decoding.
struct RawMessage {
    message_id: String,
    session_id: String,
    sender: String,
    text: String,
    intent: Option<String>,
    confidence: Option<f64>,
    entities: Option<String>,
    feedback: Option<String>,
    feedback_timestamp: Option<i64>,
    timestamp: i64,
}

impl RawMessage {
    fn decode(self) -> Result<Message, StoreError> {
        let entities: Option<EntityMap> = self
            .entities
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| StoreError::Connection(format!("Corrupt entities column: {}", e)))?;

        Ok(Message {
            sender: Sender::parse(&self.sender)
                .ok_or_else(|| StoreError::Connection(format!("Bad sender: {}", self.sender)))?,
            intent: self.intent.as_deref().and_then(Intent::parse),
            confidence: self.confidence.map(|c| c as f32),
            entities,
            feedback: self.feedback.as_deref().and_then(Feedback::parse),
            feedback_timestamp: self.feedback_timestamp.map(epoch_to_utc),
            timestamp: epoch_to_utc(self.timestamp),
            message_id: self.message_id,
            session_id: self.session_id,
            text: self.text,
        })
    }
}

fn epoch_to_utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

impl SessionGateway for SqliteGateway {
    fn create_session(&self) -> Result<String, StoreError> {
        let session_id = new_session_id();
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (session_id, created_at, last_interaction)
                 VALUES (?1, ?2, ?2)",
                rusqlite::params![session_id, now],
            )
            .map_err(|e| StoreError::Connection(format!("Failed to create session: {}", e)))?;
            Ok(())
        })?;
        tracing::info!(session_id = %session_id, "Created session");
        Ok(session_id)
    }

    fn append_message(&self, message: &Message) -> Result<String, StoreError> {
        self.db.with_conn(|conn| {
            if !Self::session_exists(conn, &message.session_id)? {
                return Err(StoreError::NotFound(message.session_id.clone()));
            }
            Self::insert_message(conn, message)
        })?;
        Ok(message.message_id.clone())
    }

    fn recent_messages(&self, session_id: &str, limit: u64) -> Result<Vec<Message>, StoreError> {
        let raw = self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT message_id, session_id, sender, text, intent, confidence,
                            entities, feedback, feedback_timestamp, timestamp
                     FROM messages
                     WHERE session_id = ?1
                     ORDER BY timestamp DESC, rowid DESC
                     LIMIT ?2",
                )
                .map_err(StoreError::from)?;

            let rows = stmt
                .query_map(rusqlite::params![session_id, limit], Self::row_to_message)
                .map_err(StoreError::from)?;

            let mut raw = Vec::new();
            for row in rows {
                raw.push(row.map_err(StoreError::from)?);
            }
            Ok(raw)
        })?;

        // Query fetched newest-first; callers expect chronological order.
        let mut messages = Vec::with_capacity(raw.len());
        for r in raw.into_iter().rev() {
            messages.push(r.decode()?);
        }
        Ok(messages)
    }

    fn session_metadata(&self, session_id: &str) -> Result<Session, StoreError> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT session_id, created_at, last_interaction, interaction_count,
                        status, current_topic, topics_discussed, version
                 FROM sessions WHERE session_id = ?1",
                rusqlite::params![session_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, u64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, u64>(7)?,
                    ))
                },
            )
            .optional()
            .map_err(StoreError::from)
        })?;

        let (sid, created, last, count, status, topic, topics_json, version) =
            row.ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;

        let topics: Vec<Intent> = serde_json::from_str(&topics_json)
            .map_err(|e| StoreError::Connection(format!("Corrupt topics column: {}", e)))?;

        let last_interaction = epoch_to_utc(last);
        let stored_status = SessionStatus::parse(&status)
            .ok_or_else(|| StoreError::Connection(format!("Bad status: {}", status)))?;
        let idle_secs = Utc::now().timestamp() - last;
        let status = if idle_secs > i64::from(self.session_timeout_hours) * 3600 {
            SessionStatus::Expired
        } else {
            stored_status
        };

        Ok(Session {
            session_id: sid,
            created_at: epoch_to_utc(created),
            last_interaction,
            interaction_count: count,
            status,
            current_topic: topic.as_deref().and_then(Intent::parse),
            topics_discussed: topics,
            version,
        })
    }

    fn update_session(&self, session_id: &str, patch: &SessionPatch) -> Result<(), StoreError> {
        self.db
            .with_conn(|conn| Self::apply_patch(conn, session_id, patch))
    }

    fn record_feedback(&self, message_id: &str, feedback: Feedback) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE messages
                     SET feedback = ?1, feedback_timestamp = ?2
                     WHERE message_id = ?3 AND feedback IS NULL",
                    rusqlite::params![
                        feedback.as_str(),
                        Utc::now().timestamp(),
                        message_id
                    ],
                )
                .map_err(StoreError::from)?;

            if updated == 1 {
                return Ok(());
            }

            let exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM messages WHERE message_id = ?1",
                    rusqlite::params![message_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)?;

            if exists.is_some() {
                Err(StoreError::Conflict(format!(
                    "feedback already recorded for {}",
                    message_id
                )))
            } else {
                Err(StoreError::NotFound(message_id.to_string()))
            }
        })
    }

    fn persist_turn(
        &self,
        user: &Message,
        bot: &Message,
        patch: &SessionPatch,
    ) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(StoreError::from)?;
            if !Self::session_exists(&tx, &user.session_id)? {
                return Err(StoreError::NotFound(user.session_id.clone()));
            }
            Self::insert_message(&tx, user)?;
            Self::insert_message(&tx, bot)?;
            Self::apply_patch(&tx, &user.session_id, patch)?;
            tx.commit().map_err(StoreError::from)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::{EntityType, new_message_id};

    fn gateway() -> SqliteGateway {
        SqliteGateway::new(Arc::new(Database::in_memory().unwrap()), 24)
    }

    fn user_message(session_id: &str, text: &str, secs: i64) -> Message {
        Message {
            message_id: new_message_id(),
            session_id: session_id.to_string(),
            sender: Sender::User,
            text: text.to_string(),
            intent: Some(Intent::OrderStatus),
            confidence: Some(0.75),
            entities: None,
            feedback: None,
            feedback_timestamp: None,
            timestamp: epoch_to_utc(secs),
        }
    }

    fn bot_message(session_id: &str, text: &str, secs: i64) -> Message {
        Message {
            message_id: new_message_id(),
            session_id: session_id.to_string(),
            sender: Sender::Bot,
            text: text.to_string(),
            intent: None,
            confidence: None,
            entities: None,
            feedback: None,
            feedback_timestamp: None,
            timestamp: epoch_to_utc(secs),
        }
    }

    fn patch_for(session: &Session) -> SessionPatch {
        SessionPatch {
            last_interaction: Utc::now(),
            interaction_count: session.interaction_count + 1,
            current_topic: Some(Intent::OrderStatus),
            topics_discussed: vec![Intent::OrderStatus],
            expected_version: session.version,
        }
    }

    // ---- Session creation ----

    #[test]
    fn test_create_session_readable() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        let session = gw.session_metadata(&sid).unwrap();
        assert_eq!(session.session_id, sid);
        assert_eq!(session.interaction_count, 0);
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.topics_discussed.is_empty());
    }

    #[test]
    fn test_session_metadata_not_found() {
        let gw = gateway();
        let result = gw.session_metadata("session_missing");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    // ---- Messages ----

    #[test]
    fn test_append_message_requires_session() {
        let gw = gateway();
        let msg = user_message("session_missing", "hello", 100);
        let result = gw.append_message(&msg);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_append_and_read_back() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();

        let mut msg = user_message(&sid, "where is order #42", 100);
        let mut entities = EntityMap::new();
        entities.insert(EntityType::OrderNumber, "42".to_string());
        msg.entities = Some(entities);
        gw.append_message(&msg).unwrap();

        let messages = gw.recent_messages(&sid, 10).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "where is order #42");
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].intent, Some(Intent::OrderStatus));
        assert_eq!(
            messages[0]
                .entities
                .as_ref()
                .unwrap()
                .get(&EntityType::OrderNumber)
                .unwrap(),
            "42"
        );
    }

    #[test]
    fn test_recent_messages_window_oldest_first() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();

        for i in 0..8 {
            let msg = user_message(&sid, &format!("message {}", i), 100 + i);
            gw.append_message(&msg).unwrap();
        }

        let recent = gw.recent_messages(&sid, 6).unwrap();
        assert_eq!(recent.len(), 6);
        // The 6 most recent of 8 are messages 2..=7, oldest first.
        assert_eq!(recent[0].text, "message 2");
        assert_eq!(recent[5].text, "message 7");
    }

    #[test]
    fn test_recent_messages_same_second_keeps_insertion_order() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();

        gw.append_message(&user_message(&sid, "question", 100)).unwrap();
        gw.append_message(&bot_message(&sid, "answer", 100)).unwrap();

        let recent = gw.recent_messages(&sid, 10).unwrap();
        assert_eq!(recent[0].text, "question");
        assert_eq!(recent[1].text, "answer");
    }

    #[test]
    fn test_recent_messages_empty_session() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        assert!(gw.recent_messages(&sid, 6).unwrap().is_empty());
    }

    // ---- Session update / optimistic concurrency ----

    #[test]
    fn test_update_session_bumps_version() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        let session = gw.session_metadata(&sid).unwrap();

        gw.update_session(&sid, &patch_for(&session)).unwrap();

        let updated = gw.session_metadata(&sid).unwrap();
        assert_eq!(updated.version, session.version + 1);
        assert_eq!(updated.interaction_count, 1);
        assert_eq!(updated.current_topic, Some(Intent::OrderStatus));
        assert_eq!(updated.topics_discussed, vec![Intent::OrderStatus]);
    }

    #[test]
    fn test_update_session_stale_version_conflicts() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        let session = gw.session_metadata(&sid).unwrap();
        let stale = patch_for(&session);

        gw.update_session(&sid, &stale).unwrap();
        // Same expected_version again: the row has moved on.
        let result = gw.update_session(&sid, &stale);
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn test_update_session_not_found() {
        let gw = gateway();
        let session = Session::new("session_ghost".to_string(), Utc::now());
        let result = gw.update_session("session_ghost", &patch_for(&session));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    // ---- persist_turn ----

    #[test]
    fn test_persist_turn_writes_both_messages_and_patch() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        let session = gw.session_metadata(&sid).unwrap();

        let user = user_message(&sid, "where is my order", 100);
        let bot = bot_message(&sid, "let me check", 100);
        gw.persist_turn(&user, &bot, &patch_for(&session)).unwrap();

        let messages = gw.recent_messages(&sid, 10).unwrap();
        assert_eq!(messages.len(), 2);
        let updated = gw.session_metadata(&sid).unwrap();
        assert_eq!(updated.interaction_count, 1);
        assert_eq!(updated.version, 1);
    }

    #[test]
    fn test_persist_turn_conflict_writes_nothing() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        let session = gw.session_metadata(&sid).unwrap();

        let mut stale = patch_for(&session);
        stale.expected_version = session.version + 5;

        let user = user_message(&sid, "hello", 100);
        let bot = bot_message(&sid, "hi", 100);
        let result = gw.persist_turn(&user, &bot, &stale);
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        // The transaction rolled back: no messages visible.
        assert!(gw.recent_messages(&sid, 10).unwrap().is_empty());
        assert_eq!(gw.session_metadata(&sid).unwrap().version, 0);
    }

    #[test]
    fn test_persist_turn_unknown_session() {
        let gw = gateway();
        let user = user_message("session_ghost", "hello", 100);
        let bot = bot_message("session_ghost", "hi", 100);
        let patch = SessionPatch {
            last_interaction: Utc::now(),
            interaction_count: 1,
            current_topic: None,
            topics_discussed: vec![],
            expected_version: 0,
        };
        let result = gw.persist_turn(&user, &bot, &patch);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    // ---- Feedback ----

    #[test]
    fn test_record_feedback_sets_pair_once() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        let msg = bot_message(&sid, "answer", 100);
        gw.append_message(&msg).unwrap();

        gw.record_feedback(&msg.message_id, Feedback::Positive)
            .unwrap();

        let messages = gw.recent_messages(&sid, 10).unwrap();
        assert_eq!(messages[0].feedback, Some(Feedback::Positive));
        assert!(messages[0].feedback_timestamp.is_some());
    }

    #[test]
    fn test_record_feedback_twice_conflicts() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        let msg = bot_message(&sid, "answer", 100);
        gw.append_message(&msg).unwrap();

        gw.record_feedback(&msg.message_id, Feedback::Positive)
            .unwrap();
        let result = gw.record_feedback(&msg.message_id, Feedback::Negative);
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        // First write wins.
        let messages = gw.recent_messages(&sid, 10).unwrap();
        assert_eq!(messages[0].feedback, Some(Feedback::Positive));
    }

    #[test]
    fn test_record_feedback_unknown_message() {
        let gw = gateway();
        let result = gw.record_feedback("msg_ghost", Feedback::Positive);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    // ---- Expiry at read time ----

    #[test]
    fn test_idle_session_reads_as_expired() {
        let gw = SqliteGateway::new(Arc::new(Database::in_memory().unwrap()), 24);
        let sid = gw.create_session().unwrap();

        // Push last_interaction 25 hours into the past.
        let stale = Utc::now().timestamp() - 25 * 3600;
        gw.db
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE sessions SET last_interaction = ?1 WHERE session_id = ?2",
                    rusqlite::params![stale, sid],
                )
                .map_err(StoreError::from)
            })
            .unwrap();

        let session = gw.session_metadata(&sid).unwrap();
        assert_eq!(session.status, SessionStatus::Expired);
    }

    #[test]
    fn test_fresh_session_reads_as_active() {
        let gw = gateway();
        let sid = gw.create_session().unwrap();
        assert_eq!(
            gw.session_metadata(&sid).unwrap().status,
            SessionStatus::Active
        );
    }
}
