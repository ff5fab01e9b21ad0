//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{
    ChatMessage, CustomerProfile, OnboardingSession, Sender, SessionStatus,
};
use crate::onboarding::state::OnboardingStep;
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical write format: RFC 3339, UTC, fixed nanosecond width, so that
/// string order in SQL matches chronological order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    // Try RFC 3339 first (our canonical write format)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    // Try SQLite datetime() output without fractional seconds
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn str_to_status(s: &str) -> SessionStatus {
    match s {
        "completed" => SessionStatus::Completed,
        _ => SessionStatus::InProgress,
    }
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<String>` to libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to an OnboardingSession.
///
/// Column order matches SESSION_COLUMNS. A row whose step is not part of the
/// onboarding sequence is a serialization error rather than a silent default.
fn row_to_session(row: &libsql::Row) -> Result<OnboardingSession, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("session row parse: {e}"));

    let id_str: String = row.get(0).map_err(read)?;
    let step_str: String = row.get(3).map_err(read)?;
    let progress: i64 = row.get(4).map_err(read)?;
    let status_str: String = row.get(5).map_err(read)?;
    let profile_str: Option<String> = row.get(6).ok();
    let created_str: String = row.get(7).map_err(read)?;
    let updated_str: String = row.get(8).map_err(read)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Serialization(format!("session id {id_str}: {e}")))?;
    let current_step: OnboardingStep = step_str
        .parse()
        .map_err(|e| DatabaseError::Serialization(format!("session {id}: {e}")))?;
    let progress_percentage = u8::try_from(progress).map_err(|_| {
        DatabaseError::Serialization(format!("session {id}: progress {progress} out of range"))
    })?;
    let customer_profile = match profile_str {
        Some(json) => Some(
            serde_json::from_str::<CustomerProfile>(&json)
                .map_err(|e| DatabaseError::Serialization(format!("session {id} profile: {e}")))?,
        ),
        None => None,
    };

    Ok(OnboardingSession {
        id,
        customer_phone: row.get(1).ok(),
        customer_email: row.get(2).ok(),
        current_step,
        progress_percentage,
        status: str_to_status(&status_str),
        customer_profile,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

/// Map a libsql Row to a ChatMessage.
///
/// Column order matches CHAT_COLUMNS.
fn row_to_chat_message(row: &libsql::Row) -> Result<ChatMessage, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("chat row parse: {e}"));

    let id_str: String = row.get(0).map_err(read)?;
    let session_str: String = row.get(1).map_err(read)?;
    let sender_str: String = row.get(2).map_err(read)?;
    let message: String = row.get(3).map_err(read)?;
    let timestamp_str: String = row.get(4).map_err(read)?;

    Ok(ChatMessage {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        session_id: Uuid::parse_str(&session_str)
            .map_err(|e| DatabaseError::Serialization(format!("chat session id: {e}")))?,
        message,
        sender: sender_str
            .parse::<Sender>()
            .map_err(DatabaseError::Serialization)?,
        timestamp: parse_datetime(&timestamp_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const SESSION_COLUMNS: &str = "id, customer_phone, customer_email, current_step, progress_percentage, status, customer_profile, created_at, updated_at";

const CHAT_COLUMNS: &str = "id, session_id, sender, message, timestamp";

async fn write_session(conn: &Connection, session: &OnboardingSession) -> Result<(), DatabaseError> {
    let profile = session
        .customer_profile
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

    conn.execute(
        &format!(
            "INSERT INTO onboarding_sessions ({SESSION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (id) DO UPDATE SET
                customer_phone = ?2,
                customer_email = ?3,
                current_step = ?4,
                progress_percentage = ?5,
                status = ?6,
                customer_profile = ?7,
                updated_at = ?9"
        ),
        params![
            session.id.to_string(),
            opt_text(session.customer_phone.as_deref()),
            opt_text(session.customer_email.as_deref()),
            session.current_step.as_str(),
            i64::from(session.progress_percentage),
            session.status.as_str(),
            opt_text_owned(profile),
            format_datetime(&session.created_at),
            format_datetime(&session.updated_at),
        ],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("upsert_session: {e}")))?;

    debug!(
        id = %session.id,
        step = %session.current_step,
        progress = session.progress_percentage,
        "Session saved to DB"
    );
    Ok(())
}

async fn write_chat_message(conn: &Connection, message: &ChatMessage) -> Result<(), DatabaseError> {
    conn.execute(
        &format!("INSERT INTO chat_messages ({CHAT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
        params![
            message.id.to_string(),
            message.session_id.to_string(),
            message.sender.as_str(),
            message.message.as_str(),
            format_datetime(&message.timestamp),
        ],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("append_chat_message: {e}")))?;

    debug!(
        id = %message.id,
        session_id = %message.session_id,
        sender = message.sender.as_str(),
        "Chat message appended"
    );
    Ok(())
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Sessions ────────────────────────────────────────────────────

    async fn upsert_session(&self, session: &OnboardingSession) -> Result<(), DatabaseError> {
        write_session(self.conn(), session).await
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<OnboardingSession>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM onboarding_sessions WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_session: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_session(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_session: {e}"))),
        }
    }

    // ── Chat messages ───────────────────────────────────────────────

    async fn append_chat_message(&self, message: &ChatMessage) -> Result<(), DatabaseError> {
        write_chat_message(self.conn(), message).await
    }

    async fn save_session_with_messages(
        &self,
        session: &OnboardingSession,
        messages: &[ChatMessage],
    ) -> Result<(), DatabaseError> {
        let tx = self
            .conn()
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("save_session_with_messages: {e}")))?;

        let written: Result<(), DatabaseError> = async {
            write_session(&tx, session).await?;
            for message in messages {
                write_chat_message(&tx, message).await?;
            }
            Ok(())
        }
        .await;

        match written {
            Ok(()) => tx
                .commit()
                .await
                .map_err(|e| DatabaseError::Query(format!("save_session_with_messages: {e}"))),
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!("Rollback of session {} failed: {rollback}", session.id);
                }
                Err(e)
            }
        }
    }

    async fn list_chat_messages(
        &self,
        session_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, DatabaseError> {
        let conn = self.conn();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CHAT_COLUMNS} FROM chat_messages WHERE session_id = ?1
                     ORDER BY timestamp ASC, rowid ASC LIMIT ?2"
                ),
                params![session_id.to_string(), limit],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_chat_messages: {e}")))?;

        let mut messages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_chat_messages: {e}")))?
        {
            match row_to_chat_message(&row) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    tracing::warn!("Skipping chat message row: {e}");
                }
            }
        }
        Ok(messages)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn make_profile() -> CustomerProfile {
        CustomerProfile {
            full_name: "Asha Rao".to_string(),
            date_of_birth: "1990-04-12".to_string(),
            address: "12 MG Road, Bengaluru".to_string(),
            occupation: "Engineer".to_string(),
            income_range: "10-25L".to_string(),
        }
    }

    // ── Session tests ───────────────────────────────────────────────

    #[tokio::test]
    async fn insert_and_get_session() {
        let db = test_db().await;
        let session = OnboardingSession::new();
        db.upsert_session(&session).await.unwrap();

        let loaded = db.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.current_step, OnboardingStep::Welcome);
        assert_eq!(loaded.progress_percentage, 0);
        assert_eq!(loaded.status, SessionStatus::InProgress);
        assert!(loaded.customer_phone.is_none());
        assert!(loaded.customer_profile.is_none());
        assert_eq!(loaded.created_at, session.created_at);
    }

    #[tokio::test]
    async fn get_session_not_found() {
        let db = test_db().await;
        let result = db.get_session(Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn upsert_overwrites_mutable_fields() {
        let db = test_db().await;
        let mut session = OnboardingSession::new();
        db.upsert_session(&session).await.unwrap();

        session.customer_phone = Some("9876543210".to_string());
        session.customer_email = Some("asha@example.com".to_string());
        session.current_step = OnboardingStep::Completion;
        session.progress_percentage = 100;
        session.status = SessionStatus::Completed;
        session.customer_profile = Some(make_profile());
        session.updated_at = session.updated_at + Duration::seconds(5);
        db.upsert_session(&session).await.unwrap();

        let loaded = db.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn upsert_keeps_created_at() {
        let db = test_db().await;
        let mut session = OnboardingSession::new();
        let created = session.created_at;
        db.upsert_session(&session).await.unwrap();

        session.created_at = created + Duration::days(1);
        db.upsert_session(&session).await.unwrap();

        let loaded = db.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.created_at, created);
    }

    #[tokio::test]
    async fn save_with_messages_writes_everything() {
        let db = test_db().await;
        let mut session = OnboardingSession::new();
        db.upsert_session(&session).await.unwrap();

        session.current_step = OnboardingStep::PhoneVerification;
        let messages = [
            ChatMessage::user(session.id, "Let's start"),
            ChatMessage::agent(session.id, "Please enter your mobile number"),
        ];
        db.save_session_with_messages(&session, &messages).await.unwrap();

        let loaded = db.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_step, OnboardingStep::PhoneVerification);
        let listed = db.list_chat_messages(session.id, 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].sender, Sender::User);
        assert_eq!(listed[1].sender, Sender::Agent);
    }

    #[tokio::test]
    async fn failed_message_write_rolls_back_the_session() {
        let db = test_db().await;
        let mut session = OnboardingSession::new();
        let greeting = ChatMessage::agent(session.id, "Hi there!");
        db.save_session_with_messages(&session, std::slice::from_ref(&greeting))
            .await
            .unwrap();

        // Reusing the greeting's id violates the primary key on the second write
        session.current_step = OnboardingStep::PhoneVerification;
        let messages = [ChatMessage::user(session.id, "Let's start"), greeting.clone()];
        let result = db.save_session_with_messages(&session, &messages).await;
        assert!(result.is_err());

        let loaded = db.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_step, OnboardingStep::Welcome);
        let listed = db.list_chat_messages(session.id, 10).await.unwrap();
        assert_eq!(listed, vec![greeting]);

        // The connection is usable again after the rollback
        db.save_session_with_messages(&session, &[ChatMessage::user(session.id, "retry")])
            .await
            .unwrap();
        assert_eq!(
            db.get_session(session.id).await.unwrap().unwrap().current_step,
            OnboardingStep::PhoneVerification
        );
    }

    #[tokio::test]
    async fn unknown_step_in_row_fails_to_load() {
        let db = test_db().await;
        let session = OnboardingSession::new();
        db.upsert_session(&session).await.unwrap();

        db.conn()
            .execute(
                "UPDATE onboarding_sessions SET current_step = 'video_kyc' WHERE id = ?1",
                params![session.id.to_string()],
            )
            .await
            .unwrap();

        let err = db.get_session(session.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Serialization(_)), "got {err:?}");
    }

    // ── Chat tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn append_and_list_messages() {
        let db = test_db().await;
        let session_id = Uuid::new_v4();
        let first = ChatMessage::agent(session_id, "welcome");
        let second = ChatMessage::user(session_id, "hi");
        db.append_chat_message(&first).await.unwrap();
        db.append_chat_message(&second).await.unwrap();

        let messages = db.list_chat_messages(session_id, 100).await.unwrap();
        assert_eq!(messages, vec![first, second]);
    }

    #[tokio::test]
    async fn list_is_time_ordered_not_insert_ordered() {
        let db = test_db().await;
        let session_id = Uuid::new_v4();
        let mut late = ChatMessage::agent(session_id, "late");
        late.timestamp = Utc::now() + Duration::seconds(10);
        let early = ChatMessage::user(session_id, "early");
        db.append_chat_message(&late).await.unwrap();
        db.append_chat_message(&early).await.unwrap();

        let messages = db.list_chat_messages(session_id, 100).await.unwrap();
        let bodies: Vec<&str> = messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_insert_order() {
        let db = test_db().await;
        let session_id = Uuid::new_v4();
        let now = Utc::now();
        for body in ["a", "b", "c"] {
            let mut msg = ChatMessage::agent(session_id, body);
            msg.timestamp = now;
            db.append_chat_message(&msg).await.unwrap();
        }

        let messages = db.list_chat_messages(session_id, 100).await.unwrap();
        let bodies: Vec<&str> = messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn list_respects_limit_and_session() {
        let db = test_db().await;
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();
        for i in 0..5 {
            db.append_chat_message(&ChatMessage::user(mine, format!("m{i}")))
                .await
                .unwrap();
        }
        db.append_chat_message(&ChatMessage::user(other, "elsewhere"))
            .await
            .unwrap();

        let limited = db.list_chat_messages(mine, 3).await.unwrap();
        let bodies: Vec<&str> = limited.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, vec!["m0", "m1", "m2"]);

        assert_eq!(db.list_chat_messages(other, 100).await.unwrap().len(), 1);
        assert!(db.list_chat_messages(Uuid::new_v4(), 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_local_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("dir").join("test.db");
        let db = LibSqlBackend::new_local(&db_path).await.unwrap();
        assert!(db_path.exists());

        let session = OnboardingSession::new();
        db.upsert_session(&session).await.unwrap();
        assert!(db.get_session(session.id).await.unwrap().is_some());
    }

    #[test]
    fn datetime_format_is_fixed_width() {
        let a = format_datetime(&Utc::now());
        let b = format_datetime(&DateTime::<Utc>::from_timestamp(0, 0).unwrap());
        assert_eq!(a.len(), b.len());
        assert!(a.ends_with('Z'));
        assert_eq!(parse_datetime(&b), DateTime::<Utc>::from_timestamp(0, 0).unwrap());
    }
}
