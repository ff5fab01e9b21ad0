//! `Database` trait: the async persistence interface the onboarding flow
//! depends on.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{ChatMessage, OnboardingSession};

/// Backend-agnostic database trait covering sessions and their transcripts.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Sessions ────────────────────────────────────────────────────

    /// Insert the session, or overwrite the stored copy with the same id.
    async fn upsert_session(&self, session: &OnboardingSession) -> Result<(), DatabaseError>;

    /// Get a session by ID.
    async fn get_session(&self, id: Uuid) -> Result<Option<OnboardingSession>, DatabaseError>;

    // ── Chat messages ───────────────────────────────────────────────

    /// Append a message to a session's transcript.
    async fn append_chat_message(&self, message: &ChatMessage) -> Result<(), DatabaseError>;

    /// Write the session and append `messages` as one atomic step. Either
    /// all of it lands or none of it does.
    async fn save_session_with_messages(
        &self,
        session: &OnboardingSession,
        messages: &[ChatMessage],
    ) -> Result<(), DatabaseError>;

    /// List up to `limit` messages for a session, oldest first.
    async fn list_chat_messages(
        &self,
        session_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, DatabaseError>;
}
