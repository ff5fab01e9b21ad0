//! Session, transcript, and customer profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::OnboardingStep;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile fields collected at the additional-info step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub full_name: String,
    pub date_of_birth: String,
    pub address: String,
    pub occupation: String,
    pub income_range: String,
}

/// One customer's onboarding attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingSession {
    pub id: Uuid,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub current_step: OnboardingStep,
    pub progress_percentage: u8,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_profile: Option<CustomerProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OnboardingSession {
    /// A fresh session at the welcome step.
    pub fn new() -> Self {
        let now = Utc::now();
        let step = OnboardingStep::Welcome;
        Self {
            id: Uuid::new_v4(),
            customer_phone: None,
            customer_email: None,
            current_step: step,
            progress_percentage: step.progress_percentage(),
            status: SessionStatus::InProgress,
            customer_profile: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

impl Default for OnboardingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Who wrote a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Agent,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
        }
    }
}

impl std::str::FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            other => Err(format!("Unknown sender: {other}")),
        }
    }
}

/// A single transcript entry. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub message: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(session_id: Uuid, sender: Sender, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            message: message.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn user(session_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(session_id, Sender::User, message)
    }

    pub fn agent(session_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(session_id, Sender::Agent, message)
    }
}
