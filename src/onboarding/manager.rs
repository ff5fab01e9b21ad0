//! OnboardingManager: coordinates the store, the transition engine, and
//! side-effect delivery for every onboarding request.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{OnboardingConfig, SimulatedLatency};
use crate::error::OnboardingError;
use crate::store::Database;

use super::decision::DecisionSource;
use super::engine::{self, OnboardingEvent, Outcome, SideEffect, StepChange};
use super::model::{ChatMessage, OnboardingSession};
use super::notify::Notifier;
use super::prompts::step_prompt;
use super::state::OnboardingStep;

/// A freshly started session and the greeting stored with it.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session: OnboardingSession,
    pub message: String,
}

/// Runs onboarding requests against persisted sessions.
///
/// Holds no per-session state of its own: every call loads the session,
/// decides, and writes back.
pub struct OnboardingManager {
    db: Arc<dyn Database>,
    decisions: Arc<dyn DecisionSource>,
    notifier: Arc<dyn Notifier>,
    config: OnboardingConfig,
}

impl OnboardingManager {
    pub fn new(
        db: Arc<dyn Database>,
        decisions: Arc<dyn DecisionSource>,
        notifier: Arc<dyn Notifier>,
        config: OnboardingConfig,
    ) -> Self {
        Self {
            db,
            decisions,
            notifier,
            config,
        }
    }

    /// Create a session at the welcome step and greet the customer.
    pub async fn start(&self) -> Result<StartedSession, OnboardingError> {
        let session = OnboardingSession::new();
        let message = step_prompt(OnboardingStep::Welcome).to_string();
        let greeting = ChatMessage::agent(session.id, message.clone());
        self.db
            .save_session_with_messages(&session, &[greeting])
            .await?;

        info!(session_id = %session.id, "Onboarding session started");
        Ok(StartedSession { session, message })
    }

    /// Load a session, or `SessionNotFound`.
    pub async fn session(&self, id: Uuid) -> Result<OnboardingSession, OnboardingError> {
        self.db
            .get_session(id)
            .await?
            .ok_or_else(|| OnboardingError::not_found(id.to_string()))
    }

    /// The session's transcript, oldest first, capped at the configured limit.
    pub async fn history(&self, id: Uuid) -> Result<Vec<ChatMessage>, OnboardingError> {
        self.session(id).await?;
        Ok(self
            .db
            .list_chat_messages(id, self.config.history_limit)
            .await?)
    }

    /// Handle a free-form chat message and return the agent's reply.
    pub async fn chat(&self, id: Uuid, text: &str) -> Result<String, OnboardingError> {
        let mut session = self.session(id).await?;
        let turn = engine::respond(&session, text);

        match &turn.change {
            Some(change) => self.commit(&mut session, change).await?,
            None => {
                self.db
                    .append_chat_message(&ChatMessage::user(id, text))
                    .await?;
                self.db
                    .append_chat_message(&ChatMessage::agent(id, turn.reply.clone()))
                    .await?;
            }
        }

        Ok(turn.reply)
    }

    /// Feed a customer submission to the session's state machine.
    ///
    /// A failed verification is an `Ok` outcome with `success: false` and
    /// leaves both the session and its transcript untouched.
    pub async fn submit(
        &self,
        id: Uuid,
        event: OnboardingEvent,
    ) -> Result<Outcome, OnboardingError> {
        let delay = self.config.latency(latency_for(&event));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut session = self.session(id).await?;
        let transition = engine::advance(&session, &event, self.decisions.as_ref());

        let Some(change) = transition.change else {
            warn!(
                session_id = %id,
                event = event.name(),
                step = %session.current_step,
                reason = %transition.outcome.message,
                "Onboarding submission rejected"
            );
            return Ok(transition.outcome);
        };

        self.commit(&mut session, &change).await?;
        if let Some(effect) = &change.side_effect {
            self.dispatch(&session, effect).await;
        }

        Ok(transition.outcome)
    }

    /// Persist a step change together with both sides of it in the
    /// transcript. A store failure leaves the stored session where it was.
    async fn commit(
        &self,
        session: &mut OnboardingSession,
        change: &StepChange,
    ) -> Result<(), OnboardingError> {
        let mut updated = session.clone();
        change.apply(&mut updated);
        let messages = [
            ChatMessage::user(updated.id, change.user_message.clone()),
            ChatMessage::agent(updated.id, change.agent_message.clone()),
        ];
        self.db.save_session_with_messages(&updated, &messages).await?;
        *session = updated;

        info!(
            session_id = %session.id,
            from = %change.from,
            to = %change.to,
            progress = change.progress_percentage,
            "Onboarding step advanced"
        );
        Ok(())
    }

    async fn dispatch(&self, session: &OnboardingSession, effect: &SideEffect) {
        let result = match effect {
            SideEffect::DeliverOtp {
                channel,
                destination,
                otp,
            } => self.notifier.deliver_otp(*channel, destination, otp).await,
            SideEffect::Confirm(kind) => {
                self.notifier
                    .send_confirmation(*kind, session.id, session.customer_email.as_deref())
                    .await
            }
        };

        match result {
            Ok(()) => debug!(session_id = %session.id, "Side effect delivered"),
            Err(e) => warn!(session_id = %session.id, error = %e, "Side effect delivery failed"),
        }
    }
}

fn latency_for(event: &OnboardingEvent) -> SimulatedLatency {
    match event {
        OnboardingEvent::SubmitPhone { .. }
        | OnboardingEvent::SubmitOtp { .. }
        | OnboardingEvent::SubmitEmail { .. }
        | OnboardingEvent::SubmitAdditionalInfo(_) => SimulatedLatency::Short,
        OnboardingEvent::SubmitKycDocument(_)
        | OnboardingEvent::SubmitBiometric { .. }
        | OnboardingEvent::SubmitEsign { .. } => SimulatedLatency::Long,
    }
}
