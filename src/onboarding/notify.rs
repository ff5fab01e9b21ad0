//! Notifier: outbound OTP and confirmation delivery.
//!
//! Real SMS/email delivery is out of scope; `LogNotifier` only records what
//! would have been sent.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// Where an OTP goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpChannel {
    Sms,
    Email,
}

impl std::fmt::Display for OtpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sms => write!(f, "sms"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// Confirmation messages sent after a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    EmailVerified,
    OnboardingCompleted,
}

impl std::fmt::Display for Confirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailVerified => write!(f, "email_verified"),
            Self::OnboardingCompleted => write!(f, "onboarding_completed"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Delivery over {channel} failed: {reason}")]
pub struct DeliveryError {
    pub channel: String,
    pub reason: String,
}

/// Delivery capability the onboarding flow depends on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver_otp(
        &self,
        channel: OtpChannel,
        destination: &str,
        otp: &str,
    ) -> Result<(), DeliveryError>;

    async fn send_confirmation(
        &self,
        kind: Confirmation,
        session_id: Uuid,
        destination: Option<&str>,
    ) -> Result<(), DeliveryError>;
}

/// Notifier that writes deliveries to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver_otp(
        &self,
        channel: OtpChannel,
        destination: &str,
        _otp: &str,
    ) -> Result<(), DeliveryError> {
        info!(%channel, destination = %mask(destination), "OTP delivered (simulated)");
        Ok(())
    }

    async fn send_confirmation(
        &self,
        kind: Confirmation,
        session_id: Uuid,
        destination: Option<&str>,
    ) -> Result<(), DeliveryError> {
        info!(
            %kind,
            session_id = %session_id,
            destination = %destination.map(mask).unwrap_or_default(),
            "Confirmation sent (simulated)"
        );
        Ok(())
    }
}

/// Keep only the last four characters of a phone number or address.
pub fn mask(destination: &str) -> String {
    let chars: Vec<char> = destination.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}
