//! Onboarding state machine: the fixed step sequence and its progress table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The steps of the onboarding conversation.
///
/// Progresses linearly: Welcome → PhoneVerification → PhoneOtpVerification →
/// EmailVerification → EmailOtpVerification → PanVerification → KycDocument →
/// FaceVerification → AdditionalInfo → Esign → Completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    #[default]
    Welcome,
    PhoneVerification,
    PhoneOtpVerification,
    EmailVerification,
    EmailOtpVerification,
    PanVerification,
    KycDocument,
    FaceVerification,
    AdditionalInfo,
    Esign,
    Completion,
}

impl OnboardingStep {
    /// Every step, in onboarding order.
    pub const ALL: [OnboardingStep; 11] = [
        Self::Welcome,
        Self::PhoneVerification,
        Self::PhoneOtpVerification,
        Self::EmailVerification,
        Self::EmailOtpVerification,
        Self::PanVerification,
        Self::KycDocument,
        Self::FaceVerification,
        Self::AdditionalInfo,
        Self::Esign,
        Self::Completion,
    ];

    /// Check if a transition from `self` to `target` is valid.
    ///
    /// The only edge that is not `next()` is Welcome → PhoneOtpVerification:
    /// a customer may submit a phone number straight from the welcome prompt.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        self.next() == Some(target) || matches!((self, target), (Welcome, PhoneOtpVerification))
    }

    /// Whether this step is terminal (onboarding is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completion)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Welcome => Some(PhoneVerification),
            PhoneVerification => Some(PhoneOtpVerification),
            PhoneOtpVerification => Some(EmailVerification),
            EmailVerification => Some(EmailOtpVerification),
            EmailOtpVerification => Some(PanVerification),
            PanVerification => Some(KycDocument),
            KycDocument => Some(FaceVerification),
            FaceVerification => Some(AdditionalInfo),
            AdditionalInfo => Some(Esign),
            Esign => Some(Completion),
            Completion => None,
        }
    }

    /// Progress shown to the customer once the session sits at this step.
    pub fn progress_percentage(&self) -> u8 {
        use OnboardingStep::*;
        match self {
            Welcome | PhoneVerification => 0,
            PhoneOtpVerification => 15,
            EmailVerification => 25,
            EmailOtpVerification => 30,
            PanVerification => 35,
            KycDocument => 45,
            FaceVerification => 60,
            AdditionalInfo => 80,
            Esign => 90,
            Completion => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::PhoneVerification => "phone_verification",
            Self::PhoneOtpVerification => "phone_otp_verification",
            Self::EmailVerification => "email_verification",
            Self::EmailOtpVerification => "email_otp_verification",
            Self::PanVerification => "pan_verification",
            Self::KycDocument => "kyc_document",
            Self::FaceVerification => "face_verification",
            Self::AdditionalInfo => "additional_info",
            Self::Esign => "esign",
            Self::Completion => "completion",
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step name that is not part of the onboarding sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown onboarding step: {0}")]
pub struct StepParseError(pub String);

impl FromStr for OnboardingStep {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| StepParseError(s.to_string()))
    }
}
