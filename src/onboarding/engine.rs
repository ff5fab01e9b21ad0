//! Transition engine: pure (session, event) → transition logic.
//!
//! Nothing here touches the store or the clock beyond building the
//! `StepChange`; the manager decides when to persist it.

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use super::decision::{BIOMETRIC_MATCH_THRESHOLD, DecisionSource, DocumentKind};
use super::model::{CustomerProfile, OnboardingSession, SessionStatus};
use super::notify::{Confirmation, OtpChannel};
use super::prompts::{EMAIL_OTP, PHONE_OTP, arrival_message, out_of_step_message, step_prompt};
use super::state::OnboardingStep;

/// Which OTP a code is being checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpKind {
    Phone,
    Email,
}

impl OtpKind {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "phone" => Some(Self::Phone),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    /// The fixed demo code that passes.
    pub fn expected_code(&self) -> &'static str {
        match self {
            Self::Phone => PHONE_OTP,
            Self::Email => EMAIL_OTP,
        }
    }
}

/// A KYC document as submitted by the customer.
#[derive(Debug, Clone, Default)]
pub struct KycSubmission {
    pub document_type: String,
    pub pan_number: Option<String>,
    pub aadhaar_number: Option<String>,
    pub document_data: Option<String>,
    pub document_file: Option<String>,
}

/// Something the customer submitted.
#[derive(Debug, Clone)]
pub enum OnboardingEvent {
    SubmitPhone { phone: String },
    SubmitOtp { verification_type: String, otp: String },
    SubmitEmail { email: String },
    SubmitKycDocument(KycSubmission),
    SubmitBiometric { face_image: String },
    SubmitAdditionalInfo(CustomerProfile),
    SubmitEsign { signature_data: String },
}

impl OnboardingEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitPhone { .. } => "submit_phone",
            Self::SubmitOtp { .. } => "submit_otp",
            Self::SubmitEmail { .. } => "submit_email",
            Self::SubmitKycDocument(_) => "submit_kyc_document",
            Self::SubmitBiometric { .. } => "submit_biometric",
            Self::SubmitAdditionalInfo(_) => "submit_additional_info",
            Self::SubmitEsign { .. } => "submit_esign",
        }
    }
}

/// What the caller reports back: `{success, message}` plus the demo OTP when
/// one was "sent".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            otp: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            otp: None,
        }
    }

    fn with_otp(mut self, otp: &str) -> Self {
        self.otp = Some(otp.to_string());
        self
    }
}

/// Customer data captured by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Phone(String),
    Email(String),
    Profile(CustomerProfile),
}

/// Work the caller performs after persisting a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    DeliverOtp {
        channel: OtpChannel,
        destination: String,
        otp: String,
    },
    Confirm(Confirmation),
}

/// A successful move to a new step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepChange {
    pub from: OnboardingStep,
    pub to: OnboardingStep,
    pub progress_percentage: u8,
    pub status: SessionStatus,
    /// Transcript entry recording what the customer did.
    pub user_message: String,
    /// Transcript entry the agent answers with.
    pub agent_message: String,
    pub captured: Option<Captured>,
    pub side_effect: Option<SideEffect>,
}

impl StepChange {
    fn new(from: OnboardingStep, to: OnboardingStep, user_message: impl Into<String>) -> Self {
        debug_assert!(from.can_transition_to(to), "{from} cannot move to {to}");
        Self {
            from,
            to,
            progress_percentage: to.progress_percentage(),
            status: if to.is_terminal() {
                SessionStatus::Completed
            } else {
                SessionStatus::InProgress
            },
            user_message: user_message.into(),
            agent_message: arrival_message(to),
            captured: None,
            side_effect: None,
        }
    }

    fn capturing(mut self, captured: Captured) -> Self {
        self.captured = Some(captured);
        self
    }

    fn with_side_effect(mut self, effect: SideEffect) -> Self {
        self.side_effect = Some(effect);
        self
    }

    /// Write the change into `session`.
    pub fn apply(&self, session: &mut OnboardingSession) {
        session.current_step = self.to;
        session.progress_percentage = self.progress_percentage;
        session.status = self.status;
        match &self.captured {
            Some(Captured::Phone(phone)) => session.customer_phone = Some(phone.clone()),
            Some(Captured::Email(email)) => session.customer_email = Some(email.clone()),
            Some(Captured::Profile(profile)) => session.customer_profile = Some(profile.clone()),
            None => {}
        }
        session.updated_at = Utc::now();
    }
}

/// Result of feeding one event to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub outcome: Outcome,
    /// Present only when the event succeeded.
    pub change: Option<StepChange>,
}

impl Transition {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::failed(message),
            change: None,
        }
    }

    fn accepted(outcome: Outcome, change: StepChange) -> Self {
        Self {
            outcome,
            change: Some(change),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.success
    }
}

/// Decide what `event` does to `session`.
///
/// Failed verifications come back with `change: None` and must leave the
/// session untouched.
pub fn advance(
    session: &OnboardingSession,
    event: &OnboardingEvent,
    decisions: &dyn DecisionSource,
) -> Transition {
    let transition = evaluate(session.current_step, event, decisions);
    debug!(
        event = event.name(),
        from = %session.current_step,
        success = transition.succeeded(),
        "Onboarding event evaluated"
    );
    transition
}

fn evaluate(
    step: OnboardingStep,
    event: &OnboardingEvent,
    decisions: &dyn DecisionSource,
) -> Transition {
    use OnboardingStep::*;

    match event {
        OnboardingEvent::SubmitPhone { phone } => {
            if !matches!(step, Welcome | PhoneVerification) {
                return Transition::rejected(out_of_step_message(step));
            }
            let user_message = format!("My mobile number is {phone}");
            let change = StepChange::new(step, PhoneOtpVerification, user_message)
                .capturing(Captured::Phone(phone.clone()))
                .with_side_effect(SideEffect::DeliverOtp {
                    channel: OtpChannel::Sms,
                    destination: phone.clone(),
                    otp: PHONE_OTP.to_string(),
                });
            Transition::accepted(
                Outcome::ok("OTP sent successfully to your mobile").with_otp(PHONE_OTP),
                change,
            )
        }

        OnboardingEvent::SubmitOtp {
            verification_type,
            otp,
        } => {
            let Some(kind) = OtpKind::from_wire(verification_type) else {
                return Transition::rejected("Invalid verification type.");
            };
            let expected_step = match kind {
                OtpKind::Phone => PhoneOtpVerification,
                OtpKind::Email => EmailOtpVerification,
            };
            if step != expected_step {
                return Transition::rejected(out_of_step_message(step));
            }
            if otp != kind.expected_code() {
                return Transition::rejected(match kind {
                    OtpKind::Phone => "Invalid OTP. Please try again.",
                    OtpKind::Email => "Invalid email OTP. Please try again.",
                });
            }
            match kind {
                OtpKind::Phone => Transition::accepted(
                    Outcome::ok("Phone verified successfully!"),
                    StepChange::new(step, EmailVerification, "Submitted phone OTP"),
                ),
                OtpKind::Email => Transition::accepted(
                    Outcome::ok("Email verified successfully! Confirmation sent to your email."),
                    StepChange::new(step, PanVerification, "Submitted email OTP")
                        .with_side_effect(SideEffect::Confirm(Confirmation::EmailVerified)),
                ),
            }
        }

        OnboardingEvent::SubmitEmail { email } => {
            if step != EmailVerification {
                return Transition::rejected(out_of_step_message(step));
            }
            let user_message = format!("My email is {email}");
            let change = StepChange::new(step, EmailOtpVerification, user_message)
                .capturing(Captured::Email(email.clone()))
                .with_side_effect(SideEffect::DeliverOtp {
                    channel: OtpChannel::Email,
                    destination: email.clone(),
                    otp: EMAIL_OTP.to_string(),
                });
            Transition::accepted(
                Outcome::ok("OTP sent successfully to your email!").with_otp(EMAIL_OTP),
                change,
            )
        }

        OnboardingEvent::SubmitKycDocument(submission) => {
            verify_document(step, submission, decisions)
        }

        OnboardingEvent::SubmitBiometric { .. } => {
            if step != FaceVerification {
                return Transition::rejected(out_of_step_message(step));
            }
            let score = decisions.biometric_score();
            if score < BIOMETRIC_MATCH_THRESHOLD {
                return Transition::rejected(
                    "Face verification failed. Please try again with better lighting.",
                );
            }
            Transition::accepted(
                Outcome::ok(format!(
                    "Face verification successful! Match score: {score}%"
                )),
                StepChange::new(step, AdditionalInfo, "Captured face photo"),
            )
        }

        OnboardingEvent::SubmitAdditionalInfo(profile) => {
            if step != AdditionalInfo {
                return Transition::rejected(out_of_step_message(step));
            }
            Transition::accepted(
                Outcome::ok("Information saved successfully!"),
                StepChange::new(step, Esign, "Submitted profile details")
                    .capturing(Captured::Profile(profile.clone())),
            )
        }

        OnboardingEvent::SubmitEsign { .. } => {
            if step != Esign {
                return Transition::rejected(out_of_step_message(step));
            }
            Transition::accepted(
                Outcome::ok("Onboarding completed successfully!"),
                StepChange::new(step, Completion, "Signed the application")
                    .with_side_effect(SideEffect::Confirm(Confirmation::OnboardingCompleted)),
            )
        }
    }
}

fn verify_document(
    step: OnboardingStep,
    submission: &KycSubmission,
    decisions: &dyn DecisionSource,
) -> Transition {
    let Some(kind) = DocumentKind::from_wire(&submission.document_type) else {
        return Transition::rejected("Invalid document type.");
    };

    match kind {
        DocumentKind::Pan => {
            if step != OnboardingStep::PanVerification {
                return Transition::rejected(out_of_step_message(step));
            }
            let valid_format = submission
                .pan_number
                .as_deref()
                .is_some_and(|pan| pan.chars().count() == 10);
            if !valid_format {
                return Transition::rejected("Please enter a valid 10-character PAN number.");
            }
            if !decisions.document_verified(kind) {
                return Transition::rejected(
                    "PAN verification failed. Please check your PAN number and try again.",
                );
            }
            Transition::accepted(
                Outcome::ok("PAN verified successfully!"),
                StepChange::new(step, OnboardingStep::KycDocument, "Submitted PAN for verification"),
            )
        }
        DocumentKind::Aadhaar | DocumentKind::DigiLocker => {
            if step != OnboardingStep::KycDocument {
                return Transition::rejected(out_of_step_message(step));
            }
            let name = kind.display_name();
            if !decisions.document_verified(kind) {
                return Transition::rejected(format!(
                    "{name} verification failed. Please check your details and try again."
                ));
            }
            Transition::accepted(
                Outcome::ok(format!("{name} verified successfully!")),
                StepChange::new(
                    step,
                    OnboardingStep::FaceVerification,
                    format!("Submitted {name} for verification"),
                ),
            )
        }
    }
}

/// Reply to a free-form chat message.
///
/// At the welcome step any message is the customer's go-ahead and moves the
/// session to phone verification. Everywhere else the agent repeats the
/// current step's prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub reply: String,
    pub change: Option<StepChange>,
}

pub fn respond(session: &OnboardingSession, text: &str) -> ChatTurn {
    let step = session.current_step;
    if step == OnboardingStep::Welcome {
        let change = StepChange::new(step, OnboardingStep::PhoneVerification, text);
        return ChatTurn {
            reply: change.agent_message.clone(),
            change: Some(change),
        };
    }
    ChatTurn {
        reply: step_prompt(step).to_string(),
        change: None,
    }
}
