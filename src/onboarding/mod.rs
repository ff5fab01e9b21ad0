//! Conversational KYC onboarding.
//!
//! A session walks a fixed sequence of steps (phone, email, PAN, KYC
//! document, face match, profile, e-sign). `engine` decides each transition
//! from the session and the submitted event; `manager` loads and persists the
//! session around it; `routes` exposes the flow over HTTP.

pub mod decision;
pub mod engine;
pub mod manager;
pub mod model;
pub mod notify;
pub mod prompts;
pub mod routes;
pub mod state;

pub use decision::{DecisionSource, FixedDecisions, RandomDecisions};
pub use engine::{OnboardingEvent, Outcome};
pub use manager::{OnboardingManager, StartedSession};
pub use model::{ChatMessage, CustomerProfile, OnboardingSession, Sender, SessionStatus};
pub use notify::{LogNotifier, Notifier};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use state::OnboardingStep;
