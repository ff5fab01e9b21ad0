//! KYC Onboard: conversational customer onboarding service.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;
