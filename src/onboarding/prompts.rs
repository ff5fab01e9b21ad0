//! Canned agent prompts for each onboarding step.

use super::state::OnboardingStep;

/// Demo OTP "sent" to the customer's phone.
pub const PHONE_OTP: &str = "123456";
/// Demo OTP "sent" to the customer's email.
pub const EMAIL_OTP: &str = "654321";

/// Prefix of the agent message sent once the email OTP is accepted.
pub const EMAIL_VERIFIED_PREFIX: &str =
    "Perfect! Email verified successfully! ✅ I've sent a verification confirmation to your email. ";

/// The agent prompt shown when a session arrives at `step`.
pub fn step_prompt(step: OnboardingStep) -> &'static str {
    match step {
        OnboardingStep::Welcome => {
            "Hi there! I'm Boardy, your personal AI banking assistant! 👋 I'll help you complete \
your account opening in just a few simple steps. We'll verify your mobile number and email, \
then complete your KYC process. Ready to get started with me? 🚀"
        }

        OnboardingStep::PhoneVerification => {
            "Great! Now I need to verify your mobile number. Please enter your 10-digit mobile \
number, and I'll send you an OTP for verification. 📱"
        }

        OnboardingStep::PhoneOtpVerification => {
            "Perfect! I've sent a 6-digit OTP to your mobile number. Please enter the OTP you \
received. (For demo: use 123456) 🔢"
        }

        OnboardingStep::EmailVerification => {
            "Excellent! Now let's verify your email address. Please provide your email ID, and \
I'll send you a verification code. 📧"
        }

        OnboardingStep::EmailOtpVerification => {
            "Great! I've sent a 6-digit OTP to your email address. Please check your inbox and \
enter the OTP you received. (For demo: use 654321) 📧✨"
        }

        OnboardingStep::PanVerification => {
            "Now let's start with your KYC verification. First, I need to verify your PAN card \
details. Please enter your 10-character PAN number. 🆔"
        }

        OnboardingStep::KycDocument => {
            "Excellent! Your PAN is verified. Now please choose your preferred KYC method:\n\n\
🪪 **Aadhaar eKYC** - Quick verification using your Aadhaar number\n\
📄 **DigiLocker** - Upload documents from your DigiLocker\n\n\
You can also upload documents directly for verification."
        }

        OnboardingStep::FaceVerification => {
            "Almost there! Now I need to capture your photo for biometric verification. This \
helps us ensure account security. Please position your face clearly in the camera frame and \
click capture. 📸"
        }

        OnboardingStep::AdditionalInfo => {
            "Great! Your identity is verified. Now I need some additional information to \
complete your profile. This helps us provide better services tailored to your needs. 📋"
        }

        OnboardingStep::Esign => {
            "Final step! Please review your application details and provide your digital \
signature to complete the account opening process. ✍️"
        }

        OnboardingStep::Completion => {
            "🎉 Congratulations! Your account opening is complete! \n\n\
Your application has been submitted successfully. You'll receive:\n\
• Account details via SMS/Email within 24 hours\n\
• Debit card delivery in 3-5 business days\n\
• Welcome kit with all account information\n\n\
Thank you for choosing us! - Boardy 😊"
        }
    }
}

/// The agent message appended when a session arrives at `step`.
///
/// Identical to [`step_prompt`] except at `PanVerification`, which is only
/// reached through a successful email OTP and leads with that confirmation.
pub fn arrival_message(step: OnboardingStep) -> String {
    match step {
        OnboardingStep::PanVerification => {
            format!("{EMAIL_VERIFIED_PREFIX}{}", step_prompt(step))
        }
        other => step_prompt(other).to_string(),
    }
}

/// Failure message for an action the current step does not accept.
pub fn out_of_step_message(current: OnboardingStep) -> String {
    format!(
        "That action isn't available right now. {}",
        step_prompt(current)
    )
}
