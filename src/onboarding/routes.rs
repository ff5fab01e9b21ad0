//! REST endpoints for onboarding sessions, chat, and verification steps.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OnboardingError;

use super::engine::{KycSubmission, OnboardingEvent, Outcome};
use super::manager::OnboardingManager;
use super::model::{ChatMessage, CustomerProfile, OnboardingSession};

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub manager: Arc<OnboardingManager>,
}

impl IntoResponse for OnboardingError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            OnboardingError::SessionNotFound { .. } => {
                (StatusCode::NOT_FOUND, "Session not found".to_string())
            }
            OnboardingError::Database(e) => {
                tracing::error!(error = %e, "Onboarding store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Session ids arrive as free text; anything that isn't a UUID can't name a
/// stored session.
fn parse_session_id(raw: &str) -> Result<Uuid, OnboardingError> {
    Uuid::parse_str(raw.trim()).map_err(|_| OnboardingError::not_found(raw))
}

// ── Request / response bodies ───────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneRequest {
    pub session_id: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub session_id: String,
    /// A missing code is checked like any other wrong code.
    #[serde(default)]
    pub otp: String,
    /// A missing type is rejected as an invalid verification type.
    #[serde(default)]
    pub verification_type: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub session_id: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct KycDocumentRequest {
    pub session_id: String,
    pub document_type: String,
    #[serde(default)]
    pub pan_number: Option<String>,
    #[serde(default)]
    pub aadhaar_number: Option<String>,
    #[serde(default)]
    pub document_data: Option<String>,
    #[serde(default)]
    pub document_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BiometricRequest {
    pub session_id: String,
    pub face_image: String,
}

#[derive(Debug, Deserialize)]
pub struct AdditionalInfoRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub profile: CustomerProfile,
}

#[derive(Debug, Deserialize)]
pub struct ESignRequest {
    pub session_id: String,
    pub signature_data: String,
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/onboarding/start
async fn start_onboarding(
    State(state): State<OnboardingRouteState>,
) -> Result<Json<StartResponse>, OnboardingError> {
    let started = state.manager.start().await?;
    Ok(Json(StartResponse {
        session_id: started.session.id,
        message: started.message,
    }))
}

/// GET /api/onboarding/{session_id}
async fn get_session(
    State(state): State<OnboardingRouteState>,
    Path(session_id): Path<String>,
) -> Result<Json<OnboardingSession>, OnboardingError> {
    let id = parse_session_id(&session_id)?;
    Ok(Json(state.manager.session(id).await?))
}

/// POST /api/chat
async fn chat(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, OnboardingError> {
    let id = parse_session_id(&req.session_id)?;
    let message = state.manager.chat(id, &req.message).await?;
    Ok(Json(ChatResponse { message }))
}

/// GET /api/chat/{session_id}
async fn chat_history(
    State(state): State<OnboardingRouteState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, OnboardingError> {
    let id = parse_session_id(&session_id)?;
    Ok(Json(state.manager.history(id).await?))
}

async fn submit(
    state: &OnboardingRouteState,
    session_id: &str,
    event: OnboardingEvent,
) -> Result<Json<Outcome>, OnboardingError> {
    let id = parse_session_id(session_id)?;
    Ok(Json(state.manager.submit(id, event).await?))
}

/// POST /api/verify/phone
async fn verify_phone(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<PhoneRequest>,
) -> Result<Json<Outcome>, OnboardingError> {
    submit(&state, &req.session_id, OnboardingEvent::SubmitPhone { phone: req.phone }).await
}

/// POST /api/verify/otp
async fn verify_otp(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<Outcome>, OnboardingError> {
    let event = OnboardingEvent::SubmitOtp {
        verification_type: req.verification_type,
        otp: req.otp,
    };
    submit(&state, &req.session_id, event).await
}

/// POST /api/verify/email
async fn verify_email(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<Outcome>, OnboardingError> {
    submit(&state, &req.session_id, OnboardingEvent::SubmitEmail { email: req.email }).await
}

/// POST /api/kyc/document
async fn kyc_document(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<KycDocumentRequest>,
) -> Result<Json<Outcome>, OnboardingError> {
    let event = OnboardingEvent::SubmitKycDocument(KycSubmission {
        document_type: req.document_type,
        pan_number: req.pan_number,
        aadhaar_number: req.aadhaar_number,
        document_data: req.document_data,
        document_file: req.document_file,
    });
    submit(&state, &req.session_id, event).await
}

/// POST /api/verify/biometric
async fn verify_biometric(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<BiometricRequest>,
) -> Result<Json<Outcome>, OnboardingError> {
    let event = OnboardingEvent::SubmitBiometric {
        face_image: req.face_image,
    };
    submit(&state, &req.session_id, event).await
}

/// POST /api/submit/additional-info
async fn additional_info(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<AdditionalInfoRequest>,
) -> Result<Json<Outcome>, OnboardingError> {
    submit(
        &state,
        &req.session_id,
        OnboardingEvent::SubmitAdditionalInfo(req.profile),
    )
    .await
}

/// POST /api/esign
async fn esign(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<ESignRequest>,
) -> Result<Json<Outcome>, OnboardingError> {
    let event = OnboardingEvent::SubmitEsign {
        signature_data: req.signature_data,
    };
    submit(&state, &req.session_id, event).await
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "kyc-onboard",
    }))
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding/start", post(start_onboarding))
        .route("/api/onboarding/{session_id}", get(get_session))
        .route("/api/chat", post(chat))
        .route("/api/chat/{session_id}", get(chat_history))
        .route("/api/verify/phone", post(verify_phone))
        .route("/api/verify/otp", post(verify_otp))
        .route("/api/verify/email", post(verify_email))
        .route("/api/kyc/document", post(kyc_document))
        .route("/api/verify/biometric", post(verify_biometric))
        .route("/api/submit/additional-info", post(additional_info))
        .route("/api/esign", post(esign))
        .with_state(state)
}
