use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CapturePaymentRequest {
    pub paypal_order_id: String,
    pub consolidation_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapturePaymentResponse {
    pub success: bool,
    pub transaction_id: String,
    pub captured_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /payments/capture
/// Capture the freight payment for a shipped consolidation. Retries
/// with the same order id return the already recorded transaction.
pub async fn capture_payment(
    State(state): State<AppState>,
    Json(req): Json<CapturePaymentRequest>,
) -> Result<Json<CapturePaymentResponse>, AppError> {
    let reference = state
        .capture
        .capture(
            state.consolidations.as_ref(),
            req.consolidation_id,
            &req.paypal_order_id,
        )
        .await?;

    Ok(Json(CapturePaymentResponse {
        success: true,
        transaction_id: reference.transaction_id,
        captured_at: reference.captured_at,
    }))
}
