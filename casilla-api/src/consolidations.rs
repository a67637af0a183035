use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use casilla_consolidation::{Consolidation, ConsolidationStatus, PaymentReference};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateConsolidationRequest {
    pub user_id: String,
    pub package_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CreateConsolidationResponse {
    pub consolidation_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsolidationResponse {
    pub id: Uuid,
    pub user_id: String,
    pub package_ids: Vec<Uuid>,
    pub total_weight_kg: f64,
    pub total_boxes: u32,
    pub status: ConsolidationStatus,
    pub paid: bool,
    pub payment_reference: Option<PaymentReference>,
    pub created_at: DateTime<Utc>,
}

impl From<Consolidation> for ConsolidationResponse {
    fn from(c: Consolidation) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            package_ids: c.package_ids,
            total_weight_kg: c.total_weight_kg,
            total_boxes: c.total_boxes,
            status: c.status,
            paid: c.payment_reference.is_some(),
            payment_reference: c.payment_reference,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ConsolidationStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListConsolidationsParams {
    pub user_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /consolidations
/// Group the selected packages into a pending shipment
pub async fn create_consolidation(
    State(state): State<AppState>,
    Json(req): Json<CreateConsolidationRequest>,
) -> Result<(StatusCode, Json<CreateConsolidationResponse>), AppError> {
    let consolidation = state
        .consolidations
        .create_consolidation(&req.user_id, &req.package_ids)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateConsolidationResponse {
            consolidation_id: consolidation.id,
        }),
    ))
}

/// GET /consolidations/{id}
pub async fn get_consolidation(
    State(state): State<AppState>,
    Path(consolidation_id): Path<Uuid>,
) -> Result<Json<ConsolidationResponse>, AppError> {
    let consolidation = state
        .consolidations
        .get_consolidation(consolidation_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(consolidation_id.to_string()))?;
    Ok(Json(consolidation.into()))
}

/// GET /consolidations?user_id=...
pub async fn list_consolidations(
    State(state): State<AppState>,
    Query(params): Query<ListConsolidationsParams>,
) -> Result<Json<Vec<ConsolidationResponse>>, AppError> {
    let consolidations = state.consolidations.list_consolidations(&params.user_id).await?;
    Ok(Json(consolidations.into_iter().map(Into::into).collect()))
}

/// POST /consolidations/{id}/status
/// Warehouse seam: advance the lifecycle (or cancel before shipping)
pub async fn update_consolidation_status(
    State(state): State<AppState>,
    Path(consolidation_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ConsolidationResponse>, AppError> {
    let consolidation = state
        .consolidations
        .update_status(consolidation_id, req.status)
        .await?;
    Ok(Json(consolidation.into()))
}
