use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use casilla_core::package::{ChildBox, Package, PackageStatus};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Intake seam: the warehouse collaborator posts received packages here
#[derive(Debug, Deserialize)]
pub struct IntakePackageRequest {
    pub user_id: String,
    pub description: String,
    pub internal_tracking: String,
    pub provider_tracking: Option<String>,
    pub weight_kg: Option<f64>,
    #[serde(default = "default_total_boxes")]
    pub total_boxes: u32,
    #[serde(default)]
    pub is_master: bool,
}

fn default_total_boxes() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PackageResponse {
    pub id: Uuid,
    pub user_id: String,
    pub description: String,
    pub weight_kg: Option<f64>,
    pub total_boxes: u32,
    pub is_master: bool,
    pub status: PackageStatus,
    pub consolidation_id: Option<Uuid>,
    pub consolidation_status: Option<String>,
    pub provider_tracking: Option<String>,
    pub internal_tracking: String,
    pub has_gex: bool,
    pub declared_value_usd: Option<f64>,
    /// Derived sub-box rows for multi-box packages
    pub child_boxes: Vec<ChildBox>,
}

impl From<Package> for PackageResponse {
    fn from(p: Package) -> Self {
        let child_boxes = p.child_boxes();
        Self {
            id: p.id,
            user_id: p.user_id,
            description: p.description,
            weight_kg: p.weight_kg,
            total_boxes: p.total_boxes,
            is_master: p.is_master,
            status: p.status,
            consolidation_id: p.consolidation_id,
            consolidation_status: p.consolidation_status,
            provider_tracking: p.provider_tracking,
            internal_tracking: p.internal_tracking,
            has_gex: p.has_gex,
            declared_value_usd: p.declared_value_usd,
            child_boxes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPackagesParams {
    pub user_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /packages
/// Register a package received at the warehouse
pub async fn intake_package(
    State(state): State<AppState>,
    Json(req): Json<IntakePackageRequest>,
) -> Result<(StatusCode, Json<PackageResponse>), AppError> {
    if req.internal_tracking.trim().is_empty() {
        return Err(AppError::ValidationError(
            "internal tracking is required".to_string(),
        ));
    }

    let mut package = Package::new(req.user_id, req.description, req.internal_tracking);
    package.provider_tracking = req.provider_tracking;
    package.weight_kg = req.weight_kg;
    package.total_boxes = req.total_boxes.max(1);
    package.is_master = req.is_master;

    state.packages.upsert_package(package.clone()).await?;
    Ok((StatusCode::CREATED, Json(package.into())))
}

/// GET /packages?user_id=...
/// List a customer's warehouse box, with derived child-box rows
pub async fn list_packages(
    State(state): State<AppState>,
    Query(params): Query<ListPackagesParams>,
) -> Result<Json<Vec<PackageResponse>>, AppError> {
    let packages = state.packages.list_packages(&params.user_id).await?;
    Ok(Json(packages.into_iter().map(Into::into).collect()))
}

/// GET /packages/{id}
pub async fn get_package(
    State(state): State<AppState>,
    Path(package_id): Path<Uuid>,
) -> Result<Json<PackageResponse>, AppError> {
    let package = state
        .packages
        .get_package(package_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(package_id.to_string()))?;
    Ok(Json(package.into()))
}
