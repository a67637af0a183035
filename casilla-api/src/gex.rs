use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use casilla_gex::models::{
    GexQuote, PaymentOption, PolicyAttachment, SignatureArtifact, WarrantySubmission,
};
use casilla_gex::pricing;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub invoice_value_usd: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub insured_value_mxn: f64,
    pub variable_fee_mxn: f64,
    pub fixed_fee_mxn: f64,
    pub total_cost_mxn: f64,
    pub exchange_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct AttachWarrantyRequest {
    pub package_id: Uuid,
    pub invoice_value_usd: f64,
    /// Opaque signature blob; required
    pub signature: Option<String>,
    pub payment_option: PaymentOption,
    /// When the customer accepted the policy text. The client may not
    /// send this until the text was scrolled to its end; the server
    /// rejects its absence regardless.
    pub accepted_at: Option<DateTime<Utc>>,
    /// The quote the customer signed against. Its exchange rate is the
    /// one the policy records, even if the live rate has since moved;
    /// the server recomputes the premium from that rate and rejects a
    /// quote that no longer matches the fee schedule.
    pub quote: Option<QuoteResponse>,
}

#[derive(Debug, Serialize)]
pub struct AttachWarrantyResponse {
    pub policy_id: Uuid,
    pub premium_mxn: f64,
    pub exchange_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub policy_id: Uuid,
    pub package_id: Uuid,
    pub declared_value_usd: f64,
    pub premium_mxn: f64,
    pub payment_option: PaymentOption,
    pub accepted_at: DateTime<Utc>,
    pub active: bool,
}

impl From<PolicyAttachment> for PolicyResponse {
    fn from(p: PolicyAttachment) -> Self {
        Self {
            policy_id: p.id,
            package_id: p.package_id,
            declared_value_usd: p.declared_value_usd,
            premium_mxn: p.premium_mxn,
            payment_option: p.payment_option,
            accepted_at: p.accepted_at,
            active: p.is_active(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /gex/quote
/// Quote the GEX premium for a declared invoice value
pub async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let quote = state
        .quotes
        .get_quote(req.invoice_value_usd)
        .await?
        .ok_or_else(|| {
            AppError::ValidationError("invoice value must be positive".to_string())
        })?;

    let rounded = quote.rounded();
    Ok(Json(QuoteResponse {
        insured_value_mxn: rounded.insured_value_mxn,
        variable_fee_mxn: rounded.variable_fee_mxn,
        fixed_fee_mxn: rounded.fixed_fee_mxn,
        total_cost_mxn: rounded.total_cost_mxn,
        exchange_rate: rounded.exchange_rate,
    }))
}

/// POST /gex/warranties/self
/// Attach a GEX policy to one package. The policy records the quote the
/// customer signed against; absent one, a fresh quote is computed at
/// submission time.
pub async fn attach_warranty(
    State(state): State<AppState>,
    Json(req): Json<AttachWarrantyRequest>,
) -> Result<(StatusCode, Json<AttachWarrantyResponse>), AppError> {
    // Compliance gate, enforced server-side: no acceptance timestamp or
    // signature, no policy.
    let accepted_at = req.accepted_at.ok_or_else(|| {
        AppError::ValidationError("policy acceptance is required".to_string())
    })?;
    let signature = match req.signature {
        Some(s) if !s.trim().is_empty() => SignatureArtifact(s),
        _ => {
            return Err(AppError::ValidationError(
                "a captured signature is required".to_string(),
            ))
        }
    };

    let quote = match req.quote {
        Some(signed) => {
            if !(signed.exchange_rate.is_finite() && signed.exchange_rate > 0.0) {
                return Err(AppError::ValidationError(
                    "submitted quote carries an invalid exchange rate".to_string(),
                ));
            }
            // Re-derive the premium from the signed rate; the client's
            // arithmetic is never trusted.
            let breakdown =
                pricing::quote(req.invoice_value_usd, signed.exchange_rate, state.quotes.schedule())
                    .map_err(|e| AppError::ValidationError(e.to_string()))?
                    .rounded();
            if (breakdown.total_cost_mxn - signed.total_cost_mxn).abs() > 0.01 {
                return Err(AppError::ValidationError(
                    "submitted quote does not match the fee schedule".to_string(),
                ));
            }
            GexQuote::new(req.invoice_value_usd, signed.exchange_rate, breakdown)
        }
        None => state
            .quotes
            .get_quote(req.invoice_value_usd)
            .await?
            .ok_or_else(|| {
                AppError::ValidationError("invoice value must be positive".to_string())
            })?
            .rounded(),
    };

    let submission = WarrantySubmission {
        package_id: req.package_id,
        declared_value_usd: req.invoice_value_usd,
        quote,
        signature,
        payment_option: req.payment_option,
        accepted_at,
    };

    let attachment = state.warranties.attach_policy(&submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(AttachWarrantyResponse {
            policy_id: attachment.id,
            premium_mxn: attachment.premium_mxn,
            exchange_rate: attachment.exchange_rate,
        }),
    ))
}

/// GET /gex/warranties/{package_id}
pub async fn get_warranty(
    State(state): State<AppState>,
    Path(package_id): Path<Uuid>,
) -> Result<Json<PolicyResponse>, AppError> {
    let policy = state
        .warranties
        .policy_for_package(package_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(package_id.to_string()))?;
    Ok(Json(policy.into()))
}
