use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::QuoteBreakdown;

/// When the GEX premium is charged. Both options attach an active
/// policy; only the charge timing downstream differs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOption {
    PayNow,
    PayWithShipment,
}

/// Opaque signature blob from the capture collaborator (e.g. an encoded
/// image); this core never looks inside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SignatureArtifact(pub String);

/// Ephemeral protection quote. Never persisted on its own; only the
/// resulting policy attachment is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GexQuote {
    pub declared_value_usd: f64,
    /// MXN per USD at computation time. The rate quoted is the rate the
    /// attached policy records.
    pub exchange_rate: f64,
    pub insured_value_mxn: f64,
    pub variable_fee_mxn: f64,
    pub fixed_fee_mxn: f64,
    pub total_cost_mxn: f64,
    pub origin_currency: String,
    pub settlement_currency: String,
}

impl GexQuote {
    pub fn new(declared_value_usd: f64, exchange_rate: f64, breakdown: QuoteBreakdown) -> Self {
        Self {
            declared_value_usd,
            exchange_rate,
            insured_value_mxn: breakdown.insured_value_mxn,
            variable_fee_mxn: breakdown.variable_fee_mxn,
            fixed_fee_mxn: breakdown.fixed_fee_mxn,
            total_cost_mxn: breakdown.total_cost_mxn,
            origin_currency: "USD".to_string(),
            settlement_currency: "MXN".to_string(),
        }
    }

    /// Charge/display precision, applied at the edge only
    pub fn rounded(&self) -> Self {
        let breakdown = QuoteBreakdown {
            insured_value_mxn: self.insured_value_mxn,
            variable_fee_mxn: self.variable_fee_mxn,
            fixed_fee_mxn: self.fixed_fee_mxn,
            total_cost_mxn: self.total_cost_mxn,
        }
        .rounded();
        Self {
            declared_value_usd: self.declared_value_usd,
            exchange_rate: self.exchange_rate,
            insured_value_mxn: breakdown.insured_value_mxn,
            variable_fee_mxn: breakdown.variable_fee_mxn,
            fixed_fee_mxn: breakdown.fixed_fee_mxn,
            total_cost_mxn: breakdown.total_cost_mxn,
            origin_currency: self.origin_currency.clone(),
            settlement_currency: self.settlement_currency.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Active,
    Claimed,
    Expired,
}

/// Everything the attach endpoint needs to record a policy. Acceptance
/// timestamp and signature are non-optional here; a request missing
/// either never becomes a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantySubmission {
    pub package_id: Uuid,
    pub declared_value_usd: f64,
    pub quote: GexQuote,
    pub signature: SignatureArtifact,
    pub payment_option: PaymentOption,
    pub accepted_at: DateTime<Utc>,
}

/// Durable record of an accepted warranty for one package.
/// Terms are immutable after attachment: the declared value, premium
/// and exchange rate are copied here and never re-read from the package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyAttachment {
    pub id: Uuid,
    pub package_id: Uuid,
    pub declared_value_usd: f64,
    pub exchange_rate: f64,
    pub premium_mxn: f64,
    pub payment_option: PaymentOption,
    pub accepted_at: DateTime<Utc>,
    pub signature: SignatureArtifact,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
}

impl PolicyAttachment {
    pub fn from_submission(submission: &WarrantySubmission) -> Self {
        Self {
            id: Uuid::new_v4(),
            package_id: submission.package_id,
            declared_value_usd: submission.declared_value_usd,
            exchange_rate: submission.quote.exchange_rate,
            premium_mxn: submission.quote.total_cost_mxn,
            payment_option: submission.payment_option,
            accepted_at: submission.accepted_at,
            signature: submission.signature.clone(),
            status: PolicyStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }
}
