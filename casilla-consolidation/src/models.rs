use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use casilla_core::package::Package;
use casilla_core::CoreError;

use crate::selection::SelectionTotals;

/// Consolidation status in the lifecycle.
///
/// `Pending → Processing → Shipped → Delivered`, no back-transitions.
/// `Cancelled` is reachable only from `Pending`/`Processing` and is
/// driven by warehouse operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsolidationStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl ConsolidationStatus {
    /// Transition table. Illegal moves are unrepresentable at the call
    /// sites because every mutation goes through `Consolidation::transition`.
    pub fn can_transition_to(&self, next: ConsolidationStatus) -> bool {
        use ConsolidationStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsolidationStatus::Pending => "PENDING",
            ConsolidationStatus::Processing => "PROCESSING",
            ConsolidationStatus::Shipped => "SHIPPED",
            ConsolidationStatus::Delivered => "DELIVERED",
            ConsolidationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ConsolidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Freight payment recorded against a consolidation.
/// The gateway order id doubles as the idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentReference {
    pub order_id: String,
    pub transaction_id: String,
    pub captured_at: DateTime<Utc>,
}

/// A shipment grouping of one or more packages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consolidation {
    pub id: Uuid,
    pub user_id: String,
    pub package_ids: Vec<Uuid>,
    pub total_weight_kg: f64,
    pub total_boxes: u32,
    pub status: ConsolidationStatus,
    pub payment_reference: Option<PaymentReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consolidation {
    /// Build a pending consolidation from the current selection.
    /// Validates the selection but does not touch the packages; the
    /// repository applies membership atomically.
    pub fn from_selection(
        user_id: &str,
        packages: &[Package],
        selected: &BTreeSet<Uuid>,
    ) -> Result<Self, ConsolidationError> {
        if selected.is_empty() {
            return Err(ConsolidationError::EmptySelection);
        }

        let mut members = Vec::with_capacity(selected.len());
        for id in selected {
            let package = packages
                .iter()
                .find(|p| p.id == *id)
                .ok_or_else(|| ConsolidationError::PackageNotFound(*id))?;
            if package.consolidation_id.is_some() {
                return Err(ConsolidationError::PackageAlreadyGrouped(*id));
            }
            if !package.is_available_for_consolidation() {
                return Err(ConsolidationError::PackageNotAvailable(*id));
            }
            members.push(package);
        }

        let totals = SelectionTotals::for_selection(packages, selected);
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            package_ids: members.iter().map(|p| p.id).collect(),
            total_weight_kg: totals.total_weight_kg,
            total_boxes: totals.total_boxes,
            status: ConsolidationStatus::Pending,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a lifecycle transition, validated against the table
    pub fn transition(&mut self, next: ConsolidationStatus) -> Result<(), ConsolidationError> {
        if !self.status.can_transition_to(next) {
            return Err(ConsolidationError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_paid(&self) -> bool {
        self.payment_reference.is_some()
    }

    /// Record a captured freight payment. Status is untouched; release
    /// is a warehouse action that checks `is_paid` separately.
    pub fn record_payment(&mut self, reference: PaymentReference) {
        self.payment_reference = Some(reference);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    #[error("Consolidation not found: {0}")]
    NotFound(Uuid),

    #[error("Selection is empty")]
    EmptySelection,

    #[error("Package not found: {0}")]
    PackageNotFound(Uuid),

    #[error("Package {0} already belongs to a consolidation")]
    PackageAlreadyGrouped(Uuid),

    #[error("Package {0} is not available for consolidation")]
    PackageNotAvailable(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Freight payment is not due while {0}")]
    PaymentNotDue(String),

    #[error("Consolidation already paid with order {0}")]
    AlreadyPaid(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Storage error: {0}")]
    Repository(String),
}

impl From<ConsolidationError> for CoreError {
    fn from(err: ConsolidationError) -> Self {
        match err {
            ConsolidationError::NotFound(id) => CoreError::NotFound(id.to_string()),
            ConsolidationError::EmptySelection => CoreError::EmptySelection,
            ConsolidationError::PackageNotFound(id) => CoreError::NotFound(id.to_string()),
            ConsolidationError::PackageAlreadyGrouped(id) => CoreError::PackageAlreadyGrouped(id),
            ConsolidationError::PackageNotAvailable(id) => CoreError::PackageNotAvailable(id),
            ConsolidationError::InvalidTransition { from, to } => {
                CoreError::InvalidTransition { from, to }
            }
            ConsolidationError::PaymentNotDue(status) => CoreError::InvalidTransition {
                from: status,
                to: "PAID".to_string(),
            },
            ConsolidationError::AlreadyPaid(order) => {
                CoreError::InvalidInput(format!("already paid with order {order}"))
            }
            ConsolidationError::PaymentFailed(msg) => CoreError::PaymentFailed(msg),
            ConsolidationError::Repository(msg) => CoreError::InternalError(msg),
        }
    }
}
