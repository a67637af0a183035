use async_trait::async_trait;
use uuid::Uuid;

use casilla_core::CoreResult;

use crate::models::{Consolidation, ConsolidationStatus, PaymentReference};

/// Repository trait for consolidation data access.
///
/// `create_consolidation` must be an atomic check-and-set: verify every
/// package is still ungrouped and `RECEIVED`, then assign the grouping,
/// all under one critical section, so two overlapping requests cannot
/// both succeed.
#[async_trait]
pub trait ConsolidationRepository: Send + Sync {
    async fn create_consolidation(
        &self,
        user_id: &str,
        package_ids: &[Uuid],
    ) -> CoreResult<Consolidation>;

    async fn get_consolidation(&self, id: Uuid) -> CoreResult<Option<Consolidation>>;

    async fn list_consolidations(&self, user_id: &str) -> CoreResult<Vec<Consolidation>>;

    /// Apply a lifecycle transition and propagate it to member packages
    async fn update_status(
        &self,
        id: Uuid,
        next: ConsolidationStatus,
    ) -> CoreResult<Consolidation>;

    /// Record a captured freight payment. Idempotent on the gateway
    /// order id: re-recording the same order returns the first
    /// reference unchanged.
    async fn record_capture(
        &self,
        id: Uuid,
        reference: &PaymentReference,
    ) -> CoreResult<PaymentReference>;
}
