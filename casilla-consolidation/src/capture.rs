use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use casilla_core::payment::PaymentGateway;

use crate::models::{ConsolidationError, ConsolidationStatus, PaymentReference};
use crate::repository::ConsolidationRepository;

/// Captures freight payments against shipped consolidations.
///
/// Capture is at-most-once-effective: the gateway order id is the
/// idempotency key, so retries and double-taps return the already
/// recorded transaction instead of charging again.
pub struct CaptureService {
    gateway: Arc<dyn PaymentGateway>,
    timeout: Duration,
}

impl CaptureService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub async fn capture(
        &self,
        repo: &dyn ConsolidationRepository,
        consolidation_id: uuid::Uuid,
        order_id: &str,
    ) -> Result<PaymentReference, ConsolidationError> {
        let consolidation = repo
            .get_consolidation(consolidation_id)
            .await
            .map_err(|e| ConsolidationError::Repository(e.to_string()))?
            .ok_or(ConsolidationError::NotFound(consolidation_id))?;

        if let Some(reference) = &consolidation.payment_reference {
            if reference.order_id == order_id {
                tracing::info!(
                    %consolidation_id,
                    order_id,
                    "capture retried for an already-paid consolidation, returning recorded transaction"
                );
                return Ok(reference.clone());
            }
            return Err(ConsolidationError::AlreadyPaid(
                reference.order_id.clone(),
            ));
        }

        if consolidation.status != ConsolidationStatus::Shipped {
            return Err(ConsolidationError::PaymentNotDue(
                consolidation.status.to_string(),
            ));
        }

        let capture = tokio::time::timeout(self.timeout, self.gateway.capture_order(order_id))
            .await
            .map_err(|_| ConsolidationError::PaymentFailed("payment gateway timed out".into()))?
            .map_err(|e| ConsolidationError::PaymentFailed(e.to_string()))?;

        if !capture.success {
            return Err(ConsolidationError::PaymentFailed(
                "payment was declined by the gateway".into(),
            ));
        }

        let reference = PaymentReference {
            order_id: order_id.to_string(),
            transaction_id: capture.transaction_id,
            captured_at: Utc::now(),
        };

        // The repository resolves the lost race between two concurrent
        // captures of the same order: the first write wins and both
        // callers get the same reference back.
        let recorded = repo
            .record_capture(consolidation_id, &reference)
            .await
            .map_err(|e| ConsolidationError::Repository(e.to_string()))?;

        tracing::info!(
            %consolidation_id,
            order_id,
            transaction_id = %recorded.transaction_id,
            "freight payment captured"
        );
        Ok(recorded)
    }
}
