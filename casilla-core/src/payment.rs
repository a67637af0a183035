use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A gateway-side order awaiting approval/capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String, // Provider's ID (e.g., a PayPal order id)
    pub approval_url: String,
    pub amount: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Result of capturing a gateway order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    pub success: bool,
    pub transaction_id: String,
}

/// External payment gateway contract. The gateway's order id is the
/// idempotency key for capture.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order with the provider
    async fn create_order(
        &self,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentOrder, Box<dyn std::error::Error + Send + Sync>>;

    /// Capture a previously approved order
    async fn capture_order(
        &self,
        order_id: &str,
    ) -> Result<CaptureResult, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(
        &self,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentOrder, Box<dyn std::error::Error + Send + Sync>> {
        let order_id = format!("mock_order_{}", uuid::Uuid::new_v4().simple());
        Ok(PaymentOrder {
            approval_url: format!("https://pay.example.com/approve/{}", order_id),
            order_id,
            amount,
            currency: currency.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn capture_order(
        &self,
        order_id: &str,
    ) -> Result<CaptureResult, Box<dyn std::error::Error + Send + Sync>> {
        // Trigger for testing declined/network paths
        if order_id.starts_with("fail-") {
            return Err("Simulated payment gateway failure".into());
        }
        if order_id.starts_with("declined-") {
            return Ok(CaptureResult {
                success: false,
                transaction_id: String::new(),
            });
        }
        tracing::debug!(order_id, "mock capture succeeded");
        Ok(CaptureResult {
            success: true,
            transaction_id: format!("txn_{}", order_id),
        })
    }
}
