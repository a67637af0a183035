use async_trait::async_trait;

/// Live MXN-per-USD exchange rate feed
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// Current MXN per USD. Assumed positive and recent.
    async fn current_rate(&self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Static rate source for environments without a live FX feed
pub struct FixedRateSource {
    rate: f64,
}

impl FixedRateSource {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

#[async_trait]
impl ExchangeRateSource for FixedRateSource {
    async fn current_rate(&self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.rate)
    }
}
