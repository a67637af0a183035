use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use casilla_core::rates::ExchangeRateSource;

use crate::models::GexQuote;
use crate::pricing::{self, FeeSchedule, PricingError};

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Exchange rate unavailable: {0}")]
    RateUnavailable(String),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    fetched_at: Instant,
}

/// Produces GEX quotes by composing the live exchange rate with the
/// pricing calculator.
///
/// The rate is cached for a short TTL (one quoting session, order of
/// minutes) so that recomputing on every keystroke does not hammer the
/// FX feed. A quote carries the rate it was computed with; the attach
/// path records that rate rather than fetching a fresh one.
pub struct QuoteService {
    rate_source: Arc<dyn ExchangeRateSource>,
    schedule: FeeSchedule,
    rate_ttl: Duration,
    rate_timeout: Duration,
    cached: Mutex<Option<CachedRate>>,
}

impl QuoteService {
    pub fn new(
        rate_source: Arc<dyn ExchangeRateSource>,
        schedule: FeeSchedule,
        rate_ttl: Duration,
        rate_timeout: Duration,
    ) -> Self {
        Self {
            rate_source,
            schedule,
            rate_ttl,
            rate_timeout,
            cached: Mutex::new(None),
        }
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    /// Current MXN/USD rate, cached within the TTL
    pub async fn current_rate(&self) -> Result<f64, QuoteError> {
        if let Some(cached) = *self.cached.lock().await {
            if cached.fetched_at.elapsed() < self.rate_ttl {
                return Ok(cached.rate);
            }
        }

        let rate = tokio::time::timeout(self.rate_timeout, self.rate_source.current_rate())
            .await
            .map_err(|_| QuoteError::RateUnavailable("rate lookup timed out".into()))?
            .map_err(|e| QuoteError::RateUnavailable(e.to_string()))?;

        if !(rate.is_finite() && rate > 0.0) {
            return Err(QuoteError::RateUnavailable(format!(
                "rate source returned non-positive rate {rate}"
            )));
        }

        tracing::debug!(rate, "refreshed MXN/USD exchange rate");
        *self.cached.lock().await = Some(CachedRate {
            rate,
            fetched_at: Instant::now(),
        });
        Ok(rate)
    }

    /// Quote the GEX premium for a declared value.
    ///
    /// Non-positive values yield `Ok(None)`: protection is optional and
    /// the caller keeps treating it as unconfigured until a positive
    /// value is entered.
    pub async fn get_quote(&self, declared_value_usd: f64) -> Result<Option<GexQuote>, QuoteError> {
        if !(declared_value_usd.is_finite() && declared_value_usd > 0.0) {
            return Ok(None);
        }

        let rate = self.current_rate().await?;
        let breakdown = pricing::quote(declared_value_usd, rate, &self.schedule)?;
        Ok(Some(GexQuote::new(declared_value_usd, rate, breakdown)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use casilla_core::rates::FixedRateSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRateSource {
        rate: f64,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExchangeRateSource for CountingRateSource {
        async fn current_rate(&self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rate)
        }
    }

    struct FailingRateSource;

    #[async_trait]
    impl ExchangeRateSource for FailingRateSource {
        async fn current_rate(&self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
            Err("FX feed down".into())
        }
    }

    fn service(source: Arc<dyn ExchangeRateSource>, ttl: Duration) -> QuoteService {
        QuoteService::new(
            source,
            FeeSchedule::default(),
            ttl,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_quote_composes_rate_and_schedule() {
        let svc = service(
            Arc::new(FixedRateSource::new(20.5)),
            Duration::from_secs(300),
        );
        let quote = svc.get_quote(100_000.0 / 20.5).await.unwrap().unwrap();

        assert_eq!(quote.exchange_rate, 20.5);
        assert!((quote.insured_value_mxn - 100_000.0).abs() < 1e-6);
        assert!((quote.total_cost_mxn - 5_625.0).abs() < 1e-6);
        assert_eq!(quote.origin_currency, "USD");
        assert_eq!(quote.settlement_currency, "MXN");
    }

    #[tokio::test]
    async fn test_non_positive_value_yields_no_quote() {
        let svc = service(
            Arc::new(FixedRateSource::new(20.5)),
            Duration::from_secs(300),
        );
        assert!(svc.get_quote(0.0).await.unwrap().is_none());
        assert!(svc.get_quote(-5.0).await.unwrap().is_none());
        assert!(svc.get_quote(f64::NAN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_unavailable_surfaces() {
        let svc = service(Arc::new(FailingRateSource), Duration::from_secs(300));
        let result = svc.get_quote(100.0).await;
        assert!(matches!(result, Err(QuoteError::RateUnavailable(_))));
    }

    #[tokio::test]
    async fn test_rate_cached_within_ttl() {
        let source = Arc::new(CountingRateSource {
            rate: 17.0,
            calls: AtomicUsize::new(0),
        });
        let svc = service(source.clone(), Duration::from_secs(300));

        svc.get_quote(10.0).await.unwrap();
        svc.get_quote(20.0).await.unwrap();
        svc.get_quote(30.0).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_refetches() {
        let source = Arc::new(CountingRateSource {
            rate: 17.0,
            calls: AtomicUsize::new(0),
        });
        let svc = service(source.clone(), Duration::ZERO);

        svc.get_quote(10.0).await.unwrap();
        svc.get_quote(20.0).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
