use serde::{Deserialize, Serialize};

/// GEX fee schedule. The 5% variable rate and the 625 MXN flat fee are
/// business constants carried in configuration, not user-editable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Variable premium as a fraction of the insured value
    pub variable_rate: f64,
    /// Flat fee in MXN
    pub fixed_fee_mxn: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            variable_rate: 0.05,
            fixed_fee_mxn: 625.0,
        }
    }
}

/// Premium breakdown in MXN. Values are unrounded; rounding happens
/// only at display/charge time via `rounded`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteBreakdown {
    pub insured_value_mxn: f64,
    pub variable_fee_mxn: f64,
    pub fixed_fee_mxn: f64,
    pub total_cost_mxn: f64,
}

impl QuoteBreakdown {
    /// Standard currency precision, applied at the edge only
    pub fn rounded(&self) -> Self {
        Self {
            insured_value_mxn: round_centavos(self.insured_value_mxn),
            variable_fee_mxn: round_centavos(self.variable_fee_mxn),
            fixed_fee_mxn: round_centavos(self.fixed_fee_mxn),
            total_cost_mxn: round_centavos(self.total_cost_mxn),
        }
    }
}

fn round_centavos(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Pure premium computation: no I/O, deterministic, fails only on
/// invalid input.
pub fn quote(
    declared_value_usd: f64,
    exchange_rate: f64,
    schedule: &FeeSchedule,
) -> Result<QuoteBreakdown, PricingError> {
    if !(declared_value_usd.is_finite() && declared_value_usd > 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "declared value must be positive, got {declared_value_usd}"
        )));
    }
    if !(exchange_rate.is_finite() && exchange_rate > 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "exchange rate must be positive, got {exchange_rate}"
        )));
    }

    let insured_value_mxn = declared_value_usd * exchange_rate;
    let variable_fee_mxn = insured_value_mxn * schedule.variable_rate;
    let fixed_fee_mxn = schedule.fixed_fee_mxn;
    let total_cost_mxn = variable_fee_mxn + fixed_fee_mxn;

    Ok(QuoteBreakdown {
        insured_value_mxn,
        variable_fee_mxn,
        fixed_fee_mxn,
        total_cost_mxn,
    })
}
