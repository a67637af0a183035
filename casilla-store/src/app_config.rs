use serde::Deserialize;
use std::env;

use casilla_gex::FeeSchedule;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// GEX variable premium as a fraction of the insured value
    #[serde(default = "default_gex_variable_rate")]
    pub gex_variable_rate: f64,
    /// GEX flat fee in MXN
    #[serde(default = "default_gex_fixed_fee")]
    pub gex_fixed_fee_mxn: f64,
    /// How long one quoting session may reuse a fetched exchange rate
    #[serde(default = "default_rate_cache_secs")]
    pub rate_cache_secs: u64,
    /// Bound on a single exchange-rate lookup
    #[serde(default = "default_rate_timeout_secs")]
    pub rate_timeout_secs: u64,
    /// Bound on a single payment-gateway call
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,
    /// MXN per USD used by the static rate source when no live FX feed
    /// is wired
    #[serde(default = "default_exchange_rate")]
    pub fallback_exchange_rate: f64,
}

fn default_gex_variable_rate() -> f64 {
    0.05
}
fn default_gex_fixed_fee() -> f64 {
    625.0
}
fn default_rate_cache_secs() -> u64 {
    300
}
fn default_rate_timeout_secs() -> u64 {
    5
}
fn default_gateway_timeout_secs() -> u64 {
    10
}
fn default_exchange_rate() -> f64 {
    20.5
}

impl BusinessRules {
    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule {
            variable_rate: self.gex_variable_rate,
            fixed_fee_mxn: self.gex_fixed_fee_mxn,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of CASILLA)
            // Eg.. `CASILLA__SERVER__PORT=8080` would set the server port
            .add_source(config::Environment::with_prefix("CASILLA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
