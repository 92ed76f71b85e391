//! Checkout configuration.

use crate::CheckoutError;
use dash_commerce::cart::FeeSchedule;
use dash_commerce::{Currency, Money};
use dash_payments::PollPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Polling bounds, in config-friendly units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    /// Grace period before the first status check.
    pub initial_delay_ms: u64,
    /// Delay between checks.
    pub interval_ms: u64,
    /// Maximum number of status checks.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 5_000,
            interval_ms: 5_000,
            max_attempts: 12,
        }
    }
}

impl PollConfig {
    /// Build the runtime polling policy.
    pub fn policy(&self) -> PollPolicy {
        PollPolicy::new(self.max_attempts)
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_interval(Duration::from_millis(self.interval_ms))
    }
}

/// Configuration for the checkout engine.
///
/// Deserializable from TOML; the defaults match production values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Fee schedule used by the cart, builder, and orchestrator.
    pub fees: FeeSchedule,
    /// Minimum order total required to check out.
    pub minimum_order: Money,
    /// Maximum number of lines in a cart.
    pub max_cart_lines: usize,
    /// Payment confirmation polling bounds.
    pub poll: PollConfig,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            minimum_order: Money::new(1_000, Currency::GHS),
            max_cart_lines: 20,
            poll: PollConfig::default(),
        }
    }
}

impl CheckoutConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml_str(raw: &str) -> Result<Self, CheckoutError> {
        toml::from_str(raw).map_err(|e| CheckoutError::Config(e.to_string()))
    }
}
