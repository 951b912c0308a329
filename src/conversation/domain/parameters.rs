//! Generation parameters and their clamping rules.

use serde::{Deserialize, Serialize};

/// Default `max_tokens` for new conversations.
pub const DEFAULT_MAX_TOKENS: i64 = 4096;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
/// Default nucleus sampling threshold.
pub const DEFAULT_TOP_P: f64 = 1.0;
/// Default top-k; zero means "not set".
pub const DEFAULT_TOP_K: i64 = 0;

const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);
const TOP_P_RANGE: (f64, f64) = (0.0, 1.0);

/// Sampling parameters sent with every model request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    /// Upper bound on generated tokens, stored verbatim.
    pub max_tokens: i64,
    /// Sampling temperature in `[0, 2]`.
    pub temperature: f64,
    /// Nucleus sampling threshold in `[0, 1]`.
    pub top_p: f64,
    /// Top-k sampling, `>= 0`.
    pub top_k: i64,
    /// Sequences that stop generation.
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            stop_sequences: Vec::new(),
        }
    }
}

/// Clamps a temperature into `[0, 2]`; NaN maps to the lower bound.
#[must_use]
pub fn clamp_temperature(value: f64) -> f64 {
    clamp_unit(value, TEMPERATURE_RANGE)
}

/// Clamps a top-p value into `[0, 1]`; NaN maps to the lower bound.
#[must_use]
pub fn clamp_top_p(value: f64) -> f64 {
    clamp_unit(value, TOP_P_RANGE)
}

/// Clamps a top-k value to be non-negative.
#[must_use]
pub const fn clamp_top_k(value: i64) -> i64 {
    if value < 0 { 0 } else { value }
}

fn clamp_unit(value: f64, (low, high): (f64, f64)) -> f64 {
    if value.is_nan() {
        low
    } else {
        value.clamp(low, high)
    }
}
