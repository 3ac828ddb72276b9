//! Host-facing capture configuration.
//!
//! `CaptureConfig` is what the host persists and edits: an enable flag, a
//! debug flag, the strategy, and the reduction dimension N (the grid is
//! N×N). Out-of-range dimensions are clamped into
//! [`MIN_DIMENSION`, `MAX_DIMENSION`] rather than rejected, because N only
//! drives resource allocation.

use crate::error::CaptureError;
use crate::params::{param_bool, param_i64, param_string};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

/// Smallest reduction dimension.
pub const MIN_DIMENSION: u32 = 2;
/// Largest reduction dimension.
pub const MAX_DIMENSION: u32 = 64;
/// Reduction dimension used when none is configured.
pub const DEFAULT_DIMENSION: u32 = 16;

/// Clamps a configured dimension into [`MIN_DIMENSION`, `MAX_DIMENSION`].
pub fn clamp_dimension(value: i64) -> u32 {
    value.clamp(i64::from(MIN_DIMENSION), i64::from(MAX_DIMENSION)) as u32
}

/// Capture settings as the host stores them.
///
/// Deserializes from either the snake_case keys or the legacy camelCase
/// keys (`lightDimensions`, `renderMode`). Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Whether capture runs at all.
    pub enable: bool,
    /// Draw the reduction target on screen and log each average.
    pub debug: bool,
    #[serde(alias = "renderMode")]
    pub strategy: Strategy,
    /// Requested grid side length, before clamping.
    #[serde(alias = "lightDimensions")]
    pub reduction_dimension: i64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enable: true,
            debug: false,
            strategy: Strategy::Blit,
            reduction_dimension: i64::from(DEFAULT_DIMENSION),
        }
    }
}

impl CaptureConfig {
    /// Extracts a config from a JSON object, falling back to defaults for
    /// missing or wrongly-typed keys. An unknown strategy name falls back
    /// to the default strategy with a warning.
    pub fn from_json(params: &Value) -> Self {
        let defaults = Self::default();
        let dimension = param_i64(
            params,
            &["reduction_dimension", "lightDimensions"],
            defaults.reduction_dimension,
        );
        let strategy_name =
            param_string(params, &["strategy", "renderMode"], defaults.strategy.name());
        let strategy = strategy_name.parse().unwrap_or_else(|e: String| {
            warn!(error = %e, "falling back to default capture strategy");
            defaults.strategy
        });
        Self {
            enable: param_bool(params, &["enable"], defaults.enable),
            debug: param_bool(params, &["debug"], defaults.debug),
            strategy,
            reduction_dimension: dimension,
        }
    }

    /// Schema describing every key, its type, default, and range.
    pub fn schema() -> Value {
        json!({
            "enable": {
                "type": "boolean",
                "default": true,
                "description": "Enable framebuffer capture"
            },
            "debug": {
                "type": "boolean",
                "default": false,
                "description": "Draw the reduced frame on screen and log the average color"
            },
            "strategy": {
                "type": "string",
                "default": Strategy::Blit.name(),
                "enum": Strategy::list_names(),
                "description": "Means of capturing the screen color"
            },
            "reduction_dimension": {
                "type": "integer",
                "default": DEFAULT_DIMENSION,
                "min": MIN_DIMENSION,
                "max": MAX_DIMENSION,
                "description": "How many pixels N*N are exported from the screen"
            }
        })
    }

    /// Checks the reduction dimension against the supported range.
    ///
    /// Returns `CaptureError::ConfigurationOutOfRange` when it falls outside;
    /// callers are expected to log it and carry on with
    /// [`effective_dimension`](Self::effective_dimension).
    pub fn validate(&self) -> Result<(), CaptureError> {
        let range = i64::from(MIN_DIMENSION)..=i64::from(MAX_DIMENSION);
        if range.contains(&self.reduction_dimension) {
            Ok(())
        } else {
            Err(CaptureError::ConfigurationOutOfRange {
                value: self.reduction_dimension,
                min: MIN_DIMENSION,
                max: MAX_DIMENSION,
            })
        }
    }

    /// The grid side length actually used, clamped into range.
    pub fn effective_dimension(&self) -> u32 {
        clamp_dimension(self.reduction_dimension)
    }
}
