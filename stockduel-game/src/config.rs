//! Session configuration with serde defaults and startup validation.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::calibrate::{DifficultyTier, TierBand, TierBands};
use crate::constants::{FALLBACK_ATTEMPTS, REVEAL_DELAY_MS, ROUND_COUNT, SEARCH_ATTEMPTS};
use crate::sampler::{FallbackPolicy, SamplingLimits};

/// Tunables for building and playing a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "QuizConfig::default_round_count")]
    pub round_count: u8,
    #[serde(default = "QuizConfig::default_search_attempts")]
    pub search_attempts: u32,
    #[serde(default = "QuizConfig::default_fallback_attempts")]
    pub fallback_attempts: u32,
    #[serde(default = "QuizConfig::default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    #[serde(default)]
    pub fallback: FallbackPolicy,
    #[serde(default)]
    pub bands: TierBands,
}

impl QuizConfig {
    #[must_use]
    pub const fn default_round_count() -> u8 {
        ROUND_COUNT
    }

    #[must_use]
    pub const fn default_search_attempts() -> u32 {
        SEARCH_ATTEMPTS
    }

    #[must_use]
    pub const fn default_fallback_attempts() -> u32 {
        FALLBACK_ATTEMPTS
    }

    #[must_use]
    pub const fn default_reveal_delay_ms() -> u64 {
        REVEAL_DELAY_MS
    }

    /// Parse a configuration document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `QuizConfigError::Parse` for malformed JSON and any
    /// validation error for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, QuizConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| QuizConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuizConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), QuizConfigError> {
        if self.round_count == 0 {
            return Err(QuizConfigError::Zero {
                field: "round_count",
            });
        }
        if self.search_attempts == 0 {
            return Err(QuizConfigError::Zero {
                field: "search_attempts",
            });
        }
        if self.fallback_attempts == 0 {
            return Err(QuizConfigError::Zero {
                field: "fallback_attempts",
            });
        }
        for tier in DifficultyTier::ALL {
            validate_band(tier, self.bands.band(tier))?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn sampling_limits(&self) -> SamplingLimits {
        SamplingLimits {
            search_attempts: self.search_attempts,
            fallback_attempts: self.fallback_attempts,
        }
    }

    #[must_use]
    pub const fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            round_count: Self::default_round_count(),
            search_attempts: Self::default_search_attempts(),
            fallback_attempts: Self::default_fallback_attempts(),
            reveal_delay_ms: Self::default_reveal_delay_ms(),
            fallback: FallbackPolicy::default(),
            bands: TierBands::default(),
        }
    }
}

fn validate_band(tier: DifficultyTier, band: &TierBand) -> Result<(), QuizConfigError> {
    if !band.min.is_finite() || band.min < 0.0 {
        return Err(QuizConfigError::NegativeBandMin {
            tier,
            min: band.min,
        });
    }
    if let Some(max) = band.max
        && (max.is_nan() || band.min >= max)
    {
        return Err(QuizConfigError::EmptyBand {
            tier,
            min: band.min,
            max,
        });
    }
    Ok(())
}

/// Errors raised when quiz configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum QuizConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{tier} band minimum must be a non-negative number (got {min:.3})")]
    NegativeBandMin { tier: DifficultyTier, min: f64 },
    #[error("{tier} band minimum {min:.3} must be below its maximum {max:.3}")]
    EmptyBand {
        tier: DifficultyTier,
        min: f64,
        max: f64,
    },
    #[error("invalid quiz config: {0}")]
    Parse(String),
}
