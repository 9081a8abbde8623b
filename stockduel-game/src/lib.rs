//! Stock Duel Game Engine
//!
//! Platform-agnostic core for the Stock Duel higher/lower quiz: players see
//! two listed companies and guess whether the second one's financial ratio is
//! higher or lower than the first's. This crate owns round generation,
//! difficulty calibration and session flow without UI or platform-specific
//! dependencies.

pub mod calibrate;
pub mod config;
pub mod constants;
pub mod data;
pub mod highlight;
pub mod insight;
pub mod metrics;
pub mod numbers;
pub mod panel;
pub mod result;
pub mod rng;
pub mod sampler;
pub mod seed;
pub mod sequencer;
pub mod session;

use thiserror::Error;

// Re-export commonly used types
pub use calibrate::{DifficultyTier, TierBand, TierBands, relative_difference};
pub use config::{QuizConfig, QuizConfigError};
pub use data::{Company, CompanyData, FieldKey};
pub use highlight::{Highlighter, Segment, SegmentKind, highlight};
pub use insight::{generate_insight, round_insight};
pub use metrics::{MetricKind, MetricSpec, REGISTRY, RegistryError, validate_registry};
pub use panel::{FieldRow, PanelLayout, format_amount, panel_rows};
pub use result::{Grade, ResultSummary, RoundRecap, result_summary};
pub use rng::RngBundle;
pub use sampler::{Answer, Calibration, FallbackPolicy, Round, RoundSampler, SamplingLimits};
pub use seed::{decode_share_code, encode_share_code, generate_share_code, share_code_for};
pub use sequencer::build_rounds;
pub use session::{
    Phase, Progress, QuizSession, RoundOutcome, RoundReveal, Screen, SessionError, SessionManager,
};

/// Config name requested from [`DataLoader::load_config`] for [`QuizConfig`].
pub const QUIZ_CONFIG_NAME: &str = "quiz";

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the company pool from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the company data cannot be loaded.
    fn load_company_data(&self) -> Result<CompanyData, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Loader backed by the dataset compiled into this crate and default config.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLoader;

impl DataLoader for BundledLoader {
    type Error = serde_json::Error;

    fn load_company_data(&self) -> Result<CompanyData, Self::Error> {
        CompanyData::bundled()
    }

    fn load_config<T>(&self, _config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_str("{}")
    }
}

/// Errors raised while wiring an engine together.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load {what}: {source}")]
    Load {
        what: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Config(#[from] QuizConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl EngineError {
    fn load<E>(what: &'static str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Load {
            what,
            source: Box::new(err),
        }
    }
}

/// Main engine for creating quiz sessions
pub struct QuizEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> QuizEngine<L>
where
    L: DataLoader,
{
    /// Create a new engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Load and validate the quiz configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or violates its bounds.
    pub fn load_config(&self) -> Result<QuizConfig, EngineError> {
        let config: QuizConfig = self
            .data_loader
            .load_config(QUIZ_CONFIG_NAME)
            .map_err(|err| EngineError::load("quiz config", err))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the company pool through the configured loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the loader fails.
    pub fn load_company_data(&self) -> Result<CompanyData, EngineError> {
        self.data_loader
            .load_company_data()
            .map_err(|err| EngineError::load("company data", err))
    }

    /// Build a session manager parked on the start screen.
    ///
    /// The metric registry and config are validated here, so a malformed
    /// setup fails before any round is sampled.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or validation fails.
    pub fn create_manager(&self) -> Result<SessionManager, EngineError> {
        validate_registry(&REGISTRY)?;
        let config = self.load_config()?;
        let data = self.load_company_data()?;
        log::info!(
            "engine ready: {} companies across {} sectors",
            data.len(),
            data.sectors().len()
        );
        Ok(SessionManager::new(data, config)?)
    }

    /// Build a standalone session for `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or validation fails.
    pub fn create_session(&self, seed: u64) -> Result<QuizSession, EngineError> {
        validate_registry(&REGISTRY)?;
        let config = self.load_config()?;
        let data = self.load_company_data()?;
        Ok(QuizSession::new(&data, &config, seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;
    use std::convert::Infallible;

    #[derive(Clone, Default)]
    struct FixtureLoader {
        config_json: Option<&'static str>,
    }

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_company_data(&self) -> Result<CompanyData, Self::Error> {
            let mut a = Company::new("AAA", "Alpha", "Banks");
            let mut b = Company::new("BBB", "Beta", "Banks");
            a.roe = Some(0.05);
            b.roe = Some(0.40);
            Ok(CompanyData::from_companies(vec![a, b]))
        }

        fn load_config<T>(&self, _config_name: &str) -> Result<T, Self::Error>
        where
            T: DeserializeOwned,
        {
            let parsed = serde_json::from_str(self.config_json.unwrap_or("{}")).unwrap();
            Ok(parsed)
        }
    }

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct BrokenDisk;

    struct BrokenLoader;

    impl DataLoader for BrokenLoader {
        type Error = BrokenDisk;

        fn load_company_data(&self) -> Result<CompanyData, Self::Error> {
            Err(BrokenDisk)
        }

        fn load_config<T>(&self, _config_name: &str) -> Result<T, Self::Error>
        where
            T: DeserializeOwned,
        {
            serde_json::from_str("{}").map_err(|_| BrokenDisk)
        }
    }

    #[test]
    fn bundled_engine_plays_a_full_session() {
        let engine = QuizEngine::new(BundledLoader);
        let mut manager = engine.create_manager().unwrap();
        assert_eq!(manager.start(99), Ok(Screen::Playing));
        assert_eq!(manager.session().map(QuizSession::len), Some(10));
    }

    #[test]
    fn fixture_config_reaches_the_session() {
        let engine = QuizEngine::new(FixtureLoader {
            config_json: Some(r#"{ "round_count": 3, "fallback": "strict" }"#),
        });
        let session = engine.create_session(4).unwrap();
        assert_eq!(session.len(), 3);
        assert!(
            session
                .rounds()
                .iter()
                .all(|round| round.calibration == Calibration::InBand)
        );
    }

    #[test]
    fn invalid_config_fails_fast() {
        let engine = QuizEngine::new(FixtureLoader {
            config_json: Some(r#"{ "search_attempts": 0 }"#),
        });
        assert!(matches!(
            engine.create_manager(),
            Err(EngineError::Config(QuizConfigError::Zero {
                field: "search_attempts"
            }))
        ));
    }

    #[test]
    fn loader_failures_are_wrapped() {
        let engine = QuizEngine::new(BrokenLoader);
        let err = engine.create_manager().unwrap_err();
        assert_eq!(err.to_string(), "failed to load company data: disk on fire");
    }
}
