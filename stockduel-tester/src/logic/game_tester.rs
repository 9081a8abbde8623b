use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use stockduel_game::{
    Company, CompanyData, QuizConfig, QuizEngine, REGISTRY, SessionManager, validate_registry,
};

use crate::common::FileLoader;
use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{SessionRecord, SimulationSession};

/// Companies kept in the sparse pool.
const SPARSE_POOL_SIZE: usize = 3;

/// Dataset and config shared by every scenario in a run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    data: CompanyData,
    config: QuizConfig,
}

impl TesterAssets {
    /// Load through the engine, validating the registry and config up front.
    pub fn load(dataset: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
        validate_registry(&REGISTRY).context("metric registry is malformed")?;
        let engine = QuizEngine::new(FileLoader::new(dataset, config));
        let config = engine.load_config().context("loading quiz config")?;
        let data = engine
            .load_company_data()
            .context("loading company dataset")?;
        log::info!(
            "tester assets: {} companies across {} sectors",
            data.len(),
            data.sectors().len()
        );
        Ok(Self { data, config })
    }

    pub fn load_default() -> Result<Self> {
        Self::load(None, None)
    }

    #[must_use]
    pub const fn data(&self) -> &CompanyData {
        &self.data
    }

    #[must_use]
    pub const fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// The pool a plan plays against.
    #[must_use]
    pub fn pool(&self, dataset: DatasetChoice) -> CompanyData {
        match dataset {
            DatasetChoice::Loaded => self.data.clone(),
            DatasetChoice::Sparse => sparse_pool(&self.data),
            DatasetChoice::Empty => CompanyData::empty(),
        }
    }
}

/// A handful of companies with only ROE inputs left, so most metrics are unusable.
fn sparse_pool(data: &CompanyData) -> CompanyData {
    let companies = data
        .companies
        .iter()
        .filter(|company| company.roe.is_some())
        .take(SPARSE_POOL_SIZE)
        .map(|company| {
            let mut stripped = Company::new(&company.ticker, &company.name, &company.sector);
            stripped.earnings = company.earnings;
            stripped.total_equity = company.total_equity;
            stripped.roe = company.roe;
            stripped
        })
        .collect();
    CompanyData::from_companies(companies)
}

/// Which pool a plan plays against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetChoice {
    /// The dataset given on the command line, or the bundled one.
    Loaded,
    Sparse,
    Empty,
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub dataset: DatasetChoice,
    pub strategy: GameplayStrategy,
    pub sessions: usize,
    pub hints: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(dataset: DatasetChoice, strategy: GameplayStrategy) -> Self {
        Self {
            dataset,
            strategy,
            sessions: 1,
            hints: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_sessions(mut self, sessions: usize) -> Self {
        self.sessions = sessions;
        self
    }

    #[must_use]
    pub const fn with_hints(mut self) -> Self {
        self.hints = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub dataset: DatasetChoice,
    pub config: QuizConfig,
    pub sessions: Vec<SessionRecord>,
    pub high_score: u32,
}

impl SimulationSummary {
    #[must_use]
    pub fn total_rounds(&self) -> usize {
        self.sessions.iter().map(|s| s.rounds.len()).sum()
    }

    #[must_use]
    pub fn total_correct(&self) -> usize {
        self.sessions.iter().map(SessionRecord::correct_rounds).sum()
    }

    /// Fraction of rounds answered correctly; `None` before any round is played.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let rounds = self.total_rounds();
        if rounds == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let accuracy = self.total_correct() as f64 / rounds as f64;
        Some(accuracy)
    }
}

#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
    assets: Arc<TesterAssets>,
}

impl GameTester {
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { verbose, assets }
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn assets(&self) -> &TesterAssets {
        &self.assets
    }

    /// Play `plan.sessions` sessions in one manager, seeding each from `seed` onward.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let config = self.assets.config.clone();
        let mut manager = SessionManager::new(self.assets.pool(plan.dataset), config.clone())
            .context("building session manager")?;
        let mut sessions = Vec::with_capacity(plan.sessions);

        {
            let mut simulation =
                SimulationSession::new(&mut manager, plan.strategy.create_policy(seed));
            if plan.hints {
                simulation = simulation.with_hints();
            }
            for index in 0..plan.sessions {
                let session_seed = seed.wrapping_add(u64::try_from(index).unwrap_or(u64::MAX));
                let record = simulation
                    .play(session_seed)
                    .with_context(|| format!("session {} (seed {session_seed})", index + 1))?;
                if self.verbose {
                    println!(
                        "   session {} seed {}: {}/{} on {}",
                        index + 1,
                        session_seed,
                        record.score,
                        record.rounds.len(),
                        record.screen
                    );
                }
                sessions.push(record);
            }
        }

        Ok(SimulationSummary {
            seed,
            strategy: plan.strategy,
            dataset: plan.dataset,
            config,
            sessions,
            high_score: manager.high_score(),
        })
    }
}
