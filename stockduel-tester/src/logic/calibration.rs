use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::collections::BTreeMap;

use stockduel_game::{Calibration, DifficultyTier, MetricKind, TierBands};

use crate::logic::game_tester::{DatasetChoice, GameTester, SimulationPlan, SimulationSummary};
use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;

/// One sampled round, as seen by the calibration sweep.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationRecord {
    pub seed_code: String,
    pub seed_value: u64,
    pub number: u8,
    pub tier: DifficultyTier,
    pub metric: MetricKind,
    pub calibration: Calibration,
    pub relative_difference: f64,
    pub distractor_count: u8,
}

/// Per-tier calibration statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationAggregate {
    pub tier: DifficultyTier,
    pub rounds: usize,
    pub in_band_rate: f64,
    pub fallback_count: usize,
    /// Over finite differences only.
    pub mean_relative_difference: f64,
    pub std_relative_difference: f64,
    pub min_relative_difference: f64,
    pub max_relative_difference: f64,
}

fn sweep_plan() -> SimulationPlan {
    SimulationPlan::new(DatasetChoice::Loaded, GameplayStrategy::Oracle)
        .with_expectation(|summary: &SimulationSummary| {
            let round_count = usize::from(summary.config.round_count);
            for session in &summary.sessions {
                ensure!(
                    session.rounds.len() <= round_count,
                    "session {} produced {} rounds, limit {round_count}",
                    session.seed,
                    session.rounds.len()
                );
            }
            Ok(())
        })
}

/// Sample one session per seed and iteration on the loaded dataset and flatten its rounds.
pub fn run_calibration_analysis(
    tester: &GameTester,
    seeds: &[SeedInfo],
    iterations: usize,
) -> Result<Vec<CalibrationRecord>> {
    let iterations = iterations.max(1);
    let plan = sweep_plan();
    let round_count = usize::from(tester.assets().config().round_count);
    let mut records = Vec::with_capacity(seeds.len() * iterations * round_count);

    for seed in seeds {
        for iteration in 0..iterations {
            let iteration_offset = u64::try_from(iteration).unwrap_or(0);
            let iteration_seed = seed.seed.wrapping_add(iteration_offset);
            let summary = tester.run_plan(&plan, iteration_seed)?;
            #[rustfmt::skip]
            let context = format!("Calibration expectation failed for seed {} (iteration {})", seed.seed, iteration + 1);
            for expectation in &plan.expectations {
                expectation
                    .evaluate(&summary)
                    .with_context(|| context.clone())?;
            }

            let seed_info = if iteration == 0 {
                seed.clone()
            } else {
                SeedInfo::from_numeric(iteration_seed)
            };
            let seed_code = seed_info.share_code().unwrap_or_default();
            for round in summary.sessions.iter().flat_map(|s| &s.rounds) {
                records.push(CalibrationRecord {
                    seed_code: seed_code.clone(),
                    seed_value: iteration_seed,
                    number: round.number,
                    tier: round.tier,
                    metric: round.metric,
                    calibration: round.calibration,
                    relative_difference: round.relative_difference,
                    distractor_count: round.distractor_count,
                });
            }
        }
    }

    Ok(records)
}

pub fn aggregate_calibration(records: &[CalibrationRecord]) -> Vec<CalibrationAggregate> {
    let mut aggregates: BTreeMap<u8, AggregateBuilder> = BTreeMap::new();
    for record in records {
        aggregates
            .entry(record.tier.index())
            .or_insert_with(|| AggregateBuilder::new(record.tier))
            .ingest(record);
    }
    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// Check that every record honours its tier: in-band differences inside the
/// band and the tier's distractor count on the panel.
pub fn validate_calibration_targets(records: &[CalibrationRecord], bands: &TierBands) -> Result<()> {
    for record in records {
        ensure!(
            record.distractor_count == record.tier.distractor_count(),
            "round {} of seed {} shows {} distractors for tier {}",
            record.number,
            record.seed_value,
            record.distractor_count,
            record.tier
        );
        if record.calibration == Calibration::InBand {
            ensure!(
                bands.band(record.tier).contains(record.relative_difference),
                "round {} of seed {} claims in-band at {:.4} outside the {} band",
                record.number,
                record.seed_value,
                record.relative_difference,
                record.tier
            );
        }
        ensure!(
            record.tier == DifficultyTier::for_round(usize::from(record.number.saturating_sub(1))),
            "round {} of seed {} carries tier {}",
            record.number,
            record.seed_value,
            record.tier
        );
    }
    Ok(())
}

struct AggregateBuilder {
    tier: DifficultyTier,
    rounds: usize,
    in_band: usize,
    fallback: usize,
    diffs: RunningStats,
    min_diff: f64,
    max_diff: f64,
}

impl AggregateBuilder {
    fn new(tier: DifficultyTier) -> Self {
        Self {
            tier,
            rounds: 0,
            in_band: 0,
            fallback: 0,
            diffs: RunningStats::default(),
            min_diff: f64::INFINITY,
            max_diff: f64::NEG_INFINITY,
        }
    }

    fn ingest(&mut self, record: &CalibrationRecord) {
        self.rounds += 1;
        match record.calibration {
            Calibration::InBand => self.in_band += 1,
            Calibration::Fallback => self.fallback += 1,
        }
        let diff = record.relative_difference;
        if diff.is_finite() {
            self.diffs.add(diff);
            self.min_diff = self.min_diff.min(diff);
            self.max_diff = self.max_diff.max(diff);
        }
    }

    fn finish(self) -> CalibrationAggregate {
        #[allow(clippy::cast_precision_loss)]
        let in_band_rate = if self.rounds == 0 {
            0.0
        } else {
            self.in_band as f64 / self.rounds as f64
        };
        CalibrationAggregate {
            tier: self.tier,
            rounds: self.rounds,
            in_band_rate,
            fallback_count: self.fallback,
            mean_relative_difference: self.diffs.mean(),
            std_relative_difference: self.diffs.std_dev(),
            min_relative_difference: if self.min_diff.is_finite() {
                self.min_diff
            } else {
                0.0
            },
            max_relative_difference: if self.max_diff.is_finite() {
                self.max_diff
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
