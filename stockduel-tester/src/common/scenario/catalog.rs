use anyhow::{Result, ensure};

use super::TestScenario;
use crate::logic::{DatasetChoice, GameplayStrategy, SimulationPlan, SimulationSummary};
use stockduel_game::{Calibration, DifficultyTier, Grade, MetricKind, Screen};

/// Share of rounds the analyst must get right from raw fields alone.
const ANALYST_MIN_ACCURACY: f64 = 0.9;

pub fn smoke() -> TestScenario {
    TestScenario::simulation(
        "Smoke Test",
        SimulationPlan::new(DatasetChoice::Loaded, GameplayStrategy::Oracle)
            .with_expectation(sessions_reach_results)
            .with_expectation(round_numbers_ascend)
            .with_expectation(perfect_play_grades_s_plus),
    )
}

pub fn tier_calibration() -> TestScenario {
    TestScenario::simulation(
        "Tier Calibration",
        SimulationPlan::new(DatasetChoice::Loaded, GameplayStrategy::Oracle)
            .with_sessions(3)
            .with_hints()
            .with_expectation(sessions_reach_results)
            .with_expectation(tiers_follow_round_slots)
            .with_expectation(in_band_rounds_sit_in_band),
    )
}

pub fn analyst_accuracy() -> TestScenario {
    TestScenario::simulation(
        "Analyst Accuracy",
        SimulationPlan::new(DatasetChoice::Loaded, GameplayStrategy::Analyst)
            .with_sessions(3)
            .with_expectation(sessions_reach_results)
            .with_expectation(scores_match_outcomes)
            .with_expectation(analyst_beats_threshold),
    )
}

pub fn distractor_trap() -> TestScenario {
    TestScenario::simulation(
        "Distractor Trap",
        SimulationPlan::new(DatasetChoice::Loaded, GameplayStrategy::Distracted)
            .with_sessions(3)
            .with_expectation(sessions_reach_results)
            .with_expectation(scores_match_outcomes)
            .with_expectation(distractor_always_visible),
    )
}

pub fn sparse_dataset() -> TestScenario {
    TestScenario::simulation(
        "Sparse Dataset Degradation",
        SimulationPlan::new(DatasetChoice::Sparse, GameplayStrategy::CoinFlip)
            .with_sessions(2)
            .with_expectation(sessions_reach_results)
            .with_expectation(round_numbers_ascend)
            .with_expectation(scores_match_outcomes)
            .with_expectation(sparse_rounds_use_roe),
    )
}

pub fn empty_dataset() -> TestScenario {
    TestScenario::simulation(
        "Empty Dataset Handling",
        SimulationPlan::new(DatasetChoice::Empty, GameplayStrategy::CoinFlip)
            .with_sessions(2)
            .with_expectation(empty_pool_reports_insufficient_data),
    )
}

pub fn high_score() -> TestScenario {
    TestScenario::simulation(
        "High Score Tracking",
        SimulationPlan::new(DatasetChoice::Loaded, GameplayStrategy::CoinFlip)
            .with_sessions(5)
            .with_expectation(sessions_reach_results)
            .with_expectation(scores_match_outcomes)
            .with_expectation(high_score_is_running_max),
    )
}

/// Played sessions end on results; sessions with no rounds end on insufficient data.
fn sessions_reach_results(summary: &SimulationSummary) -> Result<()> {
    for session in &summary.sessions {
        let expected = if session.rounds.is_empty() {
            Screen::InsufficientData
        } else {
            Screen::Results
        };
        ensure!(
            session.screen == expected,
            "session {} ended on {} after {} rounds",
            session.seed,
            session.screen,
            session.rounds.len()
        );
    }
    Ok(())
}

fn round_numbers_ascend(summary: &SimulationSummary) -> Result<()> {
    let limit = summary.config.round_count;
    for session in &summary.sessions {
        let numbers: Vec<u8> = session.rounds.iter().map(|r| r.number).collect();
        ensure!(
            numbers.windows(2).all(|pair| pair[0] < pair[1]),
            "session {} numbers out of order: {numbers:?}",
            session.seed
        );
        ensure!(
            numbers.iter().all(|n| (1..=limit).contains(n)),
            "session {} numbers outside 1..={limit}: {numbers:?}",
            session.seed
        );
    }
    Ok(())
}

fn perfect_play_grades_s_plus(summary: &SimulationSummary) -> Result<()> {
    for session in &summary.sessions {
        let Some(result) = &session.summary else {
            continue;
        };
        ensure!(
            usize::try_from(result.score).unwrap_or(usize::MAX) == session.rounds.len(),
            "oracle scored {} of {}",
            result.score,
            session.rounds.len()
        );
        ensure!(
            result.grade == Grade::SPlus,
            "perfect session graded {}",
            result.grade
        );
    }
    Ok(())
}

fn scores_match_outcomes(summary: &SimulationSummary) -> Result<()> {
    for session in &summary.sessions {
        let correct = session.correct_rounds();
        ensure!(
            usize::try_from(session.score).unwrap_or(usize::MAX) == correct,
            "session {} scored {} with {correct} correct rounds",
            session.seed,
            session.score
        );
        if let Some(result) = &session.summary {
            ensure!(
                result.recap.len() == session.rounds.len(),
                "recap has {} rows for {} rounds",
                result.recap.len(),
                session.rounds.len()
            );
            ensure!(
                result.recap.iter().filter(|r| r.correct).count() == correct,
                "recap disagrees with the played rounds"
            );
        }
    }
    Ok(())
}

fn tiers_follow_round_slots(summary: &SimulationSummary) -> Result<()> {
    for round in summary.sessions.iter().flat_map(|s| &s.rounds) {
        let slot = usize::from(round.number.saturating_sub(1));
        ensure!(
            round.tier == DifficultyTier::for_round(slot),
            "round {} is {} but its slot is {}",
            round.number,
            round.tier,
            DifficultyTier::for_round(slot)
        );
        ensure!(
            round.distractor_count == round.tier.distractor_count(),
            "round {} asks for {} distractors on {}",
            round.number,
            round.distractor_count,
            round.tier
        );
        ensure!(
            round.visible_fields == 2 + usize::from(round.distractor_count),
            "round {} shows {} fields",
            round.number,
            round.visible_fields
        );
    }
    Ok(())
}

fn in_band_rounds_sit_in_band(summary: &SimulationSummary) -> Result<()> {
    let bands = &summary.config.bands;
    for round in summary.sessions.iter().flat_map(|s| &s.rounds) {
        if round.calibration == Calibration::InBand {
            ensure!(
                bands.band(round.tier).contains(round.relative_difference),
                "round {} ({}) at {:.4} is outside its band",
                round.number,
                round.tier,
                round.relative_difference
            );
        }
    }
    Ok(())
}

fn analyst_beats_threshold(summary: &SimulationSummary) -> Result<()> {
    let Some(accuracy) = summary.accuracy() else {
        return Ok(());
    };
    ensure!(
        accuracy >= ANALYST_MIN_ACCURACY,
        "analyst accuracy {:.1}% below {:.0}%",
        accuracy * 100.0,
        ANALYST_MIN_ACCURACY * 100.0
    );
    Ok(())
}

fn distractor_always_visible(summary: &SimulationSummary) -> Result<()> {
    for round in summary.sessions.iter().flat_map(|s| &s.rounds) {
        let rationale = round.rationale.as_deref().unwrap_or_default();
        ensure!(
            rationale.starts_with("compared "),
            "round {} offered no distractor ({rationale})",
            round.number
        );
    }
    Ok(())
}

fn sparse_rounds_use_roe(summary: &SimulationSummary) -> Result<()> {
    for round in summary.sessions.iter().flat_map(|s| &s.rounds) {
        ensure!(
            round.metric == MetricKind::Roe,
            "sparse pool produced a {} round",
            round.metric
        );
    }
    ensure!(
        summary.total_rounds() <= summary.sessions.len() * usize::from(summary.config.round_count),
        "sparse pool overfilled its sessions"
    );
    Ok(())
}

fn empty_pool_reports_insufficient_data(summary: &SimulationSummary) -> Result<()> {
    for session in &summary.sessions {
        ensure!(
            session.screen == Screen::InsufficientData,
            "empty pool reached {}",
            session.screen
        );
        ensure!(session.rounds.is_empty(), "empty pool produced rounds");
        ensure!(session.summary.is_none(), "empty pool produced a summary");
    }
    ensure!(summary.high_score == 0, "empty pool set a high score");
    Ok(())
}

fn high_score_is_running_max(summary: &SimulationSummary) -> Result<()> {
    let mut best = 0;
    for session in &summary.sessions {
        best = best.max(session.score);
        ensure!(
            session.high_score == best,
            "after session {} the high score is {}, expected {best}",
            session.seed,
            session.high_score
        );
        if let Some(result) = &session.summary {
            ensure!(result.best == best, "summary best {} != {best}", result.best);
        }
    }
    ensure!(summary.high_score == best, "manager high score drifted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{GameTester, TesterAssets};
    use std::sync::Arc;

    fn run(scenario: &TestScenario, seed: u64) -> Result<()> {
        let tester = GameTester::new(Arc::new(TesterAssets::load_default().unwrap()), false);
        let summary = tester.run_plan(&scenario.plan, seed)?;
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(&summary)?;
        }
        Ok(())
    }

    #[test]
    fn catalog_passes_on_bundled_data() {
        for scenario in [
            smoke(),
            tier_calibration(),
            distractor_trap(),
            sparse_dataset(),
            empty_dataset(),
            high_score(),
        ] {
            for seed in [1_u64, 1337] {
                run(&scenario, seed).unwrap_or_else(|err| panic!("{}: {err:#}", scenario.name));
            }
        }
    }

    #[test]
    fn analyst_reads_the_raw_fields_correctly() {
        run(&analyst_accuracy(), 1337).unwrap();
    }
}
