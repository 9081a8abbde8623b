pub mod catalog;

use crate::logic::SimulationPlan;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Scenario keys run by `--scenarios all`, in catalog order.
pub const ALL_SCENARIOS: [&str; 7] = [
    "smoke",
    "tier-calibration",
    "analyst-accuracy",
    "distractor-trap",
    "sparse-dataset",
    "empty-dataset",
    "high-score",
];

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => catalog::smoke(),
        "tier-calibration" | "calibration" | "tiers" => catalog::tier_calibration(),
        "analyst-accuracy" | "analyst" => catalog::analyst_accuracy(),
        "distractor-trap" | "distracted" => catalog::distractor_trap(),
        "sparse-dataset" | "sparse" => catalog::sparse_dataset(),
        "empty-dataset" | "empty" => catalog::empty_dataset(),
        "high-score" | "highscore" => catalog::high_score(),
        _ => return None,
    };
    Some(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("tier-calibration", "Tier Calibration"),
        ("analyst-accuracy", "Analyst Accuracy"),
        ("distractor-trap", "Distractor Trap"),
        ("sparse-dataset", "Sparse Dataset Degradation"),
        ("empty-dataset", "Empty Dataset Handling"),
        ("high-score", "High Score Tracking"),
    ]
}
