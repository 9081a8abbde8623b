pub mod calibration;
pub mod game_tester;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use calibration::{
    CalibrationAggregate, CalibrationRecord, aggregate_calibration, run_calibration_analysis,
    validate_calibration_targets,
};
pub use game_tester::{
    DatasetChoice, GameTester, SimulationExpectation, SimulationPlan, SimulationSummary,
    TesterAssets,
};
pub use policy::{GameplayStrategy, PlayerPolicy, PolicyDecision};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use simulation::{RoundRecord, SessionRecord, SimulationSession};
pub use tester::*;
