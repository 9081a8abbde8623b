use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use stockduel_game::{Answer, PanelLayout, Round};

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub guess: Answer,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(guess: Answer, rationale: Option<String>) -> Self {
        Self { guess, rationale }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick higher or lower for the round on screen, seeing what a player sees.
    fn pick_answer(&mut self, round: &Round, layout: &PanelLayout) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameplayStrategy {
    Oracle,
    Analyst,
    Distracted,
    CoinFlip,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Oracle, Self::Analyst, Self::Distracted, Self::CoinFlip];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Oracle => "Oracle",
            GameplayStrategy::Analyst => "Analyst",
            GameplayStrategy::Distracted => "Distracted",
            GameplayStrategy::CoinFlip => "Coin Flip",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Oracle => Box::new(OraclePolicy),
            GameplayStrategy::Analyst => Box::new(AnalystPolicy),
            GameplayStrategy::Distracted => Box::new(DistractedPolicy),
            GameplayStrategy::CoinFlip => Box::new(CoinFlipPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct OraclePolicy;
struct AnalystPolicy;
struct DistractedPolicy;

struct CoinFlipPolicy {
    rng: ChaCha20Rng,
}

impl CoinFlipPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for OraclePolicy {
    fn name(&self) -> &'static str {
        "Oracle"
    }

    fn pick_answer(&mut self, round: &Round, _layout: &PanelLayout) -> PolicyDecision {
        PolicyDecision::new(round.answer, None)
    }
}

impl PlayerPolicy for AnalystPolicy {
    fn name(&self) -> &'static str {
        "Analyst"
    }

    fn pick_answer(&mut self, round: &Round, _layout: &PanelLayout) -> PolicyDecision {
        let spec = round.metric_spec();
        match (spec.compute(&round.company_a), spec.compute(&round.company_b)) {
            (Some(va), Some(vb)) => PolicyDecision::new(
                Answer::for_values(va, vb),
                Some(format!("{} {va:.4} vs {vb:.4}", spec.short)),
            ),
            _ => PolicyDecision::new(
                Answer::Higher,
                Some(format!("{} not derivable from raw fields", spec.short)),
            ),
        }
    }
}

impl PlayerPolicy for DistractedPolicy {
    fn name(&self) -> &'static str {
        "Distracted"
    }

    fn pick_answer(&mut self, round: &Round, layout: &PanelLayout) -> PolicyDecision {
        let spec = round.metric_spec();
        let Some(field) = layout
            .fields_b
            .iter()
            .copied()
            .find(|field| !spec.is_relevant(*field))
        else {
            return PolicyDecision::new(Answer::Higher, Some("no distractor shown".to_string()));
        };

        let rationale = Some(format!("compared {}", field.label()));
        match (round.company_a.field(field), round.company_b.field(field)) {
            (Some(va), Some(vb)) => PolicyDecision::new(Answer::for_values(va, vb), rationale),
            _ => PolicyDecision::new(Answer::Higher, rationale),
        }
    }
}

impl PlayerPolicy for CoinFlipPolicy {
    fn name(&self) -> &'static str {
        "Coin Flip"
    }

    fn pick_answer(&mut self, _round: &Round, _layout: &PanelLayout) -> PolicyDecision {
        let guess = if self.rng.gen_bool(0.5) {
            Answer::Higher
        } else {
            Answer::Lower
        };
        PolicyDecision::new(guess, None)
    }
}
