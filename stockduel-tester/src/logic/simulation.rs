use stockduel_game::{
    Answer, Calibration, DifficultyTier, MetricKind, Progress, ResultSummary, Screen,
    SessionError, SessionManager,
};

use crate::logic::policy::PlayerPolicy;

/// Snapshot of one answered round.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub number: u8,
    pub tier: DifficultyTier,
    pub metric: MetricKind,
    pub calibration: Calibration,
    pub relative_difference: f64,
    pub distractor_count: u8,
    pub visible_fields: usize,
    pub answer: Answer,
    pub guess: Answer,
    pub correct: bool,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Everything observed while playing one session to its end.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub seed: u64,
    pub screen: Screen,
    pub rounds: Vec<RoundRecord>,
    pub score: u32,
    pub high_score: u32,
    pub summary: Option<ResultSummary>,
}

impl SessionRecord {
    #[must_use]
    pub fn correct_rounds(&self) -> usize {
        self.rounds.iter().filter(|r| r.correct).count()
    }
}

/// Drives a [`SessionManager`] through whole sessions with a scripted player.
pub struct SimulationSession<'m> {
    manager: &'m mut SessionManager,
    policy: Box<dyn PlayerPolicy + Send>,
    toggle_hints: bool,
}

impl<'m> SimulationSession<'m> {
    pub fn new(manager: &'m mut SessionManager, policy: Box<dyn PlayerPolicy + Send>) -> Self {
        Self {
            manager,
            policy,
            toggle_hints: false,
        }
    }

    /// Open the hint on every round before guessing.
    #[must_use]
    pub fn with_hints(mut self) -> Self {
        self.toggle_hints = true;
        self
    }

    /// Restart the manager on `seed` and play until the results screen.
    ///
    /// # Errors
    ///
    /// Returns the first action the engine rejects.
    pub fn play(&mut self, seed: u64) -> Result<SessionRecord, SessionError> {
        let screen = self.manager.restart(seed);
        let mut rounds = Vec::new();
        if screen == Screen::Playing {
            loop {
                rounds.push(self.play_round()?);
                if let Progress::Complete { .. } = self.manager.advance()? {
                    break;
                }
            }
        }

        let score = self.manager.session().map_or(0, |s| s.score());
        Ok(SessionRecord {
            seed,
            screen: self.manager.screen(),
            rounds,
            score,
            high_score: self.manager.high_score(),
            summary: self.manager.summary(),
        })
    }

    fn play_round(&mut self) -> Result<RoundRecord, SessionError> {
        let session = self.manager.session().ok_or(SessionError::NoActiveRound)?;
        let round = session
            .current_round()
            .cloned()
            .ok_or(SessionError::NoActiveRound)?;
        let layout = session
            .current_layout()
            .cloned()
            .ok_or(SessionError::NoActiveRound)?;

        if self.toggle_hints {
            self.manager.toggle_hint()?;
        }
        let decision = self.policy.pick_answer(&round, &layout);
        let correct = self.manager.guess(decision.guess)?;
        self.manager.finish_reveal()?;
        log::debug!(
            "round {} {} {}: {} guessed {} ({})",
            round.number,
            round.tier,
            round.metric,
            self.policy.name(),
            decision.guess,
            if correct { "correct" } else { "wrong" }
        );

        Ok(RoundRecord {
            number: round.number,
            tier: round.tier,
            metric: round.metric,
            calibration: round.calibration,
            relative_difference: round.relative_difference,
            distractor_count: round.distractor_count,
            visible_fields: layout.fields_b.len(),
            answer: round.answer,
            guess: decision.guess,
            correct,
            policy_name: self.policy.name().to_string(),
            rationale: decision.rationale,
        })
    }
}
