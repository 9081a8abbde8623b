//! Round lifecycle and the screen-level session manager.
//!
//! A [`QuizSession`] owns one ordered run of rounds and walks each through
//! guessing, revealing and result. [`SessionManager`] sits above it: it owns
//! the company pool, the validated config and the running high score, and
//! moves between the start, playing and results screens.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{QuizConfig, QuizConfigError};
use crate::data::CompanyData;
use crate::insight::round_insight;
use crate::panel::PanelLayout;
use crate::result::{ResultSummary, result_summary};
use crate::rng::RngBundle;
use crate::sampler::{Answer, Round};
use crate::sequencer::build_rounds;

/// Lifecycle of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Awaiting a higher/lower call.
    Guessing,
    /// Guess recorded and scored; outcome not yet shown.
    Revealing { guess: Answer, correct: bool },
    /// Values and explanation on display.
    Result { guess: Answer, correct: bool },
}

impl Phase {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Guessing => "guessing",
            Self::Revealing { .. } => "revealing",
            Self::Result { .. } => "result",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The player's answer for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u8,
    pub guess: Answer,
    pub correct: bool,
}

/// What `advance` moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    NextRound,
    Complete { score: u32 },
}

/// Everything the result phase displays for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReveal {
    pub value_a: String,
    pub value_b: String,
    pub answer: Answer,
    pub guess: Answer,
    pub correct: bool,
    pub insight: String,
}

/// Errors raised when an action does not fit the current state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no round is in play")]
    NoActiveRound,
    #[error("cannot {action} while the round is {phase}")]
    WrongPhase { action: &'static str, phase: Phase },
    #[error("cannot {action} on the {screen} screen")]
    WrongScreen {
        action: &'static str,
        screen: Screen,
    },
}

/// One ordered run of rounds with score and answers.
#[derive(Debug, Clone)]
pub struct QuizSession {
    seed: u64,
    rounds: Vec<Round>,
    layouts: Vec<PanelLayout>,
    index: usize,
    phase: Phase,
    score: u32,
    outcomes: Vec<RoundOutcome>,
    hint_visible: bool,
}

impl QuizSession {
    /// Build a session from the pool; the seed fixes both rounds and layouts.
    #[must_use]
    pub fn new(data: &CompanyData, config: &QuizConfig, seed: u64) -> Self {
        let mut rng = RngBundle::from_user_seed(seed);
        let rounds = build_rounds(&data.companies, config, rng.sampling());
        Self::assemble(rounds, &mut rng)
    }

    /// Wrap pre-built rounds, drawing panel layouts from `seed`.
    #[must_use]
    pub fn from_rounds(rounds: Vec<Round>, seed: u64) -> Self {
        let mut rng = RngBundle::from_user_seed(seed);
        Self::assemble(rounds, &mut rng)
    }

    fn assemble(rounds: Vec<Round>, rng: &mut RngBundle) -> Self {
        let layouts = rounds
            .iter()
            .map(|round| {
                PanelLayout::draw(round.metric_spec(), round.distractor_count, rng.layout())
            })
            .collect();
        Self {
            seed: rng.seed(),
            outcomes: Vec::with_capacity(rounds.len()),
            rounds,
            layouts,
            index: 0,
            phase: Phase::Guessing,
            score: 0,
            hint_visible: false,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    #[must_use]
    pub fn layouts(&self) -> &[PanelLayout] {
        &self.layouts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Zero-based index of the round in play.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.get(self.index)
    }

    #[must_use]
    pub fn current_layout(&self) -> Option<&PanelLayout> {
        self.layouts.get(self.index)
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn outcomes(&self) -> &[RoundOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub const fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    /// True once the last round has been advanced past.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.index >= self.rounds.len()
    }

    /// Show or hide the formula hint for the round being guessed.
    ///
    /// # Errors
    ///
    /// Fails when no round is in play or the guess is already in.
    pub fn toggle_hint(&mut self) -> Result<bool, SessionError> {
        self.require_phase("toggle the hint", |p| matches!(p, Phase::Guessing))?;
        self.hint_visible = !self.hint_visible;
        Ok(self.hint_visible)
    }

    /// Record a guess; the score moves here, before the outcome is shown.
    ///
    /// # Errors
    ///
    /// Fails when no round is in play or the round already has a guess.
    pub fn guess(&mut self, guess: Answer) -> Result<bool, SessionError> {
        self.require_phase("guess", |p| matches!(p, Phase::Guessing))?;
        let round = self.current_round().ok_or(SessionError::NoActiveRound)?;
        let correct = round.is_correct(guess);
        let number = round.number;
        if correct {
            self.score = self.score.saturating_add(1);
        }
        self.outcomes.push(RoundOutcome {
            round: number,
            guess,
            correct,
        });
        self.phase = Phase::Revealing { guess, correct };
        Ok(correct)
    }

    /// End the reveal pause and show the outcome.
    ///
    /// # Errors
    ///
    /// Fails unless the round is revealing.
    pub fn finish_reveal(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Revealing { guess, correct } => {
                self.phase = Phase::Result { guess, correct };
                Ok(())
            }
            _ => Err(self.wrong_phase("finish the reveal")),
        }
    }

    /// Move past a finished round.
    ///
    /// # Errors
    ///
    /// Fails unless the round is showing its result.
    pub fn advance(&mut self) -> Result<Progress, SessionError> {
        self.require_phase("advance", |p| matches!(p, Phase::Result { .. }))?;
        self.index += 1;
        self.hint_visible = false;
        self.phase = Phase::Guessing;
        if self.is_complete() {
            return Ok(Progress::Complete { score: self.score });
        }
        Ok(Progress::NextRound)
    }

    /// Formatted values and explanation for the round showing its result.
    #[must_use]
    pub fn reveal(&self) -> Option<RoundReveal> {
        let Phase::Result { guess, correct } = self.phase else {
            return None;
        };
        let round = self.current_round()?;
        let spec = round.metric_spec();
        let (va, vb) = round.values();
        Some(RoundReveal {
            value_a: spec.format(va),
            value_b: spec.format(vb),
            answer: round.answer,
            guess,
            correct,
            insight: round_insight(round).unwrap_or_default(),
        })
    }

    fn require_phase(
        &self,
        action: &'static str,
        allowed: impl Fn(Phase) -> bool,
    ) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::NoActiveRound);
        }
        if allowed(self.phase) {
            Ok(())
        } else {
            Err(self.wrong_phase(action))
        }
    }

    const fn wrong_phase(&self, action: &'static str) -> SessionError {
        SessionError::WrongPhase {
            action,
            phase: self.phase,
        }
    }
}

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Start,
    Playing,
    Results,
    /// The pool produced no rounds for the last start.
    InsufficientData,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Playing => "playing",
            Self::Results => "results",
            Self::InsufficientData => "insufficient data",
        })
    }
}

/// Owns the pool, the config and the high score across sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    data: CompanyData,
    config: QuizConfig,
    screen: Screen,
    session: Option<QuizSession>,
    high_score: u32,
}

impl SessionManager {
    /// Validate `config` and wait on the start screen.
    ///
    /// # Errors
    ///
    /// Returns the config validation error.
    pub fn new(data: CompanyData, config: QuizConfig) -> Result<Self, QuizConfigError> {
        config.validate()?;
        Ok(Self {
            data,
            config,
            screen: Screen::Start,
            session: None,
            high_score: 0,
        })
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub const fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn high_score(&self) -> u32 {
        self.high_score
    }

    #[must_use]
    pub const fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub const fn data(&self) -> &CompanyData {
        &self.data
    }

    /// Start a session from any screen but `Playing`.
    ///
    /// # Errors
    ///
    /// Fails while a session is in play; use [`Self::restart`] to abandon it.
    pub fn start(&mut self, seed: u64) -> Result<Screen, SessionError> {
        if self.screen == Screen::Playing {
            return Err(SessionError::WrongScreen {
                action: "start",
                screen: self.screen,
            });
        }
        Ok(self.begin(seed))
    }

    /// Discard whatever is in play and start again.
    pub fn restart(&mut self, seed: u64) -> Screen {
        self.begin(seed)
    }

    fn begin(&mut self, seed: u64) -> Screen {
        let session = QuizSession::new(&self.data, &self.config, seed);
        if session.is_empty() {
            log::warn!(
                "seed {seed}: {} companies produced no rounds",
                self.data.len()
            );
            self.session = None;
            self.screen = Screen::InsufficientData;
        } else {
            log::info!("seed {seed}: session started with {} rounds", session.len());
            self.session = Some(session);
            self.screen = Screen::Playing;
        }
        self.screen
    }

    /// Abandon the session and return to the start screen. The high score is kept.
    pub fn quit(&mut self) {
        self.session = None;
        self.screen = Screen::Start;
    }

    pub fn reset_high_score(&mut self) {
        self.high_score = 0;
    }

    /// # Errors
    ///
    /// See [`QuizSession::toggle_hint`].
    pub fn toggle_hint(&mut self) -> Result<bool, SessionError> {
        self.playing_mut("toggle the hint")?.toggle_hint()
    }

    /// # Errors
    ///
    /// See [`QuizSession::guess`].
    pub fn guess(&mut self, guess: Answer) -> Result<bool, SessionError> {
        self.playing_mut("guess")?.guess(guess)
    }

    /// # Errors
    ///
    /// See [`QuizSession::finish_reveal`].
    pub fn finish_reveal(&mut self) -> Result<(), SessionError> {
        self.playing_mut("finish the reveal")?.finish_reveal()
    }

    /// Advance the session; completing it moves to results and settles the high score.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::advance`].
    pub fn advance(&mut self) -> Result<Progress, SessionError> {
        let progress = self.playing_mut("advance")?.advance()?;
        if let Progress::Complete { score } = progress {
            self.screen = Screen::Results;
            if score > self.high_score {
                log::info!("new high score {score} (was {})", self.high_score);
            }
            self.high_score = self.high_score.max(score);
        }
        Ok(progress)
    }

    /// Guess, wait out the reveal delay, then show the outcome.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::guess`].
    #[cfg(feature = "async")]
    pub async fn guess_and_reveal(&mut self, guess: Answer) -> Result<bool, SessionError> {
        let correct = self.guess(guess)?;
        tokio::time::sleep(self.config.reveal_delay()).await;
        self.finish_reveal()?;
        Ok(correct)
    }

    /// Summary of the finished session, available on the results screen.
    #[must_use]
    pub fn summary(&self) -> Option<ResultSummary> {
        if self.screen != Screen::Results {
            return None;
        }
        self.session
            .as_ref()
            .map(|session| result_summary(session, self.high_score))
    }

    fn playing_mut(&mut self, action: &'static str) -> Result<&mut QuizSession, SessionError> {
        if self.screen != Screen::Playing {
            return Err(SessionError::WrongScreen {
                action,
                screen: self.screen,
            });
        }
        self.session.as_mut().ok_or(SessionError::NoActiveRound)
    }
}
