//! End-of-session result calculation
use serde::{Deserialize, Serialize};

use crate::calibrate::DifficultyTier;
use crate::constants::{GRADE_A_MIN_PCT, GRADE_B_MIN_PCT, GRADE_C_MIN_PCT};
use crate::numbers::percent_of;
use crate::sampler::{Answer, Calibration};
use crate::seed::share_code_for;
use crate::session::QuizSession;

/// Letter grade for a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    /// Every round correct
    #[serde(rename = "S+")]
    SPlus,
    A,
    B,
    C,
    D,
}

impl Grade {
    /// Grade for a whole-number percentage.
    #[must_use]
    pub const fn for_percent(pct: u32) -> Self {
        if pct >= 100 {
            Self::SPlus
        } else if pct >= GRADE_A_MIN_PCT {
            Self::A
        } else if pct >= GRADE_B_MIN_PCT {
            Self::B
        } else if pct >= GRADE_C_MIN_PCT {
            Self::C
        } else {
            Self::D
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SPlus => "Perfect analyst. Wall Street is calling.",
            Self::A => "Excellent analytical skills!",
            Self::B => "Solid fundamentals knowledge.",
            Self::C => "Getting there. Practice the formulas!",
            Self::D => "Keep learning, analyst in training!",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::SPlus => write!(f, "S+"),
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
        }
    }
}

/// One line of the round breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecap {
    pub number: u8,
    pub tier: DifficultyTier,
    pub metric: String,
    pub ticker_a: String,
    pub ticker_b: String,
    pub value_a: String,
    pub value_b: String,
    pub answer: Answer,
    pub guess: Option<Answer>,
    pub correct: bool,
    pub calibration: Calibration,
}

/// Complete summary of a session for display on the results screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub score: u32,
    pub rounds: usize,
    pub percent: u32,
    pub grade: Grade,
    pub message: String,
    /// Best of the running high score and this session.
    pub best: u32,
    /// Replay code, when the session seed came from one.
    pub share_code: Option<String>,
    pub recap: Vec<RoundRecap>,
}

/// Generate the result summary for a session against the running high score.
#[must_use]
pub fn result_summary(session: &QuizSession, high_score: u32) -> ResultSummary {
    let score = session.score();
    let rounds = session.len();
    let percent = percent_of(usize::try_from(score).unwrap_or(usize::MAX), rounds);
    let grade = if rounds == 0 {
        Grade::D
    } else {
        Grade::for_percent(percent)
    };
    let recap = session
        .rounds()
        .iter()
        .map(|round| {
            let outcome = session.outcomes().iter().find(|o| o.round == round.number);
            let spec = round.metric_spec();
            let (va, vb) = round.values();
            RoundRecap {
                number: round.number,
                tier: round.tier,
                metric: spec.short.to_string(),
                ticker_a: round.company_a.ticker.clone(),
                ticker_b: round.company_b.ticker.clone(),
                value_a: spec.format(va),
                value_b: spec.format(vb),
                answer: round.answer,
                guess: outcome.map(|o| o.guess),
                correct: outcome.is_some_and(|o| o.correct),
                calibration: round.calibration,
            }
        })
        .collect();

    ResultSummary {
        score,
        rounds,
        percent,
        grade,
        message: grade.message().to_string(),
        best: high_score.max(score),
        share_code: share_code_for(session.seed()),
        recap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuizConfig;
    use crate::data::CompanyData;

    #[test]
    fn grade_thresholds() {
        assert_eq!(Grade::for_percent(100), Grade::SPlus);
        assert_eq!(Grade::for_percent(80), Grade::A);
        assert_eq!(Grade::for_percent(79), Grade::B);
        assert_eq!(Grade::for_percent(60), Grade::B);
        assert_eq!(Grade::for_percent(40), Grade::C);
        assert_eq!(Grade::for_percent(39), Grade::D);
        assert_eq!(Grade::SPlus.to_string(), "S+");
        assert_eq!(serde_json::to_string(&Grade::SPlus).unwrap(), "\"S+\"");
    }

    #[test]
    fn summary_grades_against_rounds_played() {
        let data = CompanyData::bundled().unwrap();
        let mut session = QuizSession::new(&data, &QuizConfig::default(), 31);
        let mut guessed = 0;
        while let Some(round) = session.current_round() {
            let guess = if guessed < 7 {
                round.answer
            } else {
                round.answer.flip()
            };
            session.guess(guess).unwrap();
            session.finish_reveal().unwrap();
            session.advance().unwrap();
            guessed += 1;
        }
        let summary = result_summary(&session, 9);
        assert_eq!(summary.score, 7);
        assert_eq!(summary.rounds, 10);
        assert_eq!(summary.percent, 70);
        assert_eq!(summary.grade, Grade::B);
        assert_eq!(summary.best, 9);
        assert_eq!(summary.recap.len(), 10);
        assert_eq!(summary.recap.iter().filter(|r| r.correct).count(), 7);
        assert_eq!(summary.share_code, None);
    }

    #[test]
    fn share_code_seeds_report_their_code() {
        let data = CompanyData::bundled().unwrap();
        let seed = crate::seed::decode_share_code("SD-MOAT07").unwrap();
        let session = QuizSession::new(&data, &QuizConfig::default(), seed);
        let summary = result_summary(&session, 0);
        assert_eq!(summary.share_code.as_deref(), Some("SD-MOAT07"));
    }

    #[test]
    fn empty_session_grades_d() {
        let session = QuizSession::from_rounds(Vec::new(), 1);
        let summary = result_summary(&session, 4);
        assert_eq!(summary.grade, Grade::D);
        assert_eq!(summary.percent, 0);
        assert_eq!(summary.best, 4);
    }
}
