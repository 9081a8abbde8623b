//! Centralized tuning constants for Stock Duel round generation.
//!
//! These values define the difficulty curve of a session. Keeping them
//! together means calibration can only drift through reviewed code
//! changes; `QuizConfig` defaults are built from them.

// Session shape ------------------------------------------------------------
pub const ROUND_COUNT: u8 = 10;
/// Rounds with a zero-based index below this are easy.
pub const EASY_ROUND_LIMIT: u8 = 3;
/// Rounds with a zero-based index below this (and not easy) are medium.
pub const MEDIUM_ROUND_LIMIT: u8 = 7;
pub const REVEAL_DELAY_MS: u64 = 1_000;

// Sampling budgets ---------------------------------------------------------
pub const SEARCH_ATTEMPTS: u32 = 200;
pub const FALLBACK_ATTEMPTS: u32 = 100;

// Difficulty bands (relative difference) -----------------------------------
pub const EASY_BAND_MIN: f64 = 0.5;
pub const MEDIUM_BAND_MIN: f64 = 0.15;
pub const MEDIUM_BAND_MAX: f64 = 1.0;
pub const HARD_BAND_MIN: f64 = 0.01;
pub const HARD_BAND_MAX: f64 = 0.5;
/// Cap applied to an unbounded band before computing its target point.
pub const BAND_TARGET_CEILING: f64 = 2.0;

// Distractors shown per company panel -------------------------------------
pub const EASY_DISTRACTORS: u8 = 1;
pub const MEDIUM_DISTRACTORS: u8 = 2;
pub const HARD_DISTRACTORS: u8 = 3;
/// Every registered metric must offer at least this many distractors.
pub const MIN_REGISTRY_DISTRACTORS: usize = 3;

// Amount formatting --------------------------------------------------------
/// Amounts at or above this magnitude are raw IDR rather than billions.
pub const RAW_IDR_THRESHOLD: f64 = 100_000.0;
pub const IDR_PER_BILLION: f64 = 1_000_000_000.0;

// Grading ------------------------------------------------------------------
pub const GRADE_A_MIN_PCT: u32 = 80;
pub const GRADE_B_MIN_PCT: u32 = 60;
pub const GRADE_C_MIN_PCT: u32 = 40;
