//! Difficulty calibration: how obvious a comparison is, and which tier it suits.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    BAND_TARGET_CEILING, EASY_BAND_MIN, EASY_DISTRACTORS, EASY_ROUND_LIMIT, HARD_BAND_MAX,
    HARD_BAND_MIN, HARD_DISTRACTORS, MEDIUM_BAND_MAX, MEDIUM_BAND_MIN, MEDIUM_DISTRACTORS,
    MEDIUM_ROUND_LIMIT,
};
use crate::data::Company;
use crate::metrics::{MetricKind, MetricSpec};

/// Difficulty tier of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Numeric tier (0 = easy, 1 = medium, 2 = hard).
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Easy),
            1 => Some(Self::Medium),
            2 => Some(Self::Hard),
            _ => None,
        }
    }

    /// Tier for a zero-based round index: rounds 1-3 easy, 4-7 medium, the rest hard.
    #[must_use]
    pub const fn for_round(index: usize) -> Self {
        if index < EASY_ROUND_LIMIT as usize {
            Self::Easy
        } else if index < MEDIUM_ROUND_LIMIT as usize {
            Self::Medium
        } else {
            Self::Hard
        }
    }

    /// Distractor fields shown per company panel.
    #[must_use]
    pub const fn distractor_count(self) -> u8 {
        match self {
            Self::Easy => EASY_DISTRACTORS,
            Self::Medium => MEDIUM_DISTRACTORS,
            Self::Hard => HARD_DISTRACTORS,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive relative-difference window for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    pub min: f64,
    /// `None` means unbounded above.
    #[serde(default)]
    pub max: Option<f64>,
}

impl TierBand {
    #[must_use]
    pub const fn new(min: f64, max: Option<f64>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.max.unwrap_or(f64::INFINITY)
    }

    #[must_use]
    pub fn contains(&self, diff: f64) -> bool {
        !diff.is_nan() && diff >= self.min && diff <= self.upper()
    }

    /// Point inside the band the sampler steers towards.
    #[must_use]
    pub fn target(&self) -> f64 {
        (self.min + self.upper().min(BAND_TARGET_CEILING)) / 2.0
    }
}

/// Band per tier, indexed by [`DifficultyTier::index`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBands {
    #[serde(default = "TierBands::default_easy")]
    pub easy: TierBand,
    #[serde(default = "TierBands::default_medium")]
    pub medium: TierBand,
    #[serde(default = "TierBands::default_hard")]
    pub hard: TierBand,
}

impl TierBands {
    const fn default_easy() -> TierBand {
        TierBand::new(EASY_BAND_MIN, None)
    }

    const fn default_medium() -> TierBand {
        TierBand::new(MEDIUM_BAND_MIN, Some(MEDIUM_BAND_MAX))
    }

    const fn default_hard() -> TierBand {
        TierBand::new(HARD_BAND_MIN, Some(HARD_BAND_MAX))
    }

    #[must_use]
    pub const fn band(&self, tier: DifficultyTier) -> &TierBand {
        match tier {
            DifficultyTier::Easy => &self.easy,
            DifficultyTier::Medium => &self.medium,
            DifficultyTier::Hard => &self.hard,
        }
    }

    /// Every tier whose band admits `diff`, easiest first.
    #[must_use]
    pub fn classify(&self, diff: f64) -> Vec<DifficultyTier> {
        DifficultyTier::ALL
            .into_iter()
            .filter(|tier| self.band(*tier).contains(diff))
            .collect()
    }
}

impl Default for TierBands {
    fn default() -> Self {
        Self {
            easy: Self::default_easy(),
            medium: Self::default_medium(),
            hard: Self::default_hard(),
        }
    }
}

/// Scale-invariant spread between two companies on a metric.
///
/// Returns `f64::INFINITY` when the comparison is unusable: a value is
/// missing, P/E is negative on either side, or both values are zero.
#[must_use]
pub fn relative_difference(a: &Company, b: &Company, metric: &MetricSpec) -> f64 {
    let (Some(va), Some(vb)) = (metric.value(a), metric.value(b)) else {
        return f64::INFINITY;
    };
    if metric.kind == MetricKind::Pe && (va < 0.0 || vb < 0.0) {
        return f64::INFINITY;
    }
    spread(va, vb)
}

/// `|a - b| / mean(|a|, |b|)`, infinite when both are zero.
#[must_use]
pub fn spread(va: f64, vb: f64) -> f64 {
    let avg = (va.abs() + vb.abs()) / 2.0;
    if avg == 0.0 {
        return f64::INFINITY;
    }
    (va - vb).abs() / avg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_pe(ticker: &str, pe: Option<f64>) -> Company {
        let mut company = Company::new(ticker, ticker, "Banks");
        company.pe = pe;
        company
    }

    fn with_roe(ticker: &str, roe: f64) -> Company {
        let mut company = Company::new(ticker, ticker, "Banks");
        company.roe = Some(roe);
        company
    }

    #[test]
    fn worked_pe_example_lands_in_easy_band() {
        let a = with_pe("A", Some(25.0));
        let b = with_pe("B", Some(5.0));
        let diff = relative_difference(&a, &b, MetricKind::Pe.spec());
        assert!((diff - 20.0 / 15.0).abs() < 1e-12);
        let bands = TierBands::default();
        assert!(bands.easy.contains(diff));
        assert!(!bands.medium.contains(diff));
        assert!(!bands.hard.contains(diff));
    }

    #[test]
    fn unusable_inputs_are_infinite() {
        let pe = MetricKind::Pe.spec();
        assert!(relative_difference(&with_pe("A", None), &with_pe("B", Some(3.0)), pe).is_infinite());
        assert!(
            relative_difference(&with_pe("A", Some(-2.0)), &with_pe("B", Some(3.0)), pe)
                .is_infinite()
        );
        assert!(
            relative_difference(&with_pe("A", Some(0.0)), &with_pe("B", Some(0.0)), pe)
                .is_infinite()
        );
    }

    #[test]
    fn negative_roe_is_allowed_and_unbounded() {
        let a = with_roe("A", -0.1);
        let b = with_roe("B", 0.1);
        let diff = relative_difference(&a, &b, MetricKind::Roe.spec());
        assert!((diff - 2.0).abs() < 1e-12);
        let c = with_roe("C", -0.3);
        let wide = relative_difference(&c, &b, MetricKind::Roe.spec());
        assert!(wide.is_finite());
    }

    #[test]
    fn relative_difference_is_symmetric() {
        let pairs = [(0.12, 0.18), (3.0, 45.0), (-0.05, 0.2), (7.5, 7.5)];
        for (x, y) in pairs {
            let a = with_roe("A", x);
            let b = with_roe("B", y);
            let spec = MetricKind::Roe.spec();
            let ab = relative_difference(&a, &b, spec);
            let ba = relative_difference(&b, &a, spec);
            assert!((ab - ba).abs() < 1e-12, "asymmetric for {x} vs {y}");
        }
    }

    #[test]
    fn tiers_follow_round_index() {
        let tiers: Vec<u8> = (0..10).map(|i| DifficultyTier::for_round(i).index()).collect();
        assert_eq!(tiers, vec![0, 0, 0, 1, 1, 1, 1, 2, 2, 2]);
        assert_eq!(DifficultyTier::from_index(2), Some(DifficultyTier::Hard));
        assert_eq!(DifficultyTier::from_index(3), None);
    }

    #[test]
    fn band_targets_sit_mid_band() {
        let bands = TierBands::default();
        assert!((bands.easy.target() - 1.25).abs() < 1e-12);
        assert!((bands.medium.target() - 0.575).abs() < 1e-12);
        assert!((bands.hard.target() - 0.255).abs() < 1e-12);
    }

    #[test]
    fn band_edges_are_inclusive() {
        let bands = TierBands::default();
        assert!(bands.hard.contains(0.5));
        assert!(bands.easy.contains(0.5));
        assert!(bands.medium.contains(1.0));
        assert!(!bands.hard.contains(0.009));
        assert!(!bands.hard.contains(f64::NAN));
        assert_eq!(
            bands.classify(0.3),
            vec![DifficultyTier::Medium, DifficultyTier::Hard]
        );
    }

    #[test]
    fn distractors_grow_with_tier() {
        let counts: Vec<u8> = DifficultyTier::ALL
            .iter()
            .map(|t| t.distractor_count())
            .collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }
}
