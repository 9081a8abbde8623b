//! Round sampling: random company pairs and metrics, filtered and fitted to a tier.
use rand::Rng;
use rand::seq::{SliceRandom, index};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calibrate::{DifficultyTier, TierBand, relative_difference};
use crate::constants::{FALLBACK_ATTEMPTS, SEARCH_ATTEMPTS};
use crate::data::Company;
use crate::metrics::{MetricKind, MetricSpec, REGISTRY};

/// The player's call on company B relative to company A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Higher,
    Lower,
}

impl Answer {
    /// Correct answer for baseline value `va` against challenger `vb`.
    #[must_use]
    pub fn for_values(va: f64, vb: f64) -> Self {
        if vb > va { Self::Higher } else { Self::Lower }
    }

    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Higher => Self::Lower,
            Self::Lower => Self::Higher,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Higher => "higher",
            Self::Lower => "lower",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a round's pair was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calibration {
    /// Relative difference lies inside the tier's band.
    InBand,
    /// Accepted by the relaxed pass; difficulty may not match the tier.
    Fallback,
}

/// What to do when no in-band candidate turns up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Accept the first structurally valid candidate.
    #[default]
    Lenient,
    /// Give up on the round.
    Strict,
}

/// One head-to-head comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based position in the session.
    pub number: u8,
    pub tier: DifficultyTier,
    pub company_a: Company,
    pub company_b: Company,
    pub metric: MetricKind,
    pub distractor_count: u8,
    pub relative_difference: f64,
    pub answer: Answer,
    pub calibration: Calibration,
}

impl Round {
    #[must_use]
    pub fn metric_spec(&self) -> &'static MetricSpec {
        self.metric.spec()
    }

    /// Metric values for A and B.
    #[must_use]
    pub fn values(&self) -> (Option<f64>, Option<f64>) {
        let spec = self.metric_spec();
        (spec.value(&self.company_a), spec.value(&self.company_b))
    }

    /// Whether `guess` matches the answer fixed at creation.
    #[must_use]
    pub fn is_correct(&self, guess: Answer) -> bool {
        guess == self.answer
    }
}

/// A structurally valid pairing found during sampling.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub company_a: &'a Company,
    pub company_b: &'a Company,
    pub metric: &'a MetricSpec,
    pub value_a: f64,
    pub value_b: f64,
    pub diff: f64,
}

impl Candidate<'_> {
    #[must_use]
    pub fn answer(&self) -> Answer {
        Answer::for_values(self.value_a, self.value_b)
    }

    fn into_round(self, tier: DifficultyTier, calibration: Calibration) -> Round {
        Round {
            number: 0,
            tier,
            company_a: self.company_a.clone(),
            company_b: self.company_b.clone(),
            metric: self.metric.kind,
            distractor_count: tier.distractor_count(),
            relative_difference: self.diff,
            answer: self.answer(),
            calibration,
        }
    }
}

/// Attempt budgets for the two sampling passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingLimits {
    pub search_attempts: u32,
    pub fallback_attempts: u32,
}

impl Default for SamplingLimits {
    fn default() -> Self {
        Self {
            search_attempts: SEARCH_ATTEMPTS,
            fallback_attempts: FALLBACK_ATTEMPTS,
        }
    }
}

/// Values of a pairing when it is usable for a round.
///
/// Rejects missing values, negatives on metrics that forbid them, ties, and
/// pairings whose relative difference cannot be computed.
#[must_use]
pub fn usable_values(a: &Company, b: &Company, metric: &MetricSpec) -> Option<(f64, f64)> {
    if a.ticker == b.ticker {
        return None;
    }
    let va = metric.value(a)?;
    let vb = metric.value(b)?;
    if !va.is_finite() || !vb.is_finite() {
        return None;
    }
    if va == vb {
        return None;
    }
    if metric.non_negative && (va < 0.0 || vb < 0.0) {
        return None;
    }
    Some((va, vb))
}

/// Random-search round sampler over a read-only company pool.
#[derive(Debug, Clone, Copy)]
pub struct RoundSampler<'a> {
    companies: &'a [Company],
    metrics: &'a [MetricSpec],
    limits: SamplingLimits,
}

impl<'a> RoundSampler<'a> {
    /// Sampler over the built-in metric registry.
    #[must_use]
    pub fn new(companies: &'a [Company], limits: SamplingLimits) -> Self {
        Self::with_metrics(companies, &REGISTRY, limits)
    }

    #[must_use]
    pub const fn with_metrics(
        companies: &'a [Company],
        metrics: &'a [MetricSpec],
        limits: SamplingLimits,
    ) -> Self {
        Self {
            companies,
            metrics,
            limits,
        }
    }

    /// Whether the pool can form a pair at all.
    #[must_use]
    pub fn can_pair(&self) -> bool {
        self.companies.len() >= 2 && !self.metrics.is_empty()
    }

    /// Draw one random ordered pair of distinct companies and a metric.
    fn draw<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Option<(&'a Company, &'a Company, &'a MetricSpec)> {
        if !self.can_pair() {
            return None;
        }
        let picks = index::sample(rng, self.companies.len(), 2);
        let metric = self.metrics.choose(rng)?;
        Some((
            &self.companies[picks.index(0)],
            &self.companies[picks.index(1)],
            metric,
        ))
    }

    /// Draw a candidate, returning `None` when the draw is unusable.
    fn draw_candidate<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Candidate<'a>> {
        let (a, b, metric) = self.draw(rng)?;
        let (value_a, value_b) = usable_values(a, b, metric)?;
        let diff = relative_difference(a, b, metric);
        if !diff.is_finite() {
            return None;
        }
        Some(Candidate {
            company_a: a,
            company_b: b,
            metric,
            value_a,
            value_b,
            diff,
        })
    }

    /// Tight pass: best in-band candidate, closest to the band's target point.
    pub fn search_in_band<R: Rng + ?Sized>(
        &self,
        band: &TierBand,
        rng: &mut R,
    ) -> Option<Candidate<'a>> {
        if !self.can_pair() {
            return None;
        }
        let target = band.target();
        let mut best: Option<(f64, Candidate<'a>)> = None;
        for _ in 0..self.limits.search_attempts {
            let Some(candidate) = self.draw_candidate(rng) else {
                continue;
            };
            if !band.contains(candidate.diff) {
                continue;
            }
            let distance = (candidate.diff - target).abs();
            if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                best = Some((distance, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }

    /// Relaxed pass: first structurally valid candidate, band ignored.
    pub fn first_valid<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Candidate<'a>> {
        if !self.can_pair() {
            return None;
        }
        (0..self.limits.fallback_attempts).find_map(|_| self.draw_candidate(rng))
    }

    /// Sample a round for `tier`, or `None` when the pool cannot supply one.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        tier: DifficultyTier,
        band: &TierBand,
        fallback: FallbackPolicy,
        rng: &mut R,
    ) -> Option<Round> {
        if let Some(candidate) = self.search_in_band(band, rng) {
            log::debug!(
                "{tier} round: {} vs {} on {} (diff {:.3})",
                candidate.company_a.ticker,
                candidate.company_b.ticker,
                candidate.metric.short,
                candidate.diff
            );
            return Some(candidate.into_round(tier, Calibration::InBand));
        }
        if fallback == FallbackPolicy::Strict {
            return None;
        }
        let candidate = self.first_valid(rng)?;
        log::debug!(
            "{tier} round fell back to {} vs {} on {} (diff {:.3})",
            candidate.company_a.ticker,
            candidate.company_b.ticker,
            candidate.metric.short,
            candidate.diff
        );
        Some(candidate.into_round(tier, Calibration::Fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::TierBands;
    use crate::data::CompanyData;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn roe_company(ticker: &str, roe: Option<f64>) -> Company {
        let mut company = Company::new(ticker, ticker, "Banks");
        company.roe = roe;
        company
    }

    fn roe_only() -> [MetricSpec; 1] {
        [*MetricKind::Roe.spec()]
    }

    #[test]
    fn answer_is_relative_to_company_a() {
        assert_eq!(Answer::for_values(25.0, 5.0), Answer::Lower);
        assert_eq!(Answer::for_values(5.0, 25.0), Answer::Higher);
        assert_eq!(Answer::Higher.flip(), Answer::Lower);
    }

    #[test]
    fn usable_values_rejects_ties_and_gaps() {
        let roe = MetricKind::Roe.spec();
        let a = roe_company("A", Some(0.12));
        let tie = roe_company("B", Some(0.12));
        let missing = roe_company("C", None);
        assert!(usable_values(&a, &tie, roe).is_none());
        assert!(usable_values(&a, &missing, roe).is_none());
        assert!(usable_values(&a, &a, roe).is_none());
        assert_eq!(
            usable_values(&a, &roe_company("D", Some(0.2)), roe),
            Some((0.12, 0.2))
        );
    }

    #[test]
    fn usable_values_rejects_negative_margin_and_pe() {
        let mut a = Company::new("A", "A", "Retail");
        let mut b = Company::new("B", "B", "Retail");
        a.profit_margin = Some(-0.01);
        b.profit_margin = Some(0.05);
        a.pe = Some(-3.0);
        b.pe = Some(12.0);
        a.roe = Some(-0.02);
        b.roe = Some(0.08);
        assert!(usable_values(&a, &b, MetricKind::ProfitMargin.spec()).is_none());
        assert!(usable_values(&a, &b, MetricKind::Pe.spec()).is_none());
        assert!(usable_values(&a, &b, MetricKind::Roe.spec()).is_some());
    }

    #[test]
    fn tight_pass_only_returns_in_band_candidates() {
        let companies = vec![
            roe_company("A", Some(0.10)),
            roe_company("B", Some(0.11)),
            roe_company("C", Some(0.30)),
        ];
        let metrics = roe_only();
        let sampler = RoundSampler::with_metrics(&companies, &metrics, SamplingLimits::default());
        let band = TierBands::default().hard;
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let candidate = sampler.search_in_band(&band, &mut rng).unwrap();
        assert!(band.contains(candidate.diff));
        let pair = [
            candidate.company_a.ticker.as_str(),
            candidate.company_b.ticker.as_str(),
        ];
        assert!(pair.contains(&"A") && pair.contains(&"B"));
    }

    #[test]
    fn tight_pass_prefers_target_point() {
        // A/B spread ≈ 0.095, A/C spread ≈ 0.25 (hard target 0.255).
        let companies = vec![
            roe_company("A", Some(0.100)),
            roe_company("B", Some(0.110)),
            roe_company("C", Some(0.1286)),
        ];
        let metrics = roe_only();
        let sampler = RoundSampler::with_metrics(&companies, &metrics, SamplingLimits::default());
        let band = TierBands::default().hard;
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let candidate = sampler.search_in_band(&band, &mut rng).unwrap();
        let mut pair = [
            candidate.company_a.ticker.clone(),
            candidate.company_b.ticker.clone(),
        ];
        pair.sort();
        assert_eq!(pair, ["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn fallback_pass_ignores_band() {
        let companies = vec![roe_company("A", Some(0.05)), roe_company("B", Some(0.50))];
        let metrics = roe_only();
        let sampler = RoundSampler::with_metrics(&companies, &metrics, SamplingLimits::default());
        let hard = TierBands::default().hard;
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        assert!(sampler.search_in_band(&hard, &mut rng).is_none());
        let candidate = sampler.first_valid(&mut rng).unwrap();
        assert!(!hard.contains(candidate.diff));

        let round = sampler
            .sample(DifficultyTier::Hard, &hard, FallbackPolicy::Lenient, &mut rng)
            .unwrap();
        assert_eq!(round.calibration, Calibration::Fallback);
        assert_eq!(round.tier, DifficultyTier::Hard);
        assert_eq!(round.distractor_count, 3);

        assert!(
            sampler
                .sample(DifficultyTier::Hard, &hard, FallbackPolicy::Strict, &mut rng)
                .is_none()
        );
    }

    #[test]
    fn degenerate_pools_yield_nothing() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let band = TierBands::default().easy;
        let lone = vec![roe_company("A", Some(0.1))];
        let sampler = RoundSampler::new(&lone, SamplingLimits::default());
        assert!(
            sampler
                .sample(DifficultyTier::Easy, &band, FallbackPolicy::Lenient, &mut rng)
                .is_none()
        );

        let blanks = vec![roe_company("A", None), roe_company("B", None)];
        let sampler = RoundSampler::new(&blanks, SamplingLimits::default());
        assert!(
            sampler
                .sample(DifficultyTier::Easy, &band, FallbackPolicy::Lenient, &mut rng)
                .is_none()
        );

        let empty: Vec<Company> = Vec::new();
        let sampler = RoundSampler::new(&empty, SamplingLimits::default());
        assert!(sampler.first_valid(&mut rng).is_none());
    }

    #[test]
    fn identical_values_never_form_a_round() {
        let companies = vec![roe_company("A", Some(0.15)), roe_company("B", Some(0.15))];
        let metrics = roe_only();
        let sampler = RoundSampler::with_metrics(&companies, &metrics, SamplingLimits::default());
        let bands = TierBands::default();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        for tier in DifficultyTier::ALL {
            assert!(
                sampler
                    .sample(tier, bands.band(tier), FallbackPolicy::Lenient, &mut rng)
                    .is_none()
            );
        }
    }

    #[test]
    fn bundled_pool_satisfies_every_tier() {
        let data = CompanyData::bundled().unwrap();
        let sampler = RoundSampler::new(&data.companies, SamplingLimits::default());
        let bands = TierBands::default();
        let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);
        for tier in DifficultyTier::ALL {
            let round = sampler
                .sample(tier, bands.band(tier), FallbackPolicy::Strict, &mut rng)
                .unwrap();
            assert_eq!(round.calibration, Calibration::InBand);
            assert!(bands.band(tier).contains(round.relative_difference));
            let (va, vb) = round.values();
            assert_eq!(
                round.answer,
                Answer::for_values(va.unwrap(), vb.unwrap())
            );
        }
    }
}
