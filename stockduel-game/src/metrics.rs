//! Closed registry of the financial ratios a round can ask about.
//!
//! Each metric reads a precomputed ratio from the company record, knows how
//! to render it, and names the two raw fields the ratio is built from plus
//! the plausible-looking fields shown alongside them as distractors.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::MIN_REGISTRY_DISTRACTORS;
use crate::data::{Company, FieldKey};

/// Identifier for each registered metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    Roe,
    Roa,
    Pe,
    Pb,
    ProfitMargin,
}

impl MetricKind {
    pub const ALL: [Self; 5] = [
        Self::Roe,
        Self::Roa,
        Self::Pe,
        Self::Pb,
        Self::ProfitMargin,
    ];

    /// Dataset key of the precomputed ratio.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Roe => "roe",
            Self::Roa => "roa",
            Self::Pe => "pe",
            Self::Pb => "pb",
            Self::ProfitMargin => "profitMargin",
        }
    }

    /// Registry entry for this metric.
    #[must_use]
    pub fn spec(self) -> &'static MetricSpec {
        match self {
            Self::Roe => &REGISTRY[0],
            Self::Roa => &REGISTRY[1],
            Self::Pe => &REGISTRY[2],
            Self::Pb => &REGISTRY[3],
            Self::ProfitMargin => &REGISTRY[4],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Static descriptor for one metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub kind: MetricKind,
    pub label: &'static str,
    pub short: &'static str,
    pub formula: &'static str,
    pub hint: &'static str,
    /// Numerator then denominator.
    pub relevant: [FieldKey; 2],
    pub distractors: &'static [FieldKey],
    /// Negative values on either side make the comparison meaningless.
    pub non_negative: bool,
    accessor: fn(&Company) -> Option<f64>,
    formatter: fn(f64) -> String,
}

impl MetricSpec {
    /// Precomputed metric value for a company.
    #[must_use]
    pub fn value(&self, company: &Company) -> Option<f64> {
        (self.accessor)(company)
    }

    /// Display string for a metric value; absent values render as `N/A`.
    #[must_use]
    pub fn format(&self, value: Option<f64>) -> String {
        match value {
            Some(v) if v.is_finite() => (self.formatter)(v),
            _ => "N/A".to_string(),
        }
    }

    /// Recompute the ratio from the two relevant raw fields.
    #[must_use]
    pub fn compute(&self, company: &Company) -> Option<f64> {
        let [numerator, denominator] = self.relevant;
        let num = company.field(numerator)?;
        let den = company.field(denominator)?;
        if den == 0.0 {
            return None;
        }
        Some(num / den)
    }

    /// Whether `field` feeds this metric's formula.
    #[must_use]
    pub fn is_relevant(&self, field: FieldKey) -> bool {
        self.relevant.contains(&field)
    }
}

fn roe(company: &Company) -> Option<f64> {
    company.roe
}

fn roa(company: &Company) -> Option<f64> {
    company.roa
}

fn pe(company: &Company) -> Option<f64> {
    company.pe
}

fn pb(company: &Company) -> Option<f64> {
    company.pb
}

fn profit_margin(company: &Company) -> Option<f64> {
    company.profit_margin
}

fn percent_1dp(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

fn percent_2dp(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn earnings_multiple(v: f64) -> String {
    if v < 0.0 {
        "N/A".to_string()
    } else {
        format!("{v:.1}x")
    }
}

fn book_multiple(v: f64) -> String {
    format!("{v:.2}x")
}

fn margin(v: f64) -> String {
    if v < 0.0 {
        "Negative".to_string()
    } else {
        percent_1dp(v)
    }
}

/// Every metric a round may use, in a fixed order.
pub static REGISTRY: [MetricSpec; 5] = [
    MetricSpec {
        kind: MetricKind::Roe,
        label: "Return on Equity",
        short: "ROE",
        formula: "Net Earnings ÷ Total Equity",
        hint: "Focus on earnings and equity. Divide earnings by equity to get ROE; the rest is noise.",
        relevant: [FieldKey::Earnings, FieldKey::TotalEquity],
        distractors: &[
            FieldKey::Revenue,
            FieldKey::TotalAssets,
            FieldKey::TotalLiabilities,
        ],
        non_negative: false,
        accessor: roe,
        formatter: percent_1dp,
    },
    MetricSpec {
        kind: MetricKind::Roa,
        label: "Return on Assets",
        short: "ROA",
        formula: "Net Earnings ÷ Total Assets",
        hint: "You need earnings and total assets. Revenue looks tempting but it is a distractor.",
        relevant: [FieldKey::Earnings, FieldKey::TotalAssets],
        distractors: &[
            FieldKey::Revenue,
            FieldKey::TotalEquity,
            FieldKey::MarketCap,
        ],
        non_negative: false,
        accessor: roa,
        formatter: percent_2dp,
    },
    MetricSpec {
        kind: MetricKind::Pe,
        label: "Price-to-Earnings",
        short: "P/E",
        formula: "Market Cap ÷ Net Earnings",
        hint: "Market cap divided by earnings. P/E is about what investors pay for profits, not revenue or assets.",
        relevant: [FieldKey::MarketCap, FieldKey::Earnings],
        distractors: &[
            FieldKey::Revenue,
            FieldKey::TotalAssets,
            FieldKey::TotalEquity,
        ],
        non_negative: true,
        accessor: pe,
        formatter: earnings_multiple,
    },
    MetricSpec {
        kind: MetricKind::Pb,
        label: "Price-to-Book",
        short: "P/B",
        formula: "Market Cap ÷ Total Equity",
        hint: "Compare market cap to equity (book value). Assets and liabilities are not what you need here.",
        relevant: [FieldKey::MarketCap, FieldKey::TotalEquity],
        distractors: &[
            FieldKey::TotalAssets,
            FieldKey::Earnings,
            FieldKey::TotalLiabilities,
        ],
        non_negative: false,
        accessor: pb,
        formatter: book_multiple,
    },
    MetricSpec {
        kind: MetricKind::ProfitMargin,
        label: "Net Profit Margin",
        short: "Margin",
        formula: "Net Earnings ÷ Revenue",
        hint: "How much of each rupiah of revenue becomes profit? Earnings divided by revenue.",
        relevant: [FieldKey::Earnings, FieldKey::Revenue],
        distractors: &[
            FieldKey::TotalAssets,
            FieldKey::MarketCap,
            FieldKey::TotalEquity,
        ],
        non_negative: true,
        accessor: profit_margin,
        formatter: margin,
    },
];

/// Errors raised when a registry entry is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry is empty")]
    Empty,
    #[error("metric {metric} is registered more than once")]
    DuplicateMetric { metric: MetricKind },
    #[error("metric {metric} uses {field} as both numerator and denominator")]
    DegenerateRatio { metric: MetricKind, field: FieldKey },
    #[error("metric {metric} needs at least {min} distractors (got {count})")]
    TooFewDistractors {
        metric: MetricKind,
        min: usize,
        count: usize,
    },
    #[error("metric {metric} lists {field} as a distractor more than once")]
    DuplicateDistractor { metric: MetricKind, field: FieldKey },
    #[error("metric {metric} lists relevant field {field} as a distractor")]
    RelevantDistractor { metric: MetricKind, field: FieldKey },
}

/// Check a registry for structural mistakes.
///
/// # Errors
///
/// Returns the first [`RegistryError`] found.
pub fn validate_registry(registry: &[MetricSpec]) -> Result<(), RegistryError> {
    if registry.is_empty() {
        return Err(RegistryError::Empty);
    }
    for (idx, spec) in registry.iter().enumerate() {
        let metric = spec.kind;
        if registry[..idx].iter().any(|other| other.kind == metric) {
            return Err(RegistryError::DuplicateMetric { metric });
        }
        let [numerator, denominator] = spec.relevant;
        if numerator == denominator {
            return Err(RegistryError::DegenerateRatio {
                metric,
                field: numerator,
            });
        }
        if spec.distractors.len() < MIN_REGISTRY_DISTRACTORS {
            return Err(RegistryError::TooFewDistractors {
                metric,
                min: MIN_REGISTRY_DISTRACTORS,
                count: spec.distractors.len(),
            });
        }
        for (d_idx, &field) in spec.distractors.iter().enumerate() {
            if spec.is_relevant(field) {
                return Err(RegistryError::RelevantDistractor { metric, field });
            }
            if spec.distractors[..d_idx].contains(&field) {
                return Err(RegistryError::DuplicateDistractor { metric, field });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company_with(kind: MetricKind, value: f64) -> Company {
        let mut company = Company::new("TST", "Test", "Banks");
        match kind {
            MetricKind::Roe => company.roe = Some(value),
            MetricKind::Roa => company.roa = Some(value),
            MetricKind::Pe => company.pe = Some(value),
            MetricKind::Pb => company.pb = Some(value),
            MetricKind::ProfitMargin => company.profit_margin = Some(value),
        }
        company
    }

    #[test]
    fn builtin_registry_is_valid() {
        assert_eq!(validate_registry(&REGISTRY), Ok(()));
        for kind in MetricKind::ALL {
            assert_eq!(kind.spec().kind, kind);
        }
    }

    #[test]
    fn accessors_read_matching_field() {
        for kind in MetricKind::ALL {
            let company = company_with(kind, 0.42);
            assert_eq!(kind.spec().value(&company), Some(0.42));
            for other in MetricKind::ALL.into_iter().filter(|k| *k != kind) {
                assert_eq!(other.spec().value(&company), None);
            }
        }
    }

    #[test]
    fn formatting_follows_metric_rules() {
        assert_eq!(MetricKind::Roe.spec().format(Some(0.1234)), "12.3%");
        assert_eq!(MetricKind::Roa.spec().format(Some(0.01234)), "1.23%");
        assert_eq!(MetricKind::Pe.spec().format(Some(18.26)), "18.3x");
        assert_eq!(MetricKind::Pe.spec().format(Some(-4.0)), "N/A");
        assert_eq!(MetricKind::Pe.spec().format(None), "N/A");
        assert_eq!(MetricKind::Pb.spec().format(Some(0.876)), "0.88x");
        assert_eq!(MetricKind::ProfitMargin.spec().format(Some(-0.02)), "Negative");
        assert_eq!(MetricKind::ProfitMargin.spec().format(Some(0.205)), "20.5%");
    }

    #[test]
    fn format_is_deterministic() {
        for spec in &REGISTRY {
            let first = spec.format(Some(1.2345));
            assert_eq!(first, spec.format(Some(1.2345)));
        }
    }

    #[test]
    fn compute_uses_relevant_fields() {
        let mut company = Company::new("TST", "Test", "Banks");
        company.earnings = Some(20.0);
        company.total_equity = Some(100.0);
        company.market_cap = Some(400.0);
        assert_eq!(MetricKind::Roe.spec().compute(&company), Some(0.2));
        assert_eq!(MetricKind::Pe.spec().compute(&company), Some(20.0));
        assert_eq!(MetricKind::Roa.spec().compute(&company), None);

        company.total_equity = Some(0.0);
        assert_eq!(MetricKind::Pb.spec().compute(&company), None);
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let mut broken = REGISTRY;
        broken[1].distractors = &[FieldKey::Revenue, FieldKey::MarketCap];
        assert_eq!(
            validate_registry(&broken),
            Err(RegistryError::TooFewDistractors {
                metric: MetricKind::Roa,
                min: 3,
                count: 2,
            })
        );

        let mut overlapping = REGISTRY;
        overlapping[0].distractors = &[
            FieldKey::Earnings,
            FieldKey::Revenue,
            FieldKey::TotalAssets,
        ];
        assert!(matches!(
            validate_registry(&overlapping),
            Err(RegistryError::RelevantDistractor { .. })
        ));

        let mut duplicated = REGISTRY;
        duplicated[4] = REGISTRY[0];
        assert_eq!(
            validate_registry(&duplicated),
            Err(RegistryError::DuplicateMetric {
                metric: MetricKind::Roe
            })
        );

        assert_eq!(validate_registry(&[]), Err(RegistryError::Empty));
    }
}
