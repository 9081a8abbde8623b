//! Company panel contents: which raw fields are visible and how amounts render.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{IDR_PER_BILLION, RAW_IDR_THRESHOLD};
use crate::data::{Company, FieldKey};
use crate::metrics::MetricSpec;

/// Visible fields on one panel: two relevant plus up to three distractors.
pub type FieldList = SmallVec<[FieldKey; 5]>;

/// Field order for both company panels of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelLayout {
    pub fields_a: FieldList,
    pub fields_b: FieldList,
}

impl PanelLayout {
    /// Draw independent layouts for the A and B panels.
    pub fn draw<R: Rng + ?Sized>(
        metric: &MetricSpec,
        distractor_count: u8,
        rng: &mut R,
    ) -> Self {
        Self {
            fields_a: visible_fields(metric, distractor_count, rng),
            fields_b: visible_fields(metric, distractor_count, rng),
        }
    }
}

/// Relevant fields plus `distractor_count` randomly chosen distractors, shuffled.
pub fn visible_fields<R: Rng + ?Sized>(
    metric: &MetricSpec,
    distractor_count: u8,
    rng: &mut R,
) -> FieldList {
    let mut fields: FieldList = metric.relevant.iter().copied().collect();
    fields.extend(
        metric
            .distractors
            .choose_multiple(rng, usize::from(distractor_count))
            .copied(),
    );
    fields.shuffle(rng);
    fields
}

/// A labelled, formatted field ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRow {
    pub key: FieldKey,
    pub label: &'static str,
    pub value: String,
}

/// Render the visible fields of `company` in layout order.
#[must_use]
pub fn panel_rows(company: &Company, fields: &[FieldKey]) -> Vec<FieldRow> {
    fields
        .iter()
        .map(|&key| FieldRow {
            key,
            label: key.label(),
            value: format_amount(company.field(key)),
        })
        .collect()
}

/// Render an IDR amount as trillions, billions or millions.
///
/// Magnitudes of at least 100 000 are treated as raw rupiah; smaller values
/// are assumed to already be in billions.
#[must_use]
pub fn format_amount(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return "N/A".to_string();
    };
    let billions = if v.abs() >= RAW_IDR_THRESHOLD {
        v / IDR_PER_BILLION
    } else {
        v
    };
    if billions.abs() >= 1_000.0 {
        format!("{} T", group_thousands(&format!("{:.1}", billions / 1_000.0)))
    } else if billions.abs() >= 1.0 {
        format!("{} B", group_thousands(&format!("{billions:.0}")))
    } else {
        format!("{} M", group_thousands(&format!("{:.0}", billions * 1_000.0)))
    }
}

/// Insert comma separators into the integer part of a formatted number.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = formatted
        .strip_prefix('-')
        .map_or(("", formatted), |rest| ("-", rest));
    let (int_part, frac_part) = unsigned
        .split_once('.')
        .map_or((unsigned, None), |(i, f)| (i, Some(f)));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
