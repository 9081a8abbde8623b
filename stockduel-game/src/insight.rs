//! Post-round explanation text, templated per metric.
use crate::data::Company;
use crate::metrics::{MetricKind, MetricSpec};
use crate::panel::format_amount;
use crate::sampler::Round;

const SECTOR_BANKS: &str = "Banks";

/// Winner and loser of a finished round, ordered by metric value.
struct Matchup<'a> {
    spec: &'a MetricSpec,
    winner: &'a Company,
    loser: &'a Company,
    win: f64,
    lose: f64,
}

impl Matchup<'_> {
    fn win_fmt(&self) -> String {
        self.spec.format(Some(self.win))
    }

    fn lose_fmt(&self) -> String {
        self.spec.format(Some(self.lose))
    }

    fn same_sector(&self) -> bool {
        self.winner.sector == self.loser.sector
    }

    /// Winner over loser, when neither side is zero.
    fn ratio(&self) -> Option<f64> {
        (self.win != 0.0 && self.lose != 0.0).then(|| self.win / self.lose)
    }
}

/// Explanation for a round whose metric values are `win_value` for `winner`
/// and `lose_value` for `loser`. The winner is the company with the higher value.
#[must_use]
pub fn generate_insight(
    metric: MetricKind,
    winner: &Company,
    loser: &Company,
    win_value: f64,
    lose_value: f64,
) -> String {
    let m = Matchup {
        spec: metric.spec(),
        winner,
        loser,
        win: win_value,
        lose: lose_value,
    };
    let parts = match metric {
        MetricKind::Roe => roe_insight(&m),
        MetricKind::Roa => roa_insight(&m),
        MetricKind::Pe => pe_insight(&m),
        MetricKind::Pb => pb_insight(&m),
        MetricKind::ProfitMargin => margin_insight(&m),
    };
    if parts.is_empty() {
        return format!(
            "{} scored {} vs {}'s {} on {}.",
            winner.ticker,
            m.win_fmt(),
            loser.ticker,
            m.lose_fmt(),
            m.spec.label
        );
    }
    parts.join(" ")
}

/// Insight for a sampled round, or `None` when a value is missing.
#[must_use]
pub fn round_insight(round: &Round) -> Option<String> {
    let (Some(va), Some(vb)) = round.values() else {
        return None;
    };
    let text = if va > vb {
        generate_insight(round.metric, &round.company_a, &round.company_b, va, vb)
    } else {
        generate_insight(round.metric, &round.company_b, &round.company_a, vb, va)
    };
    Some(text)
}

fn roe_insight(m: &Matchup<'_>) -> Vec<String> {
    let (w, l) = (&m.winner.ticker, &m.loser.ticker);
    let mut parts = Vec::new();
    if m.win > 0.25 {
        parts.push(format!(
            "{w} posts an ROE of {}, an exceptional return for its shareholders. Screeners usually treat anything above 15% as strong.",
            m.win_fmt()
        ));
    } else if m.lose < 0.05 {
        parts.push(format!(
            "{l} returns only {} on equity, so shareholder capital is barely working. That can point to inefficiency or to heavy reinvestment.",
            m.lose_fmt()
        ));
    } else {
        parts.push(format!(
            "{w} earns {} on each rupiah of equity against {}'s {}.",
            m.win_fmt(),
            l,
            m.lose_fmt()
        ));
    }
    match m.ratio() {
        Some(ratio) if m.same_sector() && ratio > 1.5 => parts.push(format!(
            "Both sit in {}, yet {w} is {ratio:.1}x more efficient with shareholder equity. A gap like this inside one sector is a warning sign for {l} holders.",
            m.winner.sector
        )),
        _ if !m.same_sector() => parts.push(format!(
            "ROE across sectors ({} vs {}) is a rough comparison because capital intensity differs. Compare within a sector first.",
            m.winner.sector, m.loser.sector
        )),
        _ => {}
    }
    if let (Some(wpb), Some(lpb)) = (m.winner.pb, m.loser.pb)
        && wpb > lpb * 1.5
    {
        parts.push(format!(
            "The stronger ROE helps explain why {w} carries the richer P/B ({wpb:.1}x vs {lpb:.1}x); the market pays up for efficient use of equity."
        ));
    }
    parts
}

fn roa_insight(m: &Matchup<'_>) -> Vec<String> {
    let (w, l) = (&m.winner.ticker, &m.loser.ticker);
    let mut parts = Vec::new();
    if m.winner.sector == SECTOR_BANKS || m.loser.sector == SECTOR_BANKS {
        parts.push(format!(
            "Banks rarely clear 3% ROA because deposits and loans inflate the balance sheet, so {} is a solid result for a lender.",
            m.win_fmt()
        ));
    } else if m.win > 0.15 {
        parts.push(format!(
            "{w} turns its assets into profit at {}, the mark of an asset-light business.",
            m.win_fmt()
        ));
    } else {
        parts.push(format!(
            "{w} earns {} on its assets compared with {}'s {}.",
            m.win_fmt(),
            l,
            m.lose_fmt()
        ));
    }
    if let (Some(wa), Some(la)) = (m.winner.total_assets, m.loser.total_assets)
        && wa > 0.0
        && la > 0.0
    {
        let scale = wa.max(la) / wa.min(la);
        if scale.round() > 5.0 {
            let bigger = if wa > la { w } else { l };
            parts.push(format!(
                "{bigger} holds {scale:.0}x the total assets, and ROA shows that a larger asset base does not guarantee better returns."
            ));
        }
    }
    parts.push(
        "Asset-heavy industries such as banking and property naturally score lower on ROA than technology or pharma."
            .to_string(),
    );
    parts
}

fn pe_insight(m: &Matchup<'_>) -> Vec<String> {
    let (w, l) = (&m.winner.ticker, &m.loser.ticker);
    let (high, low) = (m.win.max(m.lose), m.win.min(m.lose));
    let (high_co, low_co) = if m.win > m.lose {
        (m.winner, m.loser)
    } else {
        (m.loser, m.winner)
    };
    let mut parts = Vec::new();
    if high > 20.0 {
        parts.push(format!(
            "At a P/E of {}, buyers of {} pay about {high:.0} years of current earnings, a premium that assumes strong growth ahead.",
            m.spec.format(Some(high)),
            high_co.ticker
        ));
    }
    if low < 8.0 {
        parts.push(format!(
            "{}'s P/E of {} looks cheap, but a low multiple can also mean the market expects earnings to fall.",
            low_co.ticker,
            m.spec.format(Some(low))
        ));
    }
    if high > low * 2.0 {
        parts.push(format!(
            "A {:.1}x gap in P/E is large. Ask whether the pricier stock is growing faster or the cheaper one faces headwinds.",
            high / low
        ));
    } else {
        parts.push(format!(
            "{w} trades at {} and {l} at {}. Similar multiples suggest the market sees comparable growth prospects.",
            m.win_fmt(),
            m.lose_fmt()
        ));
    }
    parts
}

fn pb_insight(m: &Matchup<'_>) -> Vec<String> {
    let (w, l) = (&m.winner.ticker, &m.loser.ticker);
    let mut parts = Vec::new();
    if m.lose < 1.0 {
        parts.push(format!(
            "{l} trades at {} book, below the net assets on its balance sheet. That is either deep value or a verdict on asset quality.",
            m.lose_fmt()
        ));
    }
    if m.win > 5.0 {
        parts.push(format!(
            "{w} is valued at {:.0}x its book value; a premium that steep usually reflects brand, market position or other intangibles.",
            m.win
        ));
    } else {
        parts.push(format!(
            "{w} trades at {} book value against {}'s {}.",
            m.win_fmt(),
            l,
            m.lose_fmt()
        ));
    }
    if m.same_sector() {
        parts.push(format!(
            "Inside {}, a P/B gap tends to track a gap in ROE: investors pay more for higher returns on equity.",
            m.winner.sector
        ));
    } else {
        parts.push(
            "P/B ranges differ widely by sector. Consumer brands carry high multiples while banks and property sit near 1.0x."
                .to_string(),
        );
    }
    parts
}

fn margin_insight(m: &Matchup<'_>) -> Vec<String> {
    let (w, l) = (&m.winner.ticker, &m.loser.ticker);
    let mut parts = Vec::new();
    if m.win > 0.20 {
        parts.push(format!(
            "{w} keeps Rp{:.0} of every Rp100 of revenue as profit, a sign of pricing power or a lean cost base.",
            m.win * 100.0
        ));
    }
    if m.lose > 0.0 && m.lose < 0.03 {
        parts.push(format!(
            "{l} runs a razor-thin {} margin. Volume businesses live like this, and one weak quarter can push them into a loss.",
            m.lose_fmt()
        ));
    }
    match (m.winner.revenue, m.loser.revenue) {
        (Some(wr), Some(lr)) if lr > wr * 2.0 && m.lose < m.win => parts.push(format!(
            "{l} books {} in revenue against {w}'s {}, yet {w} keeps more of each sale and ends up the more profitable business.",
            format_amount(Some(lr)),
            format_amount(Some(wr))
        )),
        _ => parts.push(
            "Margins describe business quality: a 30% margin absorbs a 10% revenue dip that would wipe out a 3% margin."
                .to_string(),
        ),
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(ticker: &str, sector: &str) -> Company {
        Company::new(ticker, ticker, sector)
    }

    #[test]
    fn roe_flags_exceptional_returns_and_cross_sector() {
        let w = company("UNVR", "Consumer");
        let l = company("BBRI", "Banks");
        let text = generate_insight(MetricKind::Roe, &w, &l, 0.9, 0.18);
        assert!(text.contains("UNVR posts an ROE of 90.0%"));
        assert!(text.contains("(Consumer vs Banks)"));
    }

    #[test]
    fn roe_same_sector_gap_mentions_ratio() {
        let mut w = company("AAA", "Banks");
        let mut l = company("BBB", "Banks");
        w.pb = Some(4.0);
        l.pb = Some(1.0);
        let text = generate_insight(MetricKind::Roe, &w, &l, 0.2, 0.1);
        assert!(text.contains("2.0x more efficient"));
        assert!(text.contains("(4.0x vs 1.0x)"));
    }

    #[test]
    fn roa_mentions_banks_and_asset_scale() {
        let mut w = company("BBCA", "Banks");
        let mut l = company("TLKM", "Telecom");
        w.total_assets = Some(1_400_000.0);
        l.total_assets = Some(280_000.0);
        let text = generate_insight(MetricKind::Roa, &w, &l, 0.035, 0.02);
        assert!(text.starts_with("Banks rarely clear 3% ROA"));
        assert!(!text.contains("the total assets"));
        l.total_assets = Some(200_000.0);
        let text = generate_insight(MetricKind::Roa, &w, &l, 0.035, 0.02);
        assert!(text.contains("BBCA holds 7x the total assets"));
    }

    #[test]
    fn pe_names_premium_and_cheap_sides() {
        let w = company("AAA", "Consumer");
        let l = company("BBB", "Consumer");
        let text = generate_insight(MetricKind::Pe, &w, &l, 25.0, 5.0);
        assert!(text.contains("At a P/E of 25.0x, buyers of AAA"));
        assert!(text.contains("BBB's P/E of 5.0x looks cheap"));
        assert!(text.contains("A 5.0x gap"));
    }

    #[test]
    fn margin_revenue_paradox() {
        let mut w = company("HMSP", "Tobacco");
        let mut l = company("ASII", "Conglomerate");
        w.revenue = Some(100_000_000_000_000.0);
        l.revenue = Some(300_000_000_000_000.0);
        let text = generate_insight(MetricKind::ProfitMargin, &w, &l, 0.25, 0.02);
        assert!(text.contains("Rp25 of every Rp100"));
        assert!(text.contains("razor-thin 2.0% margin"));
        assert!(text.contains("ASII books 300.0 T in revenue against HMSP's 100.0 T"));
    }

    #[test]
    fn round_insight_orders_by_value() {
        let mut a = company("A", "Banks");
        let mut b = company("B", "Banks");
        a.pb = Some(0.8);
        b.pb = Some(2.0);
        let round = Round {
            number: 1,
            tier: crate::calibrate::DifficultyTier::Easy,
            company_a: a,
            company_b: b,
            metric: MetricKind::Pb,
            distractor_count: 1,
            relative_difference: 0.857,
            answer: crate::sampler::Answer::Higher,
            calibration: crate::sampler::Calibration::InBand,
        };
        let text = round_insight(&round).unwrap();
        assert!(text.starts_with("A trades at 0.80x book"));
        assert!(text.contains("B trades at 2.00x book value"));
    }

    #[test]
    fn insight_is_deterministic() {
        let w = company("X", "Retail");
        let l = company("Y", "Retail");
        let first = generate_insight(MetricKind::Pb, &w, &l, 3.0, 1.5);
        assert_eq!(first, generate_insight(MetricKind::Pb, &w, &l, 3.0, 1.5));
    }
}
