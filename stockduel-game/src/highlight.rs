//! Split insight text into styled segments: tickers, figures and metric names.
use regex::Regex;
use serde::Serialize;

const FIGURE_PATTERN: &str =
    r"\d[\d,]*(?:\.\d+)?%|\d[\d,]*(?:\.\d+)?x\b|Rp\d+|IDR \d+[TBM]\b|\d[\d,]*(?:\.\d+)? ?[TBM]\b";
const METRIC_PATTERN: &str = r"\bROE\b|\bROA\b|\bP/E\b|\bP/B\b|net profit margin|profit margin|market cap|debt-to-equity|asset base|book value";

/// How a segment should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Plain,
    Ticker,
    Figure,
    Metric,
}

/// A contiguous slice of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment<'t> {
    pub kind: SegmentKind,
    pub text: &'t str,
}

/// Compiled matcher for one set of tickers.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// Build a matcher that also recognises `tickers` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns the regex error if the combined pattern fails to compile.
    pub fn new(tickers: &[&str]) -> Result<Self, regex::Error> {
        let escaped: Vec<String> = tickers
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(t))
            .collect();
        let ticker_group = if escaped.is_empty() {
            String::new()
        } else {
            format!(r"(?P<ticker>\b(?:{})\b)|", escaped.join("|"))
        };
        let pattern = Regex::new(&format!(
            r"(?i){ticker_group}(?P<figure>{FIGURE_PATTERN})|(?P<metric>{METRIC_PATTERN})"
        ))?;
        Ok(Self { pattern })
    }

    /// Segment `text`, preserving every byte in order.
    #[must_use]
    pub fn segments<'t>(&self, text: &'t str) -> Vec<Segment<'t>> {
        let mut out = Vec::new();
        let mut cursor = 0;
        for caps in self.pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > cursor {
                out.push(Segment {
                    kind: SegmentKind::Plain,
                    text: &text[cursor..whole.start()],
                });
            }
            let kind = if caps.name("ticker").is_some() {
                SegmentKind::Ticker
            } else if caps.name("figure").is_some() {
                SegmentKind::Figure
            } else {
                SegmentKind::Metric
            };
            out.push(Segment {
                kind,
                text: whole.as_str(),
            });
            cursor = whole.end();
        }
        if cursor < text.len() {
            out.push(Segment {
                kind: SegmentKind::Plain,
                text: &text[cursor..],
            });
        }
        out
    }
}

/// Segment `text`, treating `tickers` as company names to call out.
#[must_use]
pub fn highlight<'t>(text: &'t str, tickers: &[&str]) -> Vec<Segment<'t>> {
    match Highlighter::new(tickers) {
        Ok(highlighter) => highlighter.segments(text),
        Err(err) => {
            log::warn!("highlight pattern rejected: {err}");
            vec![Segment {
                kind: SegmentKind::Plain,
                text,
            }]
        }
    }
}
