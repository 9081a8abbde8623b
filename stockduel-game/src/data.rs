use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw financial fields carried by every company record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Earnings,
    Revenue,
    TotalEquity,
    TotalAssets,
    TotalLiabilities,
    MarketCap,
}

impl FieldKey {
    pub const ALL: [Self; 6] = [
        Self::Earnings,
        Self::Revenue,
        Self::TotalEquity,
        Self::TotalAssets,
        Self::TotalLiabilities,
        Self::MarketCap,
    ];

    /// Wire name of the field in the dataset.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earnings => "earnings",
            Self::Revenue => "revenue",
            Self::TotalEquity => "total_equity",
            Self::TotalAssets => "total_assets",
            Self::TotalLiabilities => "total_liabilities",
            Self::MarketCap => "market_cap",
        }
    }

    /// Display label shown on a company panel.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Earnings => "Net Earnings",
            Self::Revenue => "Total Revenue",
            Self::TotalEquity => "Total Equity",
            Self::TotalAssets => "Total Assets",
            Self::TotalLiabilities => "Total Liabilities",
            Self::MarketCap => "Market Cap",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A listed company as supplied by the host dataset.
///
/// Every numeric field may be absent; absent values are never usable for
/// comparison. The derived ratios are precomputed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    #[serde(default)]
    pub earnings: Option<f64>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub total_equity: Option<f64>,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub total_liabilities: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub roe: Option<f64>,
    #[serde(default)]
    pub roa: Option<f64>,
    #[serde(default)]
    pub pe: Option<f64>,
    #[serde(default)]
    pub pb: Option<f64>,
    #[serde(default, rename = "profitMargin")]
    pub profit_margin: Option<f64>,
}

impl Company {
    /// Record with identity only and every numeric field absent.
    #[must_use]
    pub fn new(ticker: &str, name: &str, sector: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            sector: sector.to_string(),
            earnings: None,
            revenue: None,
            total_equity: None,
            total_assets: None,
            total_liabilities: None,
            market_cap: None,
            roe: None,
            roa: None,
            pe: None,
            pb: None,
            profit_margin: None,
        }
    }

    /// Look up a raw field by key.
    #[must_use]
    pub const fn field(&self, key: FieldKey) -> Option<f64> {
        match key {
            FieldKey::Earnings => self.earnings,
            FieldKey::Revenue => self.revenue,
            FieldKey::TotalEquity => self.total_equity,
            FieldKey::TotalAssets => self.total_assets,
            FieldKey::TotalLiabilities => self.total_liabilities,
            FieldKey::MarketCap => self.market_cap,
        }
    }
}

/// Container for the company pool a session draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CompanyData {
    pub companies: Vec<Company>,
}

const BUNDLED_COMPANIES: &str = include_str!("../assets/data/companies.json");

impl CompanyData {
    /// Create an empty pool (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            companies: Vec::new(),
        }
    }

    /// Load the pool from a JSON array of company records.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into company records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn from_companies(companies: Vec<Company>) -> Self {
        Self { companies }
    }

    /// Sample dataset of Indonesian listed companies shipped with the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset fails to parse.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_COMPANIES)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.companies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// Distinct sectors in first-seen order.
    #[must_use]
    pub fn sectors(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for company in &self.companies {
            if !seen.contains(&company.sector.as_str()) {
                seen.push(company.sector.as_str());
            }
        }
        seen
    }

    #[must_use]
    pub fn find(&self, ticker: &str) -> Option<&Company> {
        self.companies
            .iter()
            .find(|c| c.ticker.eq_ignore_ascii_case(ticker))
    }
}
