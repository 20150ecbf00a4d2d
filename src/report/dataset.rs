use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Hits, pages, visits, visitors and bandwidth for one day, month or year.
///
/// Every field is optional: missing values are unknown, not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewRecord {
    #[serde(default)]
    pub hits: Option<u64>,
    #[serde(default)]
    pub pages: Option<u64>,
    #[serde(default)]
    pub visits: Option<u64>,
    #[serde(default)]
    pub visitors: Option<u64>,
    /// Bytes.
    #[serde(default)]
    pub bandwidth: Option<u64>,
}

/// Entry of the "Top 10" pages report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub url: String,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub bandwidth: u64,
}

/// Entry of the downloads report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEntry {
    pub url: String,
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub bandwidth: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerEntry {
    pub url: String,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub hits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    #[serde(default)]
    pub searches: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseEntry {
    pub phrase: String,
    #[serde(default)]
    pub searches: u64,
}

/// Contents of `data/<site>.json`.
///
/// `overview` is keyed by date (`YYYY`, `YYYYMM` or `YYYYMMDD`); the other
/// tables are keyed by period code. A `BTreeMap` keeps every table in key
/// order, which for fixed-width date keys is chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDataset {
    pub url: String,
    /// Most recent first.
    pub periods: Vec<String>,
    #[serde(default)]
    pub overview: BTreeMap<String, OverviewRecord>,
    #[serde(default)]
    pub top10: BTreeMap<String, Vec<PageEntry>>,
    #[serde(default)]
    pub downloads: BTreeMap<String, Vec<DownloadEntry>>,
    #[serde(default)]
    pub referrers: BTreeMap<String, Vec<ReferrerEntry>>,
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<KeywordEntry>>,
    #[serde(default)]
    pub phrases: BTreeMap<String, Vec<PhraseEntry>>,
}

impl SiteDataset {
    /// The most recent period, used when no period has been chosen.
    pub fn latest_period(&self) -> Option<&str> {
        self.periods.first().map(String::as_str)
    }

    pub fn has_period(&self, period: &str) -> bool {
        self.periods.iter().any(|p| p == period)
    }
}

/// The six reports, which double as the tabs of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportName {
    #[default]
    Overview,
    Top10,
    Downloads,
    Referrers,
    Keywords,
    Phrases,
}

impl ReportName {
    pub const ALL: [Self; 6] = [
        Self::Overview,
        Self::Top10,
        Self::Downloads,
        Self::Referrers,
        Self::Keywords,
        Self::Phrases,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Top10 => "top10",
            Self::Downloads => "downloads",
            Self::Referrers => "referrers",
            Self::Keywords => "keywords",
            Self::Phrases => "phrases",
        }
    }

    /// Navigation label shown on the tab.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Top10 => "Top 10 pages",
            Self::Downloads => "Downloads",
            Self::Referrers => "Referrers",
            Self::Keywords => "Search keywords",
            Self::Phrases => "Search phrases",
        }
    }
}

impl fmt::Display for ReportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a page name does not match any report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReport(pub String);

impl fmt::Display for UnknownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown report page: '{}'", self.0)
    }
}

impl std::error::Error for UnknownReport {}

impl FromStr for ReportName {
    type Err = UnknownReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownReport(s.to_string()))
    }
}
