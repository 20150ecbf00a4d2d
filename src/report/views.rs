//! View models handed to the dashboard: plain serializable data, one struct
//! per report, computed for a single period.

use crate::format::bandwidth::format_bandwidth;
use crate::format::period::{month_name, Period, PeriodMode, Tick};
use crate::report::dataset::{
    DownloadEntry, KeywordEntry, OverviewRecord, PageEntry, PhraseEntry, ReferrerEntry,
    SiteDataset,
};
use crate::report::series::{build_series, sorted_properties};
use serde::Serialize;
use std::collections::BTreeMap;

/// One row of the overview table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewRow {
    /// Day number in month mode, month name in year mode.
    pub label: String,
    pub hits: Option<u64>,
    pub pages: Option<u64>,
    pub visits: Option<u64>,
    pub visitors: Option<u64>,
    pub bandwidth: String,
}

/// Chart and table of the overview report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewView {
    /// `(x, pages)` points.
    pub series: Vec<(usize, Option<u64>)>,
    pub ticks: Vec<Tick>,
    pub table: Vec<OverviewRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRow {
    pub url: String,
    pub link: String,
    pub pages: u64,
    pub bandwidth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Top10View {
    pub base_url: String,
    pub pages: Vec<PageRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRow {
    pub url: String,
    pub link: String,
    pub hits: u64,
    pub bandwidth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadsView {
    pub base_url: String,
    pub files: Vec<DownloadRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferrersView {
    pub referrers: Vec<ReferrerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordsView {
    pub keywords: Vec<KeywordEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhrasesView {
    pub phrases: Vec<PhraseEntry>,
}

/// Entry of the period dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodOption {
    pub key: String,
    pub label: String,
}

/// All six reports for one site and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reports {
    pub overview: OverviewView,
    pub top10: Top10View,
    pub downloads: DownloadsView,
    pub referrers: ReferrersView,
    pub keywords: KeywordsView,
    pub phrases: PhrasesView,
}

impl Reports {
    pub fn build(dataset: &SiteDataset, period: &Period) -> Self {
        Self {
            overview: overview(dataset, period),
            top10: top10(dataset, period),
            downloads: downloads(dataset, period),
            referrers: ReferrersView {
                referrers: entries_for(&dataset.referrers, period),
            },
            keywords: KeywordsView {
                keywords: entries_for(&dataset.keywords, period),
            },
            phrases: PhrasesView {
                phrases: entries_for(&dataset.phrases, period),
            },
        }
    }
}

/// Rows of a per-period table; a period without data has no rows.
fn entries_for<T: Clone>(table: &BTreeMap<String, Vec<T>>, period: &Period) -> Vec<T> {
    table.get(period.code()).cloned().unwrap_or_default()
}

/// Absolute link for a report URL: root-relative paths are joined to the
/// site URL, anything else is kept as is.
fn site_link(base_url: &str, url: &str) -> String {
    if url.starts_with('/') {
        format!("{}{url}", base_url.trim_end_matches('/'))
    } else {
        url.to_string()
    }
}

pub fn overview(dataset: &SiteDataset, period: &Period) -> OverviewView {
    let mode = period.mode();
    let sorted: Vec<(String, OverviewRecord)> = sorted_properties(
        dataset
            .overview
            .iter()
            .map(|(key, record)| (key.clone(), record.clone())),
    );
    let data = build_series(&sorted, period.code(), mode);

    let series = data.iter().map(|(x, record)| (*x, record.pages)).collect();
    let table = data
        .iter()
        .map(|(x, record)| {
            let label = match mode {
                PeriodMode::Month => (x + 1).to_string(),
                PeriodMode::Year => u32::try_from(x + 1)
                    .map_or_else(|_| (x + 1).to_string(), |m| month_name(m).to_string()),
            };
            OverviewRow {
                label,
                hits: record.hits,
                pages: record.pages,
                visits: record.visits,
                visitors: record.visitors,
                bandwidth: format_bandwidth(record.bandwidth),
            }
        })
        .collect();

    OverviewView {
        series,
        ticks: period.ticks(),
        table,
    }
}

pub fn top10(dataset: &SiteDataset, period: &Period) -> Top10View {
    let pages = entries_for(&dataset.top10, period)
        .into_iter()
        .map(|PageEntry { url, pages, bandwidth }| PageRow {
            link: site_link(&dataset.url, &url),
            url,
            pages,
            bandwidth: format_bandwidth(Some(bandwidth)),
        })
        .collect();
    Top10View {
        base_url: dataset.url.clone(),
        pages,
    }
}

pub fn downloads(dataset: &SiteDataset, period: &Period) -> DownloadsView {
    let files = entries_for(&dataset.downloads, period)
        .into_iter()
        .map(|DownloadEntry { url, hits, bandwidth }| DownloadRow {
            link: site_link(&dataset.url, &url),
            url,
            hits,
            bandwidth: format_bandwidth(Some(bandwidth)),
        })
        .collect();
    DownloadsView {
        base_url: dataset.url.clone(),
        files,
    }
}

/// Dropdown entries for every period of the site, in dataset order.
pub fn period_options(dataset: &SiteDataset) -> Vec<PeriodOption> {
    dataset
        .periods
        .iter()
        .map(|key| PeriodOption {
            key: key.clone(),
            label: Period::parse(key).map_or_else(|_| key.clone(), |p| p.label()),
        })
        .collect()
}
