//! The report view-controller.
//!
//! A [`Viewer`] owns the current selection (site, period and active report
//! page), the dataset of the selected site and the reports derived from it.
//! Every change goes through [`Viewer::select_site`], [`Viewer::select_period`]
//! or [`Viewer::show_page`], and each change rewrites the bookmarkable
//! fragment (`site=...&period=...&page=...`).

use crate::format::period::{Period, PeriodError, PeriodMode};
use crate::format::querystring::QueryString;
use crate::report::dataset::{ReportName, SiteDataset};
use crate::report::views::{period_options, PeriodOption, Reports};
use crate::storage::loader::{DataSource, LoadError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Outcome of a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested selection was already current; nothing was recomputed.
    Unchanged,
    /// First site ever selected: the header chrome can now be shown.
    FirstLoad,
    Updated,
}

#[derive(Debug)]
pub enum ViewerError {
    Load(LoadError),
    NoSites,
    NoSiteSelected,
    NoPeriods { site: String },
    InvalidPeriod(PeriodError),
    UnknownPeriod { site: String, period: String },
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "{e}"),
            Self::NoSites => write!(f, "No site is listed in sites.json"),
            Self::NoSiteSelected => write!(f, "No site is selected"),
            Self::NoPeriods { site } => write!(f, "Site '{site}' has no reporting period"),
            Self::InvalidPeriod(e) => write!(f, "{e}"),
            Self::UnknownPeriod { site, period } => {
                write!(f, "Site '{site}' has no report for period '{period}'")
            }
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::InvalidPeriod(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for ViewerError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<PeriodError> for ViewerError {
    fn from(e: PeriodError) -> Self {
        Self::InvalidPeriod(e)
    }
}

/// Navigation tab of one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub page: ReportName,
    pub title: &'static str,
    pub current: bool,
}

/// Everything the dashboard needs to render the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub sites: Vec<String>,
    pub site: String,
    pub url: String,
    pub period: Period,
    pub period_label: String,
    pub mode: PeriodMode,
    pub periods: Vec<PeriodOption>,
    pub page: Option<ReportName>,
    pub nav: Vec<NavEntry>,
    pub header_visible: bool,
    pub fragment: String,
    pub reports: Reports,
}

/// State committed by a successful site/period selection.
struct Selection {
    site: String,
    dataset: Arc<SiteDataset>,
    period: Period,
    period_options: Vec<PeriodOption>,
    reports: Reports,
}

pub struct Viewer<S> {
    source: S,
    sites: Vec<String>,
    selection: Option<Selection>,
    page: Option<ReportName>,
    fragment: String,
    header_visible: bool,
}

impl<S: DataSource> Viewer<S> {
    /// A viewer with nothing selected. No data is loaded until
    /// [`Viewer::restore`] or [`Viewer::select_site`] is called.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            sites: Vec::new(),
            selection: None,
            page: None,
            fragment: String::new(),
            header_visible: false,
        }
    }

    /// Seed the selection from a bookmarked fragment such as
    /// `#site=example.com&period=201203&page=top10`.
    ///
    /// Missing parts default to the first listed site, its latest period
    /// and the overview page. An unknown page name falls back to the
    /// overview.
    pub fn restore(&mut self, fragment: &str) -> Result<Transition, ViewerError> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let qs = QueryString::parse(fragment);

        self.sites = self.source.sites()?;
        let site = match qs.get("site").filter(|s| !s.is_empty()) {
            Some(site) => site.to_string(),
            None => self.sites.first().cloned().ok_or(ViewerError::NoSites)?,
        };
        let period = qs.get("period").filter(|p| !p.is_empty());
        let transition = self.select_site(&site, period)?;

        let page = qs.get("page").map_or_else(ReportName::default, |name| {
            name.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring page from fragment");
                ReportName::default()
            })
        });
        self.show_page(page)?;
        Ok(transition)
    }

    /// Select a site and optionally a period, then recompute every report.
    ///
    /// Without a period, the site's most recent one is used. All loading and
    /// validation happens before anything is committed: on error the
    /// previous selection and reports are left untouched.
    pub fn select_site(
        &mut self,
        new_site: &str,
        new_period: Option<&str>,
    ) -> Result<Transition, ViewerError> {
        let current = self.selection.as_ref();
        let site_changed = current.map(|s| s.site.as_str()) != Some(new_site);
        let period_changed = current.map(|s| s.period.code()) != new_period;
        if !site_changed && !period_changed {
            return Ok(Transition::Unchanged);
        }

        let dataset = match current {
            Some(selection) if !site_changed => Arc::clone(&selection.dataset),
            _ => self.source.site(new_site)?,
        };

        let code = match new_period {
            Some(code) => code,
            None => dataset
                .latest_period()
                .ok_or_else(|| ViewerError::NoPeriods {
                    site: new_site.to_string(),
                })?,
        };
        let period = Period::parse(code)?;
        if !dataset.has_period(code) {
            return Err(ViewerError::UnknownPeriod {
                site: new_site.to_string(),
                period: code.to_string(),
            });
        }

        let reports = Reports::build(&dataset, &period);
        let first_load = self.selection.is_none();
        tracing::info!(site = new_site, period = %period, "Selection changed");

        self.selection = Some(Selection {
            site: new_site.to_string(),
            period_options: period_options(&dataset),
            dataset,
            period,
            reports,
        });
        if first_load {
            self.header_visible = true;
        }
        self.update_hash();

        Ok(if first_load {
            Transition::FirstLoad
        } else {
            Transition::Updated
        })
    }

    /// Switch to another period of the current site.
    pub fn select_period(&mut self, new_period: &str) -> Result<Transition, ViewerError> {
        let selection = self.selection.as_ref().ok_or(ViewerError::NoSiteSelected)?;
        if selection.period.code() == new_period {
            return Ok(Transition::Unchanged);
        }
        let site = selection.site.clone();
        self.select_site(&site, Some(new_period))
    }

    /// Make `new_page` the active tab. Returns `false` if it already was.
    ///
    /// Pages belong to a selection: with no site selected nothing changes.
    pub fn show_page(&mut self, new_page: ReportName) -> Result<bool, ViewerError> {
        if self.selection.is_none() {
            return Err(ViewerError::NoSiteSelected);
        }
        if self.page == Some(new_page) {
            return Ok(false);
        }
        tracing::debug!(from = ?self.page, to = %new_page, "Showing page");
        self.page = Some(new_page);
        self.update_hash();
        Ok(true)
    }

    /// Rewrite the bookmarkable fragment from the current selection.
    pub fn update_hash(&mut self) -> &str {
        let mut qs = QueryString::new();
        qs.insert("site", self.site().map(str::to_string));
        qs.insert("period", self.period().map(|p| p.code().to_string()));
        qs.insert("page", self.page.map(|p| p.as_str().to_string()));
        self.fragment = qs.serialize();
        &self.fragment
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn site(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.site.as_str())
    }

    pub fn period(&self) -> Option<&Period> {
        self.selection.as_ref().map(|s| &s.period)
    }

    pub const fn page(&self) -> Option<ReportName> {
        self.page
    }

    /// Base URL of the selected site.
    pub fn url(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.dataset.url.as_str())
    }

    pub fn reports(&self) -> Option<&Reports> {
        self.selection.as_ref().map(|s| &s.reports)
    }

    pub fn period_options(&self) -> &[PeriodOption] {
        self.selection
            .as_ref()
            .map(|s| s.period_options.as_slice())
            .unwrap_or_default()
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub const fn header_visible(&self) -> bool {
        self.header_visible
    }

    /// View model of the current selection, or `None` before the first
    /// successful selection.
    pub fn snapshot(&self) -> Option<ViewSnapshot> {
        let selection = self.selection.as_ref()?;
        let nav = ReportName::ALL
            .into_iter()
            .map(|page| NavEntry {
                page,
                title: page.title(),
                current: self.page == Some(page),
            })
            .collect();
        Some(ViewSnapshot {
            sites: self.sites.clone(),
            site: selection.site.clone(),
            url: selection.dataset.url.clone(),
            period: selection.period.clone(),
            period_label: selection.period.label(),
            mode: selection.period.mode(),
            periods: selection.period_options.clone(),
            page: self.page,
            nav,
            header_visible: self.header_visible,
            fragment: self.fragment.clone(),
            reports: selection.reports.clone(),
        })
    }
}
