//! Predicting the archive name the portal will give a scheduled report.
//!
//! The portal never returns an id for a scheduled report, so the only way to
//! find it again is to guess its file name. Templates are configurable; the
//! subscriptions one has never been checked against a real report.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::ReportType;

pub const ALL_APPS_LINK_NAME: &str = "All_Applications";

static NON_ALPHANUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 ]").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());

/// File name templates per report type. `{app}`, `{start}` and `{end}` are
/// replaced by the app link name and the range bounds (`dd_Mon_yyyy`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingTemplates {
    pub downloads: String,
    pub downloads_summary: String,
    pub purchases: String,
    pub subscriptions: String,
    pub reviews: String,
}

impl Default for NamingTemplates {
    fn default() -> Self {
        Self {
            downloads: "{app}_Downloads_for_{start}_to_{end}_by_date.zip".into(),
            downloads_summary: "{app}_DownloadSummary_{start}_to_{end}_by_date.zip".into(),
            purchases: "{app}_Purchase_for_{start}_to_{end}_by_date.zip".into(),
            // TODO: verify against a real subscriptions report archive
            subscriptions: "{app}_Subscriptions_for_{start}_to_{end}_by_day.zip".into(),
            reviews: "{app}_Reviews_{start}_to_{end}_by_date.zip".into(),
        }
    }
}

impl NamingTemplates {
    pub fn template(&self, report_type: ReportType) -> &str {
        match report_type {
            ReportType::Downloads => &self.downloads,
            ReportType::DownloadsSummary => &self.downloads_summary,
            ReportType::Purchases => &self.purchases,
            ReportType::Subscriptions => &self.subscriptions,
            ReportType::Reviews => &self.reviews,
        }
    }

    pub fn file_name(
        &self,
        app_link_name: &str,
        report_type: ReportType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> String {
        self.template(report_type)
            .replace("{start}", &file_date(start))
            .replace("{end}", &file_date(end))
            .replace("{app}", app_link_name)
    }
}

/// `2015-05-11` -> `11_May_2015`
pub fn file_date(date: NaiveDate) -> String {
    date.format("%d_%b_%Y").to_string()
}

/// Guess the portal's link name for an app: drop everything but ASCII
/// letters, digits and spaces, then turn runs of spaces into `_`.
pub fn derive_link_name(name: &str) -> String {
    let stripped = NON_ALPHANUMERIC_RE.replace_all(name, "");
    SPACES_RE.replace_all(&stripped, "_").into_owned()
}
