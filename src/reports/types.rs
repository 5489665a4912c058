use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::naming::{derive_link_name, ALL_APPS_LINK_NAME};

/// Report kinds the portal can generate. The discriminant is the portal's
/// `selectedReportType` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    Downloads = 1,
    DownloadsSummary = 2,
    Purchases = 3,
    Subscriptions = 4,
    Reviews = 5,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Downloads,
        ReportType::DownloadsSummary,
        ReportType::Purchases,
        ReportType::Subscriptions,
        ReportType::Reviews,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            ReportType::Downloads => "downloads",
            ReportType::DownloadsSummary => "downloads-summary",
            ReportType::Purchases => "purchases",
            ReportType::Subscriptions => "subscriptions",
            ReportType::Reviews => "reviews",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ReportType::ALL
            .into_iter()
            .find(|ty| ty.name() == normalized || ty.code().to_string() == normalized)
            .ok_or_else(|| Error::UnknownReportType(s.to_string()))
    }
}

/// Best-effort job state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportState {
    Unknown,
    Processing,
    Ready,
}

/// A report range bound: days relative to today, or a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDate {
    Offset(i64),
    Date(NaiveDate),
}

impl ReportDate {
    pub const DEFAULT_START: ReportDate = ReportDate::Offset(-14);
    pub const DEFAULT_END: ReportDate = ReportDate::Offset(0);

    /// Fails with [`Error::DateOutOfRange`] when an offset leaves chrono's
    /// calendar.
    pub fn resolve(self, today: NaiveDate) -> Result<NaiveDate> {
        match self {
            ReportDate::Offset(days) => Duration::try_days(days)
                .and_then(|delta| today.checked_add_signed(delta))
                .ok_or(Error::DateOutOfRange(days)),
            ReportDate::Date(date) => Ok(date),
        }
    }
}

impl FromStr for ReportDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(days) = s.parse::<i64>() {
            return Ok(ReportDate::Offset(days));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(ReportDate::Date)
            .map_err(|_| Error::InvalidDate(s.to_string()))
    }
}

impl From<NaiveDate> for ReportDate {
    fn from(date: NaiveDate) -> Self {
        ReportDate::Date(date)
    }
}

/// An app as listed by the portal's product picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    pub name: String,
    /// Guess at how the portal spells the app in report file names. Prefer
    /// `app_id` wherever the portal accepts it.
    pub link_name: String,
    pub app_id: String,
}

impl AppDescriptor {
    pub fn new(name: impl Into<String>, app_id: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            link_name: derive_link_name(&name),
            name,
            app_id: app_id.into(),
        }
    }
}

/// Which apps a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppScope {
    All,
    App(AppDescriptor),
}

impl AppScope {
    pub fn link_name(&self) -> &str {
        match self {
            AppScope::All => ALL_APPS_LINK_NAME,
            AppScope::App(app) => &app.link_name,
        }
    }

    /// Value of the schedule form's `selectedContent`; empty for all apps.
    pub fn content_id(&self) -> &str {
        match self {
            AppScope::All => "",
            AppScope::App(app) => &app.app_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub app: AppScope,
    pub report_type: ReportType,
    pub start: ReportDate,
    pub end: ReportDate,
}

impl ReportRequest {
    /// Request covering the last two weeks up to today.
    pub fn new(app: AppScope, report_type: ReportType) -> Self {
        Self {
            app,
            report_type,
            start: ReportDate::DEFAULT_START,
            end: ReportDate::DEFAULT_END,
        }
    }

    pub fn with_range(mut self, start: impl Into<ReportDate>, end: impl Into<ReportDate>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }

    pub fn resolve_range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        Ok((self.start.resolve(today)?, self.end.resolve(today)?))
    }
}

/// Metadata and links of one report archive. The portal is the only source
/// of truth; a descriptor may describe a report that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDescriptor {
    pub file_name: String,
    pub download_link: String,
    pub delete_link: String,
    pub state: ReportState,
}

impl ReportDescriptor {
    /// File name without the `.zip` extension.
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(".zip")
            .unwrap_or(&self.file_name)
    }
}
