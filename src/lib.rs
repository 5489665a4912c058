//! Scripted access to the BlackBerry World vendor portal.
//!
//! The portal has no API. [`StatsClient`] logs in by replaying the browser's
//! OpenID handshake, then schedules, polls, downloads and deletes sales and
//! download reports by scraping the portal's pages.

pub mod artifact;
pub mod client;
pub mod config;
pub mod error;
pub mod reports;
pub mod session;
pub mod transport;

pub use artifact::Row;
pub use client::StatsClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use reports::types::{
    AppDescriptor, AppScope, ReportDate, ReportDescriptor, ReportRequest, ReportState, ReportType,
};
pub use session::tokens::SessionTokens;
