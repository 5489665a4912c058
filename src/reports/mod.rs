pub mod inference;
pub mod naming;
pub mod types;

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Endpoints;
use crate::error::Result;
use crate::session::tokens::SessionTokens;
use crate::session::Session;
use crate::transport::PortalRequest;

use inference::{HeuristicInference, StateInference};
use naming::NamingTemplates;
use types::{AppDescriptor, ReportDescriptor, ReportRequest, ReportState};

static DOWNLOAD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"/isvportal/reports/downloadData\.do.+?&fileName=([^"]*)"#).unwrap()
});

const SCHEDULE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Schedule, list, poll and delete reports on an authenticated session.
pub struct ReportLifecycle {
    templates: NamingTemplates,
    inference: Box<dyn StateInference>,
}

impl ReportLifecycle {
    pub fn new(templates: NamingTemplates) -> Self {
        Self {
            templates,
            inference: Box::new(HeuristicInference),
        }
    }

    pub fn with_inference(mut self, inference: Box<dyn StateInference>) -> Self {
        self.inference = inference;
        self
    }

    /// Name the portal is expected to give the archive for `request`, with
    /// relative dates resolved against `today`.
    pub fn expected_file_name(&self, request: &ReportRequest, today: NaiveDate) -> Result<String> {
        let (start, end) = request.resolve_range(today)?;
        Ok(self
            .templates
            .file_name(request.app.link_name(), request.report_type, start, end))
    }

    /// Ask the portal to generate a report. It shows up in the listing only
    /// once it has finished processing.
    pub fn schedule(&self, session: &mut Session, request: &ReportRequest) -> Result<()> {
        let tokens = session.require_tokens("schedule_report")?;
        let (start, end) = request.resolve_range(today())?;
        let endpoints = session.endpoints();

        let form = PortalRequest::post(endpoints.schedule())
            .referer(endpoints.schedule_page(&tokens.csrf_token))
            .field("csrfToken", tokens.csrf_token.as_str())
            .field("selectedReportType", request.report_type.code().to_string())
            .field("selectedSubType", "0")
            .field("selectedContent", request.app.content_id())
            .field("selectedVG", "")
            .field("selectedPeriod", "1")
            .field("selectedSortOption", "0")
            .field("startDate", start.format(SCHEDULE_DATE_FORMAT).to_string())
            .field("endDate", end.format(SCHEDULE_DATE_FORMAT).to_string());
        session.send(form)?;

        info!(
            report_type = %request.report_type,
            app = request.app.link_name(),
            %start,
            %end,
            "report scheduled"
        );
        Ok(())
    }

    /// Finished reports, in the order the portal lists them.
    pub fn list(&self, session: &mut Session) -> Result<Vec<ReportDescriptor>> {
        let tokens = session.require_tokens("list_reports")?;
        let listing = fetch_listing(session, &tokens)?;
        let reports = parse_listing(&listing, session.endpoints(), &tokens.csrf_token);
        debug!(count = reports.len(), "reports listed");
        Ok(reports)
    }

    /// Best-effort state of the report `request` would produce. The
    /// descriptor's links are built from the expected file name whether or
    /// not the portal knows about it.
    pub fn state(&self, session: &mut Session, request: &ReportRequest) -> Result<ReportDescriptor> {
        let tokens = session.require_tokens("report_state")?;
        let file_name = self.expected_file_name(request, today())?;
        let listing = fetch_listing(session, &tokens)?;

        let state = self.inference.classify(&listing, &file_name);
        debug!(file_name = %file_name, ?state, "report state inferred");

        let endpoints = session.endpoints();
        Ok(ReportDescriptor {
            download_link: endpoints.download(&tokens.csrf_token, &file_name),
            delete_link: endpoints.delete(&tokens.csrf_token, &file_name),
            file_name,
            state,
        })
    }

    pub fn delete(&self, session: &mut Session, report: &ReportDescriptor) -> Result<()> {
        let tokens = session.require_tokens("delete_report")?;
        let request = PortalRequest::get(report.delete_link.as_str())
            .referer(session.endpoints().reports_home(&tokens.csrf_token));
        session.send(request)?;

        info!(file_name = %report.file_name, "report deleted");
        Ok(())
    }

    pub fn delete_all(&self, session: &mut Session) -> Result<()> {
        let tokens = session.require_tokens("delete_all_reports")?;
        let endpoints = session.endpoints();
        let request = PortalRequest::get(endpoints.delete_all())
            .query("csrfToken", tokens.csrf_token.as_str())
            .referer(endpoints.reports_home(&tokens.csrf_token));
        session.send(request)?;

        info!("all reports deleted");
        Ok(())
    }

    /// Apps of the signed-in vendor, without the portal's "All apps" entry.
    pub fn apps(&self, session: &mut Session) -> Result<Vec<AppDescriptor>> {
        let tokens = session.require_tokens("list_apps")?;
        let endpoints = session.endpoints();

        let request = PortalRequest::post(endpoints.products())
            .referer(endpoints.schedule_page(&tokens.csrf_token))
            .field("csrfToken", tokens.csrf_token.as_str())
            .field("selectedReportType", "1")
            .field("selectedSubType", "0")
            .field("selectedContent", "0")
            .field("selectedVG", "")
            .field("selectedPeriod", "1")
            .field("startDate", "")
            .field("endDate", "");
        let products: ProductsResponse = session.send(request)?.json()?;

        let apps: Vec<AppDescriptor> = products
            .contents
            .into_iter()
            .skip(1)
            .map(|product| AppDescriptor::new(product.name, id_to_string(product.id)))
            .collect();
        debug!(count = apps.len(), "apps listed");
        Ok(apps)
    }
}

impl Default for ReportLifecycle {
    fn default() -> Self {
        Self::new(NamingTemplates::default())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn fetch_listing(session: &mut Session, tokens: &SessionTokens) -> Result<String> {
    let endpoints = session.endpoints();
    let request = PortalRequest::post(endpoints.download_list())
        .referer(endpoints.reports_home(&tokens.csrf_token))
        .field("csrfToken", tokens.csrf_token.as_str());
    Ok(session.send(request)?.text())
}

/// Every download anchor in a listing page, in document order.
pub fn parse_listing(body: &str, endpoints: &Endpoints, csrf_token: &str) -> Vec<ReportDescriptor> {
    DOWNLOAD_LINK_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let link = caps.get(0)?.as_str();
            let file_name = caps.get(1)?.as_str().to_string();
            Some(ReportDescriptor {
                download_link: endpoints.portal_url(link),
                delete_link: endpoints.delete(csrf_token, &file_name),
                file_name,
                state: ReportState::Ready,
            })
        })
        .collect()
}

#[derive(Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    contents: Vec<Product>,
}

#[derive(Deserialize)]
struct Product {
    name: String,
    #[serde(default)]
    id: Value,
}

fn id_to_string(id: Value) -> String {
    match id {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
