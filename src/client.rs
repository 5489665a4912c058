use std::path::Path;

use chrono::Local;

use crate::artifact::{ArtifactPipeline, Row};
use crate::config::{ClientConfig, Endpoints};
use crate::error::{Error, Result};
use crate::reports::inference::StateInference;
use crate::reports::types::{AppDescriptor, AppScope, ReportDescriptor, ReportRequest};
use crate::reports::ReportLifecycle;
use crate::session::tokens::SessionTokens;
use crate::session::Session;
use crate::transport::{HttpTransport, Transport};

/// Everything a caller needs in one place: login, report lifecycle and
/// archive retrieval over a single session.
///
/// Operations other than `login` and `set_login_tokens` need a session and
/// fail with [`Error::NotAuthenticated`] before sending anything otherwise.
pub struct StatsClient {
    session: Session,
    lifecycle: ReportLifecycle,
    artifacts: ArtifactPipeline,
}

impl StatsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Box::new(transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Box<dyn Transport>) -> Result<Self> {
        let endpoints = Endpoints::from_config(&config)?;
        Ok(Self {
            session: Session::new(transport, endpoints),
            lifecycle: ReportLifecycle::new(config.templates),
            artifacts: ArtifactPipeline::new(config.scratch_dir),
        })
    }

    /// Replace the default text-matching state classifier.
    pub fn with_inference(mut self, inference: Box<dyn StateInference>) -> Self {
        self.lifecycle = self.lifecycle.with_inference(inference);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // -- Session --------------------------------------------------------------

    pub fn login(&mut self, username: &str, password: &str) -> Result<Option<SessionTokens>> {
        self.session.login(username, password)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.logout()
    }

    pub fn set_login_tokens(&mut self, tokens: SessionTokens) {
        self.session.set_login_tokens(tokens);
    }

    pub fn login_tokens(&self) -> Option<&SessionTokens> {
        self.session.tokens()
    }

    // -- Reports --------------------------------------------------------------

    pub fn schedule_report(&mut self, request: &ReportRequest) -> Result<()> {
        self.lifecycle.schedule(&mut self.session, request)
    }

    pub fn reports(&mut self) -> Result<Vec<ReportDescriptor>> {
        self.lifecycle.list(&mut self.session)
    }

    pub fn report_state(&mut self, request: &ReportRequest) -> Result<ReportDescriptor> {
        self.lifecycle.state(&mut self.session, request)
    }

    /// File name the portal should give the report for `request` today.
    pub fn expected_file_name(&self, request: &ReportRequest) -> Result<String> {
        self.lifecycle
            .expected_file_name(request, Local::now().date_naive())
    }

    pub fn download_report(
        &mut self,
        report: &ReportDescriptor,
        destination: Option<&Path>,
        parse_rows: bool,
    ) -> Result<Option<Vec<Row>>> {
        self.artifacts
            .download(&mut self.session, report, destination, parse_rows)
    }

    pub fn delete_report(&mut self, report: &ReportDescriptor) -> Result<()> {
        self.lifecycle.delete(&mut self.session, report)
    }

    pub fn delete_all_reports(&mut self) -> Result<()> {
        self.lifecycle.delete_all(&mut self.session)
    }

    pub fn apps(&mut self) -> Result<Vec<AppDescriptor>> {
        self.lifecycle.apps(&mut self.session)
    }

    /// Resolve `all`, an app id or an app link name to a report scope.
    /// Anything but `all` needs a session to look the app up.
    pub fn resolve_app(&mut self, app: &str) -> Result<AppScope> {
        if app.eq_ignore_ascii_case("all") {
            return Ok(AppScope::All);
        }
        self.apps()?
            .into_iter()
            .find(|a| a.app_id == app || a.link_name.eq_ignore_ascii_case(app))
            .map(AppScope::App)
            .ok_or_else(|| Error::UnknownApp(app.to_string()))
    }
}
