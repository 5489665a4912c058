use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use bbstats::{ReportDate, ReportDescriptor, ReportRequest, ReportType, StatsClient};

use crate::storage::{SavedSession, SessionStore};

pub fn cmd_login(username: Option<&str>, password: &str) -> Result<()> {
    let store = SessionStore::new()?;
    let mut config = store.load_config()?;

    let username = match username {
        Some(u) => u.to_string(),
        None => config
            .default_username
            .clone()
            .context("No username given and no default_username in config.toml")?,
    };

    let mut client = StatsClient::new(config.client.clone())?;
    eprintln!("Logging in as {}...", username);

    let tokens = client
        .login(&username, password)?
        .context("Login failed: the portal did not issue a session (check username and password)")?;

    store.save_session(&SavedSession::new(username.as_str(), tokens))?;

    if config.default_username.is_none() {
        config.default_username = Some(username.clone());
        store.save_config(&config)?;
    }

    eprintln!("Logged in as {}.", username);
    Ok(())
}

pub fn cmd_logout() -> Result<()> {
    let store = SessionStore::new()?;
    let Some(mut client) = resume(&store)? else {
        eprintln!("Not logged in.");
        return Ok(());
    };

    let result = client.logout();
    store.clear_session()?;
    result.context("Portal logout failed (local session removed anyway)")?;

    eprintln!("Logged out.");
    Ok(())
}

pub fn cmd_apps() -> Result<()> {
    let mut client = authenticated_client()?;
    print_json(&client.apps()?)
}

pub fn cmd_reports() -> Result<()> {
    let mut client = authenticated_client()?;
    let reports = client.reports()?;
    if reports.is_empty() {
        eprintln!("No finished reports.");
    }
    print_json(&reports)
}

pub fn cmd_schedule(app: &str, report_type: &str, start: &str, end: &str) -> Result<()> {
    let mut client = authenticated_client()?;
    let request = report_request(&mut client, app, report_type, start, end)?;

    client.schedule_report(&request)?;

    eprintln!(
        "Scheduled. Poll with `bbstats state {} {} --start {} --end {}`.",
        app, request.report_type, start, end
    );
    println!("{}", client.expected_file_name(&request)?);
    Ok(())
}

pub fn cmd_state(app: &str, report_type: &str, start: &str, end: &str) -> Result<()> {
    let mut client = authenticated_client()?;
    let request = report_request(&mut client, app, report_type, start, end)?;
    print_json(&client.report_state(&request)?)
}

pub fn cmd_download(file_name: &str, output: Option<&Path>, rows: bool) -> Result<()> {
    let mut client = authenticated_client()?;
    let report = find_report(&mut client, file_name)?;

    // Without --rows the CSV is the only result, so keep it somewhere.
    let default_output;
    let output = match output {
        Some(path) => Some(path),
        None if !rows => {
            default_output = PathBuf::from(format!("{}.csv", report.stem()));
            Some(default_output.as_path())
        }
        None => None,
    };

    let parsed = client.download_report(&report, output, rows)?;

    if let Some(path) = output {
        eprintln!("Saved {}", path.display());
    }
    if let Some(parsed) = parsed {
        print_json(&parsed)?;
    }
    Ok(())
}

pub fn cmd_delete(file_name: &str) -> Result<()> {
    let mut client = authenticated_client()?;
    let report = find_report(&mut client, file_name)?;
    client.delete_report(&report)?;
    eprintln!("Deleted {}", report.file_name);
    Ok(())
}

pub fn cmd_delete_all() -> Result<()> {
    let mut client = authenticated_client()?;
    client.delete_all_reports()?;
    eprintln!("Deleted all reports.");
    Ok(())
}

// -- Helpers ------------------------------------------------------------------

/// Client seeded with the saved session, if there is one.
fn resume(store: &SessionStore) -> Result<Option<StatsClient>> {
    let Some(saved) = store.load_session()? else {
        return Ok(None);
    };
    let config = store.load_config()?;

    let mut client = StatsClient::new(config.client)?;
    client.set_login_tokens(saved.tokens);
    Ok(Some(client))
}

fn authenticated_client() -> Result<StatsClient> {
    let store = SessionStore::new()?;
    resume(&store)?.context("Not logged in. Run `bbstats login` first.")
}

fn report_request(
    client: &mut StatsClient,
    app: &str,
    report_type: &str,
    start: &str,
    end: &str,
) -> Result<ReportRequest> {
    let report_type: ReportType = report_type.parse()?;
    let start: ReportDate = start.parse()?;
    let end: ReportDate = end.parse()?;
    let scope = client.resolve_app(app)?;
    Ok(ReportRequest::new(scope, report_type).with_range(start, end))
}

fn find_report(client: &mut StatsClient, file_name: &str) -> Result<ReportDescriptor> {
    client
        .reports()?
        .into_iter()
        .find(|r| r.file_name == file_name)
        .with_context(|| format!("No finished report named '{}'", file_name))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
