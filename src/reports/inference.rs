use regex::Regex;
use tracing::debug;

use super::types::ReportState;

/// Decides how far along a report is, given the finished-reports listing.
///
/// The portal has no job-status endpoint; implementations only ever look at
/// the listing page.
pub trait StateInference {
    fn classify(&self, listing: &str, file_name: &str) -> ReportState;
}

/// Text matching against the listing page.
///
/// A download anchor carrying the exact file name means the archive is
/// ready. The bare stem showing up anywhere else (case-insensitively) is
/// taken as "still processing".
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicInference;

impl StateInference for HeuristicInference {
    fn classify(&self, listing: &str, file_name: &str) -> ReportState {
        let pattern = format!(
            r#"/isvportal/reports/downloadData\.do.+?&fileName={}""#,
            regex::escape(file_name)
        );
        let ready = match Regex::new(&pattern) {
            Ok(re) => re.is_match(listing),
            Err(e) => {
                debug!(error = %e, "download anchor pattern rejected");
                false
            }
        };
        if ready {
            return ReportState::Ready;
        }

        let stem = file_name.replace(".zip", "").to_lowercase();
        if !stem.is_empty() && listing.to_lowercase().contains(&stem) {
            ReportState::Processing
        } else {
            ReportState::Unknown
        }
    }
}
