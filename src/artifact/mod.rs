pub mod rows;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::reports::types::ReportDescriptor;
use crate::session::Session;
use crate::transport::PortalRequest;

pub use rows::{read_rows, read_rows_from, Row};

/// Downloads finished report archives and unpacks their CSV.
///
/// Only one download may run per scratch directory at a time; the scratch
/// paths are derived from the report file name alone.
#[derive(Debug, Clone)]
pub struct ArtifactPipeline {
    scratch_dir: PathBuf,
}

impl ArtifactPipeline {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Fetch `report`, extract its CSV and optionally parse it.
    ///
    /// With `destination` the CSV is moved there and kept. Without it the CSV
    /// only lives long enough to be parsed. Nothing is left in the scratch
    /// directory afterwards, on success or failure.
    pub fn download(
        &self,
        session: &mut Session,
        report: &ReportDescriptor,
        destination: Option<&Path>,
        parse_rows: bool,
    ) -> Result<Option<Vec<Row>>> {
        let tokens = session.require_tokens("download_report")?;

        let scratch = ScratchFiles::new(&self.scratch_dir, &report.file_name)?;
        fs::create_dir_all(&self.scratch_dir)?;

        let request = PortalRequest::get(report.download_link.as_str())
            .referer(session.endpoints().reports_home(&tokens.csrf_token));
        let response = session.send(request)?;

        fs::write(&scratch.zip, &response.body)?;
        debug!(path = %scratch.zip.display(), bytes = response.body.len(), "archive saved");

        fs::create_dir_all(&scratch.dir)?;
        extract_csv(&scratch.zip, &scratch.csv, &report.file_name)?;
        fs::remove_file(&scratch.zip)?;

        let csv_path = match destination {
            Some(dest) => {
                move_file(&scratch.csv, dest)?;
                dest.to_path_buf()
            }
            None => scratch.csv.clone(),
        };

        let rows = if parse_rows {
            Some(read_rows(&csv_path)?)
        } else {
            None
        };

        info!(
            file_name = %report.file_name,
            destination = ?destination,
            rows = rows.as_ref().map(Vec::len),
            "report downloaded"
        );
        Ok(rows)
    }
}

/// Scratch paths for one report. Dropping removes whatever still exists.
struct ScratchFiles {
    root: PathBuf,
    zip: PathBuf,
    dir: PathBuf,
    csv: PathBuf,
}

impl ScratchFiles {
    /// Separators are flattened. Names whose stem is empty or only dots
    /// would resolve to the scratch directory or its parent and are refused.
    fn new(scratch_dir: &Path, file_name: &str) -> Result<Self> {
        let flat = file_name.replace(['/', '\\'], "_");
        let stem = flat.strip_suffix(".zip").unwrap_or(&flat);
        if stem.trim_start_matches('.').is_empty() {
            return Err(Error::InvalidFileName(file_name.to_string()));
        }

        let dir = scratch_dir.join(stem);
        Ok(Self {
            root: scratch_dir.to_path_buf(),
            zip: scratch_dir.join(&flat),
            csv: dir.join(format!("{}.csv", stem)),
            dir,
        })
    }

    fn is_direct_child(&self, path: &Path) -> bool {
        path.file_name().is_some() && path.parent() == Some(self.root.as_path())
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        if self.is_direct_child(&self.zip) {
            let _ = fs::remove_file(&self.zip);
        }
        if self.is_direct_child(&self.dir) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }
}

/// Copy the archive's CSV entry to `target`. Reports carry exactly one.
fn extract_csv(archive_path: &Path, target: &Path, file_name: &str) -> Result<()> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;

    let index = (0..archive.len()).find(|&i| {
        archive
            .by_index(i)
            .map(|entry| entry.is_file() && entry.name().to_ascii_lowercase().ends_with(".csv"))
            .unwrap_or(false)
    });
    let Some(index) = index else {
        return Err(Error::MissingCsv(file_name.to_string()));
    };

    let mut entry = archive.by_index(index)?;
    let mut out = File::create(target)?;
    io::copy(&mut entry, &mut out)?;
    debug!(entry = entry.name(), path = %target.display(), "csv extracted");
    Ok(())
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}
