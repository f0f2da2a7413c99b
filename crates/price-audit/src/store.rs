use std::fs;
use std::path::PathBuf;

use chrono::DateTime;
use chrono_tz::Tz;
use price_audit_common::{now_in_report_timezone, ReportError, ValidationReport};
use serde::Serialize;
use tracing::info;

const REPORT_FILE_PREFIX: &str = "api_validation_report";

/// Writes validation reports as JSON files into a directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Saves the report under a filename stamped with the current time.
    pub fn save(&self, report: &ValidationReport) -> Result<PathBuf, ReportError> {
        self.save_at(report, &now_in_report_timezone())
    }

    pub fn save_at(
        &self,
        report: &ValidationReport,
        at: &DateTime<Tz>,
    ) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ReportError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(report_file_name(at));
        fs::write(&path, to_pretty_json(report)?).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Report saved to {}", path.display());
        Ok(path)
    }
}

/// `api_validation_report_YYYYMMDD_HHMMSS.json`
pub fn report_file_name(at: &DateTime<Tz>) -> String {
    format!("{}_{}.json", REPORT_FILE_PREFIX, at.format("%Y%m%d_%H%M%S"))
}

fn to_pretty_json(report: &ValidationReport) -> Result<Vec<u8>, ReportError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    report.serialize(&mut serializer)?;
    Ok(buf)
}
