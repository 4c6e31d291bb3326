//! Persistence of generated reports.
//!
//! Supports writing the rendered text report and appending per-station
//! statistics as CSV rows.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StationsError;
use crate::report::{BlockOutcome, Report};
use csv::WriterBuilder;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// One CSV row per station block.
#[derive(Debug, Serialize)]
pub struct StatsRecord<'a> {
    pub region_code: &'a str,
    pub station_id: u64,
    pub ps_number: u32,
    pub hotline: Option<&'a str>,
    pub opens_at_hour: Option<u8>,
    pub closes_at_hour: Option<u8>,
    pub total_attendance: u64,
    pub days_count: u32,
    pub max_load_hour: u8,
    pub max_load_hour_attendance: u64,
    pub min_load_hour: u8,
    pub min_load_hour_attendance: u64,
    pub avg_load_by_hour: u64,
    pub note: Option<&'a str>,
}

impl Report {
    /// Flattens the report into CSV rows, keeping section order.
    pub fn records(&self) -> Vec<StatsRecord<'_>> {
        let mut rows = Vec::with_capacity(self.station_count());
        for section in &self.sections {
            for block in &section.stations {
                let row = match &block.outcome {
                    BlockOutcome::Computed {
                        hotline,
                        opens_at_hour,
                        closes_at_hour,
                        stats,
                        note,
                    } => StatsRecord {
                        region_code: &section.region_code,
                        station_id: block.station_id,
                        ps_number: block.ps_number,
                        hotline: hotline.as_deref(),
                        opens_at_hour: Some(*opens_at_hour),
                        closes_at_hour: Some(*closes_at_hour),
                        total_attendance: stats.total_attendance,
                        days_count: stats.days_count,
                        max_load_hour: stats.max_load_hour,
                        max_load_hour_attendance: stats.max_load_hour_attendance,
                        min_load_hour: stats.min_load_hour,
                        min_load_hour_attendance: stats.min_load_hour_attendance,
                        avg_load_by_hour: stats.avg_load_by_hour,
                        note: note.as_deref(),
                    },
                    BlockOutcome::Unavailable { reason } => StatsRecord {
                        region_code: &section.region_code,
                        station_id: block.station_id,
                        ps_number: block.ps_number,
                        hotline: None,
                        opens_at_hour: None,
                        closes_at_hour: None,
                        total_attendance: 0,
                        days_count: 0,
                        max_load_hour: 0,
                        max_load_hour_attendance: 0,
                        min_load_hour: 0,
                        min_load_hour_attendance: 0,
                        avg_load_by_hour: 0,
                        note: Some(reason),
                    },
                };
                rows.push(row);
            }
        }
        rows
    }
}

/// Writes `content` to `path`, creating missing parent directories.
///
/// Overwrites an existing file. A failed write is reported as-is and is not
/// retried.
pub fn write_report(path: &Path, content: &str) -> Result<(), StationsError> {
    let io_err = |source| StationsError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, content).map_err(io_err)?;

    info!(path = %path.display(), bytes = content.len(), "Report written");
    Ok(())
}

/// Appends one CSV row per station in `report` to the file at `path`.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &Path, report: &Report) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in report.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
