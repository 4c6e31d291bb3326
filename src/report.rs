//! Attendance report assembly and text rendering.
//!
//! Detail fetches fan out on the runtime, bounded by a semaphore, and are
//! gathered back in selection order. A station whose detail cannot be fetched
//! or summarised still gets a block, so one bad station never costs the
//! operator the rest of the report.

use chrono::NaiveDate;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{DirectoryError, Result, StationsError};
use crate::model::{StationBrief, StationDetail};
use crate::output::write_report;
use crate::selector::{FilterArgs, FilterSpec, ResolvedStation, Selection, StationSelector};
use crate::services::{StationDirectory, StationLookup};
use crate::stats::AttendanceStats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Computed {
        hotline: Option<String>,
        opens_at_hour: u8,
        closes_at_hour: u8,
        stats: AttendanceStats,
        /// Set when the stats were zeroed instead of computed.
        note: Option<String>,
    },
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationBlock {
    pub station_id: u64,
    pub ps_number: u32,
    pub outcome: BlockOutcome,
}

impl StationBlock {
    /// Summarises a fetched (or failed) detail record.
    pub fn from_detail(
        brief: &StationBrief,
        detail: std::result::Result<StationDetail, DirectoryError>,
    ) -> Self {
        let outcome = match detail {
            Err(e) => {
                warn!(station_id = brief.id, error = %e, "Station detail unavailable");
                BlockOutcome::Unavailable {
                    reason: StationsError::from(e).to_string(),
                }
            }
            Ok(detail) => {
                let samples = detail.samples();
                let (stats, note) =
                    match AttendanceStats::compute(samples, detail.opens_at_hour, detail.closes_at_hour) {
                        Ok(stats) if samples.is_empty() => {
                            warn!(ps_number = detail.ps_number, "No attendance data");
                            (
                                stats,
                                Some(format!("No attendance data for station {}", detail.ps_number)),
                            )
                        }
                        Ok(stats) => (stats, None),
                        Err(e) => {
                            warn!(ps_number = detail.ps_number, error = %e, "Attendance stats not computed");
                            (AttendanceStats::default(), Some(e.to_string()))
                        }
                    };

                BlockOutcome::Computed {
                    hotline: detail.hotline,
                    opens_at_hour: detail.opens_at_hour,
                    closes_at_hour: detail.closes_at_hour,
                    stats,
                    note,
                }
            }
        };

        Self {
            station_id: brief.id,
            ps_number: brief.ps_number,
            outcome,
        }
    }

    fn unavailable(brief: &StationBrief, reason: String) -> Self {
        Self {
            station_id: brief.id,
            ps_number: brief.ps_number,
            outcome: BlockOutcome::Unavailable { reason },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.outcome, BlockOutcome::Computed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSection {
    pub region_code: String,
    pub stations: Vec<StationBlock>,
}

/// Per-region sections in the order the directory returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub sections: Vec<RegionSection>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.stations.is_empty())
    }

    pub fn station_count(&self) -> usize {
        self.sections.iter().map(|s| s.stations.len()).sum()
    }

    pub fn unavailable_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.stations)
            .filter(|b| !b.is_available())
            .count()
    }
}

/// Fetches every selected station's detail for `date` and summarises it.
///
/// At most `concurrency` fetches are in flight at once. Stations that the
/// selector already fetched are not requested again.
#[tracing::instrument(skip(directory, selection), fields(stations = selection.station_count()))]
pub async fn build_report(
    directory: Arc<dyn StationDirectory>,
    selection: Selection,
    date: Option<NaiveDate>,
    concurrency: usize,
) -> Report {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut pending = Vec::with_capacity(selection.regions.len());
    for region in selection.regions {
        let mut tasks = Vec::with_capacity(region.stations.len());
        for station in region.stations {
            let brief = station.brief.clone();
            let span = tracing::info_span!(
                "station_block",
                station_id = brief.id,
                ps_number = brief.ps_number,
            );
            let task = tokio::spawn(
                fetch_block(Arc::clone(&directory), Arc::clone(&semaphore), station, date)
                    .instrument(span),
            );
            tasks.push((brief, task));
        }
        pending.push((region.code, tasks));
    }

    // Awaiting in spawn order keeps the selection order regardless of
    // which fetch finishes first.
    let mut sections = Vec::with_capacity(pending.len());
    for (region_code, tasks) in pending {
        let mut stations = Vec::with_capacity(tasks.len());
        for (brief, task) in tasks {
            let block = match task.await {
                Ok(block) => block,
                Err(e) => {
                    error!(station_id = brief.id, error = %e, "Station task failed");
                    StationBlock::unavailable(&brief, format!("station task failed: {e}"))
                }
            };
            stations.push(block);
        }
        sections.push(RegionSection {
            region_code,
            stations,
        });
    }

    let report = Report { sections };
    info!(
        sections = report.sections.len(),
        stations = report.station_count(),
        unavailable = report.unavailable_count(),
        "Report assembled"
    );
    report
}

/// Resolves `args`, builds the report and writes its text to `path`.
///
/// Returns `Ok(None)` without touching `path` when no station matched.
#[tracing::instrument(skip(directory, args, path), fields(path = %path.display()))]
pub async fn generate(
    directory: Arc<dyn StationDirectory>,
    args: &FilterArgs,
    date: Option<NaiveDate>,
    path: &Path,
    concurrency: usize,
) -> Result<Option<Report>> {
    let spec = FilterSpec::from_args(args)?;
    let selection = StationSelector::new(directory.as_ref())
        .resolve(&spec, date)
        .await?;

    if selection.is_empty() {
        return Ok(None);
    }

    let report = build_report(Arc::clone(&directory), selection, date, concurrency).await;
    write_report(path, &report.to_string())?;

    Ok(Some(report))
}

async fn fetch_block(
    directory: Arc<dyn StationDirectory>,
    semaphore: Arc<Semaphore>,
    station: ResolvedStation,
    date: Option<NaiveDate>,
) -> StationBlock {
    let ResolvedStation { brief, detail } = station;

    let detail = match detail {
        Some(detail) => Ok(detail),
        None => {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return StationBlock::unavailable(&brief, "fetch limiter closed".to_string());
            };
            debug!("Fetching station detail");
            directory
                .get_station_detail(&StationLookup::ById(brief.id), date)
                .await
        }
    };

    StationBlock::from_detail(&brief, detail)
}

impl fmt::Display for StationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Polling station {} basic information:", self.ps_number)?;
        match &self.outcome {
            BlockOutcome::Unavailable { reason } => {
                writeln!(f, "    Station details unavailable: {reason}")
            }
            BlockOutcome::Computed {
                hotline,
                opens_at_hour,
                closes_at_hour,
                stats,
                note,
            } => {
                writeln!(f, "    Hotline: {}", hotline.as_deref().unwrap_or("-"))?;
                writeln!(f, "    Opening hour: {opens_at_hour}")?;
                writeln!(f, "    Closing hour: {closes_at_hour}")?;
                writeln!(f, "    Attendance information:")?;
                writeln!(f, "        Total attendance: {}", stats.total_attendance)?;
                writeln!(f, "        Total days counted: {}", stats.days_count)?;
                writeln!(f, "        The busiest hour: {}", stats.max_load_hour)?;
                writeln!(
                    f,
                    "        Attendance at the busiest hour: {}",
                    stats.max_load_hour_attendance
                )?;
                writeln!(f, "        The LEAST busy hour: {}", stats.min_load_hour)?;
                writeln!(
                    f,
                    "        Attendance at the LEAST busy hour: {}",
                    stats.min_load_hour_attendance
                )?;
                writeln!(f, "        AVG attendance by hour: {}", stats.avg_load_by_hour)?;
                if let Some(note) = note {
                    writeln!(f, "    Note: {note}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "Report for region: {}", section.region_code)?;
            for block in &section.stations {
                write!(f, "{block}")?;
            }
        }
        Ok(())
    }
}
