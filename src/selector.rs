//! Resolution of operator filters into concrete stations.
//!
//! Raw command-line options are first narrowed to exactly one [`FilterSpec`]
//! (most specific wins: station id, then address, then region codes, then
//! station numbers, then everything). The filter is then resolved against a
//! [`StationDirectory`] into a [`Selection`] that keeps the directory's
//! region and station ordering.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{Result, StationsError};
use crate::model::{Address, RegionStations, StationBrief, StationDetail};
use crate::services::{StationDirectory, StationLookup};

/// Exactly one way of choosing stations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    ByStationId(u64),
    ByAddress(Address),
    ByRegionCodes(Vec<String>),
    ByStationNumbers(Vec<u32>),
    All,
}

/// Filter options exactly as the operator supplied them.
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    pub station_id: Option<u64>,
    pub address: Option<Vec<String>>,
    pub region_codes: Option<String>,
    pub station_numbers: Option<String>,
}

/// Lookup options of the single-station detail command.
#[derive(Debug, Clone, Default)]
pub struct DetailArgs {
    pub station_id: Option<u64>,
    pub address: Option<Vec<String>>,
    pub region_code: Option<String>,
    pub station_number: Option<u32>,
}

impl FilterSpec {
    /// Picks the most specific filter present in `args`.
    ///
    /// Lower-priority options are ignored once a higher one is present, but a
    /// malformed option that wins priority is still an error.
    pub fn from_args(args: &FilterArgs) -> Result<Self> {
        if let Some(id) = args.station_id {
            return Ok(FilterSpec::ByStationId(id));
        }
        if let Some(parts) = &args.address {
            return Ok(FilterSpec::ByAddress(parse_address(parts)?));
        }
        if let Some(codes) = args.region_codes.as_deref().and_then(parse_region_codes) {
            return Ok(FilterSpec::ByRegionCodes(codes));
        }
        if let Some(numbers) = args.station_numbers.as_deref() {
            if let Some(numbers) = parse_station_numbers(numbers)? {
                return Ok(FilterSpec::ByStationNumbers(numbers));
            }
        }
        Ok(FilterSpec::All)
    }
}

/// Builds an [`Address`] from region code, city, street, house number and
/// an optional building.
pub fn parse_address(parts: &[String]) -> Result<Address> {
    if parts.len() < 4 {
        return Err(StationsError::IncompleteAddress(parts.len()));
    }
    if parts.len() > 5 {
        warn!(provided = parts.len(), "Ignoring address values after the building");
    }

    Ok(Address {
        region_code: parts[0].clone(),
        city: parts[1].clone(),
        street: parts[2].clone(),
        house_number: parts[3].clone(),
        building: parts.get(4).cloned(),
    })
}

/// Splits a comma-separated list of region codes.
///
/// Returns `None` when nothing but blanks was given.
pub fn parse_region_codes(raw: &str) -> Option<Vec<String>> {
    let codes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();

    (!codes.is_empty()).then_some(codes)
}

/// Splits a comma-separated list of station numbers.
///
/// Blank input yields `Ok(None)`; any token that is not a positive integer
/// fails the whole list.
pub fn parse_station_numbers(raw: &str) -> Result<Option<Vec<u32>>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    raw.split(',')
        .map(|token| {
            let token = token.trim();
            match token.parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(StationsError::InvalidStationNumber(token.to_string())),
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Picks the detail lookup from `args`: id, then address, then region code
/// with station number.
pub fn lookup_from_args(args: &DetailArgs) -> Result<StationLookup> {
    if let Some(id) = args.station_id {
        return Ok(StationLookup::ById(id));
    }
    if let Some(parts) = &args.address {
        return Ok(StationLookup::ByAddress(parse_address(parts)?));
    }

    let region_code = args
        .region_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    match (region_code, args.station_number) {
        (Some(region_code), Some(ps_number)) => Ok(StationLookup::ByRegionAndNumber {
            region_code: region_code.to_string(),
            ps_number,
        }),
        _ => Err(StationsError::MissingLookup),
    }
}

/// A selected station. Carries its full record when resolution already had
/// to fetch it.
#[derive(Debug, Clone)]
pub struct ResolvedStation {
    pub brief: StationBrief,
    pub detail: Option<StationDetail>,
}

#[derive(Debug, Clone)]
pub struct ResolvedRegion {
    pub code: String,
    pub stations: Vec<ResolvedStation>,
}

/// Stations grouped by region, in directory order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub regions: Vec<ResolvedRegion>,
}

impl Selection {
    fn from_listing(regions: Vec<RegionStations>) -> Self {
        let regions = regions
            .into_iter()
            .map(|r| ResolvedRegion {
                code: r.code,
                stations: r
                    .stations
                    .into_iter()
                    .map(|brief| ResolvedStation {
                        brief,
                        detail: None,
                    })
                    .collect(),
            })
            .collect();
        Self { regions }
    }

    fn from_detail(detail: StationDetail) -> Self {
        Self {
            regions: vec![ResolvedRegion {
                code: detail.actual_address.region_code.clone(),
                stations: vec![ResolvedStation {
                    brief: detail.brief(),
                    detail: Some(detail),
                }],
            }],
        }
    }

    pub fn station_count(&self) -> usize {
        self.regions.iter().map(|r| r.stations.len()).sum()
    }

    /// No station matched. This is a normal outcome, not a failure.
    pub fn is_empty(&self) -> bool {
        self.station_count() == 0
    }
}

/// Resolves filters against a station directory.
pub struct StationSelector<'a> {
    directory: &'a dyn StationDirectory,
}

impl<'a> StationSelector<'a> {
    pub fn new(directory: &'a dyn StationDirectory) -> Self {
        Self { directory }
    }

    /// Fetches the stations chosen by `spec`.
    ///
    /// Id and address filters go straight to the detail endpoint for `date`;
    /// the listing endpoints are not consulted for them.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, spec: &FilterSpec, date: Option<NaiveDate>) -> Result<Selection> {
        let selection = match spec {
            FilterSpec::ByStationId(id) => {
                let detail = self.fetch_detail(&StationLookup::ById(*id), date).await?;
                Selection::from_detail(detail)
            }
            FilterSpec::ByAddress(address) => {
                let detail = self
                    .fetch_detail(&StationLookup::ByAddress(address.clone()), date)
                    .await?;
                Selection::from_detail(detail)
            }
            FilterSpec::ByRegionCodes(codes) => {
                Selection::from_listing(self.directory.list_stations_filtered(codes, &[]).await?)
            }
            FilterSpec::ByStationNumbers(numbers) => {
                Selection::from_listing(self.directory.list_stations_filtered(&[], numbers).await?)
            }
            FilterSpec::All => Selection::from_listing(self.directory.list_stations().await?),
        };

        if selection.is_empty() {
            info!("No stations matched the filter");
        } else {
            debug!(
                regions = selection.regions.len(),
                stations = selection.station_count(),
                "Stations resolved"
            );
        }

        Ok(selection)
    }

    /// Fetches one station's full record.
    pub async fn fetch_detail(
        &self,
        lookup: &StationLookup,
        date: Option<NaiveDate>,
    ) -> Result<StationDetail> {
        Ok(self.directory.get_station_detail(lookup, date).await?)
    }
}
