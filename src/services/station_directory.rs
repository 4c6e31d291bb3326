//! Trait and types for interacting with the polling-station directory.

use chrono::NaiveDate;

use crate::error::DirectoryError;
use crate::model::{Address, RegionStations, StationDetail};

/// How a single station's full record is addressed.
///
/// Mirrors the three detail endpoints of the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationLookup {
    /// Internal station identifier.
    ById(u64),
    /// Region code plus the station number within that region.
    ByRegionAndNumber { region_code: String, ps_number: u32 },
    /// Physical address of the station.
    ByAddress(Address),
}

impl StationLookup {
    /// Short human-readable label for logs and notes.
    pub fn describe(&self) -> String {
        match self {
            StationLookup::ById(id) => format!("id {id}"),
            StationLookup::ByRegionAndNumber {
                region_code,
                ps_number,
            } => format!("station {ps_number} in region {region_code}"),
            StationLookup::ByAddress(a) => format!(
                "address {}, {}, {} {}",
                a.region_code, a.city, a.street, a.house_number
            ),
        }
    }
}

/// Abstraction over a station directory provider.
///
/// Empty filter slices mean "no constraint on that axis". A `None` date
/// leaves defaulting to the provider.
#[async_trait::async_trait]
pub trait StationDirectory: Send + Sync {
    /// Returns every station, grouped by region.
    async fn list_stations(&self) -> Result<Vec<RegionStations>, DirectoryError>;

    /// Returns stations matching the given region codes or station numbers.
    async fn list_stations_filtered(
        &self,
        region_codes: &[String],
        station_numbers: &[u32],
    ) -> Result<Vec<RegionStations>, DirectoryError>;

    /// Returns the full record, including attendance, of a single station.
    async fn get_station_detail(
        &self,
        lookup: &StationLookup,
        date: Option<NaiveDate>,
    ) -> Result<StationDetail, DirectoryError>;
}
