//! Wire types returned by the station directory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical address of a polling station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub region_code: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\tCity: {},", self.city)?;
        writeln!(f, "\tStreet: {},", self.street)?;
        writeln!(f, "\tHouse number: {},", self.house_number)?;
        writeln!(f, "\tBuilding: {}", self.building.as_deref().unwrap_or("-"))
    }
}

/// One hour-of-day count for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSample {
    pub hour: u8,
    pub attendance: u64,
}

impl AttendanceSample {
    pub fn new(hour: u8, attendance: u64) -> Self {
        Self { hour, attendance }
    }
}

/// Listing entry as returned by the brief endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationBrief {
    pub id: u64,
    pub ps_number: u32,
    pub actual_address: Address,
}

impl fmt::Display for StationBrief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Polling station: {}", self.ps_number)?;
        writeln!(f, "  Internal id: {}", self.id)?;
        writeln!(f, "  Station address:")?;
        write!(f, "{}", self.actual_address)
    }
}

/// Stations of one region, in directory order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStations {
    pub code: String,
    #[serde(default)]
    pub stations: Vec<StationBrief>,
}

/// Response envelope of the listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationList {
    #[serde(default)]
    pub regions: Vec<RegionStations>,
}

/// Full station record including attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDetail {
    pub id: u64,
    pub ps_number: u32,
    pub actual_address: Address,
    #[serde(default)]
    pub hotline: Option<String>,
    pub opens_at_hour: u8,
    pub closes_at_hour: u8,
    #[serde(default)]
    pub attendance: Option<Vec<AttendanceSample>>,
}

impl StationDetail {
    pub fn brief(&self) -> StationBrief {
        StationBrief {
            id: self.id,
            ps_number: self.ps_number,
            actual_address: self.actual_address.clone(),
        }
    }

    /// Samples carried by the record; absent and empty are treated alike.
    pub fn samples(&self) -> &[AttendanceSample] {
        self.attendance.as_deref().unwrap_or(&[])
    }
}

impl fmt::Display for StationDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Polling station: {}", self.ps_number)?;
        writeln!(f, "  Internal id: {}", self.id)?;
        writeln!(f, "  Region: {}", self.actual_address.region_code)?;
        writeln!(f, "  Hotline: {}", self.hotline.as_deref().unwrap_or("-"))?;
        writeln!(
            f,
            "  Working hours: {:02}:00-{:02}:00",
            self.opens_at_hour, self.closes_at_hour
        )?;
        writeln!(f, "  Station address:")?;
        write!(f, "{}", self.actual_address)?;
        match self.attendance.as_deref() {
            Some(samples) if !samples.is_empty() => {
                writeln!(f, "  Attendance:")?;
                for s in samples {
                    writeln!(f, "\t{:02}:00 - {}", s.hour, s.attendance)?;
                }
                Ok(())
            }
            _ => writeln!(f, "  Attendance: no data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(building: Option<&str>) -> Address {
        Address {
            region_code: "77".to_string(),
            city: "Moscow".to_string(),
            street: "Tverskaya".to_string(),
            house_number: "13".to_string(),
            building: building.map(String::from),
        }
    }

    #[test]
    fn test_address_without_building_renders_dash() {
        let text = address(None).to_string();
        assert!(text.contains("Building: -"));
        assert!(text.contains("City: Moscow"));
    }

    #[test]
    fn test_detail_deserializes_camel_case() {
        let json = r#"{
            "id": 12,
            "psNumber": 1043,
            "actualAddress": {
                "regionCode": "77",
                "city": "Moscow",
                "street": "Tverskaya",
                "houseNumber": "13"
            },
            "hotline": "+7 495 000-00-00",
            "opensAtHour": 8,
            "closesAtHour": 20,
            "attendance": [{"hour": 8, "attendance": 40}]
        }"#;

        let detail: StationDetail = serde_json::from_str(json).unwrap();

        assert_eq!(detail.ps_number, 1043);
        assert_eq!(detail.actual_address.building, None);
        assert_eq!(detail.samples(), &[AttendanceSample::new(8, 40)]);
    }

    #[test]
    fn test_missing_attendance_yields_no_samples() {
        let detail = StationDetail {
            id: 1,
            ps_number: 2,
            actual_address: address(Some("2")),
            hotline: None,
            opens_at_hour: 8,
            closes_at_hour: 20,
            attendance: None,
        };

        assert!(detail.samples().is_empty());
        assert!(detail.to_string().contains("Attendance: no data"));
        assert_eq!(detail.brief().actual_address.building.as_deref(), Some("2"));
    }

    #[test]
    fn test_station_list_tolerates_missing_regions() {
        let list: StationList = serde_json::from_str("{}").unwrap();
        assert!(list.regions.is_empty());
    }
}
