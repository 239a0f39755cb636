//! Launch record data model and table conversion
//!
//! A launch table lives in memory as a polars [`DataFrame`] whose column
//! names follow the CSV header used throughout the project. [`LaunchRecord`]
//! is the typed view of one row; the collector and the generator build
//! records and convert them into a table with [`records_to_frame`].

mod collector;
mod generator;
mod loader;

pub use collector::{
    normalize_launch, ApiCore, ApiLaunch, ApiPayload, CollectorConfig, LaunchCollector, ResolvedResources,
};
pub use generator::{GeneratorConfig, SampleGenerator};
pub use loader::{DatasetLoader, LaunchTable};

use crate::error::{LandingError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column names of the launch table
pub mod columns {
    pub const FLIGHT_NUMBER: &str = "FlightNumber";
    pub const DATE: &str = "Date";
    pub const LAUNCH_SITE: &str = "LaunchSite";
    pub const ROCKET: &str = "Rocket";
    pub const GRID_FINS: &str = "GridFins";
    pub const REUSED: &str = "Reused";
    pub const LEGS: &str = "Legs";
    pub const LANDING_ATTEMPT: &str = "LandingAttempt";
    pub const LANDING_SUCCESS: &str = "LandingSuccess";
    pub const LANDING_TYPE: &str = "LandingType";
    pub const PAYLOAD_COUNT: &str = "PayloadCount";
    pub const PAYLOAD_MASS: &str = "PayloadMass";
    pub const ORBIT: &str = "Orbit";
    pub const CLASS: &str = "Class";
}

/// Known launch pads
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LaunchSite {
    CcafsLc40,
    CcafsSlc40,
    KscLc39a,
    VafbSlc4e,
    /// Pad identifier not in the known list (raw API ids end up here)
    Other(String),
}

impl LaunchSite {
    pub const KNOWN: [LaunchSite; 4] = [
        LaunchSite::CcafsLc40,
        LaunchSite::CcafsSlc40,
        LaunchSite::KscLc39a,
        LaunchSite::VafbSlc4e,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            LaunchSite::CcafsLc40 => "CCAFS LC-40",
            LaunchSite::CcafsSlc40 => "CCAFS SLC-40",
            LaunchSite::KscLc39a => "KSC LC-39A",
            LaunchSite::VafbSlc4e => "VAFB SLC-4E",
            LaunchSite::Other(id) => id,
        }
    }
}

impl From<String> for LaunchSite {
    fn from(s: String) -> Self {
        match s.trim() {
            "CCAFS LC-40" => LaunchSite::CcafsLc40,
            "CCAFS SLC-40" | "CCSFS SLC 40" => LaunchSite::CcafsSlc40,
            "KSC LC-39A" | "KSC LC 39A" => LaunchSite::KscLc39a,
            "VAFB SLC-4E" | "VAFB SLC 4E" => LaunchSite::VafbSlc4e,
            other => LaunchSite::Other(other.to_string()),
        }
    }
}

impl From<LaunchSite> for String {
    fn from(site: LaunchSite) -> Self {
        site.as_str().to_string()
    }
}

impl fmt::Display for LaunchSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload orbit classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Orbit {
    Leo,
    Iss,
    Gto,
    Sso,
    Po,
    Meo,
    EsL1,
    Heo,
    Geo,
    Vleo,
    So,
    Other(String),
}

impl Orbit {
    pub fn as_str(&self) -> &str {
        match self {
            Orbit::Leo => "LEO",
            Orbit::Iss => "ISS",
            Orbit::Gto => "GTO",
            Orbit::Sso => "SSO",
            Orbit::Po => "PO",
            Orbit::Meo => "MEO",
            Orbit::EsL1 => "ES-L1",
            Orbit::Heo => "HEO",
            Orbit::Geo => "GEO",
            Orbit::Vleo => "VLEO",
            Orbit::So => "SO",
            Orbit::Other(name) => name,
        }
    }
}

impl From<String> for Orbit {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "LEO" => Orbit::Leo,
            "ISS" => Orbit::Iss,
            "GTO" => Orbit::Gto,
            "SSO" => Orbit::Sso,
            "PO" => Orbit::Po,
            "MEO" => Orbit::Meo,
            "ES-L1" => Orbit::EsL1,
            "HEO" => Orbit::Heo,
            "GEO" => Orbit::Geo,
            "VLEO" => Orbit::Vleo,
            "SO" => Orbit::So,
            _ => Orbit::Other(s.trim().to_string()),
        }
    }
}

impl From<Orbit> for String {
    fn from(orbit: Orbit) -> Self {
        orbit.as_str().to_string()
    }
}

impl fmt::Display for Orbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First-stage recovery method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LandingType {
    /// Autonomous spaceport drone ship
    #[serde(rename = "ASDS")]
    DroneShip,
    /// Return to launch site
    #[serde(rename = "RTLS")]
    ReturnToLaunchSite,
    /// Controlled ocean touchdown, no recovery
    Ocean,
    #[default]
    None,
}

impl LandingType {
    /// Value written to the table, `None` becomes a null cell
    pub fn as_table_value(&self) -> Option<&'static str> {
        match self {
            LandingType::DroneShip => Some("ASDS"),
            LandingType::ReturnToLaunchSite => Some("RTLS"),
            LandingType::Ocean => Some("Ocean"),
            LandingType::None => None,
        }
    }
}

impl FromStr for LandingType {
    type Err = LandingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "ASDS" => Ok(LandingType::DroneShip),
            "RTLS" => Ok(LandingType::ReturnToLaunchSite),
            "Ocean" | "OCEAN" => Ok(LandingType::Ocean),
            "" | "None" | "none" => Ok(LandingType::None),
            other => Err(LandingError::Data(format!("unknown landing type '{}'", other))),
        }
    }
}

/// One launch attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub flight_number: u32,
    pub date: NaiveDate,
    pub launch_site: LaunchSite,
    pub rocket: String,
    pub grid_fins: bool,
    pub reused: bool,
    pub legs: bool,
    pub landing_attempt: bool,
    /// `None` when no landing was attempted or the outcome is unknown
    pub landing_success: Option<bool>,
    pub landing_type: LandingType,
    pub payload_count: u32,
    /// Total payload mass in kilograms, `None` when unknown
    pub payload_mass: Option<f64>,
    pub orbit: Orbit,
}

impl LaunchRecord {
    /// Label: true only for a confirmed successful landing
    pub fn class(&self) -> bool {
        self.landing_success == Some(true)
    }
}

/// Build a launch table from typed records, preserving record order
pub fn records_to_frame(records: &[LaunchRecord]) -> Result<DataFrame> {
    use columns::*;

    let flight_numbers: Vec<i64> = records.iter().map(|r| r.flight_number as i64).collect();
    let dates: Vec<String> = records.iter().map(|r| r.date.format("%Y-%m-%d").to_string()).collect();
    let sites: Vec<String> = records.iter().map(|r| r.launch_site.to_string()).collect();
    let rockets: Vec<String> = records.iter().map(|r| r.rocket.clone()).collect();
    let grid_fins: Vec<bool> = records.iter().map(|r| r.grid_fins).collect();
    let reused: Vec<bool> = records.iter().map(|r| r.reused).collect();
    let legs: Vec<bool> = records.iter().map(|r| r.legs).collect();
    let attempts: Vec<bool> = records.iter().map(|r| r.landing_attempt).collect();
    let successes: Vec<Option<bool>> = records.iter().map(|r| r.landing_success).collect();
    let landing_types: Vec<Option<String>> = records
        .iter()
        .map(|r| r.landing_type.as_table_value().map(str::to_string))
        .collect();
    let payload_counts: Vec<i64> = records.iter().map(|r| r.payload_count as i64).collect();
    let payload_masses: Vec<Option<f64>> = records.iter().map(|r| r.payload_mass).collect();
    let orbits: Vec<String> = records.iter().map(|r| r.orbit.to_string()).collect();
    let classes: Vec<i64> = records.iter().map(|r| r.class() as i64).collect();

    let df = df!(
        FLIGHT_NUMBER => flight_numbers,
        DATE => dates,
        LAUNCH_SITE => sites,
        ROCKET => rockets,
        GRID_FINS => grid_fins,
        REUSED => reused,
        LEGS => legs,
        LANDING_ATTEMPT => attempts,
        LANDING_SUCCESS => successes,
        LANDING_TYPE => landing_types,
        PAYLOAD_COUNT => payload_counts,
        PAYLOAD_MASS => payload_masses,
        ORBIT => orbits,
        CLASS => classes
    )?;

    Ok(df)
}

/// Read typed records back from a launch table.
///
/// `FlightNumber` and `Date` are required; every other column is optional
/// and falls back to its neutral value when absent.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<LaunchRecord>> {
    use columns::*;

    let n = df.height();
    let flight_numbers = float_column(df, FLIGHT_NUMBER)?
        .ok_or_else(|| LandingError::missing_column(FLIGHT_NUMBER))?;
    let dates = string_column(df, DATE)?.ok_or_else(|| LandingError::missing_column(DATE))?;

    let sites = string_column(df, LAUNCH_SITE)?.unwrap_or_else(|| vec![None; n]);
    let rockets = string_column(df, ROCKET)?.unwrap_or_else(|| vec![None; n]);
    let grid_fins = bool_column(df, GRID_FINS)?.unwrap_or_else(|| vec![None; n]);
    let reused = bool_column(df, REUSED)?.unwrap_or_else(|| vec![None; n]);
    let legs = bool_column(df, LEGS)?.unwrap_or_else(|| vec![None; n]);
    let attempts = bool_column(df, LANDING_ATTEMPT)?.unwrap_or_else(|| vec![None; n]);
    let successes = bool_column(df, LANDING_SUCCESS)?.unwrap_or_else(|| vec![None; n]);
    let landing_types = string_column(df, LANDING_TYPE)?.unwrap_or_else(|| vec![None; n]);
    let payload_counts = float_column(df, PAYLOAD_COUNT)?.unwrap_or_else(|| vec![None; n]);
    let payload_masses = float_column(df, PAYLOAD_MASS)?.unwrap_or_else(|| vec![None; n]);
    let orbits = string_column(df, ORBIT)?.unwrap_or_else(|| vec![None; n]);

    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let flight_number = flight_numbers[i]
            .filter(|v| *v >= 1.0)
            .ok_or_else(|| LandingError::Schema(format!("row {}: '{}' must be a positive integer", i, FLIGHT_NUMBER)))?;
        let date = dates[i]
            .as_deref()
            .and_then(parse_date)
            .ok_or_else(|| LandingError::Schema(format!("row {}: '{}' is not a calendar date", i, DATE)))?;

        let landing_type = landing_types[i]
            .as_deref()
            .map(|s| s.parse::<LandingType>().unwrap_or(LandingType::None))
            .unwrap_or_default();

        records.push(LaunchRecord {
            flight_number: flight_number as u32,
            date,
            launch_site: LaunchSite::from(sites[i].clone().unwrap_or_else(|| "Unknown".to_string())),
            rocket: rockets[i].clone().unwrap_or_else(|| "Unknown".to_string()),
            grid_fins: grid_fins[i].unwrap_or(false),
            reused: reused[i].unwrap_or(false),
            legs: legs[i].unwrap_or(false),
            landing_attempt: attempts[i].unwrap_or(false),
            landing_success: successes[i],
            landing_type,
            payload_count: payload_counts[i].map(|v| v.max(0.0) as u32).unwrap_or(0),
            payload_mass: payload_masses[i],
            orbit: Orbit::from(orbits[i].clone().unwrap_or_else(|| "Unknown".to_string())),
        });
    }

    Ok(records)
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time component
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Interpret a cell as a boolean flag
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim() {
        "True" | "true" | "TRUE" | "1" | "1.0" => Some(true),
        "False" | "false" | "FALSE" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

/// Numeric view of a column, `None` when the column is absent.
/// Booleans map to 0/1; unparsable strings become null.
pub fn float_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    let column = match df.column(name) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };
    let series = column.as_materialized_series();

    let values = match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| parse_flag(s).map(|b| b as u8 as f64).or_else(|| s.trim().parse::<f64>().ok())))
            .collect(),
        DataType::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| if b { 1.0 } else { 0.0 }))
            .collect(),
        _ => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect(),
    };

    Ok(Some(values))
}

/// Boolean view of a column, `None` when the column is absent
pub fn bool_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<bool>>>> {
    let column = match df.column(name) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };
    let series = column.as_materialized_series();

    let values = match series.dtype() {
        DataType::Boolean => series.bool()?.into_iter().collect(),
        DataType::String => series.str()?.into_iter().map(|v| v.and_then(parse_flag)).collect(),
        _ => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()).map(|x| x != 0.0))
            .collect(),
    };

    Ok(Some(values))
}

/// String view of a column, `None` when the column is absent
pub fn string_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    let column = match df.column(name) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(Some(values))
}
