//! Canonical record types produced by the normalization pipeline.
//!
//! Every record carries a reporting year and a calendar [`Month`]. Field
//! declaration order matters: the derived `PartialOrd` compares fields in
//! order, which is exactly the sort order of the output tables
//! (year, month, entity, then values as a deterministic tie break).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The twelve canonical months, ordered by the calendar.
///
/// Labels follow the Italian abbreviations used by the source files and the
/// dashboards (`Gen`, `Feb`, ..., `Dic`). Ordering is calendar order and never
/// alphabetical, so `Month::Dic > Month::Ago` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Gen = 1,
    Feb,
    Mar,
    Apr,
    Mag,
    Giu,
    Lug,
    Ago,
    Set,
    Ott,
    Nov,
    Dic,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Month; 12] = [
        Month::Gen,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::Mag,
        Month::Giu,
        Month::Lug,
        Month::Ago,
        Month::Set,
        Month::Ott,
        Month::Nov,
        Month::Dic,
    ];

    /// Calendar number, 1 for January through 12 for December.
    pub fn number(&self) -> u32 {
        *self as u32
    }

    /// Month for a calendar number (1..=12).
    pub fn from_number(number: u32) -> Option<Month> {
        Self::ALL.get(number.checked_sub(1)? as usize).copied()
    }

    /// Canonical three-letter label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gen => "Gen",
            Self::Feb => "Feb",
            Self::Mar => "Mar",
            Self::Apr => "Apr",
            Self::Mag => "Mag",
            Self::Giu => "Giu",
            Self::Lug => "Lug",
            Self::Ago => "Ago",
            Self::Set => "Set",
            Self::Ott => "Ott",
            Self::Nov => "Nov",
            Self::Dic => "Dic",
        }
    }

    /// Full Italian month name.
    pub fn full_name(&self) -> &'static str {
        match self {
            Self::Gen => "Gennaio",
            Self::Feb => "Febbraio",
            Self::Mar => "Marzo",
            Self::Apr => "Aprile",
            Self::Mag => "Maggio",
            Self::Giu => "Giugno",
            Self::Lug => "Luglio",
            Self::Ago => "Agosto",
            Self::Set => "Settembre",
            Self::Ott => "Ottobre",
            Self::Nov => "Novembre",
            Self::Dic => "Dicembre",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::canonical::canonicalize_month(s).ok_or_else(|| format!("not a month: '{s}'"))
    }
}

/// Sub-provincial tourism zone (STL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubZone {
    Dolomiti,
    Belluno,
}

impl SubZone {
    pub const ALL: [SubZone; 2] = [SubZone::Dolomiti, SubZone::Belluno];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Dolomiti => "STL Dolomiti",
            Self::Belluno => "STL Belluno",
        }
    }

    /// Short tag used in exported tables.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Dolomiti => "dolomiti",
            Self::Belluno => "belluno",
        }
    }
}

/// A data family with its own file pattern and schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Municipal,
    Provincial,
    SubZone(SubZone),
    CountryOfOrigin,
}

impl Domain {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Municipal => "Municipal",
            Self::Provincial => "Provincial",
            Self::SubZone(zone) => zone.display_name(),
            Self::CountryOfOrigin => "Country of origin",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Overnight stays (`presenze`).
    OvernightStays,
    /// Arrivals (`arrivi`).
    Arrivals,
}

impl Metric {
    /// Column name in the Italian-labelled frames.
    pub fn column(&self) -> &'static str {
        match self {
            Self::OvernightStays => "presenze",
            Self::Arrivals => "arrivi",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

fn first_day(year: i32, month: Month) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.number(), 1)
}

/// Overnight stays of one municipality in one month.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub year: i32,
    pub month: Month,
    pub municipality: String,
    pub overnight_stays: f64,
}

impl MonthlyRecord {
    /// First day of the record's month, for time-series consumers.
    pub fn period_start(&self) -> Option<NaiveDate> {
        first_day(self.year, self.month)
    }
}

/// Province-wide arrivals and overnight stays for one month.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ProvincialRecord {
    pub year: i32,
    pub month: Month,
    pub arrivals: f64,
    pub overnight_stays: f64,
}

impl ProvincialRecord {
    pub fn period_start(&self) -> Option<NaiveDate> {
        first_day(self.year, self.month)
    }
}

/// Same shape as [`ProvincialRecord`], tagged with its zone.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SubZoneRecord {
    pub zone: SubZone,
    pub year: i32,
    pub month: Month,
    pub arrivals: f64,
    pub overnight_stays: f64,
}

impl SubZoneRecord {
    pub fn period_start(&self) -> Option<NaiveDate> {
        first_day(self.year, self.month)
    }
}

/// Overnight stays of foreign visitors by country of origin.
///
/// `is_aggregate` marks buckets such as "Altri Paesi" that are not a real
/// country but share the table with real countries.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct CountryOriginRecord {
    pub year: i32,
    pub month: Month,
    pub country: String,
    pub overnight_stays: f64,
    pub is_aggregate: bool,
}

impl CountryOriginRecord {
    pub fn period_start(&self) -> Option<NaiveDate> {
        first_day(self.year, self.month)
    }
}
