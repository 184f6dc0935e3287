//! Typed output tables.
//!
//! A [`Table`] is a sorted, read-only collection of records of one domain.
//! Sort order is (year, month, entity) with the remaining fields as a
//! deterministic tie break; it comes from the record types' derived ordering.

mod merge;

pub use merge::merge;

use crate::types::{
    CountryOriginRecord, Metric, Month, MonthlyRecord, ProvincialRecord, SubZoneRecord,
};
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

/// A canonical record of one domain.
pub trait Record: Clone + PartialOrd + Debug + Send + Sync + 'static {
    /// Column names of the converted [`DataFrame`].
    const COLUMNS: &'static [&'static str];

    fn year(&self) -> i32;
    fn month(&self) -> Month;

    /// Entity name, for domains that have one.
    fn entity(&self) -> Option<&str> {
        None
    }

    /// Value of a metric, `None` when the domain does not measure it.
    fn metric(&self, metric: Metric) -> Option<f64>;

    /// True for aggregate buckets mixed with real entities.
    fn is_aggregate(&self) -> bool {
        false
    }

    /// False when a mandatory key field is blank.
    fn has_key(&self) -> bool {
        self.entity().is_none_or(|entity| !entity.trim().is_empty())
    }

    fn to_dataframe(rows: &[Self]) -> PolarsResult<DataFrame>;
}

fn month_columns<R: Record>(rows: &[R]) -> (Vec<i32>, Vec<&'static str>, Vec<u32>) {
    (
        rows.iter().map(Record::year).collect(),
        rows.iter().map(|r| r.month().label()).collect(),
        rows.iter().map(|r| r.month().number()).collect(),
    )
}

impl Record for MonthlyRecord {
    const COLUMNS: &'static [&'static str] = &["anno", "mese", "mese_num", "comune", "presenze"];

    fn year(&self) -> i32 {
        self.year
    }

    fn month(&self) -> Month {
        self.month
    }

    fn entity(&self) -> Option<&str> {
        Some(&self.municipality)
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::OvernightStays => Some(self.overnight_stays),
            Metric::Arrivals => None,
        }
    }

    fn to_dataframe(rows: &[Self]) -> PolarsResult<DataFrame> {
        let (years, months, numbers) = month_columns(rows);
        df!(
            "anno" => years,
            "mese" => months,
            "mese_num" => numbers,
            "comune" => rows.iter().map(|r| r.municipality.as_str()).collect::<Vec<_>>(),
            "presenze" => rows.iter().map(|r| r.overnight_stays).collect::<Vec<_>>(),
        )
    }
}

impl Record for ProvincialRecord {
    const COLUMNS: &'static [&'static str] = &["anno", "mese", "mese_num", "arrivi", "presenze"];

    fn year(&self) -> i32 {
        self.year
    }

    fn month(&self) -> Month {
        self.month
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        Some(match metric {
            Metric::OvernightStays => self.overnight_stays,
            Metric::Arrivals => self.arrivals,
        })
    }

    fn to_dataframe(rows: &[Self]) -> PolarsResult<DataFrame> {
        let (years, months, numbers) = month_columns(rows);
        df!(
            "anno" => years,
            "mese" => months,
            "mese_num" => numbers,
            "arrivi" => rows.iter().map(|r| r.arrivals).collect::<Vec<_>>(),
            "presenze" => rows.iter().map(|r| r.overnight_stays).collect::<Vec<_>>(),
        )
    }
}

impl Record for SubZoneRecord {
    const COLUMNS: &'static [&'static str] =
        &["anno", "mese", "mese_num", "stl", "arrivi", "presenze"];

    fn year(&self) -> i32 {
        self.year
    }

    fn month(&self) -> Month {
        self.month
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        Some(match metric {
            Metric::OvernightStays => self.overnight_stays,
            Metric::Arrivals => self.arrivals,
        })
    }

    fn to_dataframe(rows: &[Self]) -> PolarsResult<DataFrame> {
        let (years, months, numbers) = month_columns(rows);
        df!(
            "anno" => years,
            "mese" => months,
            "mese_num" => numbers,
            "stl" => rows.iter().map(|r| r.zone.tag()).collect::<Vec<_>>(),
            "arrivi" => rows.iter().map(|r| r.arrivals).collect::<Vec<_>>(),
            "presenze" => rows.iter().map(|r| r.overnight_stays).collect::<Vec<_>>(),
        )
    }
}

impl Record for CountryOriginRecord {
    const COLUMNS: &'static [&'static str] =
        &["anno", "mese", "mese_num", "paese", "presenze", "aggregato"];

    fn year(&self) -> i32 {
        self.year
    }

    fn month(&self) -> Month {
        self.month
    }

    fn entity(&self) -> Option<&str> {
        Some(&self.country)
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::OvernightStays => Some(self.overnight_stays),
            Metric::Arrivals => None,
        }
    }

    fn is_aggregate(&self) -> bool {
        self.is_aggregate
    }

    fn to_dataframe(rows: &[Self]) -> PolarsResult<DataFrame> {
        let (years, months, numbers) = month_columns(rows);
        df!(
            "anno" => years,
            "mese" => months,
            "mese_num" => numbers,
            "paese" => rows.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
            "presenze" => rows.iter().map(|r| r.overnight_stays).collect::<Vec<_>>(),
            "aggregato" => rows.iter().map(|r| r.is_aggregate).collect::<Vec<_>>(),
        )
    }
}

/// Key of a record: year, month and entity when the domain has one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey {
    pub year: i32,
    pub month: Month,
    pub entity: Option<String>,
}

impl RecordKey {
    pub fn of<R: Record>(record: &R) -> Self {
        Self {
            year: record.year(),
            month: record.month(),
            entity: record.entity().map(str::to_string),
        }
    }
}

/// A sorted table of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R: Record> Table<R> {
    /// A table with no rows; still converts to a frame with every column.
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Build a table, imposing the canonical sort order.
    pub fn from_rows(mut rows: Vec<R>) -> Self {
        rows.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(Record::year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct entity names, sorted.
    pub fn entities(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|r| r.entity())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Keys claimed by more than one row, with their counts, sorted.
    pub fn duplicate_keys(&self) -> Vec<(RecordKey, usize)> {
        let mut counts: HashMap<RecordKey, usize> = HashMap::new();
        for row in &self.rows {
            *counts.entry(RecordKey::of(row)).or_default() += 1;
        }
        let mut duplicates: Vec<(RecordKey, usize)> =
            counts.into_iter().filter(|(_, count)| *count > 1).collect();
        duplicates.sort();
        duplicates
    }

    /// Convert to a polars frame with the Italian column names.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        R::to_dataframe(&self.rows)
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

static_assertions::assert_impl_all!(Table<MonthlyRecord>: Send, Sync);
static_assertions::assert_impl_all!(Table<CountryOriginRecord>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubZone;
    use pretty_assertions::assert_eq;

    fn monthly(year: i32, month: Month, name: &str, stays: f64) -> MonthlyRecord {
        MonthlyRecord {
            year,
            month,
            municipality: name.to_string(),
            overnight_stays: stays,
        }
    }

    #[test]
    fn test_from_rows_sorts_by_calendar() {
        let table = Table::from_rows(vec![
            monthly(2023, Month::Dic, "Belluno", 1.0),
            monthly(2022, Month::Mar, "Feltre", 2.0),
            monthly(2023, Month::Ago, "Agordo", 3.0),
            monthly(2023, Month::Ago, "Agordo", 1.0),
        ]);
        let keys: Vec<(i32, Month, f64)> = table
            .iter()
            .map(|r| (r.year, r.month, r.overnight_stays))
            .collect();
        assert_eq!(
            keys,
            vec![
                (2022, Month::Mar, 2.0),
                (2023, Month::Ago, 1.0),
                (2023, Month::Ago, 3.0),
                (2023, Month::Dic, 1.0),
            ]
        );
    }

    #[test]
    fn test_years_and_entities() {
        let table = Table::from_rows(vec![
            monthly(2023, Month::Gen, "Feltre", 1.0),
            monthly(2022, Month::Gen, "Belluno", 1.0),
            monthly(2023, Month::Feb, "Feltre", 1.0),
        ]);
        assert_eq!(table.years(), vec![2022, 2023]);
        assert_eq!(table.entities(), vec!["Belluno", "Feltre"]);
    }

    #[test]
    fn test_duplicate_keys() {
        let table = Table::from_rows(vec![
            monthly(2023, Month::Gen, "Feltre", 1.0),
            monthly(2023, Month::Gen, "Feltre", 2.0),
            monthly(2023, Month::Feb, "Feltre", 1.0),
        ]);
        let duplicates = table.duplicate_keys();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0.month, Month::Gen);
        assert_eq!(duplicates[0].1, 2);
    }

    #[test]
    fn test_has_key() {
        assert!(monthly(2023, Month::Gen, "Feltre", 1.0).has_key());
        assert!(!monthly(2023, Month::Gen, "  ", 1.0).has_key());
        let provincial = ProvincialRecord {
            year: 2023,
            month: Month::Gen,
            arrivals: 1.0,
            overnight_stays: 2.0,
        };
        assert!(provincial.has_key());
    }

    #[test]
    fn test_empty_table_keeps_schema() {
        let df = Table::<CountryOriginRecord>::empty().to_dataframe().unwrap();
        assert_eq!(df.height(), 0);
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, CountryOriginRecord::COLUMNS);
        assert_eq!(df.column("presenze").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("aggregato").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_subzone_dataframe() {
        let table = Table::from_rows(vec![SubZoneRecord {
            zone: SubZone::Dolomiti,
            year: 2023,
            month: Month::Lug,
            arrivals: 10.0,
            overnight_stays: 50.0,
        }]);
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), SubZoneRecord::COLUMNS.len());
        let stl = df.column("stl").unwrap().str().unwrap().get(0);
        assert_eq!(stl, Some("dolomiti"));
        let month_num = df.column("mese_num").unwrap().u32().unwrap().get(0);
        assert_eq!(month_num, Some(7));
    }

    #[test]
    fn test_table_serializes_as_list() {
        let table = Table::from_rows(vec![monthly(2023, Month::Gen, "Feltre", 1.0)]);
        let json = serde_json::to_value(&table).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["municipality"], "Feltre");
    }
}
