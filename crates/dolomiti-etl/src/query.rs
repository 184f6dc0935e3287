//! Query helpers over the normalized tables.
//!
//! Filtering, annual totals and year-over-year comparison, the operations
//! the dashboards run on top of every domain table.

use crate::table::{Record, Table};
use crate::types::{Metric, Month};
use serde::Serialize;
use std::collections::BTreeMap;

/// Row filter by years, months and entities.
///
/// Unset criteria match everything.
///
/// ```rust,ignore
/// let summer = Filter::new()
///     .years([2023])
///     .months([Month::Lug, Month::Ago])
///     .exclude_aggregates()
///     .apply(&output.country_origin);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    years: Option<Vec<i32>>,
    months: Option<Vec<Month>>,
    entities: Option<Vec<String>>,
    exclude_aggregates: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = Some(years.into_iter().collect());
        self
    }

    pub fn months(mut self, months: impl IntoIterator<Item = Month>) -> Self {
        self.months = Some(months.into_iter().collect());
        self
    }

    /// Keep only these entities. Matching ignores case.
    pub fn entities<S: Into<String>>(mut self, entities: impl IntoIterator<Item = S>) -> Self {
        self.entities = Some(
            entities
                .into_iter()
                .map(|e| e.into().to_lowercase())
                .collect(),
        );
        self
    }

    /// Drop aggregate buckets such as "Altri Paesi".
    pub fn exclude_aggregates(mut self) -> Self {
        self.exclude_aggregates = true;
        self
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        if self.exclude_aggregates && record.is_aggregate() {
            return false;
        }
        if let Some(years) = &self.years
            && !years.contains(&record.year())
        {
            return false;
        }
        if let Some(months) = &self.months
            && !months.contains(&record.month())
        {
            return false;
        }
        if let Some(entities) = &self.entities {
            let Some(entity) = record.entity() else {
                return false;
            };
            if !entities.contains(&entity.to_lowercase()) {
                return false;
            }
        }
        true
    }

    pub fn apply<R: Record>(&self, table: &Table<R>) -> Table<R> {
        Table::from_rows(table.iter().filter(|r| self.matches(*r)).cloned().collect())
    }
}

/// Yearly sum of a metric for one entity (or the whole domain).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualTotal {
    pub entity: Option<String>,
    pub year: i32,
    pub value: f64,
}

/// Sum `metric` per (entity, year), sorted by entity then year.
///
/// Returns nothing when the domain does not measure `metric`.
pub fn annual_totals<R: Record>(table: &Table<R>, metric: Metric) -> Vec<AnnualTotal> {
    let mut totals: BTreeMap<(Option<String>, i32), f64> = BTreeMap::new();
    for record in table {
        if let Some(value) = record.metric(metric) {
            let key = (record.entity().map(str::to_string), record.year());
            *totals.entry(key).or_default() += value;
        }
    }
    totals
        .into_iter()
        .map(|((entity, year), value)| AnnualTotal {
            entity,
            year,
            value,
        })
        .collect()
}

/// One month of one entity in two years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearComparison {
    pub entity: Option<String>,
    pub month: Month,
    pub base: f64,
    pub compared: f64,
    /// `compared - base`.
    pub difference: f64,
    /// Percentage change over `base`; `None` when `base` is zero.
    pub variation_pct: Option<f64>,
}

/// Compare `metric` between `base_year` and `compared_year` per (entity, month).
///
/// A month present in only one of the years counts as zero in the other.
/// Rows sharing a key are summed.
pub fn year_comparison<R: Record>(
    table: &Table<R>,
    metric: Metric,
    base_year: i32,
    compared_year: i32,
) -> Vec<YearComparison> {
    let mut pairs: BTreeMap<(Option<String>, Month), (f64, f64)> = BTreeMap::new();

    for record in table {
        let Some(value) = record.metric(metric) else {
            continue;
        };
        let key = (record.entity().map(str::to_string), record.month());
        if record.year() == base_year {
            pairs.entry(key.clone()).or_default().0 += value;
        }
        if record.year() == compared_year {
            pairs.entry(key).or_default().1 += value;
        }
    }

    pairs
        .into_iter()
        .map(|((entity, month), (base, compared))| YearComparison {
            entity,
            month,
            base,
            compared,
            difference: compared - base,
            variation_pct: (base != 0.0).then(|| (compared - base) / base * 100.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CountryOriginRecord, ProvincialRecord};
    use pretty_assertions::assert_eq;

    fn country(year: i32, month: Month, name: &str, stays: f64) -> CountryOriginRecord {
        CountryOriginRecord {
            year,
            month,
            country: name.to_string(),
            overnight_stays: stays,
            is_aggregate: name.starts_with("Altri"),
        }
    }

    fn sample() -> Table<CountryOriginRecord> {
        Table::from_rows(vec![
            country(2022, Month::Gen, "Germania", 100.0),
            country(2022, Month::Feb, "Germania", 50.0),
            country(2023, Month::Gen, "Germania", 150.0),
            country(2023, Month::Gen, "Austria", 10.0),
            country(2023, Month::Gen, "Altri Paesi", 5.0),
        ])
    }

    #[test]
    fn test_filter() {
        let table = sample();
        assert_eq!(Filter::new().apply(&table).len(), 5);
        assert_eq!(Filter::new().years([2023]).apply(&table).len(), 3);
        assert_eq!(Filter::new().months([Month::Feb]).apply(&table).len(), 1);
        assert_eq!(
            Filter::new().entities(["germania"]).apply(&table).len(),
            3
        );
        assert_eq!(
            Filter::new().years([2023]).exclude_aggregates().apply(&table).len(),
            2
        );
    }

    #[test]
    fn test_entity_filter_on_entityless_domain() {
        let table = Table::from_rows(vec![ProvincialRecord {
            year: 2023,
            month: Month::Gen,
            arrivals: 1.0,
            overnight_stays: 2.0,
        }]);
        assert!(Filter::new().entities(["Belluno"]).apply(&table).is_empty());
    }

    #[test]
    fn test_annual_totals() {
        let totals = annual_totals(&sample(), Metric::OvernightStays);
        let germany: Vec<(i32, f64)> = totals
            .iter()
            .filter(|t| t.entity.as_deref() == Some("Germania"))
            .map(|t| (t.year, t.value))
            .collect();
        assert_eq!(germany, vec![(2022, 150.0), (2023, 150.0)]);

        // countries have no arrivals
        assert!(annual_totals(&sample(), Metric::Arrivals).is_empty());
    }

    #[test]
    fn test_year_comparison() {
        let rows = year_comparison(&sample(), Metric::OvernightStays, 2022, 2023);
        let germany_gen = rows
            .iter()
            .find(|r| r.entity.as_deref() == Some("Germania") && r.month == Month::Gen)
            .unwrap();
        assert_eq!(germany_gen.difference, 50.0);
        assert_eq!(germany_gen.variation_pct, Some(50.0));

        let germany_feb = rows
            .iter()
            .find(|r| r.entity.as_deref() == Some("Germania") && r.month == Month::Feb)
            .unwrap();
        assert_eq!(germany_feb.compared, 0.0);
        assert_eq!(germany_feb.variation_pct, Some(-100.0));

        let austria = rows
            .iter()
            .find(|r| r.entity.as_deref() == Some("Austria"))
            .unwrap();
        assert_eq!(austria.base, 0.0);
        assert_eq!(austria.variation_pct, None);
    }
}
