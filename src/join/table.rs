use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Events attributed to one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default)]
struct YearCounts {
    /// In order of first insertion.
    entries: Vec<CountryCount>,
    positions: HashMap<String, usize>,
}

/// Per-year, per-country event counts.
///
/// Filled once by [`build`](super::build) and read-only afterwards. Within a
/// year, countries keep the order in which the build pass first saw them.
#[derive(Debug, Clone, Default)]
pub struct CountryYearCounts {
    years: BTreeMap<i32, YearCounts>,
}

impl CountryYearCounts {
    pub(crate) fn increment(&mut self, year: i32, country: &str) {
        let bucket = self.years.entry(year).or_default();
        match bucket.positions.get(country) {
            Some(&idx) => bucket.entries[idx].count += 1,
            None => {
                bucket.positions.insert(country.to_string(), bucket.entries.len());
                bucket.entries.push(CountryCount {
                    country: country.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn count(&self, year: i32, country: &str) -> u64 {
        self.years
            .get(&year)
            .and_then(|b| b.positions.get(country).map(|&i| b.entries[i].count))
            .unwrap_or(0)
    }

    /// Entries for one year in first-insertion order.
    pub fn year_entries(&self, year: i32) -> &[CountryCount] {
        self.years
            .get(&year)
            .map(|b| b.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn year_total(&self, year: i32) -> u64 {
        self.year_entries(year).iter().map(|e| e.count).sum()
    }

    /// Events attributed to any country, all years.
    pub fn total(&self) -> u64 {
        self.years
            .values()
            .flat_map(|b| b.entries.iter())
            .map(|e| e.count)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
