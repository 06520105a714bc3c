use super::table::{CountryCount, CountryYearCounts};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TOP_N: usize = 5;

/// Ordering of countries with equal counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Keep the order in which the build pass first saw each country.
    #[default]
    Insertion,
    /// Order by country name.
    Alphabetical,
}

impl TieBreak {
    pub fn toggled(self) -> Self {
        match self {
            TieBreak::Insertion => TieBreak::Alphabetical,
            TieBreak::Alphabetical => TieBreak::Insertion,
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::Insertion => f.write_str("insertion"),
            TieBreak::Alphabetical => f.write_str("alphabetical"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insertion" => Ok(TieBreak::Insertion),
            "alphabetical" => Ok(TieBreak::Alphabetical),
            other => Err(format!(
                "unknown tie-break `{other}` (expected `insertion` or `alphabetical`)"
            )),
        }
    }
}

/// The `n` countries with most events in `year`, ties in insertion order.
pub fn top_n(table: &CountryYearCounts, year: i32, n: usize) -> Vec<CountryCount> {
    top_n_with(table, year, n, TieBreak::Insertion)
}

pub fn top_n_with(
    table: &CountryYearCounts,
    year: i32,
    n: usize,
    tie_break: TieBreak,
) -> Vec<CountryCount> {
    let mut entries = table.year_entries(year).to_vec();
    // sort_by is stable, so Insertion needs no secondary key.
    match tie_break {
        TieBreak::Insertion => entries.sort_by(|a, b| b.count.cmp(&a.count)),
        TieBreak::Alphabetical => entries.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.country.cmp(&b.country))
        }),
    }
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(i32, &str)]) -> CountryYearCounts {
        let mut t = CountryYearCounts::default();
        for &(year, country) in rows {
            t.increment(year, country);
        }
        t
    }

    fn names(result: &[CountryCount]) -> Vec<&str> {
        result.iter().map(|c| c.country.as_str()).collect()
    }

    #[test]
    fn test_sorted_descending_and_truncated() {
        let t = table(&[
            (2011, "Chile"),
            (2011, "Japan"),
            (2011, "Japan"),
            (2011, "Japan"),
            (2011, "Peru"),
            (2011, "Peru"),
            (2011, "Fiji"),
        ]);
        let top = top_n(&t, 2011, 2);
        assert_eq!(names(&top), ["Japan", "Peru"]);
        assert_eq!(top[0].count, 3);
        assert_eq!(top_n(&t, 2011, 10).len(), 4);
    }

    #[test]
    fn test_unknown_year_is_empty() {
        let t = table(&[(2011, "Japan")]);
        assert!(top_n(&t, 1990, 5).is_empty());
        assert!(top_n(&t, 2011, 0).is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let t = table(&[(2004, "Sumatra"), (2004, "Chile"), (2004, "Alaska")]);
        assert_eq!(names(&top_n(&t, 2004, 5)), ["Sumatra", "Chile", "Alaska"]);
    }

    #[test]
    fn test_ties_alphabetical() {
        let t = table(&[
            (2004, "Sumatra"),
            (2004, "Chile"),
            (2004, "Alaska"),
            (2004, "Tonga"),
            (2004, "Tonga"),
        ]);
        let top = top_n_with(&t, 2004, 5, TieBreak::Alphabetical);
        assert_eq!(names(&top), ["Tonga", "Alaska", "Chile", "Sumatra"]);
    }

    #[test]
    fn test_repeated_queries_agree() {
        let t = table(&[(2015, "Nepal"), (2015, "Chile"), (2015, "Nepal")]);
        let first = top_n(&t, 2015, 5);
        for _ in 0..10 {
            assert_eq!(top_n(&t, 2015, 5), first);
        }
    }

    #[test]
    fn test_tie_break_parse() {
        assert_eq!("alphabetical".parse::<TieBreak>(), Ok(TieBreak::Alphabetical));
        assert_eq!(TieBreak::Insertion.to_string(), "insertion");
        assert!("random".parse::<TieBreak>().is_err());
        assert_eq!(TieBreak::Insertion.toggled(), TieBreak::Alphabetical);
    }
}
