//! Whole-catalogue summaries: yearly totals with a smoothed trend, the
//! magnitude distribution, and each year's split into magnitude classes.

use crate::data::events::is_plausible_magnitude;
use crate::data::Event;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_MAGNITUDE_STEP: f64 = 0.2;

/// Wider histograms only list populated bins.
const MAX_CONTIGUOUS_BINS: i64 = 1024;

/// Slack for magnitudes that sit on a bin edge but divide slightly under it.
const BIN_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub count: u64,
    /// Mean of this year's count and its neighbours' (centred, 3 rows).
    pub moving_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnitudeBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

/// Events per year across the whole catalogue, attributed or not.
pub fn yearly_trend(events: &[Event]) -> Vec<YearTotal> {
    let mut per_year: BTreeMap<i32, u64> = BTreeMap::new();
    for e in events {
        *per_year.entry(e.year).or_insert(0) += 1;
    }
    let counts: Vec<(i32, u64)> = per_year.into_iter().collect();

    counts
        .iter()
        .enumerate()
        .map(|(i, &(year, count))| {
            let window = &counts[i.saturating_sub(1)..(i + 2).min(counts.len())];
            let sum: u64 = window.iter().map(|&(_, c)| c).sum();
            YearTotal {
                year,
                count,
                moving_avg: sum as f64 / window.len() as f64,
            }
        })
        .collect()
}

/// Year with the most events and year with the fewest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendExtremes {
    pub peak: (i32, u64),
    pub trough: (i32, u64),
}

/// Peak and trough of the yearly counts; the earliest year wins ties.
pub fn trend_extremes(trend: &[YearTotal]) -> Option<TrendExtremes> {
    let first = trend.first()?;
    let mut extremes = TrendExtremes {
        peak: (first.year, first.count),
        trough: (first.year, first.count),
    };
    for t in &trend[1..] {
        if t.count > extremes.peak.1 {
            extremes.peak = (t.year, t.count);
        }
        if t.count < extremes.trough.1 {
            extremes.trough = (t.year, t.count);
        }
    }
    Some(extremes)
}

/// Broad magnitude bands: below 7, 7 up to 8, 8 and above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MagnitudeClass {
    Strong,
    Major,
    Great,
}

impl MagnitudeClass {
    pub const ALL: [MagnitudeClass; 3] =
        [MagnitudeClass::Strong, MagnitudeClass::Major, MagnitudeClass::Great];

    pub fn of(magnitude: f64) -> Self {
        if magnitude < 7.0 {
            MagnitudeClass::Strong
        } else if magnitude < 8.0 {
            MagnitudeClass::Major
        } else {
            MagnitudeClass::Great
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MagnitudeClass::Strong => "6.0-6.9",
            MagnitudeClass::Major => "7.0-7.9",
            MagnitudeClass::Great => ">=8.0",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One year's events split by magnitude class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearClassShare {
    pub year: i32,
    /// Counts indexed like [`MagnitudeClass::ALL`].
    pub counts: [u64; 3],
}

impl YearClassShare {
    pub fn count(&self, class: MagnitudeClass) -> u64 {
        self.counts[class.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Fraction of the year's classified events in `class` (0 when empty).
    pub fn share(&self, class: MagnitudeClass) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(class) as f64 / total as f64,
        }
    }
}

/// Per-year counts in each magnitude class, ascending by year. Events
/// without a plausible magnitude are not classified.
pub fn magnitude_classes(events: &[Event]) -> Vec<YearClassShare> {
    let mut per_year: BTreeMap<i32, [u64; 3]> = BTreeMap::new();
    for e in events {
        let Some(mag) = e.magnitude.filter(|&m| is_plausible_magnitude(m)) else {
            continue;
        };
        per_year.entry(e.year).or_insert([0; 3])[MagnitudeClass::of(mag).index()] += 1;
    }
    per_year
        .into_iter()
        .map(|(year, counts)| YearClassShare { year, counts })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassPeak {
    pub class: MagnitudeClass,
    pub year: i32,
    pub count: u64,
}

/// Year with the most events of each class, earliest on ties. Classes
/// that never occur are left out.
pub fn class_peaks(shares: &[YearClassShare]) -> Vec<ClassPeak> {
    MagnitudeClass::ALL
        .into_iter()
        .filter_map(|class| {
            let mut best: Option<ClassPeak> = None;
            for share in shares {
                let count = share.count(class);
                if count > best.map_or(0, |b| b.count) {
                    best = Some(ClassPeak { class, year: share.year, count });
                }
            }
            best
        })
        .collect()
}

/// Histogram of magnitudes with bins aligned to multiples of `step`.
///
/// Bins run contiguously from the lowest to the highest populated one,
/// unless that would take more than `MAX_CONTIGUOUS_BINS` bins; then only
/// populated bins are listed. Events without a plausible magnitude are
/// ignored.
pub fn magnitude_histogram(events: &[Event], step: f64) -> Vec<MagnitudeBin> {
    if !(step > 0.0 && step.is_finite()) {
        return Vec::new();
    }
    let mut per_bin: BTreeMap<i64, u64> = BTreeMap::new();
    for mag in events
        .iter()
        .filter_map(|e| e.magnitude)
        .filter(|&m| is_plausible_magnitude(m))
    {
        let idx = (mag / step + BIN_EPSILON).floor() as i64;
        *per_bin.entry(idx).or_insert(0) += 1;
    }
    let (Some(&lo), Some(&hi)) = (per_bin.keys().next(), per_bin.keys().next_back()) else {
        return Vec::new();
    };

    let bin = |idx: i64, count: u64| MagnitudeBin {
        start: idx as f64 * step,
        end: (idx as f64 + 1.0) * step,
        count,
    };
    let span = hi.checked_sub(lo).and_then(|d| d.checked_add(1));
    match span {
        Some(span) if span <= MAX_CONTIGUOUS_BINS => (lo..=hi)
            .map(|idx| bin(idx, per_bin.get(&idx).copied().unwrap_or(0)))
            .collect(),
        _ => {
            log::debug!("magnitude histogram too wide for step {step}, listing populated bins");
            per_bin.into_iter().map(|(idx, count)| bin(idx, count)).collect()
        }
    }
}

/// Most populated bin; the lowest one on ties.
pub fn peak_bin(bins: &[MagnitudeBin]) -> Option<&MagnitudeBin> {
    bins.iter()
        .fold(None, |best: Option<&MagnitudeBin>, bin| match best {
            Some(b) if b.count >= bin.count => Some(b),
            _ => Some(bin),
        })
}
