//! Spatial join of events to countries, and per-year rankings.
//!
//! Every event is tested against the country polygons in load order and
//! attributed to the first one containing it. There is no spatial index:
//! a bounding-box check rejects far-away polygons before the exact test,
//! which keeps the scan order (and therefore the result) unchanged.

mod ranking;
mod table;

pub use ranking::{top_n, top_n_with, TieBreak, DEFAULT_TOP_N};
pub use table::{CountryCount, CountryYearCounts};

use crate::data::{CountryPolygon, Event};
use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct JoinOptions {
    /// Country names that are never assigned.
    pub exclude: Vec<String>,
    /// Classify events on the rayon pool. Counts are still accumulated in
    /// event order, so the table is identical either way.
    pub parallel: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            exclude: vec!["Antarctica".to_string()],
            parallel: true,
        }
    }
}

impl JoinOptions {
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e == name)
    }
}

struct Candidate<'a> {
    name: &'a str,
    bounds: Rect<f64>,
    geometry: &'a MultiPolygon<f64>,
}

/// First-match point classifier over a fixed polygon order.
pub struct Classifier<'a> {
    candidates: Vec<Candidate<'a>>,
}

impl<'a> Classifier<'a> {
    pub fn new(polygons: &'a [CountryPolygon], options: &JoinOptions) -> Self {
        let candidates = polygons
            .iter()
            .filter(|p| !options.is_excluded(&p.name))
            .filter_map(|p| {
                Some(Candidate {
                    name: &p.name,
                    bounds: p.geometry.bounding_rect()?,
                    geometry: &p.geometry,
                })
            })
            .collect();
        Self { candidates }
    }

    /// Name of the first polygon containing `(lon, lat)`.
    pub fn classify(&self, lon: f64, lat: f64) -> Option<&'a str> {
        let point = Point::new(lon, lat);
        self.candidates
            .iter()
            .find(|c| {
                let (min, max) = (c.bounds.min(), c.bounds.max());
                lon >= min.x
                    && lon <= max.x
                    && lat >= min.y
                    && lat <= max.y
                    && c.geometry.contains(&point)
            })
            .map(|c| c.name)
    }

    /// Number of polygons that can receive events.
    fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Count events per `(year, country)`.
///
/// Events outside every non-excluded polygon are not counted. Never fails;
/// empty inputs give an empty table.
pub fn build(
    events: &[Event],
    polygons: &[CountryPolygon],
    options: &JoinOptions,
) -> CountryYearCounts {
    let classifier = Classifier::new(polygons, options);
    let classify = |e: &Event| classifier.classify(e.longitude, e.latitude);

    let assignments: Vec<Option<&str>> = if options.parallel {
        events.par_iter().map(classify).collect()
    } else {
        events.iter().map(classify).collect()
    };

    let mut table = CountryYearCounts::default();
    let mut unmatched = 0usize;
    for (event, assignment) in events.iter().zip(&assignments) {
        match assignment {
            Some(name) => table.increment(event.year, name),
            None => unmatched += 1,
        }
    }

    log::info!(
        "attributed {} of {} events to {} countries ({} unattributed)",
        events.len() - unmatched,
        events.len(),
        classifier.len(),
        unmatched
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn rect(name: &str, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> CountryPolygon {
        let ring = LineString::from(vec![
            (min_lon, min_lat),
            (max_lon, min_lat),
            (max_lon, max_lat),
            (min_lon, max_lat),
            (min_lon, min_lat),
        ]);
        CountryPolygon::new(name, MultiPolygon::new(vec![Polygon::new(ring, vec![])]))
    }

    fn event(time: &str, year: i32, lat: f64, lon: f64) -> Event {
        Event {
            timestamp_raw: time.to_string(),
            year,
            latitude: lat,
            longitude: lon,
            magnitude: None,
        }
    }

    fn serial() -> JoinOptions {
        JoinOptions {
            parallel: false,
            ..JoinOptions::default()
        }
    }

    #[test]
    fn test_japan_indonesia_scenario() {
        let events = vec![
            event("2011-03-11", 2011, 38.3, 142.4),
            event("2011-03-11", 2011, 35.0, 135.0),
            event("2004-12-26", 2004, 3.3, 95.9),
        ];
        let polygons = vec![
            rect("Japan", 128.0, 30.0, 146.0, 46.0),
            rect("Indonesia", 94.0, -11.0, 142.0, 6.0),
        ];
        let table = build(&events, &polygons, &JoinOptions::default());

        assert_eq!(table.count(2011, "Japan"), 2);
        assert_eq!(table.count(2004, "Indonesia"), 1);
        assert_eq!(table.total(), 3);
        assert_eq!(
            top_n(&table, 2011, 5),
            vec![CountryCount {
                country: "Japan".into(),
                count: 2
            }]
        );
    }

    #[test]
    fn test_overlap_goes_to_first_polygon() {
        let events = vec![event("2010-01-01", 2010, 5.0, 5.0)];
        let a = rect("A", 0.0, 0.0, 10.0, 10.0);
        let b = rect("B", 2.0, 2.0, 12.0, 12.0);

        let forward = build(&events, &[a.clone(), b.clone()], &serial());
        assert_eq!(forward.count(2010, "A"), 1);
        assert_eq!(forward.count(2010, "B"), 0);

        let reversed = build(&events, &[b, a], &serial());
        assert_eq!(reversed.count(2010, "A"), 0);
        assert_eq!(reversed.count(2010, "B"), 1);
    }

    #[test]
    fn test_excluded_polygon_never_assigned() {
        let events = vec![
            event("2012-01-01", 2012, -80.0, 0.0),
            event("2012-01-02", 2012, -80.0, 10.0),
        ];
        let polygons = vec![
            rect("Antarctica", -180.0, -90.0, 180.0, -60.0),
            rect("Nowhere", 50.0, 50.0, 60.0, 60.0),
        ];
        let table = build(&events, &polygons, &JoinOptions::default());
        assert!(table.is_empty());
        assert!(top_n(&table, 2012, 5).iter().all(|c| c.country != "Antarctica"));
    }

    #[test]
    fn test_excluded_polygon_falls_through_to_next() {
        let events = vec![event("2012-01-01", 2012, 5.0, 5.0)];
        let polygons = vec![rect("Antarctica", 0.0, 0.0, 10.0, 10.0), rect("Under", 0.0, 0.0, 10.0, 10.0)];
        let table = build(&events, &polygons, &JoinOptions::default());
        assert_eq!(top_n(&table, 2012, 5)[0].country, "Under");
    }

    #[test]
    fn test_ocean_events_dropped_and_sums_bounded() {
        let events = vec![
            event("2013-01-01", 2013, 5.0, 5.0),
            event("2013-01-02", 2013, -40.0, -140.0),
            event("2013-01-03", 2013, 6.0, 6.0),
            event("2014-01-01", 2014, 0.0, 100.0),
        ];
        let polygons = vec![rect("Land", 0.0, 0.0, 10.0, 10.0)];
        let table = build(&events, &polygons, &serial());

        for year in [2013, 2014] {
            let in_year = events.iter().filter(|e| e.year == year).count() as u64;
            assert!(table.year_total(year) <= in_year);
        }
        assert_eq!(table.year_total(2013), 2);
        assert_eq!(table.year_total(2014), 0);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let polygons = vec![
            rect("West", -10.0, -10.0, 0.0, 10.0),
            rect("East", 0.0, -10.0, 10.0, 10.0),
            rect("Overlap", -5.0, -5.0, 5.0, 5.0),
        ];
        let events: Vec<Event> = (0..500)
            .map(|i| {
                let lon = (i % 25) as f64 - 12.0;
                let lat = (i % 17) as f64 - 8.0;
                event("2000-01-01", 2000 + (i % 3), lat, lon)
            })
            .collect();

        let par = build(&events, &polygons, &JoinOptions::default());
        let ser = build(&events, &polygons, &serial());
        for year in 2000..2003 {
            assert_eq!(par.year_entries(year), ser.year_entries(year));
        }
    }

    #[test]
    fn test_empty_inputs() {
        let polygons = vec![rect("Land", 0.0, 0.0, 10.0, 10.0)];
        assert!(build(&[], &polygons, &JoinOptions::default()).is_empty());
        let events = vec![event("2011-01-01", 2011, 5.0, 5.0)];
        assert!(build(&events, &[], &JoinOptions::default()).is_empty());
    }

    #[test]
    fn test_classifier() {
        let polygons = vec![rect("Antarctica", 0.0, 0.0, 1.0, 1.0), rect("Land", 0.0, 0.0, 10.0, 10.0)];
        let classifier = Classifier::new(&polygons, &JoinOptions::default());
        assert_eq!(classifier.len(), 1);
        assert_eq!(classifier.classify(0.5, 0.5), Some("Land"));
        assert_eq!(classifier.classify(20.0, 0.5), None);
    }
}
