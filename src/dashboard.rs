//! The dashboard: injected data sources in, per-year views out.
//!
//! A [`Dashboard`] owns the current [`Snapshot`] behind an `Arc`. Reloading
//! builds a complete new snapshot first and only then replaces the old one,
//! so a failed reload (or a reader holding the previous `Arc`) never sees a
//! half-built table.

use crate::config::DashboardConfig;
use crate::data::{parse_country_polygons, parse_events, CountryPolygon, Delimiter, Event};
use crate::error::{IngestError, Resource};
use crate::join::{self, top_n_with, CountryCount, CountryYearCounts, JoinOptions, TieBreak};
use crate::source::DataSource;
use crate::stats::{self, MagnitudeBin, YearClassShare, YearTotal, DEFAULT_MAGNITUDE_STEP};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub delimiter: Delimiter,
    pub country_objects: Vec<String>,
    pub join: JoinOptions,
    pub top_n: usize,
    pub tie_break: TieBreak,
}

impl From<&DashboardConfig> for DashboardOptions {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            country_objects: config.country_objects.clone(),
            join: config.join_options(),
            top_n: config.top_n,
            tie_break: config.tie_break,
        }
    }
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

/// Everything derived from one ingestion cycle.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub events: Vec<Event>,
    pub polygons: Vec<CountryPolygon>,
    pub table: CountryYearCounts,
    pub trend: Vec<YearTotal>,
    pub magnitudes: Vec<MagnitudeBin>,
    pub classes: Vec<YearClassShare>,
}

impl Snapshot {
    pub fn ingest(
        events: &[u8],
        mut countries: Vec<u8>,
        options: &DashboardOptions,
    ) -> Result<Self, IngestError> {
        let text = std::str::from_utf8(events).map_err(|e| IngestError::decode(Resource::Events, e))?;
        let events = parse_events(text, options.delimiter)?;
        let polygons = parse_country_polygons(&mut countries, &options.country_objects)?;
        if polygons.is_empty() {
            log::warn!("country layer has no polygons; no event will be attributed");
        }

        let table = join::build(&events, &polygons, &options.join);
        let trend = stats::yearly_trend(&events);
        let magnitudes = stats::magnitude_histogram(&events, DEFAULT_MAGNITUDE_STEP);
        let classes = stats::magnitude_classes(&events);
        Ok(Self {
            events,
            polygons,
            table,
            trend,
            magnitudes,
            classes,
        })
    }

    /// First and last year present in the event table.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        Some((self.trend.first()?.year, self.trend.last()?.year))
    }

    pub fn year_events(&self, year: i32) -> u64 {
        self.trend
            .iter()
            .find(|t| t.year == year)
            .map_or(0, |t| t.count)
    }
}

/// What a sink gets to draw for one year.
#[derive(Debug, Clone, Serialize)]
pub struct YearView {
    pub year: i32,
    pub top: Vec<CountryCount>,
    /// All events of the year, attributed or not.
    pub year_events: u64,
    /// Events of the year attributed to some country.
    pub attributed: u64,
    #[serde(skip)]
    pub epicenters: Vec<Event>,
}

/// A consumer of per-year views.
pub trait RenderSink {
    fn render(&mut self, view: &YearView) -> Result<()>;
}

/// Plain-text leaderboard.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RenderSink for TextSink<W> {
    fn render(&mut self, view: &YearView) -> Result<()> {
        writeln!(
            self.out,
            "{}: {} events, {} in countries",
            view.year, view.year_events, view.attributed
        )?;
        let width = view.top.iter().map(|c| c.country.chars().count()).max().unwrap_or(0);
        for (rank, entry) in view.top.iter().enumerate() {
            writeln!(
                self.out,
                "{:>3}. {:<width$}  {:>5}",
                rank + 1,
                entry.country,
                entry.count
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON object per view, newline separated.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RenderSink for JsonSink<W> {
    fn render(&mut self, view: &YearView) -> Result<()> {
        serde_json::to_writer(&mut self.out, view)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

pub struct Dashboard {
    events: Box<dyn DataSource>,
    countries: Box<dyn DataSource>,
    options: DashboardOptions,
    snapshot: Arc<Snapshot>,
    sinks: Vec<Box<dyn RenderSink>>,
}

impl Dashboard {
    /// Create an empty dashboard; call [`reload`](Self::reload) to fill it.
    pub fn new(
        events: Box<dyn DataSource>,
        countries: Box<dyn DataSource>,
        options: DashboardOptions,
    ) -> Self {
        Self {
            events,
            countries,
            options,
            snapshot: Arc::new(Snapshot::default()),
            sinks: Vec::new(),
        }
    }

    /// Fetch both resources and rebuild everything. On error the current
    /// snapshot stays in place.
    pub fn reload(&mut self) -> Result<(), IngestError> {
        let events = fetch(self.events.as_ref(), Resource::Events)?;
        let countries = fetch(self.countries.as_ref(), Resource::Countries)?;
        let snapshot = Snapshot::ingest(&events, countries, &self.options)?;
        log::info!(
            "loaded {} events ({} in countries), {} countries, years {:?}",
            snapshot.events.len(),
            snapshot.table.total(),
            snapshot.polygons.len(),
            snapshot.year_range()
        );
        if snapshot.table.is_empty() && !snapshot.events.is_empty() {
            log::warn!("no event fell inside a country polygon");
        }
        self.snapshot = Arc::new(snapshot);
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn tie_break(&self) -> TieBreak {
        self.options.tie_break
    }

    pub fn set_tie_break(&mut self, tie_break: TieBreak) {
        self.options.tie_break = tie_break;
    }

    pub fn top(&self, year: i32) -> Vec<CountryCount> {
        top_n_with(&self.snapshot.table, year, self.options.top_n, self.options.tie_break)
    }

    pub fn view(&self, year: i32) -> YearView {
        let snapshot = &self.snapshot;
        YearView {
            year,
            top: self.top(year),
            year_events: snapshot.year_events(year),
            attributed: snapshot.table.year_total(year),
            epicenters: snapshot.events.iter().filter(|e| e.year == year).cloned().collect(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn RenderSink>) {
        self.sinks.push(sink);
    }

    /// Render `year` to every registered sink.
    pub fn publish(&mut self, year: i32) -> Result<()> {
        let view = self.view(year);
        for sink in &mut self.sinks {
            sink.render(&view)?;
        }
        Ok(())
    }

    /// Clamp a year into the loaded data's range.
    pub fn clamp_year(&self, year: i32) -> i32 {
        match self.snapshot.year_range() {
            Some((first, last)) => year.clamp(first, last),
            None => year,
        }
    }

    pub fn step_year(&self, year: i32, delta: i32) -> i32 {
        self.clamp_year(year.saturating_add(delta))
    }
}

fn fetch(source: &dyn DataSource, resource: Resource) -> Result<Vec<u8>, IngestError> {
    log::debug!("fetching {resource} from {}", source.describe());
    source
        .fetch()
        .map_err(|e| IngestError::ResourceUnavailable {
            resource,
            location: source.describe(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::source::StaticSource;
    use serde_json::json;
    use std::sync::Mutex;

    const EVENTS: &str = "time,latitude,longitude,mag\n\
                          2011-03-11T05:46:24.120Z,38.3,142.4,9.1\n\
                          2011-04-07T14:32:43.290Z,35.0,135.0,7.1\n\
                          ,,\n\
                          2011-06-01T00:00:00Z,-40.0,-140.0,6.2\n\
                          2004-12-26T00:58:53.450Z,3.3,95.9,9.1\n";

    fn countries() -> Vec<u8> {
        json!({
            "type": "Topology",
            "arcs": [
                [[128.0, 30.0], [146.0, 30.0], [146.0, 46.0], [128.0, 46.0], [128.0, 30.0]],
                [[94.0, -11.0], [142.0, -11.0], [142.0, 6.0], [94.0, 6.0], [94.0, -11.0]],
                [[-180.0, -90.0], [180.0, -90.0], [180.0, -60.0], [-180.0, -60.0], [-180.0, -90.0]]
            ],
            "objects": {
                "countries": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Polygon", "arcs": [[2]], "properties": { "name": "Antarctica" } },
                        { "type": "Polygon", "arcs": [[0]], "id": "392", "properties": { "name": "Japan" } },
                        { "type": "Polygon", "arcs": [[1]], "id": "360", "properties": { "name": "Indonesia" } }
                    ]
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    /// Serves whatever bytes are currently stored, or a 503 when empty.
    struct SwitchableSource(Arc<Mutex<Option<Vec<u8>>>>);

    impl DataSource for SwitchableSource {
        fn describe(&self) -> String {
            "switchable".to_string()
        }

        fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            self.0.lock().unwrap().clone().ok_or(FetchError::Status(503))
        }
    }

    struct RecordingSink(Arc<Mutex<Vec<YearView>>>);

    impl RenderSink for RecordingSink {
        fn render(&mut self, view: &YearView) -> Result<()> {
            self.0.lock().unwrap().push(view.clone());
            Ok(())
        }
    }

    fn dashboard() -> Dashboard {
        let mut d = Dashboard::new(
            Box::new(StaticSource::new("events", EVENTS)),
            Box::new(StaticSource::new("countries", countries())),
            DashboardOptions::default(),
        );
        d.reload().unwrap();
        d
    }

    #[test]
    fn test_end_to_end() {
        let d = dashboard();
        let snapshot = d.snapshot();
        assert_eq!(snapshot.events.len(), 4);
        assert_eq!(snapshot.polygons.len(), 3);
        assert_eq!(snapshot.table.count(2011, "Japan"), 2);
        assert_eq!(snapshot.table.count(2004, "Indonesia"), 1);
        assert_eq!(snapshot.year_range(), Some((2004, 2011)));
        assert_eq!(snapshot.classes.len(), 2);
        assert_eq!(snapshot.classes[1].counts, [1, 1, 1]);

        let view = d.view(2011);
        assert_eq!(view.top, vec![CountryCount { country: "Japan".into(), count: 2 }]);
        assert_eq!(view.year_events, 3);
        assert_eq!(view.attributed, 2);
        assert_eq!(view.epicenters.len(), 3);
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let events = Arc::new(Mutex::new(Some(EVENTS.as_bytes().to_vec())));
        let mut d = Dashboard::new(
            Box::new(SwitchableSource(Arc::clone(&events))),
            Box::new(StaticSource::new("countries", countries())),
            DashboardOptions::default(),
        );
        d.reload().unwrap();
        let before = d.snapshot();

        *events.lock().unwrap() = None;
        let err = d.reload().unwrap_err();
        assert!(matches!(
            err,
            IngestError::ResourceUnavailable { resource: Resource::Events, .. }
        ));
        assert!(Arc::ptr_eq(&before, &d.snapshot()));

        *events.lock().unwrap() = Some(b"time,lat,longitude\n2011-03-11,38.3,142.4\n".to_vec());
        assert!(matches!(d.reload(), Err(IngestError::Schema(_))));
        assert_eq!(d.snapshot().table.count(2011, "Japan"), 2);
    }

    #[test]
    fn test_reload_swaps_in_new_table() {
        let events = Arc::new(Mutex::new(Some(EVENTS.as_bytes().to_vec())));
        let mut d = Dashboard::new(
            Box::new(SwitchableSource(Arc::clone(&events))),
            Box::new(StaticSource::new("countries", countries())),
            DashboardOptions::default(),
        );
        d.reload().unwrap();
        let old = d.snapshot();

        *events.lock().unwrap() =
            Some(b"time,latitude,longitude\n2015-04-25,0.0,100.0\n".to_vec());
        d.reload().unwrap();
        assert_eq!(old.table.count(2011, "Japan"), 2);
        assert_eq!(d.snapshot().table.count(2011, "Japan"), 0);
        assert_eq!(d.snapshot().table.count(2015, "Indonesia"), 1);
    }

    #[test]
    fn test_extreme_magnitude_does_not_abort_reload() {
        let events = "time,latitude,longitude,mag\n2011-03-11,38.3,142.4,1e300\n2011-03-12,38.3,142.4,9.1\n";
        let mut d = Dashboard::new(
            Box::new(StaticSource::new("events", events)),
            Box::new(StaticSource::new("countries", countries())),
            DashboardOptions::default(),
        );
        d.reload().unwrap();
        let snapshot = d.snapshot();
        assert_eq!(snapshot.table.count(2011, "Japan"), 2);
        assert_eq!(snapshot.magnitudes.iter().map(|b| b.count).sum::<u64>(), 1);
    }

    #[test]
    fn test_excluded_country_not_ranked() {
        let events = "time,latitude,longitude\n2012-01-01,-80.0,0.0\n2012-01-02,40.0,140.0\n";
        let mut d = Dashboard::new(
            Box::new(StaticSource::new("events", events)),
            Box::new(StaticSource::new("countries", countries())),
            DashboardOptions::default(),
        );
        d.reload().unwrap();
        let top = d.top(2012);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].country, "Japan");
    }

    #[test]
    fn test_publish_to_sinks() {
        let mut d = dashboard();
        let seen = Arc::new(Mutex::new(Vec::new()));
        d.add_sink(Box::new(RecordingSink(Arc::clone(&seen))));
        d.publish(2004).unwrap();
        d.publish(1999).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].top[0].country, "Indonesia");
        assert!(seen[1].top.is_empty());
    }

    #[test]
    fn test_text_and_json_sinks() {
        let d = dashboard();
        let view = d.view(2011);

        let mut text = Vec::new();
        TextSink::new(&mut text).render(&view).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("2011: 3 events, 2 in countries"));
        assert!(text.contains("1. Japan"));

        let mut json = Vec::new();
        JsonSink::new(&mut json).render(&view).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["year"], 2011);
        assert_eq!(value["top"][0]["country"], "Japan");
        assert_eq!(value["top"][0]["count"], 2);
        assert!(value.get("epicenters").is_none());
    }

    #[test]
    fn test_year_navigation() {
        let d = dashboard();
        assert_eq!(d.clamp_year(1990), 2004);
        assert_eq!(d.clamp_year(2030), 2011);
        assert_eq!(d.step_year(2010, 1), 2011);
        assert_eq!(d.step_year(2011, 1), 2011);
        assert_eq!(d.step_year(2005, -5), 2004);
    }

    #[test]
    fn test_tie_break_switch() {
        let events = "time,latitude,longitude\n2012-01-01,40.0,140.0\n2012-01-02,0.0,100.0\n";
        let mut d = Dashboard::new(
            Box::new(StaticSource::new("events", events)),
            Box::new(StaticSource::new("countries", countries())),
            DashboardOptions::default(),
        );
        d.reload().unwrap();
        assert_eq!(d.top(2012)[0].country, "Japan");
        d.set_tie_break(TieBreak::Alphabetical);
        assert_eq!(d.top(2012)[0].country, "Indonesia");
    }
}
