//! Event table parsing (CSV or TSV with a header row).

use crate::error::{IngestError, Resource};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const TIME_COLUMN: &str = "time";
const LATITUDE_COLUMN: &str = "latitude";
const LONGITUDE_COLUMN: &str = "longitude";
const MAGNITUDE_COLUMN: &str = "mag";

/// Magnitudes outside this range are read as missing.
pub const MIN_MAGNITUDE: f64 = -2.0;
pub const MAX_MAGNITUDE: f64 = 12.0;

/// Naive timestamp layouts tried after RFC 3339.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// One earthquake record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub timestamp_raw: String,
    pub year: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: Option<f64>,
}

/// Field separator of the event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Tab if the header line contains one, comma otherwise.
    #[default]
    Auto,
    Comma,
    Tab,
}

impl Delimiter {
    fn resolve(self, text: &str) -> Delimiter {
        match self {
            Delimiter::Auto => {
                let header = text.lines().next().unwrap_or("");
                if header.contains('\t') {
                    Delimiter::Tab
                } else {
                    Delimiter::Comma
                }
            }
            other => other,
        }
    }

    fn byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma | Delimiter::Auto => b',',
        }
    }
}

/// Column positions resolved from the header row.
struct Columns {
    time: usize,
    latitude: usize,
    longitude: usize,
    magnitude: Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                IngestError::schema(format!("event table has no `{name}` column"))
            })
        };
        Ok(Self {
            time: require(TIME_COLUMN)?,
            latitude: require(LATITUDE_COLUMN)?,
            longitude: require(LONGITUDE_COLUMN)?,
            magnitude: find(MAGNITUDE_COLUMN),
        })
    }
}

/// Parse the event table.
///
/// Fails only when the header lacks `time`, `latitude` or `longitude`.
/// Rows with an unparsable timestamp or non-finite coordinates are dropped.
pub fn parse_events(text: &str, delimiter: Delimiter) -> Result<Vec<Event>, IngestError> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = delimiter.resolve(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .quoting(delimiter == Delimiter::Comma)
        .double_quote(true)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| IngestError::decode(Resource::Events, e))?
        .clone();
    let columns = Columns::from_header(&header)?;

    let mut events = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let parsed = record.ok().and_then(|r| parse_row(&r, &columns));
        match parsed {
            Some(event) => events.push(event),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::info!("skipped {skipped} malformed event rows");
    }
    log::debug!("parsed {} events ({:?}-delimited)", events.len(), delimiter);
    Ok(events)
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Option<Event> {
    let raw_time = record.get(columns.time)?;
    let year = parse_timestamp(raw_time)?.year();
    let latitude = parse_finite(record.get(columns.latitude)?)?;
    let longitude = parse_finite(record.get(columns.longitude)?)?;
    let magnitude = columns
        .magnitude
        .and_then(|i| record.get(i))
        .and_then(parse_finite)
        .filter(|&m| is_plausible_magnitude(m));

    Some(Event {
        timestamp_raw: raw_time.to_string(),
        year,
        latitude,
        longitude,
        magnitude,
    })
}

pub fn is_plausible_magnitude(mag: f64) -> bool {
    (MIN_MAGNITUDE..=MAX_MAGNITUDE).contains(&mag)
}

fn parse_finite(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a timestamp into a UTC date-time.
///
/// Accepts RFC 3339, naive date-times (`T` or space separated, optional
/// fractional seconds) and bare `YYYY-MM-DD` dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
