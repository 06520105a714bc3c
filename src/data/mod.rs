//! Ingestion: event table and country geometry into typed records.

pub mod events;

pub use events::{parse_events, Delimiter, Event};

use crate::error::{IngestError, Resource};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::feature::Id;
use geojson::{Feature, GeoJson, Geometry, JsonObject, JsonValue, Value};
use topojson::{to_geojson, TopoJson, Topology};

/// Object names tried, in order, when the caller does not name one.
pub const DEFAULT_COUNTRY_OBJECTS: [&str; 3] =
    ["countries", "countries110m", "ne_110m_admin_0_countries"];

/// Properties consulted for a display name, highest precedence first.
const NAME_PROPERTIES: [&str; 3] = ["name", "ADMIN", "name_long"];

/// A named country boundary.
#[derive(Debug, Clone)]
pub struct CountryPolygon {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl CountryPolygon {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// Exterior rings as lon/lat polylines, for drawing.
    pub fn outlines(&self) -> impl Iterator<Item = Vec<(f64, f64)>> + '_ {
        self.geometry
            .iter()
            .map(|p| p.exterior().coords().map(|c| (c.x, c.y)).collect())
    }
}

/// Resolve a display name for a country feature.
///
/// `name`, then `ADMIN`, then `name_long` (first usable value wins),
/// then the feature id, then the feature's position in its collection.
pub fn country_name(properties: Option<&JsonObject>, id: Option<&Id>, index: usize) -> String {
    if let Some(props) = properties {
        for key in NAME_PROPERTIES {
            if let Some(name) = props.get(key).and_then(property_name) {
                return name;
            }
        }
    }
    match id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => index.to_string(),
    }
}

/// A property value usable as a name: non-empty strings, non-zero numbers,
/// `true`, or any array/object, rendered as text.
fn property_name(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        JsonValue::Bool(true) => Some("true".to_string()),
        JsonValue::Array(_) | JsonValue::Object(_) => Some(value.to_string()),
        _ => None,
    }
}

/// Parse country boundaries from a TopoJSON topology (or a GeoJSON
/// feature collection).
///
/// The first of `object_names` present in the topology is used; if none is,
/// this fails with [`IngestError::Schema`]. Features without polygonal
/// geometry are skipped.
pub fn parse_country_polygons(
    document: &mut [u8],
    object_names: &[String],
) -> Result<Vec<CountryPolygon>, IngestError> {
    let value: JsonValue = simd_json::serde::from_slice(document)
        .map_err(|e| IngestError::decode(Resource::Countries, e))?;

    let features = match value.get("type").and_then(JsonValue::as_str) {
        Some("Topology") => topology_features(&value, object_names)?,
        Some("FeatureCollection") | Some("Feature") => read_features(value)?,
        _ => {
            return Err(IngestError::schema(
                "country document is neither a TopoJSON topology nor a GeoJSON feature collection",
            ))
        }
    };

    Ok(polygons_from_features(&features))
}

/// Decode the first of `object_names` present in a topology into features.
fn topology_features(
    value: &JsonValue,
    object_names: &[String],
) -> Result<Vec<Feature>, IngestError> {
    let topology: Topology = match value.to_string().parse::<TopoJson>() {
        Ok(TopoJson::Topology(topology)) => topology,
        Ok(_) => return Err(IngestError::schema("country document is not a topology")),
        Err(e) => return Err(IngestError::decode(Resource::Countries, e)),
    };

    let Some(name) = object_names
        .iter()
        .find(|n| topology.objects.iter().any(|o| &o.name == *n))
    else {
        let mut present: Vec<&str> = topology.objects.iter().map(|o| o.name.as_str()).collect();
        present.sort_unstable();
        return Err(IngestError::schema(format!(
            "no country collection among {object_names:?} (topology has {present:?})"
        )));
    };
    log::debug!("decoding topology object `{name}`");

    let collection =
        to_geojson(&topology, name).map_err(|e| IngestError::decode(Resource::Countries, e))?;
    // Re-read through serde so the features use this crate's geojson types.
    let value = serde_json::to_value(&collection)
        .map_err(|e| IngestError::decode(Resource::Countries, e))?;
    read_features(value)
}

fn read_features(value: JsonValue) -> Result<Vec<Feature>, IngestError> {
    let geojson = serde_json::from_value::<GeoJson>(value)
        .map_err(|e| IngestError::decode(Resource::Countries, e))?;
    Ok(match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => Vec::new(),
    })
}

fn polygons_from_features(features: &[Feature]) -> Vec<CountryPolygon> {
    let mut polygons = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let name = country_name(feature.properties.as_ref(), feature.id.as_ref(), index);
        let mut parts = Vec::new();
        if let Some(ref geometry) = feature.geometry {
            collect_polygons(geometry, &mut parts);
        }
        if parts.is_empty() {
            log::debug!("country feature `{name}` has no polygon geometry");
            continue;
        }
        polygons.push(CountryPolygon::new(name, MultiPolygon::new(parts)));
    }
    log::info!("loaded {} country polygons", polygons.len());
    polygons
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon<f64>>) {
    match &geometry.value {
        Value::Polygon(rings) => out.extend(to_polygon(rings)),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().filter_map(|rings| to_polygon(rings)));
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        to_line_string(exterior),
        interiors.iter().map(|r| to_line_string(r)).collect(),
    ))
}

fn to_line_string(ring: &[Vec<f64>]) -> LineString<f64> {
    ring.iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect::<Vec<_>>()
        .into()
}
