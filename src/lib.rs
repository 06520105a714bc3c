//! Earthquake dashboard core: ingest an event table and country
//! boundaries, attribute each quake to the first country containing it,
//! and rank countries per year.

pub mod braille;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod join;
pub mod map;
pub mod source;
pub mod stats;

pub use dashboard::{Dashboard, DashboardOptions, RenderSink, Snapshot, YearView};
pub use error::IngestError;
