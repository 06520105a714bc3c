//! Dashboard configuration, read from an optional TOML file.

use crate::data::{Delimiter, DEFAULT_COUNTRY_OBJECTS};
use crate::join::{JoinOptions, TieBreak, DEFAULT_TOP_N};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_YEAR: i32 = 2011;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Event table: file path or http(s) URL.
    pub events: String,
    /// Country geometry: file path or http(s) URL.
    pub countries: String,
    /// Topology objects tried, in order, for the country layer.
    pub country_objects: Vec<String>,
    /// Countries never assigned an event.
    pub exclude: Vec<String>,
    pub top_n: usize,
    pub default_year: i32,
    pub fetch_timeout_secs: u64,
    pub tie_break: TieBreak,
    pub delimiter: Delimiter,
    pub parallel: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            events: "data/earthquakes_2000_2025_m6.csv".to_string(),
            countries: "data/countries-110m.json".to_string(),
            country_objects: DEFAULT_COUNTRY_OBJECTS.iter().map(|s| s.to_string()).collect(),
            exclude: vec!["Antarctica".to_string()],
            top_n: DEFAULT_TOP_N,
            default_year: DEFAULT_YEAR,
            fetch_timeout_secs: 30,
            tie_break: TieBreak::default(),
            delimiter: Delimiter::default(),
            parallel: true,
        }
    }
}

impl DashboardConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("cannot parse config {}", path.display()))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn join_options(&self) -> JoinOptions {
        JoinOptions {
            exclude: self.exclude.clone(),
            parallel: self.parallel,
        }
    }
}
