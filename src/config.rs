use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::model::POPULATION;
use crate::data::loader::{ColumnNames, DataSource, DEFAULT_SOURCE};
use crate::views::BubbleAxes;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Runtime settings. Every field has a default, so a config file only
/// needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL or file path of the raw table.
    pub source: String,
    pub columns: ColumnNames,
    /// Initial entity selection for the time-series view.
    pub default_entities: Vec<String>,
    pub series_measure: String,
    pub axes: BubbleAxes,
    /// Measure used by the ranking and category views.
    pub ranking_measure: String,
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: DEFAULT_SOURCE.to_string(),
            columns: ColumnNames::default(),
            default_entities: vec!["Canada".to_string()],
            series_measure: POPULATION.to_string(),
            axes: BubbleAxes::default(),
            ranking_measure: POPULATION.to_string(),
            top_n: 15,
        }
    }
}

impl Config {
    /// Read a JSON config file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn data_source(&self) -> DataSource {
        DataSource::parse(&self.source)
    }
}
