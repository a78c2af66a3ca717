use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Standard gapminder measure columns.
pub const POPULATION: &str = "pop";
pub const GDP_PER_CAPITA: &str = "gdpPercap";
pub const LIFE_EXPECTANCY: &str = "lifeExp";

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// One (entity, category, year) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Country name.
    pub entity: String,
    /// Grouping label, e.g. the continent.
    pub category: String,
    pub year: i32,
    /// Numeric columns: measure name → value. Empty or non-numeric
    /// cells are simply absent.
    pub measures: BTreeMap<String, f64>,
}

impl Record {
    pub fn new(entity: impl Into<String>, category: impl Into<String>, year: i32) -> Self {
        Record {
            entity: entity.into(),
            category: category.into(),
            year,
            measures: BTreeMap::new(),
        }
    }

    /// Builder-style helper to attach a measure.
    pub fn with_measure(mut self, name: impl Into<String>, value: f64) -> Self {
        self.measures.insert(name.into(), value);
        self
    }

    pub fn measure(&self, name: &str) -> Option<f64> {
        self.measures.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// ReconstructedRow – a record relabelled for a target year
// ---------------------------------------------------------------------------

/// A record standing in for a target year, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructedRow {
    #[serde(flatten)]
    pub record: Record,
    pub is_imputed: bool,
    /// Equal to `record.year` unless imputed, in which case it is the
    /// year the values were actually observed.
    pub source_year: i32,
}

impl ReconstructedRow {
    pub fn entity(&self) -> &str {
        &self.record.entity
    }

    pub fn category(&self) -> &str {
        &self.record.category
    }

    pub fn measure(&self, name: &str) -> Option<f64> {
        self.record.measure(name)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed indices. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All records, in source order.
    pub records: Vec<Record>,
    /// Distinct entities in first-seen order.
    pub entities: Vec<String>,
    /// Category of each entity (first record wins).
    pub categories: HashMap<String, String>,
    /// Every measure name that appears in at least one record.
    pub measure_names: BTreeSet<String>,
    year_range: Option<(i32, i32)>,
}

impl Dataset {
    /// Build indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut entities = Vec::new();
        let mut categories = HashMap::new();
        let mut measure_names = BTreeSet::new();
        let mut year_range: Option<(i32, i32)> = None;

        for rec in &records {
            if !categories.contains_key(&rec.entity) {
                categories.insert(rec.entity.clone(), rec.category.clone());
                entities.push(rec.entity.clone());
            }
            measure_names.extend(rec.measures.keys().cloned());
            year_range = Some(match year_range {
                Some((lo, hi)) => (lo.min(rec.year), hi.max(rec.year)),
                None => (rec.year, rec.year),
            });
        }

        Dataset {
            records,
            entities,
            categories,
            measure_names,
            year_range,
        }
    }

    /// Minimal stand-in used when the real source cannot be loaded, so
    /// downstream views never see an empty table.
    pub fn placeholder() -> Self {
        let record = Record::new("No data", "Unknown", 2007)
            .with_measure(POPULATION, 0.0)
            .with_measure(GDP_PER_CAPITA, 0.0)
            .with_measure(LIFE_EXPECTANCY, 0.0);
        Dataset::from_records(vec![record])
    }

    /// Inclusive `(min_year, max_year)`, `None` for an empty dataset.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        self.year_range
    }

    pub fn category_of(&self, entity: &str) -> Option<&str> {
        self.categories.get(entity).map(String::as_str)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_first_seen_order() {
        let ds = Dataset::from_records(vec![
            Record::new("Chad", "Africa", 1990).with_measure(POPULATION, 6.0),
            Record::new("Peru", "Americas", 1985).with_measure(LIFE_EXPECTANCY, 61.0),
            Record::new("Chad", "Africa", 2001),
        ]);

        assert_eq!(ds.entities, vec!["Chad", "Peru"]);
        assert_eq!(ds.category_of("Peru"), Some("Americas"));
        assert_eq!(ds.year_range(), Some((1985, 2001)));
        assert_eq!(
            ds.measure_names.iter().collect::<Vec<_>>(),
            vec![LIFE_EXPECTANCY, POPULATION]
        );
    }

    #[test]
    fn empty_dataset_has_no_year_range() {
        let ds = Dataset::from_records(Vec::new());
        assert!(ds.is_empty());
        assert_eq!(ds.year_range(), None);
    }

    #[test]
    fn placeholder_is_never_empty() {
        let ds = Dataset::placeholder();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].measure(POPULATION), Some(0.0));
    }

    #[test]
    fn reconstructed_row_serialises_flat() {
        let row = ReconstructedRow {
            record: Record::new("Chad", "Africa", 2007).with_measure(POPULATION, 1.0),
            is_imputed: true,
            source_year: 2002,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["entity"], "Chad");
        assert_eq!(json["year"], 2007);
        assert_eq!(json["source_year"], 2002);
        assert_eq!(json["measures"]["pop"], 1.0);
    }
}
