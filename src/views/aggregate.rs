use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::ReconstructedRow;
use crate::data::model::{GDP_PER_CAPITA, LIFE_EXPECTANCY, POPULATION};

use super::hover;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Whether any row was filled from an earlier year (footnote switch).
pub fn any_imputed(rows: &[ReconstructedRow]) -> bool {
    rows.iter().any(|r| r.is_imputed)
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// The `n` rows with the largest `measure`, descending.
///
/// The sort is stable, so equal values keep their input order. Rows
/// without the measure sort after every row that has it.
pub fn top_n<'a>(rows: &'a [ReconstructedRow], measure: &str, n: usize) -> Vec<&'a ReconstructedRow> {
    let mut ranked: Vec<&ReconstructedRow> = rows.iter().collect();
    ranked.sort_by(|a, b| match (a.measure(measure), b.measure(measure)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranked.truncate(n);
    ranked
}

/// One bar of the ranking view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBar {
    pub entity: String,
    pub value: Option<f64>,
    pub is_imputed: bool,
    pub source_year: i32,
    pub hover: String,
}

pub fn ranking_bars(rows: &[ReconstructedRow], measure: &str, n: usize) -> Vec<RankedBar> {
    top_n(rows, measure, n)
        .into_iter()
        .map(|row| RankedBar {
            entity: row.entity().to_string(),
            value: row.measure(measure),
            is_imputed: row.is_imputed,
            source_year: row.source_year,
            hover: hover::ranking_hover(row, measure),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Grouping by category
// ---------------------------------------------------------------------------

/// Sum of a measure over one category, with imputation counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Rows missing the measure contribute nothing.
    pub total: f64,
    pub entity_count: usize,
    pub imputed_count: usize,
}

/// Group rows by category and sum `measure`. Sorted by category name.
pub fn category_totals(rows: &[ReconstructedRow], measure: &str) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<&str, CategoryTotal> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry(row.category())
            .or_insert_with(|| CategoryTotal {
                category: row.category().to_string(),
                total: 0.0,
                entity_count: 0,
                imputed_count: 0,
            });
        entry.total += row.measure(measure).unwrap_or(0.0);
        entry.entity_count += 1;
        if row.is_imputed {
            entry.imputed_count += 1;
        }
    }
    groups.into_values().collect()
}

// ---------------------------------------------------------------------------
// Bubble chart
// ---------------------------------------------------------------------------

/// Which measures drive the bubble chart axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleAxes {
    pub x: String,
    pub y: String,
    pub size: String,
}

impl Default for BubbleAxes {
    fn default() -> Self {
        BubbleAxes {
            x: GDP_PER_CAPITA.to_string(),
            y: LIFE_EXPECTANCY.to_string(),
            size: POPULATION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubblePoint {
    pub entity: String,
    pub category: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub is_imputed: bool,
    pub source_year: i32,
    pub hover: String,
}

/// One point per row that has all three axis measures.
pub fn bubble_points(rows: &[ReconstructedRow], axes: &BubbleAxes) -> Vec<BubblePoint> {
    let names = [axes.x.as_str(), axes.y.as_str(), axes.size.as_str()];
    rows.iter()
        .filter_map(|row| {
            let (x, y, size) = (
                row.measure(&axes.x)?,
                row.measure(&axes.y)?,
                row.measure(&axes.size)?,
            );
            Some(BubblePoint {
                entity: row.entity().to_string(),
                category: row.category().to_string(),
                x,
                y,
                size,
                is_imputed: row.is_imputed,
                source_year: row.source_year,
                hover: hover::bubble_hover(row, &names),
            })
        })
        .collect()
}
