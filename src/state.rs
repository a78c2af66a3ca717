use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::data::filter::{SeriesPoint, entity_series};
use crate::data::{Dataset, ReconstructedRow, reconstruct, reconstruct_all};
use crate::views::{self, BubbleAxes, BubblePoint, CategoryTotal, RankedBar, hover};

// ---------------------------------------------------------------------------
// View payloads handed to the presentation layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BubbleView {
    pub year: i32,
    pub axes: BubbleAxes,
    pub points: Vec<BubblePoint>,
    pub any_imputed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingView {
    pub year: i32,
    pub measure: String,
    pub bars: Vec<RankedBar>,
    pub footnote: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySlice {
    #[serde(flatten)]
    pub total: CategoryTotal,
    pub hover: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub year: i32,
    pub measure: String,
    pub slices: Vec<CategorySlice>,
    pub footnote: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Selections for one viewer session over a shared, read-only dataset.
///
/// Every view is rebuilt from scratch on each call; nothing derived from
/// the dataset is kept between calls.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Arc<Dataset>,
    year: i32,
    /// Entities shown on the time-series view.
    pub entities: Vec<String>,
    pub series_measure: String,
    pub axes: BubbleAxes,
    pub ranking_measure: String,
    pub top_n: usize,
}

impl Session {
    /// Start a session at the latest year with the configured selections.
    pub fn new(dataset: Arc<Dataset>, config: &Config) -> Self {
        let year = dataset.year_range().map(|(_, max)| max).unwrap_or_default();

        let mut entities: Vec<String> = config
            .default_entities
            .iter()
            .filter(|e| dataset.categories.contains_key(*e))
            .cloned()
            .collect();
        if entities.is_empty() {
            entities.extend(dataset.entities.first().cloned());
        }

        Session {
            dataset,
            year,
            entities,
            series_measure: config.series_measure.clone(),
            axes: config.axes.clone(),
            ranking_measure: config.ranking_measure.clone(),
            top_n: config.top_n,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Select a year, clamped into the dataset's range. Returns the year
    /// actually selected.
    pub fn set_year(&mut self, year: i32) -> i32 {
        self.year = match self.dataset.year_range() {
            Some((min, max)) => year.clamp(min, max),
            None => year,
        };
        self.year
    }

    pub fn set_entities(&mut self, entities: Vec<String>) {
        self.entities = entities;
    }

    /// Every entity, reconstructed for the selected year.
    pub fn rows(&self) -> Vec<ReconstructedRow> {
        reconstruct_all(&self.dataset, self.year)
    }

    /// Only the selected entities, reconstructed for the selected year.
    pub fn selected_rows(&self) -> Vec<ReconstructedRow> {
        reconstruct(&self.dataset, self.year, &self.entities)
    }

    pub fn bubble_view(&self) -> BubbleView {
        let rows = self.rows();
        BubbleView {
            year: self.year,
            axes: self.axes.clone(),
            points: views::bubble_points(&rows, &self.axes),
            any_imputed: views::any_imputed(&rows),
        }
    }

    pub fn ranking_view(&self) -> RankingView {
        let rows = self.rows();
        let bars = views::ranking_bars(&rows, &self.ranking_measure, self.top_n);
        let footnote = bars
            .iter()
            .any(|b| b.is_imputed)
            .then_some(hover::RANKING_FOOTNOTE);
        RankingView {
            year: self.year,
            measure: self.ranking_measure.clone(),
            bars,
            footnote,
        }
    }

    pub fn category_view(&self) -> CategoryView {
        let rows = self.rows();
        let slices = views::category_totals(&rows, &self.ranking_measure)
            .into_iter()
            .map(|total| CategorySlice {
                hover: hover::category_hover(&total, &self.ranking_measure),
                total,
            })
            .collect();
        CategoryView {
            year: self.year,
            measure: self.ranking_measure.clone(),
            slices,
            footnote: views::any_imputed(&rows).then_some(hover::CATEGORY_FOOTNOTE),
        }
    }

    /// Raw yearly values for the selected entities; no gap filling.
    pub fn series(&self) -> Vec<SeriesPoint> {
        entity_series(&self.dataset, &self.entities, &self.series_measure)
    }
}
