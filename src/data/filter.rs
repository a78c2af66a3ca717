use std::collections::HashSet;

use serde::Serialize;

use super::model::Dataset;

/// One raw observation of a measure, as plotted on a time-series chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub entity: String,
    pub year: i32,
    pub value: f64,
}

/// Return indices of records whose entity is in `entities`.
///
/// An empty selection matches nothing.
pub fn filtered_indices<S: AsRef<str>>(dataset: &Dataset, entities: &[S]) -> Vec<usize> {
    let selected: HashSet<&str> = entities.iter().map(|e| e.as_ref()).collect();
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selected.contains(rec.entity.as_str()))
        .map(|(i, _)| i)
        .collect()
}

/// Raw per-year values of `measure` for the selected entities.
///
/// No gap filling happens here: a time series shows every year that was
/// actually observed. Records without the measure are skipped. Points
/// keep dataset order.
pub fn entity_series<S: AsRef<str>>(
    dataset: &Dataset,
    entities: &[S],
    measure: &str,
) -> Vec<SeriesPoint> {
    filtered_indices(dataset, entities)
        .into_iter()
        .filter_map(|idx| {
            let rec = &dataset.records[idx];
            rec.measure(measure).map(|value| SeriesPoint {
                entity: rec.entity.clone(),
                year: rec.year,
                value,
            })
        })
        .collect()
}
