use std::collections::HashMap;

use super::model::{Dataset, ReconstructedRow};

/// Best candidate records found for one requested entity.
#[derive(Debug, Clone, Copy, Default)]
struct Candidates {
    /// First record observed exactly at the target year.
    exact: Option<usize>,
    /// Record with the greatest year strictly before the target year.
    prior: Option<usize>,
}

/// Build one row per requested entity representing `target_year`.
///
/// For each entity, in the order given:
/// * a record at `target_year` is emitted as-is (`is_imputed = false`);
/// * otherwise the record from the latest earlier year is relabelled to
///   `target_year` and tagged with the year it came from;
/// * an entity with nothing at or before `target_year` is left out.
///
/// Repeated entity names are collapsed to their first occurrence. When an
/// entity has several records in the same year the first one in dataset
/// order is used. The dataset is scanned once.
pub fn reconstruct<S: AsRef<str>>(
    dataset: &Dataset,
    target_year: i32,
    entities: &[S],
) -> Vec<ReconstructedRow> {
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(entities.len());
    for entity in entities {
        let next = slots.len();
        slots.entry(entity.as_ref()).or_insert(next);
    }
    if slots.is_empty() {
        return Vec::new();
    }

    let mut candidates = vec![Candidates::default(); slots.len()];
    for (idx, rec) in dataset.records.iter().enumerate() {
        let Some(&slot) = slots.get(rec.entity.as_str()) else {
            continue;
        };
        let found = &mut candidates[slot];
        if rec.year == target_year {
            found.exact.get_or_insert(idx);
        } else if rec.year < target_year {
            // strictly greater keeps the earliest record on ties
            let better = match found.prior {
                Some(p) => rec.year > dataset.records[p].year,
                None => true,
            };
            if better {
                found.prior = Some(idx);
            }
        }
    }

    let mut rows = Vec::with_capacity(candidates.len());
    let mut imputed = 0usize;
    for found in candidates {
        if let Some(idx) = found.exact {
            rows.push(ReconstructedRow {
                record: dataset.records[idx].clone(),
                is_imputed: false,
                source_year: target_year,
            });
        } else if let Some(idx) = found.prior {
            let mut record = dataset.records[idx].clone();
            let source_year = record.year;
            record.year = target_year;
            rows.push(ReconstructedRow {
                record,
                is_imputed: true,
                source_year,
            });
            imputed += 1;
        }
    }

    log::debug!(
        "reconstructed {} rows for {target_year} ({} exact, {imputed} imputed, {} omitted)",
        rows.len(),
        rows.len() - imputed,
        slots.len() - rows.len()
    );
    rows
}

/// [`reconstruct`] over every entity in the dataset, in first-seen order.
pub fn reconstruct_all(dataset: &Dataset, target_year: i32) -> Vec<ReconstructedRow> {
    reconstruct(dataset, target_year, &dataset.entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Record, POPULATION};

    fn scenario() -> Dataset {
        Dataset::from_records(vec![
            Record::new("A", "X", 2000).with_measure(POPULATION, 10.0),
            Record::new("A", "X", 2005).with_measure(POPULATION, 20.0),
            Record::new("B", "Y", 2005).with_measure(POPULATION, 5.0),
        ])
    }

    #[test]
    fn exact_year_rows_are_not_imputed() {
        let rows = reconstruct(&scenario(), 2005, &["A", "B"]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity(), "A");
        assert_eq!(rows[0].record.year, 2005);
        assert_eq!(rows[0].measure(POPULATION), Some(20.0));
        assert!(!rows[0].is_imputed);
        assert_eq!(rows[0].source_year, 2005);
        assert_eq!(rows[1].entity(), "B");
        assert_eq!(rows[1].measure(POPULATION), Some(5.0));
        assert!(!rows[1].is_imputed);
    }

    #[test]
    fn missing_year_uses_latest_prior_record() {
        let rows = reconstruct(&scenario(), 2006, &["A", "B"]);

        assert_eq!(rows.len(), 2);
        for (row, pop) in rows.iter().zip([20.0, 5.0]) {
            assert_eq!(row.record.year, 2006);
            assert_eq!(row.measure(POPULATION), Some(pop));
            assert!(row.is_imputed);
            assert_eq!(row.source_year, 2005);
        }
    }

    #[test]
    fn nothing_before_target_year_yields_empty() {
        assert!(reconstruct(&scenario(), 1999, &["A", "B"]).is_empty());
    }

    #[test]
    fn closest_prior_not_nearest_overall() {
        let ds = Dataset::from_records(vec![
            Record::new("E", "X", 2005),
            Record::new("E", "X", 2000),
            Record::new("E", "X", 2008),
            Record::new("E", "X", 2003),
        ]);
        let rows = reconstruct(&ds, 2007, &["E"]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source_year, 2005);
        assert_eq!(rows[0].record.year, 2007);
        assert!(rows[0].is_imputed);
    }

    #[test]
    fn exact_match_wins_over_earlier_years() {
        let ds = Dataset::from_records(vec![
            Record::new("E", "X", 2001).with_measure(POPULATION, 1.0),
            Record::new("E", "X", 2004).with_measure(POPULATION, 4.0),
        ]);
        let rows = reconstruct(&ds, 2004, &["E"]);

        assert_eq!(rows[0].measure(POPULATION), Some(4.0));
        assert!(!rows[0].is_imputed);
    }

    #[test]
    fn entity_starting_after_target_is_omitted() {
        let ds = Dataset::from_records(vec![
            Record::new("Late", "X", 2010),
            Record::new("Early", "X", 1990),
        ]);
        let rows = reconstruct(&ds, 2005, &["Late", "Early"]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity(), "Early");
    }

    #[test]
    fn unknown_entities_are_skipped() {
        let rows = reconstruct(&scenario(), 2005, &["Atlantis", "B"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity(), "B");
    }

    #[test]
    fn duplicate_year_takes_first_record() {
        let ds = Dataset::from_records(vec![
            Record::new("E", "X", 2000).with_measure(POPULATION, 1.0),
            Record::new("E", "X", 2000).with_measure(POPULATION, 2.0),
            Record::new("E", "X", 2002).with_measure(POPULATION, 3.0),
            Record::new("E", "X", 2002).with_measure(POPULATION, 4.0),
        ]);

        let prior = reconstruct(&ds, 2001, &["E"]);
        assert_eq!(prior[0].measure(POPULATION), Some(1.0));

        let exact = reconstruct(&ds, 2002, &["E"]);
        assert_eq!(exact[0].measure(POPULATION), Some(3.0));
    }

    #[test]
    fn output_follows_request_order_without_duplicates() {
        let rows = reconstruct(&scenario(), 2005, &["B", "A", "B"]);
        let names: Vec<_> = rows.iter().map(|r| r.entity()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn dataset_is_left_untouched() {
        let ds = scenario();
        let before = ds.records.clone();
        let _ = reconstruct(&ds, 2010, &["A", "B"]);
        assert_eq!(ds.records, before);
    }

    #[test]
    fn reconstruct_all_covers_every_entity() {
        let rows = reconstruct_all(&scenario(), 2007);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.is_imputed));
    }
}
