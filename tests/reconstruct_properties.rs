use std::collections::HashSet;

use proptest::prelude::*;
use yearfill::data::model::POPULATION;
use yearfill::data::{Dataset, Record, reconstruct};

const ENTITIES: &[&str] = &["A", "B", "C", "D", "E"];

fn record_strategy() -> impl Strategy<Value = Record> {
    (0..ENTITIES.len(), 1990i32..2010, 0u32..1000).prop_map(|(e, year, pop)| {
        Record::new(ENTITIES[e], "X", year).with_measure(POPULATION, f64::from(pop))
    })
}

fn request_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(vec!["A", "B", "C", "D", "E", "Z"]),
        0..8,
    )
    .prop_map(|names| names.into_iter().map(String::from).collect())
}

fn dataset_strategy() -> impl Strategy<Value = Dataset> {
    prop::collection::vec(record_strategy(), 0..40).prop_map(Dataset::from_records)
}

proptest! {
    #[test]
    fn repeated_calls_are_identical(
        ds in dataset_strategy(),
        year in 1985i32..2015,
        request in request_strategy(),
    ) {
        let first = reconstruct(&ds, year, &request);
        let second = reconstruct(&ds, year, &request);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn at_most_one_row_per_entity_in_request_order(
        ds in dataset_strategy(),
        year in 1985i32..2015,
        request in request_strategy(),
    ) {
        let rows = reconstruct(&ds, year, &request);

        let mut seen = HashSet::new();
        for row in &rows {
            prop_assert!(seen.insert(row.entity().to_string()), "duplicate {}", row.entity());
            prop_assert_eq!(row.record.year, year);
        }

        let mut expected_order: Vec<&str> = Vec::new();
        for name in &request {
            if !expected_order.contains(&name.as_str()) {
                expected_order.push(name);
            }
        }
        let got: Vec<&str> = rows.iter().map(|r| r.entity()).collect();
        let filtered: Vec<&str> = expected_order
            .into_iter()
            .filter(|name| got.contains(name))
            .collect();
        prop_assert_eq!(got, filtered);
    }

    #[test]
    fn rows_come_from_exact_or_closest_prior_year(
        ds in dataset_strategy(),
        year in 1985i32..2015,
        request in request_strategy(),
    ) {
        let rows = reconstruct(&ds, year, &request);

        for name in &request {
            let history: Vec<&Record> =
                ds.records.iter().filter(|r| &r.entity == name).collect();
            let exact = history.iter().find(|r| r.year == year);
            let prior_year = history.iter().map(|r| r.year).filter(|&y| y < year).max();
            let row = rows.iter().find(|r| r.entity() == name.as_str());

            match (exact, prior_year, row) {
                (Some(rec), _, Some(row)) => {
                    prop_assert!(!row.is_imputed);
                    prop_assert_eq!(row.source_year, year);
                    prop_assert_eq!(&row.record, *rec);
                }
                (None, Some(source), Some(row)) => {
                    prop_assert!(row.is_imputed);
                    prop_assert!(row.source_year < year);
                    prop_assert_eq!(row.source_year, source);
                    let first = history.iter().find(|r| r.year == source).unwrap();
                    prop_assert_eq!(row.measure(POPULATION), first.measure(POPULATION));
                }
                (None, None, None) => {}
                (exact, prior, row) => prop_assert!(
                    false,
                    "{name}: exact={:?} prior={prior:?} row={row:?}",
                    exact.map(|r| r.year)
                ),
            }
        }
    }
}

#[test]
fn documented_scenarios() {
    let ds = Dataset::from_records(vec![
        Record::new("A", "X", 2000).with_measure(POPULATION, 10.0),
        Record::new("A", "X", 2005).with_measure(POPULATION, 20.0),
        Record::new("B", "X", 2005).with_measure(POPULATION, 5.0),
    ]);

    let exact = reconstruct(&ds, 2005, &["A", "B"]);
    assert_eq!(exact.len(), 2);
    assert!(exact.iter().all(|r| !r.is_imputed && r.source_year == 2005));
    assert_eq!(exact[0].measure(POPULATION), Some(20.0));
    assert_eq!(exact[1].measure(POPULATION), Some(5.0));

    let filled = reconstruct(&ds, 2006, &["A", "B"]);
    assert_eq!(filled.len(), 2);
    assert!(filled.iter().all(|r| r.is_imputed && r.source_year == 2005 && r.record.year == 2006));
    assert_eq!(filled[0].measure(POPULATION), Some(20.0));

    assert!(reconstruct(&ds, 1999, &["A", "B"]).is_empty());
}

#[test]
fn closest_prior_year_example() {
    let ds = Dataset::from_records(
        [2000, 2003, 2005]
            .into_iter()
            .map(|y| Record::new("E", "X", y))
            .collect(),
    );
    let rows = reconstruct(&ds, 2007, &["E"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source_year, 2005);
    assert_eq!(rows[0].record.year, 2007);
    assert!(rows[0].is_imputed);

    let none = Dataset::from_records(vec![Record::new("E", "X", 2010)]);
    assert!(reconstruct(&none, 2005, &["E"]).is_empty());
}
