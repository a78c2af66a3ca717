use crate::data::ReconstructedRow;

use super::aggregate::CategoryTotal;

/// Footnote for the ranking view when at least one bar is imputed.
pub const RANKING_FOOTNOTE: &str = "* data from the latest earlier year available";

/// Footnote for the category share view when at least one row is imputed.
pub const CATEGORY_FOOTNOTE: &str =
    "Note: some countries use data from the closest earlier year";

/// Round to an integer and group thousands with spaces: `1 234 567`.
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Whole numbers are grouped, fractional values printed as-is.
pub fn format_measure(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        group_thousands(value)
    } else {
        value.to_string()
    }
}

/// `* data from 2002` for imputed rows.
pub fn provenance_note(row: &ReconstructedRow) -> Option<String> {
    row.is_imputed
        .then(|| format!("* data from {}", row.source_year))
}

fn push_provenance(text: &mut String, row: &ReconstructedRow) {
    if let Some(note) = provenance_note(row) {
        text.push('\n');
        text.push_str(&note);
    }
}

/// Hover text for a ranking bar.
pub fn ranking_hover(row: &ReconstructedRow, measure: &str) -> String {
    let value = row
        .measure(measure)
        .map(group_thousands)
        .unwrap_or_else(|| "n/a".into());
    let mut text = format!("{}\n{measure}: {value}", row.entity());
    push_provenance(&mut text, row);
    text
}

/// Hover text for a bubble: every plotted measure plus provenance.
pub fn bubble_hover(row: &ReconstructedRow, measures: &[&str]) -> String {
    let mut text = row.entity().to_string();
    for name in measures {
        match row.measure(name) {
            Some(v) => text.push_str(&format!("\n{name}: {}", format_measure(v))),
            None => text.push_str(&format!("\n{name}: n/a")),
        }
    }
    push_provenance(&mut text, row);
    text
}

/// Hover text for one category slice.
pub fn category_hover(total: &CategoryTotal, measure: &str) -> String {
    format!(
        "{}\n{measure}: {}\n{} of {} countries use earlier years",
        total.category,
        group_thousands(total.total),
        total.imputed_count,
        total.entity_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Record, POPULATION};

    fn row(imputed: bool) -> ReconstructedRow {
        ReconstructedRow {
            record: Record::new("Chad", "Africa", 2007).with_measure(POPULATION, 10238807.0),
            is_imputed: imputed,
            source_year: if imputed { 2002 } else { 2007 },
        }
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1 000");
        assert_eq!(group_thousands(1234567.4), "1 234 567");
        assert_eq!(group_thousands(-45678.0), "-45 678");
    }

    #[test]
    fn ranking_hover_mentions_source_year_only_when_imputed() {
        assert_eq!(ranking_hover(&row(false), POPULATION), "Chad\npop: 10 238 807");
        assert_eq!(
            ranking_hover(&row(true), POPULATION),
            "Chad\npop: 10 238 807\n* data from 2002"
        );
    }

    #[test]
    fn bubble_hover_marks_missing_measures() {
        let text = bubble_hover(&row(false), &[POPULATION, "lifeExp"]);
        assert_eq!(text, "Chad\npop: 10 238 807\nlifeExp: n/a");
    }

    #[test]
    fn measures_group_only_whole_numbers() {
        assert_eq!(format_measure(2682462.0), "2 682 462");
        assert_eq!(format_measure(1178.66), "1178.66");
        assert_eq!(format_measure(43.9), "43.9");
    }

    #[test]
    fn category_hover_counts() {
        let total = CategoryTotal {
            category: "Africa".into(),
            total: 2500.0,
            entity_count: 4,
            imputed_count: 1,
        };
        assert_eq!(
            category_hover(&total, POPULATION),
            "Africa\npop: 2 500\n1 of 4 countries use earlier years"
        );
    }
}
