use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use yearfill::config::Config;
use yearfill::data::loader;
use yearfill::state::Session;
use yearfill::views::hover::group_thousands;

#[derive(Parser, Debug)]
#[command(
    name = "yearfill",
    version,
    about = "Country statistics for one year, gaps filled from the latest earlier year"
)]
struct Args {
    /// JSON config file layered over the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset URL or file path (.csv, .json, .parquet)
    #[arg(long, env = "YEARFILL_SOURCE")]
    source: Option<String>,

    /// Target year; defaults to the latest year in the dataset
    #[arg(long)]
    year: Option<i32>,

    /// Country to select, repeatable
    #[arg(long = "entity")]
    entities: Vec<String>,

    /// Measure for the ranking, category and series views
    #[arg(long)]
    measure: Option<String>,

    /// Bubble chart axes
    #[arg(long)]
    x: Option<String>,
    #[arg(long)]
    y: Option<String>,
    #[arg(long)]
    size: Option<String>,

    /// Number of bars in the ranking view
    #[arg(long)]
    top: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    view: View,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum View {
    /// Reconstructed rows (all countries, or the --entity selection)
    Rows,
    /// Bubble chart points
    Bubble,
    /// Top-N ranking
    Top,
    /// Totals per continent
    Continents,
    /// Raw time series for the selected countries
    Series,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(source) = &args.source {
        config.source = source.clone();
    }
    if let Some(measure) = &args.measure {
        config.ranking_measure = measure.clone();
        config.series_measure = measure.clone();
    }
    if let Some(x) = &args.x {
        config.axes.x = x.clone();
    }
    if let Some(y) = &args.y {
        config.axes.y = y.clone();
    }
    if let Some(size) = &args.size {
        config.axes.size = size.clone();
    }
    if let Some(top) = args.top {
        config.top_n = top;
    }

    let dataset = loader::load_or_fallback(&config.data_source(), &config.columns);
    let mut session = Session::new(Arc::new(dataset), &config);
    if let Some(year) = args.year {
        let selected = session.set_year(year);
        if selected != year {
            log::warn!("Year {year} outside dataset range, using {selected}");
        }
    }
    if !args.entities.is_empty() {
        session.set_entities(args.entities.clone());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match (args.view, args.format) {
        (View::Rows, OutputFormat::Json) => write_json(&mut out, &rows(&session, &args))?,
        (View::Bubble, OutputFormat::Json) => write_json(&mut out, &session.bubble_view())?,
        (View::Top, OutputFormat::Json) => write_json(&mut out, &session.ranking_view())?,
        (View::Continents, OutputFormat::Json) => write_json(&mut out, &session.category_view())?,
        (View::Series, OutputFormat::Json) => write_json(&mut out, &session.series())?,
        (view, OutputFormat::Text) => write_text(&mut out, &session, &args, view)?,
    }
    out.flush()?;
    Ok(())
}

fn rows(session: &Session, args: &Args) -> Vec<yearfill::data::ReconstructedRow> {
    if args.entities.is_empty() {
        session.rows()
    } else {
        session.selected_rows()
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Plain-text tables
// ---------------------------------------------------------------------------

fn write_text<W: Write>(out: &mut W, session: &Session, args: &Args, view: View) -> Result<()> {
    let year = session.year();
    match view {
        View::Rows => {
            let rows = rows(session, args);
            writeln!(out, "country\tcontinent\tyear\tsource_year")?;
            for row in &rows {
                let mark = if row.is_imputed { " *" } else { "" };
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}{mark}",
                    row.entity(),
                    row.category(),
                    row.record.year,
                    row.source_year
                )?;
            }
            if rows.is_empty() {
                writeln!(out, "(no country has data at or before {year})")?;
            }
        }
        View::Bubble => {
            let view = session.bubble_view();
            writeln!(
                out,
                "{year}: {} vs {}, size {}",
                view.axes.x, view.axes.y, view.axes.size
            )?;
            for p in &view.points {
                let mark = if p.is_imputed { " *" } else { "" };
                writeln!(out, "{}\t{}\t{}\t{}{mark}", p.entity, p.x, p.y, p.size)?;
            }
        }
        View::Top => {
            let view = session.ranking_view();
            writeln!(out, "Top {} by {} ({year})", view.bars.len(), view.measure)?;
            for (rank, bar) in view.bars.iter().enumerate() {
                let value = bar.value.map(group_thousands).unwrap_or_else(|| "n/a".into());
                let mark = if bar.is_imputed { " *" } else { "" };
                writeln!(out, "{:>3}. {}\t{value}{mark}", rank + 1, bar.entity)?;
            }
            if let Some(note) = view.footnote {
                writeln!(out, "{note}")?;
            }
        }
        View::Continents => {
            let view = session.category_view();
            writeln!(out, "{} by continent ({year})", view.measure)?;
            for slice in &view.slices {
                let t = &slice.total;
                writeln!(
                    out,
                    "{}\t{}\t{}/{} imputed",
                    t.category,
                    group_thousands(t.total),
                    t.imputed_count,
                    t.entity_count
                )?;
            }
            if let Some(note) = view.footnote {
                writeln!(out, "{note}")?;
            }
        }
        View::Series => {
            for p in session.series() {
                writeln!(out, "{}\t{}\t{}", p.entity, p.year, p.value)?;
            }
        }
    }
    Ok(())
}
