use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

#[derive(Parser, Debug)]
#[command(name = "generate_sample", about = "Write a sparse gapminder-like table for testing")]
struct Args {
    /// Output file; `.parquet` / `.pq` writes Parquet, anything else CSV
    #[arg(long, default_value = "sample_data.csv")]
    output: PathBuf,

    /// Probability that a given country-year is left out
    #[arg(long, default_value_t = 0.3)]
    gap_rate: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// (country, continent, first year reported, pop 1952, gdpPercap 1952, lifeExp 1952)
const COUNTRIES: &[(&str, &str, i32, f64, f64, f64)] = &[
    ("Canada", "Americas", 1952, 14_785_584.0, 11_367.2, 68.8),
    ("Peru", "Americas", 1952, 8_025_700.0, 3_758.5, 43.9),
    ("Chad", "Africa", 1952, 2_682_462.0, 1_178.7, 38.1),
    ("Namibia", "Africa", 1967, 706_640.0, 3_793.7, 51.2),
    ("Japan", "Asia", 1952, 86_459_025.0, 3_216.9, 63.0),
    ("Mongolia", "Asia", 1952, 800_663.0, 786.6, 42.2),
    ("Norway", "Europe", 1952, 3_327_728.0, 10_095.4, 72.7),
    ("Slovenia", "Europe", 1992, 1_999_210.0, 14_214.7, 73.6),
    ("New Zealand", "Oceania", 1952, 1_994_794.0, 10_556.6, 69.4),
];

struct Row {
    country: &'static str,
    continent: &'static str,
    year: i64,
    pop: f64,
    gdp_percap: f64,
    life_exp: f64,
}

fn generate(rng: &mut SimpleRng, gap_rate: f64) -> Vec<Row> {
    let mut rows = Vec::new();
    for &(country, continent, first, pop0, gdp0, life0) in COUNTRIES {
        for year in (1952..=2007).step_by(5) {
            if year < first {
                continue;
            }
            // Keep the first reported year so every country has an anchor.
            if year > first && rng.next_f64() < gap_rate {
                continue;
            }
            let t = f64::from(year - first);
            rows.push(Row {
                country,
                continent,
                year: i64::from(year),
                pop: (pop0 * (1.0 + 0.015 * (1.0 + 0.2 * rng.next_f64())).powf(t)).round(),
                gdp_percap: gdp0 * 1.02_f64.powf(t) * (0.95 + 0.1 * rng.next_f64()),
                life_exp: (life0 + 0.3 * t).min(83.0),
            });
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(["country", "continent", "year", "lifeExp", "pop", "gdpPercap"])?;
    for r in rows {
        writer.write_record([
            r.country.to_string(),
            r.continent.to_string(),
            r.year.to_string(),
            format!("{:.3}", r.life_exp),
            format!("{:.0}", r.pop),
            format!("{:.4}", r.gdp_percap),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("country", DataType::Utf8, false),
        Field::new("continent", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("lifeExp", DataType::Float64, true),
        Field::new("pop", DataType::Float64, true),
        Field::new("gdpPercap", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(rows.iter().map(|r| r.country).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.continent).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.life_exp).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.pop).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.gdp_percap).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = SimpleRng::new(args.seed);
    let rows = generate(&mut rng, args.gap_rate);

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(&args.output, &rows)?,
        _ => write_csv(&args.output, &rows)?,
    }

    println!(
        "Wrote {} rows for {} countries to {}",
        rows.len(),
        COUNTRIES.len(),
        args.output.display()
    );
    Ok(())
}
