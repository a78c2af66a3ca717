/// Data layer: core types, loading, gap filling and raw series selection.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet  (file or URL)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse source → Dataset (or placeholder on failure)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, entity order, year range
///   └──────────┘
///        │                         │
///        ▼                         ▼
///   ┌──────────┐             ┌──────────┐
///   │  impute   │ year slice  │  filter   │ raw time series
///   └──────────┘             └──────────┘
///        │
///        ▼
///   Vec<ReconstructedRow>  →  views
/// ```

pub mod filter;
pub mod impute;
pub mod loader;
pub mod model;

pub use impute::{reconstruct, reconstruct_all};
pub use loader::{ColumnNames, DataSource, LoadError};
pub use model::{Dataset, Record, ReconstructedRow};
