/// Data layer: core types, loading, filtering, and series projection.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  raw rows → typed records, date + time → timestamp
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, shared field set, min/max timestamp
///   └──────────┘
///        │  TimeBound
///        ▼
///   ┌──────────┐
///   │  filter   │  lo <= ts <= hi, or everything if the bound is invalid
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  series   │  SeriesSpec → ChartData (one (ts, value) line per field)
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod series;
