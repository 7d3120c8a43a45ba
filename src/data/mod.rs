/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse rows → derive features → sample → AccidentDataset
///   └──────────┘   (memoized per path in DatasetCache)
///        │
///        ▼
///   ┌─────────────────┐
///   │ AccidentDataset │  Vec<AccidentRecord>, facet values
///   └─────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterCriteria → FilteredView (record indices)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  day / hour / weather counts, map center
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod region;
pub mod summary;
