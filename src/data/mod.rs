/// Data layer: core types, the service contract, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .tsv upload
///        │
///        ▼
///   ┌──────────┐
///   │ service   │  DataService: upload → DatasetSummary, fetch rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Dataset: Vec<Row>, column descriptors
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSet: per-column predicates → filtered indices
///   └──────────┘
/// ```
pub mod filter;
pub mod model;
pub mod service;
