/// Plot layer: configuration types and the trace compiler.
///
/// Architecture:
/// ```text
///   filtered rows + PlotConfig
///        │
///        ▼
///   ┌──────────┐
///   │ compile   │  group → assign axes → emit traces
///   └──────────┘
///        │
///        ▼
///   CompileResult (traces + layout, or empty state)
///        │
///        ▼
///   ui::plot (egui_plot rendering adapter)
/// ```
pub mod compile;
pub mod config;
