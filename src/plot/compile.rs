use std::collections::BTreeMap;

use eframe::egui::Color32;

use crate::color::trace_color;
use crate::data::model::{cell_text, CellValue, Row};
use crate::plot::config::{ChartType, PlotConfig};

/// Display key separator between grouping-column values.
const GROUP_KEY_SEPARATOR: &str = " - ";
/// Placeholder for a missing value in a grouping column.
const MISSING_GROUP_VALUE: &str = "Unknown";
/// Group name when no grouping columns are selected.
const DEFAULT_GROUP: &str = "All Data";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One renderable data series. Fully rebuilt on every configuration or
/// filter change, never patched incrementally.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub x: Vec<CellValue>,
    pub y: Vec<CellValue>,
    pub chart_type: ChartType,
    /// Axis id this trace is drawn against (`y`, `y2`, …).
    pub y_axis: String,
    pub color: Color32,
    pub show_outliers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Left,
    Right,
}

/// Placement of one y axis in the multi-axis layout.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub id: String,
    pub title: String,
    pub side: AxisSide,
    /// Fractional horizontal position of the axis line.
    pub position: f64,
    /// Whether this axis overlays the primary one.
    pub overlaying: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotLayout {
    pub title: String,
    pub x_title: String,
    /// Axis specs in assignment order: all left axes, then all right axes.
    pub y_axes: Vec<AxisSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPlot {
    pub traces: Vec<Trace>,
    pub layout: PlotLayout,
}

/// Result of compiling a row set against a configuration. Validation
/// problems produce `Empty` with a user-facing reason, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileResult {
    Chart(CompiledPlot),
    Empty { reason: &'static str },
}

impl CompileResult {
    pub fn empty_no_data() -> Self {
        CompileResult::Empty {
            reason: "No data available for plotting",
        }
    }

    pub fn traces(&self) -> &[Trace] {
        match self {
            CompileResult::Chart(plot) => &plot.traces,
            CompileResult::Empty { .. } => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compile a filtered row set and a plot configuration into renderable
/// traces plus an axis layout. Deterministic and pure: identical inputs
/// yield identical trace names, colours, and ordering.
pub fn compile(rows: &[Row], config: &PlotConfig) -> CompileResult {
    if rows.is_empty() {
        return CompileResult::empty_no_data();
    }
    if !config.is_renderable() {
        return CompileResult::Empty {
            reason: "Please select X-axis and at least one Y-axis",
        };
    }

    let groups = group_rows(rows, &config.grouping);

    let mut layout = PlotLayout {
        title: plot_title(config),
        x_title: config.x_axis.clone(),
        y_axes: Vec::new(),
    };
    let mut traces = Vec::new();
    let mut color_index = 0;

    // Left y columns claim axis ids first, in declaration order; the first
    // one reuses the primary axis, later ones overlay it on the left.
    for (y_index, y_column) in config.left_y_axes.iter().enumerate() {
        let axis_id = if y_index == 0 {
            "y".to_string()
        } else {
            format!("y{}", y_index + 1)
        };
        layout.y_axes.push(AxisSpec {
            id: axis_id.clone(),
            title: y_column.clone(),
            side: AxisSide::Left,
            position: y_index as f64 * 0.1,
            overlaying: y_index > 0,
        });
        for (group_name, group_rows) in &groups {
            traces.push(build_trace(
                group_rows,
                group_name,
                y_column,
                &axis_id,
                config,
                trace_color(color_index),
            ));
            color_index += 1;
        }
    }

    // Right y columns continue the id sequence after all left axes and
    // overlay on the right side, stepping in from the edge.
    let left_count = config.left_y_axes.len();
    for (y_index, y_column) in config.right_y_axes.iter().enumerate() {
        let axis_id = format!("y{}", left_count + y_index + 1);
        layout.y_axes.push(AxisSpec {
            id: axis_id.clone(),
            title: y_column.clone(),
            side: AxisSide::Right,
            position: 1.0 - y_index as f64 * 0.1,
            overlaying: true,
        });
        for (group_name, group_rows) in &groups {
            traces.push(build_trace(
                group_rows,
                group_name,
                y_column,
                &axis_id,
                config,
                trace_color(color_index),
            ));
            color_index += 1;
        }
    }

    CompileResult::Chart(CompiledPlot { traces, layout })
}

fn plot_title(config: &PlotConfig) -> String {
    let y_columns: Vec<&str> = config
        .left_y_axes
        .iter()
        .chain(config.right_y_axes.iter())
        .map(String::as_str)
        .collect();
    format!(
        "{} Plot: {} vs {}",
        config.chart_type.label(),
        y_columns.join(", "),
        config.x_axis
    )
}

/// Bucket rows by the joined values of the grouping columns, preserving
/// first-seen group order. With no grouping, everything is one group.
fn group_rows<'a>(rows: &'a [Row], grouping: &[String]) -> Vec<(String, Vec<&'a Row>)> {
    if grouping.is_empty() {
        return vec![(DEFAULT_GROUP.to_string(), rows.iter().collect())];
    }

    let mut order: Vec<String> = Vec::new();
    let mut buckets: BTreeMap<String, Vec<&Row>> = BTreeMap::new();
    for row in rows {
        let key = grouping
            .iter()
            .map(|col| {
                let cell = row.get(col);
                if cell.map_or(true, |c| c.is_blank()) {
                    MISSING_GROUP_VALUE.to_string()
                } else {
                    cell_text(cell)
                }
            })
            .collect::<Vec<_>>()
            .join(GROUP_KEY_SEPARATOR);
        if !buckets.contains_key(&key) {
            order.push(key.clone());
        }
        buckets.entry(key).or_default().push(row);
    }
    order
        .into_iter()
        .map(|key| {
            let rows = buckets.remove(&key).unwrap_or_default();
            (key, rows)
        })
        .collect()
}

/// Construct one trace for a (y column × group) pair, applying the
/// chart-type-specific shaping.
fn build_trace(
    rows: &[&Row],
    group_name: &str,
    y_column: &str,
    axis_id: &str,
    config: &PlotConfig,
    color: Color32,
) -> Trace {
    let (x, y) = if config.chart_type == ChartType::Bar {
        aggregate_for_bar(rows, &config.x_axis, y_column)
    } else {
        project(rows, &config.x_axis, y_column)
    };

    let mut name = if config.grouping.is_empty() {
        y_column.to_string()
    } else {
        format!("{group_name}{GROUP_KEY_SEPARATOR}{y_column}")
    };

    // Distribution charts can carry the sample size in the legend.
    if matches!(config.chart_type, ChartType::Box | ChartType::Violin) && config.show_data_points {
        let n = y.iter().filter(|v| v.as_f64().is_some()).count();
        name = format!("{name} (n={n})");
    }

    Trace {
        name,
        x,
        y,
        chart_type: config.chart_type,
        y_axis: axis_id.to_string(),
        color,
        show_outliers: config.show_outliers,
    }
}

/// Project rows onto two columns; a missing cell becomes `Null` so the
/// renderer shows a gap instead of failing.
fn project(rows: &[&Row], x_column: &str, y_column: &str) -> (Vec<CellValue>, Vec<CellValue>) {
    let x = rows
        .iter()
        .map(|row| row.get(x_column).cloned().unwrap_or(CellValue::Null))
        .collect();
    let y = rows
        .iter()
        .map(|row| row.get(y_column).cloned().unwrap_or(CellValue::Null))
        .collect();
    (x, y)
}

/// Bar aggregation: mean of the numeric y values per distinct stringified
/// x value, buckets sorted by key. Non-numeric y values are excluded and a
/// bucket with no numeric values at all is dropped.
fn aggregate_for_bar(
    rows: &[&Row],
    x_column: &str,
    y_column: &str,
) -> (Vec<CellValue>, Vec<CellValue>) {
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let Some(y) = row.get(y_column).and_then(|c| c.as_f64()) else {
            continue;
        };
        let key = cell_text(row.get(x_column));
        buckets.entry(key).or_default().push(y);
    }

    let mut x = Vec::with_capacity(buckets.len());
    let mut y = Vec::with_capacity(buckets.len());
    for (key, values) in buckets {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        x.push(CellValue::Text(key));
        y.push(CellValue::Number(mean));
    }
    (x, y)
}
