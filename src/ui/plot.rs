use eframe::egui::{Ui, Vec2b};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};

use crate::data::model::CellValue;
use crate::plot::compile::{CompileResult, CompiledPlot, Trace};
use crate::plot::config::ChartType;

// ---------------------------------------------------------------------------
// Rendering adapter: compiled traces → egui_plot primitives
// ---------------------------------------------------------------------------

/// Render the compiled plot in the central panel. Each y axis of the layout
/// gets its own stacked plot strip (egui_plot draws one y axis per plot);
/// axis order follows the layout's left-then-right assignment order.
pub fn plot_panel(ui: &mut Ui, result: &CompileResult) {
    let plot = match result {
        CompileResult::Chart(plot) => plot,
        CompileResult::Empty { reason } => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(*reason);
            });
            return;
        }
    };

    ui.heading(&plot.layout.title);

    let categories = x_categories(plot);
    let strip_height =
        (ui.available_height() / plot.layout.y_axes.len().max(1) as f32 - 8.0).max(120.0);

    for axis in &plot.layout.y_axes {
        let traces: Vec<&Trace> = plot
            .traces
            .iter()
            .filter(|t| t.y_axis == axis.id)
            .collect();

        let mut chart = Plot::new(("dashboard_plot", axis.id.clone()))
            .legend(Legend::default())
            .height(strip_height)
            .x_axis_label(plot.layout.x_title.clone())
            .y_axis_label(axis.title.clone())
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(Vec2b::new(true, true));

        if let Some(labels) = categories.clone() {
            chart = chart.x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < labels.len() {
                    labels[idx as usize].clone()
                } else {
                    String::new()
                }
            });
        }

        chart.show(ui, |plot_ui| {
            for (slot, trace) in traces.iter().enumerate() {
                draw_trace(plot_ui, trace, categories.as_deref(), slot, traces.len());
            }
        });
    }
}

/// Distinct x labels in first-seen order across all traces, if any trace
/// carries non-numeric x values. Categorical x values are drawn at their
/// label index.
fn x_categories(plot: &CompiledPlot) -> Option<Vec<String>> {
    let has_categorical = plot
        .traces
        .iter()
        .flat_map(|t| t.x.iter())
        .any(|v| !matches!(v, CellValue::Null) && v.as_f64().is_none());
    if !has_categorical {
        return None;
    }

    let mut labels: Vec<String> = Vec::new();
    for trace in &plot.traces {
        for value in &trace.x {
            if matches!(value, CellValue::Null) {
                continue;
            }
            let label = value.to_string();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    Some(labels)
}

/// Map one x cell to a plot coordinate: category index when a label table
/// is active, the numeric value otherwise. `None` renders as a gap.
fn x_position(value: &CellValue, categories: Option<&[String]>) -> Option<f64> {
    match categories {
        Some(labels) => {
            if matches!(value, CellValue::Null) {
                return None;
            }
            let label = value.to_string();
            labels.iter().position(|l| *l == label).map(|i| i as f64)
        }
        None => value.as_f64(),
    }
}

fn draw_trace(
    plot_ui: &mut egui_plot::PlotUi,
    trace: &Trace,
    categories: Option<&[String]>,
    slot: usize,
    slots: usize,
) {
    // Side-by-side offset so bars/boxes sharing an x bucket stay visible.
    let offset = (slot as f64 - (slots.saturating_sub(1)) as f64 / 2.0) * 0.18;

    match trace.chart_type {
        ChartType::Line => {
            let points: PlotPoints = numeric_pairs(trace, categories).into();
            plot_ui.line(
                Line::new(points)
                    .name(&trace.name)
                    .color(trace.color)
                    .width(2.0),
            );
        }
        ChartType::Scatter => {
            let points: PlotPoints = numeric_pairs(trace, categories).into();
            plot_ui.points(
                Points::new(points)
                    .name(&trace.name)
                    .color(trace.color)
                    .radius(3.0),
            );
        }
        ChartType::Bar => {
            let bars: Vec<Bar> = numeric_pairs(trace, categories)
                .into_iter()
                .map(|[x, y]| Bar::new(x + offset, y).width(0.16).fill(trace.color))
                .collect();
            plot_ui.bar_chart(BarChart::new(bars).name(&trace.name).color(trace.color));
        }
        // egui_plot has no violin primitive; violins render as boxes.
        ChartType::Box | ChartType::Violin => {
            draw_boxes(plot_ui, trace, categories, offset);
        }
    }
}

/// (x, y) pairs with both coordinates resolvable; everything else is a gap.
fn numeric_pairs(trace: &Trace, categories: Option<&[String]>) -> Vec<[f64; 2]> {
    trace
        .x
        .iter()
        .zip(trace.y.iter())
        .filter_map(|(x, y)| Some([x_position(x, categories)?, y.as_f64()?]))
        .collect()
}

fn draw_boxes(
    plot_ui: &mut egui_plot::PlotUi,
    trace: &Trace,
    categories: Option<&[String]>,
    offset: f64,
) {
    // Bucket y values by x position.
    let mut buckets: Vec<(f64, Vec<f64>)> = Vec::new();
    for (x, y) in trace.x.iter().zip(trace.y.iter()) {
        let (Some(pos), Some(y)) = (x_position(x, categories), y.as_f64()) else {
            continue;
        };
        match buckets.iter_mut().find(|(p, _)| *p == pos) {
            Some((_, values)) => values.push(y),
            None => buckets.push((pos, vec![y])),
        }
    }

    let mut elems = Vec::new();
    let mut outliers: Vec<[f64; 2]> = Vec::new();
    for (pos, mut values) in buckets {
        values.sort_by(f64::total_cmp);
        let (q1, median, q3) = quartiles(&values);
        let data_min = values[0];
        let data_max = values[values.len() - 1];

        let (low, high) = if trace.show_outliers {
            // Tukey whiskers; points beyond them are drawn separately.
            let iqr = q3 - q1;
            let low = values
                .iter()
                .copied()
                .find(|v| *v >= q1 - 1.5 * iqr)
                .unwrap_or(data_min);
            let high = values
                .iter()
                .rev()
                .copied()
                .find(|v| *v <= q3 + 1.5 * iqr)
                .unwrap_or(data_max);
            for v in &values {
                if *v < low || *v > high {
                    outliers.push([pos + offset, *v]);
                }
            }
            (low, high)
        } else {
            (data_min, data_max)
        };

        elems.push(
            BoxElem::new(pos + offset, BoxSpread::new(low, q1, median, q3, high)).box_width(0.14),
        );
    }

    plot_ui.box_plot(BoxPlot::new(elems).name(&trace.name).color(trace.color));
    if trace.show_outliers && !outliers.is_empty() {
        let points: PlotPoints = outliers.into();
        plot_ui.points(Points::new(points).color(trace.color).radius(2.5));
    }
}

/// Linear-interpolation quartiles over a sorted, non-empty slice.
fn quartiles(sorted: &[f64]) -> (f64, f64, f64) {
    (
        percentile(sorted, 0.25),
        percentile(sorted, 0.5),
        percentile(sorted, 0.75),
    )
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&values, 0.5) - 2.5).abs() < 1e-12);
        assert!((percentile(&values, 0.25) - 1.75).abs() < 1e-12);
        assert!((percentile(&values, 1.0) - 4.0).abs() < 1e-12);
        assert!((percentile(&[7.0], 0.5) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn categorical_x_maps_to_first_seen_indices() {
        let labels = vec!["Fuller".to_string(), "Sika".to_string()];
        assert_eq!(
            x_position(&CellValue::Text("Sika".into()), Some(&labels)),
            Some(1.0)
        );
        assert_eq!(x_position(&CellValue::Null, Some(&labels)), None);
        assert_eq!(x_position(&CellValue::Number(0.3), None), Some(0.3));
    }
}
