use std::collections::BTreeSet;

use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::data::filter::{operators_for, FilterOp, FilterSpec, ValueField};
use crate::data::model::{ColumnType, Dataset};
use crate::data::service::{ColumnStatistics, DataService, LocalDataService};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, service: &mut LocalDataService) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state, service);
                ui.close_menu();
            }
            if ui.button("Load sample data").clicked() {
                load_sample_data(state, service);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Export plot image…").clicked() {
                ui.ctx()
                    .send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} rows, {} visible",
                ds.name,
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(egui::Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Dataset loading
// ---------------------------------------------------------------------------

/// The adhesive pull-test dataset bundled with the app (12 rows).
const SAMPLE_CSV: &str = include_str!("../../assets/sample_data.csv");

pub fn open_file_dialog(state: &mut AppState, service: &mut LocalDataService) {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter("Tabular files", &["csv", "tsv"])
        .add_filter("CSV", &["csv"])
        .add_filter("TSV", &["tsv"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.csv")
            .to_string();
        let result = std::fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| load_bytes(state, service, &name, &bytes));
        if let Err(e) = result {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
            state.loading = false;
        }
    }
}

pub fn load_sample_data(state: &mut AppState, service: &mut LocalDataService) {
    if let Err(e) = load_bytes(state, service, "sample_data.csv", SAMPLE_CSV.as_bytes()) {
        log::error!("Failed to load sample data: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}

/// Push raw bytes through the data service and install the result as the
/// current dataset session.
fn load_bytes(
    state: &mut AppState,
    service: &mut LocalDataService,
    name: &str,
    bytes: &[u8],
) -> anyhow::Result<()> {
    use anyhow::Context;

    let summary = service
        .upload(name, bytes)
        .with_context(|| format!("uploading {name}"))?;
    let rows = service
        .fetch_rows(&summary.id)
        .context("fetching dataset rows")?;
    let statistics = service
        .fetch_statistics(&summary.id, &summary.columns)
        .context("fetching statistics")?;

    log::info!(
        "Loaded {} rows with columns {:?}",
        summary.row_count,
        summary.columns
    );

    state.set_dataset(Dataset {
        id: summary.id,
        name: summary.filename,
        columns: summary.columns,
        rows,
        column_info: summary.column_info,
        suggestions: summary.suggestions,
    });
    state.statistics = statistics;
    Ok(())
}

// ---------------------------------------------------------------------------
// Left side panel
// ---------------------------------------------------------------------------

/// Deferred filter edits collected while rendering, applied afterwards so
/// the rule list is not mutated mid-iteration.
enum FilterAction {
    Add,
    Remove(u64),
    SetColumn(u64, String),
    SetOperator(u64, FilterOp),
    SetValue(u64, ValueField),
}

/// Render the left panel: suggestions, templates, filter builder, and the
/// plot configuration.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        ui.label("Use File → Open… or File → Load sample data.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let dataset = dataset.clone();
    let mut filter_actions: Vec<FilterAction> = Vec::new();
    let mut apply_patch = None;
    let mut config_changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            suggestions_section(ui, state, &mut apply_patch);
            templates_section(ui, state, &mut apply_patch);
            filters_section(ui, state, &dataset, &mut filter_actions);
            config_section(ui, state, &dataset, &mut config_changed);
            statistics_section(ui, state);
        });

    for action in filter_actions {
        match action {
            FilterAction::Add => state.add_filter(),
            FilterAction::Remove(id) => state.remove_filter(id),
            FilterAction::SetColumn(id, column) => state.set_filter_column(id, &column),
            FilterAction::SetOperator(id, op) => state.set_filter_operator(id, op),
            FilterAction::SetValue(id, field) => state.set_filter_value(id, field),
        }
    }
    if let Some(patch) = apply_patch {
        state.apply_patch(&patch);
    }
    if config_changed {
        state.config_changed();
    }
}

fn suggestions_section(
    ui: &mut Ui,
    state: &AppState,
    apply_patch: &mut Option<crate::plot::config::ConfigPatch>,
) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    if dataset.suggestions.is_empty() {
        return;
    }
    egui::CollapsingHeader::new(RichText::new("Smart Suggestions").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            for suggestion in &dataset.suggestions {
                ui.horizontal(|ui: &mut Ui| {
                    ui.strong(&suggestion.title);
                    ui.weak(format!("{:.0}%", suggestion.confidence * 100.0));
                });
                ui.small(&suggestion.description);
                if ui.small_button("Apply").clicked() {
                    *apply_patch = Some(suggestion.config.clone());
                }
                ui.add_space(4.0);
            }
        });
    ui.separator();
}

fn templates_section(
    ui: &mut Ui,
    state: &AppState,
    apply_patch: &mut Option<crate::plot::config::ConfigPatch>,
) {
    if state.templates.is_empty() {
        return;
    }
    egui::CollapsingHeader::new(RichText::new("Templates").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for template in &state.templates {
                ui.horizontal(|ui: &mut Ui| {
                    ui.strong(&template.name);
                    ui.weak(&template.category);
                });
                ui.small(&template.description);
                if ui.small_button("Apply Template").clicked() {
                    *apply_patch = Some(template.config.clone());
                }
                ui.add_space(4.0);
            }
        });
    ui.separator();
}

fn filters_section(
    ui: &mut Ui,
    state: &AppState,
    dataset: &Dataset,
    actions: &mut Vec<FilterAction>,
) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Filters");
        if ui.small_button("Add Filter").clicked() {
            actions.push(FilterAction::Add);
        }
    });

    if state.filters.is_empty() {
        ui.weak("No filters applied");
    }

    for spec in state.filters.list() {
        filter_row(ui, spec, dataset, actions);
        ui.add_space(4.0);
    }
    ui.separator();
}

/// One filter rule: column selector, operator selector, value input shaped
/// by the operator, and a remove button.
fn filter_row(ui: &mut Ui, spec: &FilterSpec, dataset: &Dataset, actions: &mut Vec<FilterAction>) {
    ui.horizontal(|ui: &mut Ui| {
        egui::ComboBox::from_id_salt(("filter_column", spec.id))
            .selected_text(&spec.column)
            .show_ui(ui, |ui: &mut Ui| {
                for column in &dataset.columns {
                    if ui
                        .selectable_label(*column == spec.column, column)
                        .clicked()
                    {
                        actions.push(FilterAction::SetColumn(spec.id, column.clone()));
                    }
                }
            });

        egui::ComboBox::from_id_salt(("filter_op", spec.id))
            .selected_text(spec.op.label())
            .show_ui(ui, |ui: &mut Ui| {
                // Only the operators defined for the column's type.
                for op in operators_for(spec.column_type) {
                    if ui.selectable_label(*op == spec.op, op.label()).clicked() {
                        actions.push(FilterAction::SetOperator(spec.id, *op));
                    }
                }
            });

        if ui.small_button("✕").clicked() {
            actions.push(FilterAction::Remove(spec.id));
        }
    });

    filter_value_input(ui, spec, dataset, actions);
}

fn filter_value_input(
    ui: &mut Ui,
    spec: &FilterSpec,
    dataset: &Dataset,
    actions: &mut Vec<FilterAction>,
) {
    let sample_values = dataset
        .column_info
        .get(&spec.column)
        .map(|info| info.sample_values.clone())
        .unwrap_or_default();

    match spec.op {
        FilterOp::Between => {
            ui.horizontal(|ui: &mut Ui| {
                let mut min = spec.min_value.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut min).hint_text("Min").desired_width(70.0))
                    .changed()
                {
                    actions.push(FilterAction::SetValue(spec.id, ValueField::Min(min)));
                }
                let mut max = spec.max_value.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut max).hint_text("Max").desired_width(70.0))
                    .changed()
                {
                    actions.push(FilterAction::SetValue(spec.id, ValueField::Max(max)));
                }
            });
        }
        FilterOp::In => {
            // Membership set over the column's known values.
            for value in &sample_values {
                let mut checked = spec.values.contains(value);
                if ui.checkbox(&mut checked, value).changed() {
                    let mut values: BTreeSet<String> = spec.values.clone();
                    if checked {
                        values.insert(value.clone());
                    } else {
                        values.remove(value);
                    }
                    actions.push(FilterAction::SetValue(spec.id, ValueField::Values(values)));
                }
            }
        }
        FilterOp::Equals | FilterOp::NotEquals
            if spec.column_type == ColumnType::Categorical && !sample_values.is_empty() =>
        {
            let selected = if spec.value.is_empty() {
                "Select value…"
            } else {
                spec.value.as_str()
            };
            egui::ComboBox::from_id_salt(("filter_value", spec.id))
                .selected_text(selected)
                .show_ui(ui, |ui: &mut Ui| {
                    for value in &sample_values {
                        if ui.selectable_label(*value == spec.value, value).clicked() {
                            actions.push(FilterAction::SetValue(
                                spec.id,
                                ValueField::Value(value.clone()),
                            ));
                        }
                    }
                });
        }
        _ => {
            let mut value = spec.value.clone();
            if ui
                .add(egui::TextEdit::singleline(&mut value).hint_text("Value"))
                .changed()
            {
                actions.push(FilterAction::SetValue(spec.id, ValueField::Value(value)));
            }
        }
    }
}

fn config_section(ui: &mut Ui, state: &mut AppState, dataset: &Dataset, changed: &mut bool) {
    ui.heading("Configuration");

    ui.strong("X-Axis");
    let selected = if state.config.x_axis.is_empty() {
        "Select column…"
    } else {
        state.config.x_axis.as_str()
    };
    egui::ComboBox::from_id_salt("x_axis")
        .selected_text(selected)
        .show_ui(ui, |ui: &mut Ui| {
            for column in &dataset.columns {
                if ui
                    .selectable_label(*column == state.config.x_axis, column)
                    .clicked()
                {
                    state.config.x_axis = column.clone();
                    *changed = true;
                }
            }
        });

    column_multiselect(ui, "Left Y-Axes", &dataset.columns, &mut state.config.left_y_axes, changed);
    column_multiselect(ui, "Right Y-Axes", &dataset.columns, &mut state.config.right_y_axes, changed);
    column_multiselect(ui, "Group By", &dataset.columns, &mut state.config.grouping, changed);

    ui.strong("Chart Type");
    egui::ComboBox::from_id_salt("chart_type")
        .selected_text(state.config.chart_type.label())
        .show_ui(ui, |ui: &mut Ui| {
            for chart_type in crate::plot::config::ChartType::ALL {
                if ui
                    .selectable_label(chart_type == state.config.chart_type, chart_type.label())
                    .clicked()
                {
                    state.config.chart_type = chart_type;
                    *changed = true;
                }
            }
        });

    if ui
        .checkbox(&mut state.config.show_outliers, "Show outliers")
        .changed()
    {
        *changed = true;
    }
    if ui
        .checkbox(&mut state.config.show_data_points, "Show data points")
        .changed()
    {
        *changed = true;
    }
    ui.separator();
}

/// Checkbox list preserving selection order: newly checked columns append
/// to the end, which is the declaration order the compiler honors.
fn column_multiselect(
    ui: &mut Ui,
    label: &str,
    columns: &[String],
    selection: &mut Vec<String>,
    changed: &mut bool,
) {
    let header = format!("{label}  ({}/{})", selection.len(), columns.len());
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(label)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for column in columns {
                let mut checked = selection.contains(column);
                if ui.checkbox(&mut checked, column).changed() {
                    if checked {
                        selection.push(column.clone());
                    } else {
                        selection.retain(|c| c != column);
                    }
                    *changed = true;
                }
            }
        });
}

fn statistics_section(ui: &mut Ui, state: &AppState) {
    if state.statistics.is_empty() {
        return;
    }
    egui::CollapsingHeader::new(RichText::new("Statistics").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for (column, stats) in &state.statistics {
                ui.strong(column);
                match stats {
                    ColumnStatistics::Numeric {
                        mean,
                        median,
                        std,
                        min,
                        max,
                        ..
                    } => {
                        ui.small(format!("Mean: {mean:.2}   Median: {median:.2}"));
                        ui.small(format!("Std Dev: {std:.2}   Range: {min:.2} – {max:.2}"));
                    }
                    ColumnStatistics::Categorical {
                        count,
                        unique,
                        top_values,
                    } => {
                        ui.small(format!("Unique: {unique}   Count: {count}"));
                        for (value, n) in top_values.iter().take(3) {
                            ui.small(format!("{value}: {n}"));
                        }
                    }
                }
                ui.add_space(4.0);
            }
        });
}
