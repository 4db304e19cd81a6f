use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Chart type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Box,
    Violin,
    Scatter,
    Line,
    Bar,
}

impl ChartType {
    pub const ALL: [ChartType; 5] = [
        ChartType::Box,
        ChartType::Violin,
        ChartType::Scatter,
        ChartType::Line,
        ChartType::Bar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartType::Box => "Box",
            ChartType::Violin => "Violin",
            ChartType::Scatter => "Scatter",
            ChartType::Line => "Line",
            ChartType::Bar => "Bar",
        }
    }
}

// ---------------------------------------------------------------------------
// Plot configuration
// ---------------------------------------------------------------------------

/// The full set of user choices defining what and how to chart.
/// Each plot tab owns its own copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlotConfig {
    pub x_axis: String,
    pub left_y_axes: Vec<String>,
    pub right_y_axes: Vec<String>,
    pub grouping: Vec<String>,
    pub chart_type: ChartType,
    pub show_outliers: bool,
    pub show_data_points: bool,
}

impl PlotConfig {
    /// A configuration can produce traces only with an x axis and at least
    /// one y column on either side.
    pub fn is_renderable(&self) -> bool {
        !self.x_axis.is_empty() && !(self.left_y_axes.is_empty() && self.right_y_axes.is_empty())
    }

    /// Drop references to columns that no longer exist (dataset change).
    pub fn retain_columns(&mut self, columns: &[String]) {
        if !columns.contains(&self.x_axis) {
            self.x_axis.clear();
        }
        self.left_y_axes.retain(|c| columns.contains(c));
        self.right_y_axes.retain(|c| columns.contains(c));
        self.grouping.retain(|c| columns.contains(c));
    }
}

// ---------------------------------------------------------------------------
// Partial configuration from suggestions and templates
// ---------------------------------------------------------------------------

/// Configuration fragment carried by smart suggestions and saved templates.
/// Only the fields present in the payload are applied; unknown keys from the
/// service (themes, annotations…) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    pub x_axis: Option<String>,
    pub left_y_axes: Option<Vec<String>>,
    pub right_y_axes: Option<Vec<String>>,
    pub grouping: Option<Vec<String>>,
    pub chart_type: Option<ChartType>,
    pub show_outliers: Option<bool>,
    pub show_data_points: Option<bool>,
}

impl ConfigPatch {
    pub fn apply_to(&self, config: &mut PlotConfig) {
        if let Some(x) = &self.x_axis {
            config.x_axis = x.clone();
        }
        if let Some(left) = &self.left_y_axes {
            config.left_y_axes = left.clone();
        }
        if let Some(right) = &self.right_y_axes {
            config.right_y_axes = right.clone();
        }
        if let Some(grouping) = &self.grouping {
            config.grouping = grouping.clone();
        }
        if let Some(chart_type) = self.chart_type {
            config.chart_type = chart_type;
        }
        if let Some(outliers) = self.show_outliers {
            config.show_outliers = outliers;
        }
        if let Some(points) = self.show_data_points {
            config.show_data_points = points;
        }
    }
}
