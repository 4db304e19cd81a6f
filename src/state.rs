use std::collections::BTreeMap;

use crate::data::filter::{filtered_indices, FilterOp, FilterSet, ValueField};
use crate::data::model::{Dataset, Row};
use crate::data::service::{ColumnStatistics, Template};
use crate::plot::compile::{compile, CompileResult};
use crate::plot::config::{ConfigPatch, PlotConfig};

// ---------------------------------------------------------------------------
// Plot tabs
// ---------------------------------------------------------------------------

/// One named plot configuration. Each tab owns its own copy; activating a
/// tab re-applies the stored copy as the live editable configuration.
#[derive(Debug, Clone)]
pub struct PlotTab {
    pub id: u64,
    pub name: String,
    pub config: PlotConfig,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering. Constructed once per
/// session with filters cleared and no tabs; no ambient globals.
pub struct AppState {
    /// Loaded dataset (None until something is uploaded).
    pub dataset: Option<Dataset>,

    /// The active filter rules; scoped to the current dataset session.
    pub filters: FilterSet,

    /// Indices of rows passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Live editable plot configuration, mirrored into the active tab.
    pub config: PlotConfig,

    pub tabs: Vec<PlotTab>,
    pub active_tab: Option<u64>,
    next_tab_id: u64,

    /// Cached compiler output; rebuilt on every filter or config change.
    pub compiled: CompileResult,

    /// Per-column statistics from the analysis service (may be empty).
    pub statistics: BTreeMap<String, ColumnStatistics>,

    /// Predefined templates from the data service.
    pub templates: Vec<Template>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether an upload is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            filters: FilterSet::default(),
            visible_indices: Vec::new(),
            config: PlotConfig::default(),
            tabs: Vec::new(),
            active_tab: None,
            next_tab_id: 0,
            compiled: CompileResult::empty_no_data(),
            statistics: BTreeMap::new(),
            templates: Vec::new(),
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset: filters and tabs belong to the old
    /// session and are dropped, then a fresh "Main Plot" tab is created.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters.clear();
        self.visible_indices = (0..dataset.len()).collect();
        self.config = PlotConfig::default();
        self.tabs.clear();
        self.active_tab = None;
        self.statistics.clear();
        self.dataset = Some(dataset);
        self.add_tab(Some("Main Plot".to_string()));
        self.status_message = None;
        self.loading = false;
        self.recompile();
    }

    /// Recompute `visible_indices` after a filter change, then recompile.
    pub fn refilter(&mut self) {
        if let Some(dataset) = &self.dataset {
            self.visible_indices = filtered_indices(&dataset.rows, &self.filters);
        }
        self.recompile();
    }

    /// Rebuild the compiled plot from the filtered rows and the live config.
    pub fn recompile(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.compiled = CompileResult::empty_no_data();
            return;
        };
        let rows: Vec<Row> = self
            .visible_indices
            .iter()
            .map(|&i| dataset.rows[i].clone())
            .collect();
        self.compiled = compile(&rows, &self.config);
    }

    /// Called after any edit to the live config: the active tab keeps its
    /// own copy in sync, then the plot is recompiled.
    pub fn config_changed(&mut self) {
        if let Some(active) = self.active_tab {
            if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == active) {
                tab.config = self.config.clone();
            }
        }
        self.recompile();
    }

    /// Apply a partial configuration (suggestion or template).
    pub fn apply_patch(&mut self, patch: &ConfigPatch) {
        patch.apply_to(&mut self.config);
        if let Some(dataset) = &self.dataset {
            self.config.retain_columns(&dataset.columns);
        }
        self.config_changed();
    }

    // ---- tabs ----

    /// Create a tab capturing the current configuration and activate it.
    pub fn add_tab(&mut self, name: Option<String>) -> u64 {
        self.next_tab_id += 1;
        let id = self.next_tab_id;
        let name = name.unwrap_or_else(|| format!("Plot {}", self.tabs.len() + 1));
        self.tabs.push(PlotTab {
            id,
            name,
            config: self.config.clone(),
        });
        self.active_tab = Some(id);
        id
    }

    /// Activate a tab, re-applying its stored configuration.
    pub fn activate_tab(&mut self, id: u64) {
        let Some(tab) = self.tabs.iter().find(|t| t.id == id) else {
            return;
        };
        self.config = tab.config.clone();
        self.active_tab = Some(id);
        self.recompile();
    }

    // ---- filter mutations (each one recomputes the filtered row set) ----

    pub fn add_filter(&mut self) {
        if let Some(dataset) = &self.dataset {
            let dataset = dataset.clone();
            if self.filters.add(&dataset) {
                self.refilter();
            }
        }
    }

    pub fn remove_filter(&mut self, id: u64) {
        if self.filters.remove(id) {
            self.refilter();
        }
    }

    pub fn set_filter_column(&mut self, id: u64, column: &str) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let column_type = dataset.column_type(column);
        if self.filters.set_column(id, column, column_type) {
            self.refilter();
        }
    }

    pub fn set_filter_operator(&mut self, id: u64, op: FilterOp) {
        if self.filters.set_operator(id, op) {
            self.refilter();
        }
    }

    pub fn set_filter_value(&mut self, id: u64, field: ValueField) {
        if self.filters.set_value(id, field) {
            self.refilter();
        }
    }
}
