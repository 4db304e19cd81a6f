use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a tabular row
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, mirroring what the data service emits as
/// JSON (pandas-style records: strings, numbers, booleans, nulls).
///
/// Untagged so `150`, `"Fuller"`, `true` and `null` all deserialize directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl CellValue {
    /// Interpret the cell as a number, parsing text if necessary.
    /// Numeric filter comparisons and bar aggregation both go through here;
    /// a `None` means "exclude from the computation", never an error.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }

    /// Whether the cell is absent for display/grouping purposes.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

/// One row of the dataset: column name → scalar value.
/// Rows come from the data service and are read-only from the core's side.
pub type Row = BTreeMap<String, CellValue>;

/// Stringify a possibly-missing cell for text comparisons and group keys.
/// Absent and null cells both stringify to the empty string.
pub fn cell_text(cell: Option<&CellValue>) -> String {
    cell.map(|v| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Column metadata
// ---------------------------------------------------------------------------

/// Declared type of a column, fixed for the lifetime of a dataset.
/// Constrains which filter operators are selectable for the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
}

/// Per-column metadata delivered with the dataset load response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Distinct values observed in the column, in first-seen order.
    /// Populated for categorical columns; drives the filter value dropdowns.
    #[serde(default)]
    pub sample_values: Vec<String>,
    #[serde(default)]
    pub unique_count: usize,
    #[serde(default)]
    pub null_count: usize,
}

// ---------------------------------------------------------------------------
// Dataset – one loaded tabular dataset
// ---------------------------------------------------------------------------

/// The dataset a session works on: the full row set plus the column
/// metadata and configuration suggestions returned by the data service.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    /// Column names in original file order.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub column_info: BTreeMap<String, ColumnDescriptor>,
    pub suggestions: Vec<crate::data::service::Suggestion>,
}

impl Dataset {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Declared type of a column; unknown columns default to categorical.
    pub fn column_type(&self, column: &str) -> ColumnType {
        self.column_info
            .get(column)
            .map(|info| info.column_type)
            .unwrap_or(ColumnType::Categorical)
    }
}
