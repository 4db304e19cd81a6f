use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{CellValue, ColumnDescriptor, ColumnType, Row};
use crate::plot::config::{ChartType, ConfigPatch};

// ---------------------------------------------------------------------------
// Wire contract
// ---------------------------------------------------------------------------

/// Response to a dataset upload: everything the client needs to drive the
/// column selectors, the filter builder, and the suggestion cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: String,
    pub filename: String,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub column_info: BTreeMap<String, ColumnDescriptor>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// A ranked configuration suggestion derived from the dataset's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Confidence in [0, 1]; suggestions arrive sorted descending.
    pub confidence: f64,
    pub config: ConfigPatch,
}

/// A saved, reusable plot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub config: ConfigPatch,
}

/// Per-column summary statistics computed by the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnStatistics {
    Numeric {
        count: usize,
        mean: f64,
        median: f64,
        std: f64,
        min: f64,
        max: f64,
    },
    Categorical {
        count: usize,
        unique: usize,
        top_values: BTreeMap<String, usize>,
    },
}

/// Envelope of the row-fetch response.
#[derive(Debug, Clone, Deserialize)]
pub struct RowsResponse {
    pub data: Vec<Row>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to parse upload: {0}")]
    Parse(#[from] csv::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The data-serving collaborator. Parsing, statistics, and persistence live
/// behind this seam; the core only consumes the request/response contract.
pub trait DataService {
    /// Submit a raw tabular file; returns the dataset summary.
    fn upload(&mut self, filename: &str, bytes: &[u8]) -> Result<DatasetSummary, ServiceError>;

    /// Fetch the full ordered row set of a loaded dataset.
    fn fetch_rows(&self, dataset_id: &str) -> Result<Vec<Row>, ServiceError>;

    /// Fetch per-column summary statistics for a loaded dataset.
    fn fetch_statistics(
        &self,
        dataset_id: &str,
        columns: &[String],
    ) -> Result<BTreeMap<String, ColumnStatistics>, ServiceError>;

    /// List the predefined visualization templates.
    fn list_templates(&self) -> Result<Vec<Template>, ServiceError>;
}

// ---------------------------------------------------------------------------
// Local in-process service
// ---------------------------------------------------------------------------

/// Fraction of parseable values above which a column counts as numeric.
const NUMERIC_THRESHOLD: f64 = 0.8;
/// Cap on the distinct sample values collected per column.
const MAX_SAMPLE_VALUES: usize = 20;

/// In-process stand-in for the remote data service: parses CSV/TSV uploads,
/// detects column types, and generates configuration suggestions. Summary
/// statistics stay with the remote analysis service and are not computed
/// here.
#[derive(Debug, Default)]
pub struct LocalDataService {
    datasets: BTreeMap<String, Vec<Row>>,
    next_id: u64,
}

impl DataService for LocalDataService {
    fn upload(&mut self, filename: &str, bytes: &[u8]) -> Result<DatasetSummary, ServiceError> {
        let lower = filename.to_ascii_lowercase();
        let delimiter = if lower.ends_with(".tsv") {
            b'\t'
        } else if lower.ends_with(".csv") {
            b','
        } else {
            return Err(ServiceError::UnsupportedFormat(filename.to_string()));
        };

        let (columns, rows) = parse_delimited(bytes, delimiter)?;
        let column_info = detect_column_types(&columns, &rows);
        let suggestions = generate_suggestions(&columns, &column_info);

        self.next_id += 1;
        let id = format!("local-{}", self.next_id);
        let row_count = rows.len();
        self.datasets.insert(id.clone(), rows);

        Ok(DatasetSummary {
            id,
            filename: filename.to_string(),
            columns,
            row_count,
            column_info,
            suggestions,
        })
    }

    fn fetch_rows(&self, dataset_id: &str) -> Result<Vec<Row>, ServiceError> {
        self.datasets
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| ServiceError::DatasetNotFound(dataset_id.to_string()))
    }

    fn fetch_statistics(
        &self,
        dataset_id: &str,
        _columns: &[String],
    ) -> Result<BTreeMap<String, ColumnStatistics>, ServiceError> {
        if !self.datasets.contains_key(dataset_id) {
            return Err(ServiceError::DatasetNotFound(dataset_id.to_string()));
        }
        Ok(BTreeMap::new())
    }

    fn list_templates(&self) -> Result<Vec<Template>, ServiceError> {
        Ok(builtin_templates())
    }
}

/// Parse a delimited text file: header row with column names, one record
/// per row. Cells are typed by parsing: number, boolean, empty → null.
fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<(Vec<String>, Vec<Row>), ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (i, column) in columns.iter().enumerate() {
            let raw = record.get(i).unwrap_or("").trim();
            row.insert(column.clone(), typed_cell(raw));
        }
        rows.push(row);
    }
    Ok((columns, rows))
}

fn typed_cell(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::Null;
    }
    if let Ok(v) = raw.parse::<f64>() {
        return CellValue::Number(v);
    }
    if raw == "true" || raw == "false" {
        return CellValue::Bool(raw == "true");
    }
    CellValue::Text(raw.to_string())
}

/// Classify each column as numeric or categorical and collect its distinct
/// sample values in first-seen order.
fn detect_column_types(columns: &[String], rows: &[Row]) -> BTreeMap<String, ColumnDescriptor> {
    let mut info = BTreeMap::new();
    for column in columns {
        let mut numeric = 0usize;
        let mut non_null = 0usize;
        let mut null_count = 0usize;
        let mut sample_values: Vec<String> = Vec::new();
        let mut unique_count = 0usize;

        for row in rows {
            let cell = row.get(column);
            if cell.map_or(true, |c| c.is_blank()) {
                null_count += 1;
                continue;
            }
            non_null += 1;
            let cell = cell.unwrap();
            if cell.as_f64().is_some() {
                numeric += 1;
            }
            let display = cell.to_string();
            if !sample_values.contains(&display) {
                unique_count += 1;
                if sample_values.len() < MAX_SAMPLE_VALUES {
                    sample_values.push(display);
                }
            }
        }

        let numeric_ratio = if non_null > 0 {
            numeric as f64 / non_null as f64
        } else {
            0.0
        };
        let column_type = if numeric_ratio > NUMERIC_THRESHOLD {
            ColumnType::Numeric
        } else {
            ColumnType::Categorical
        };
        // Sample value dropdowns are only meaningful for categorical columns.
        if column_type == ColumnType::Numeric {
            sample_values.clear();
        }

        info.insert(
            column.clone(),
            ColumnDescriptor {
                column_type,
                sample_values,
                unique_count,
                null_count,
            },
        );
    }
    info
}

/// Configuration suggestions ranked by confidence, based on the mix of
/// numeric and categorical columns.
fn generate_suggestions(
    columns: &[String],
    column_info: &BTreeMap<String, ColumnDescriptor>,
) -> Vec<Suggestion> {
    let numeric: Vec<&String> = columns
        .iter()
        .filter(|c| column_info.get(*c).map(|i| i.column_type) == Some(ColumnType::Numeric))
        .collect();
    let categorical: Vec<&String> = columns
        .iter()
        .filter(|c| column_info.get(*c).map(|i| i.column_type) == Some(ColumnType::Categorical))
        .collect();

    let mut suggestions = Vec::new();

    if !categorical.is_empty() && !numeric.is_empty() {
        suggestions.push(Suggestion {
            id: "category_comparison".into(),
            title: "Category Comparison".into(),
            description: format!("Compare {} across {}", numeric[0], categorical[0]),
            confidence: 0.8,
            config: ConfigPatch {
                chart_type: Some(ChartType::Box),
                x_axis: Some(categorical[0].clone()),
                left_y_axes: Some(vec![numeric[0].clone()]),
                right_y_axes: Some(Vec::new()),
                grouping: Some(categorical.get(1).map(|c| vec![(*c).clone()]).unwrap_or_default()),
                ..Default::default()
            },
        });
    }

    if numeric.len() >= 2 {
        suggestions.push(Suggestion {
            id: "correlation".into(),
            title: "Correlation Analysis".into(),
            description: format!(
                "Analyze relationship between {} and {}",
                numeric[0], numeric[1]
            ),
            confidence: 0.7,
            config: ConfigPatch {
                chart_type: Some(ChartType::Scatter),
                x_axis: Some(numeric[0].clone()),
                left_y_axes: Some(vec![numeric[1].clone()]),
                right_y_axes: Some(Vec::new()),
                grouping: Some(
                    categorical.first().map(|c| vec![(*c).clone()]).unwrap_or_default(),
                ),
                ..Default::default()
            },
        });
    }

    if numeric.len() >= 3 {
        suggestions.push(Suggestion {
            id: "multi_metric".into(),
            title: "Multi-Metric View".into(),
            description: "Compare multiple metrics on dual axes".into(),
            confidence: 0.6,
            config: ConfigPatch {
                chart_type: Some(ChartType::Line),
                x_axis: categorical.first().or(numeric.first()).map(|c| (*c).clone()),
                left_y_axes: Some(numeric[..2].iter().map(|c| (*c).clone()).collect()),
                right_y_axes: Some(vec![numeric[2].clone()]),
                grouping: Some(Vec::new()),
                ..Default::default()
            },
        });
    }

    suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    suggestions
}

fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "sales_dashboard".into(),
            name: "Sales Dashboard".into(),
            category: "Business".into(),
            description: "Track sales metrics over time with multiple KPIs".into(),
            config: ConfigPatch {
                chart_type: Some(ChartType::Line),
                show_data_points: Some(true),
                ..Default::default()
            },
        },
        Template {
            id: "scientific_analysis".into(),
            name: "Scientific Analysis".into(),
            category: "Science".into(),
            description: "Statistical analysis with error bars and regression".into(),
            config: ConfigPatch {
                chart_type: Some(ChartType::Scatter),
                show_outliers: Some(true),
                ..Default::default()
            },
        },
        Template {
            id: "comparison_study".into(),
            name: "Comparison Study".into(),
            category: "Analysis".into(),
            description: "Compare multiple groups with box plots".into(),
            config: ConfigPatch {
                chart_type: Some(ChartType::Box),
                show_outliers: Some(true),
                show_data_points: Some(true),
                ..Default::default()
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Displacement,Pull Load (N),Adhesive
0.1,150,Fuller
0.2,310,Fuller
0.1,120,Sika
0.2,250,Sika
";

    #[test]
    fn upload_detects_types_and_counts_rows() {
        let mut service = LocalDataService::default();
        let summary = service.upload("pull_test.csv", CSV.as_bytes()).unwrap();

        assert_eq!(summary.row_count, 4);
        assert_eq!(
            summary.columns,
            vec!["Displacement", "Pull Load (N)", "Adhesive"]
        );
        assert_eq!(
            summary.column_info["Displacement"].column_type,
            ColumnType::Numeric
        );
        assert_eq!(
            summary.column_info["Adhesive"].column_type,
            ColumnType::Categorical
        );
        assert_eq!(
            summary.column_info["Adhesive"].sample_values,
            vec!["Fuller", "Sika"]
        );
        assert_eq!(summary.column_info["Adhesive"].unique_count, 2);
    }

    #[test]
    fn upload_rejects_unknown_extensions() {
        let mut service = LocalDataService::default();
        let err = service.upload("data.xlsx", b"...").unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedFormat(_)));
    }

    #[test]
    fn fetch_rows_round_trips_typed_cells() {
        let mut service = LocalDataService::default();
        let summary = service.upload("pull_test.csv", CSV.as_bytes()).unwrap();
        let rows = service.fetch_rows(&summary.id).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["Pull Load (N)"], CellValue::Number(150.0));
        assert_eq!(rows[0]["Adhesive"], CellValue::Text("Fuller".into()));
    }

    #[test]
    fn fetch_rows_unknown_dataset_errors() {
        let service = LocalDataService::default();
        assert!(matches!(
            service.fetch_rows("nope"),
            Err(ServiceError::DatasetNotFound(_))
        ));
    }

    #[test]
    fn suggestions_are_sorted_by_confidence() {
        let mut service = LocalDataService::default();
        let summary = service.upload("pull_test.csv", CSV.as_bytes()).unwrap();

        assert!(!summary.suggestions.is_empty());
        for pair in summary.suggestions.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        let comparison = summary
            .suggestions
            .iter()
            .find(|s| s.id == "category_comparison")
            .unwrap();
        assert_eq!(comparison.config.chart_type, Some(ChartType::Box));
        assert_eq!(comparison.config.x_axis.as_deref(), Some("Adhesive"));
    }

    #[test]
    fn tsv_uploads_are_supported() {
        let mut service = LocalDataService::default();
        let summary = service
            .upload("data.tsv", b"a\tb\n1\tx\n2\ty\n")
            .unwrap();
        assert_eq!(summary.row_count, 2);
        assert_eq!(summary.column_info["a"].column_type, ColumnType::Numeric);
    }

    #[test]
    fn dataset_summary_deserializes_from_wire_json() {
        let json = r#"{
            "id": "abc",
            "filename": "pull_test.csv",
            "columns": ["Adhesive"],
            "rowCount": 12,
            "columnInfo": {
                "Adhesive": {"type": "categorical", "sample_values": ["Fuller", "Sika"]}
            },
            "suggestions": [
                {"id": "s1", "title": "t", "description": "d", "confidence": 0.9,
                 "config": {"chartType": "bar", "xAxis": "Adhesive"}}
            ]
        }"#;
        let summary: DatasetSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.row_count, 12);
        assert_eq!(summary.suggestions[0].config.chart_type, Some(ChartType::Bar));
    }

    #[test]
    fn statistics_deserialize_untagged() {
        let json = r#"{
            "load": {"count": 12, "mean": 486.7, "median": 480.0, "std": 250.1,
                     "min": 120.0, "max": 900.0},
            "adhesive": {"count": 12, "unique": 2, "top_values": {"Fuller": 6, "Sika": 6}}
        }"#;
        let stats: BTreeMap<String, ColumnStatistics> = serde_json::from_str(json).unwrap();
        assert!(matches!(stats["load"], ColumnStatistics::Numeric { .. }));
        assert!(matches!(
            stats["adhesive"],
            ColumnStatistics::Categorical { .. }
        ));
    }
}
