use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{cell_text, ColumnType, Dataset, Row};

// ---------------------------------------------------------------------------
// Filter operators
// ---------------------------------------------------------------------------

/// Comparison operator of one filter rule. Which operators are selectable
/// depends on the bound column's declared type, see [`operators_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    Between,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl FilterOp {
    /// Human-readable label for the builder UI.
    pub fn label(self) -> &'static str {
        match self {
            FilterOp::Equals => "Equals",
            FilterOp::NotEquals => "Not Equals",
            FilterOp::GreaterThan => "Greater Than",
            FilterOp::LessThan => "Less Than",
            FilterOp::GreaterEqual => "Greater or Equal",
            FilterOp::LessEqual => "Less or Equal",
            FilterOp::Between => "Between",
            FilterOp::Contains => "Contains",
            FilterOp::StartsWith => "Starts With",
            FilterOp::EndsWith => "Ends With",
            FilterOp::In => "In List",
        }
    }
}

/// The fixed operator vocabulary per column type. Single source of truth:
/// the builder UI offers exactly these, and [`FilterSet::set_operator`]
/// rejects anything outside the set for the bound column.
pub fn operators_for(column_type: ColumnType) -> &'static [FilterOp] {
    match column_type {
        ColumnType::Numeric => &[
            FilterOp::Equals,
            FilterOp::NotEquals,
            FilterOp::GreaterThan,
            FilterOp::LessThan,
            FilterOp::GreaterEqual,
            FilterOp::LessEqual,
            FilterOp::Between,
        ],
        ColumnType::Categorical => &[
            FilterOp::Equals,
            FilterOp::NotEquals,
            FilterOp::Contains,
            FilterOp::StartsWith,
            FilterOp::EndsWith,
            FilterOp::In,
        ],
    }
}

// ---------------------------------------------------------------------------
// FilterSpec – one predicate rule
// ---------------------------------------------------------------------------

/// One filter rule: column, operator, and the value fields the operator
/// reads. Only the fields matching the operator's shape are meaningful;
/// changing column or operator clears all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub id: u64,
    pub column: String,
    pub column_type: ColumnType,
    pub op: FilterOp,
    /// Scalar comparison value (`equals`, `contains`, ordering operators…).
    pub value: String,
    /// Lower bound for `between`; empty or unparseable means unconstrained.
    pub min_value: String,
    /// Upper bound for `between`; empty or unparseable means unconstrained.
    pub max_value: String,
    /// Membership set for `in`.
    pub values: BTreeSet<String>,
}

/// Which value field a [`FilterSet::set_value`] call targets.
#[derive(Debug, Clone)]
pub enum ValueField {
    Value(String),
    Min(String),
    Max(String),
    Values(BTreeSet<String>),
}

impl FilterSpec {
    fn new(id: u64, column: String, column_type: ColumnType) -> Self {
        FilterSpec {
            id,
            column,
            column_type,
            op: FilterOp::Equals,
            value: String::new(),
            min_value: String::new(),
            max_value: String::new(),
            values: BTreeSet::new(),
        }
    }

    fn clear_values(&mut self) {
        self.value.clear();
        self.min_value.clear();
        self.max_value.clear();
        self.values.clear();
    }

    /// Evaluate this rule against one row.
    pub fn evaluate(&self, row: &Row) -> bool {
        let cell = row.get(&self.column);
        match self.op {
            FilterOp::Equals => cell_text(cell) == self.value,
            FilterOp::NotEquals => cell_text(cell) != self.value,
            FilterOp::Contains => cell_text(cell).contains(&self.value),
            FilterOp::StartsWith => cell_text(cell).starts_with(&self.value),
            FilterOp::EndsWith => cell_text(cell).ends_with(&self.value),
            FilterOp::GreaterThan => self.compare(cell, |x, v| x > v),
            FilterOp::LessThan => self.compare(cell, |x, v| x < v),
            FilterOp::GreaterEqual => self.compare(cell, |x, v| x >= v),
            FilterOp::LessEqual => self.compare(cell, |x, v| x <= v),
            FilterOp::Between => {
                // Either bound may be left open; both ends are inclusive.
                let Some(x) = cell.and_then(|c| c.as_f64()) else {
                    return false;
                };
                let min_ok = self
                    .min_value
                    .trim()
                    .parse::<f64>()
                    .map(|min| x >= min)
                    .unwrap_or(true);
                let max_ok = self
                    .max_value
                    .trim()
                    .parse::<f64>()
                    .map(|max| x <= max)
                    .unwrap_or(true);
                min_ok && max_ok
            }
            FilterOp::In => {
                // Nothing selected → nothing matches.
                self.values.contains(&cell_text(cell))
            }
        }
    }

    /// Numeric comparison; a cell or filter value that fails to parse as a
    /// number never matches.
    fn compare(&self, cell: Option<&super::model::CellValue>, cmp: impl Fn(f64, f64) -> bool) -> bool {
        match (cell.and_then(|c| c.as_f64()), self.value.trim().parse::<f64>()) {
            (Some(x), Ok(v)) => cmp(x, v),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSet – the ordered filter collection
// ---------------------------------------------------------------------------

/// The ordered collection of filter rules for the current dataset session.
///
/// Every mutating method returns whether anything changed so the owner knows
/// to recompute the filtered row set and re-render.
#[derive(Debug, Default)]
pub struct FilterSet {
    specs: Vec<FilterSpec>,
    next_id: u64,
}

impl FilterSet {
    /// Append a new rule defaulted to the first known column with operator
    /// `Equals` and empty values. No-op when the dataset has no columns.
    pub fn add(&mut self, dataset: &Dataset) -> bool {
        let Some(first) = dataset.columns.first() else {
            return false;
        };
        self.next_id += 1;
        self.specs.push(FilterSpec::new(
            self.next_id,
            first.clone(),
            dataset.column_type(first),
        ));
        true
    }

    /// Remove the rule with the given id; no-op if absent.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.specs.len();
        self.specs.retain(|s| s.id != id);
        self.specs.len() != before
    }

    /// Rebind a rule to another column: operator falls back to `Equals` and
    /// all value fields are cleared, keeping column/operator/value consistent.
    pub fn set_column(&mut self, id: u64, column: &str, column_type: ColumnType) -> bool {
        let Some(spec) = self.get_mut(id) else {
            return false;
        };
        spec.column = column.to_string();
        spec.column_type = column_type;
        spec.op = FilterOp::Equals;
        spec.clear_values();
        true
    }

    /// Change a rule's operator, clearing the value fields (operators expect
    /// structurally different value shapes). Operators outside the vocabulary
    /// of the bound column's type are ignored.
    pub fn set_operator(&mut self, id: u64, op: FilterOp) -> bool {
        let Some(spec) = self.get_mut(id) else {
            return false;
        };
        if !operators_for(spec.column_type).contains(&op) {
            return false;
        }
        spec.op = op;
        spec.clear_values();
        true
    }

    /// Set a single value field without touching the rest of the rule.
    pub fn set_value(&mut self, id: u64, field: ValueField) -> bool {
        let Some(spec) = self.get_mut(id) else {
            return false;
        };
        match field {
            ValueField::Value(v) => spec.value = v,
            ValueField::Min(v) => spec.min_value = v,
            ValueField::Max(v) => spec.max_value = v,
            ValueField::Values(v) => spec.values = v,
        }
        true
    }

    /// Drop all rules (new dataset session).
    pub fn clear(&mut self) -> bool {
        let had_any = !self.specs.is_empty();
        self.specs.clear();
        had_any
    }

    /// The rules in insertion order.
    pub fn list(&self) -> &[FilterSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Logical AND across all rules; an empty collection excludes nothing.
    pub fn evaluate_all(&self, row: &Row) -> bool {
        self.specs.iter().all(|spec| spec.evaluate(row))
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut FilterSpec> {
        self.specs.iter_mut().find(|s| s.id == id)
    }
}

/// Return indices of rows that pass all active filters.
pub fn filtered_indices(rows: &[Row], filters: &FilterSet) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| filters.evaluate_all(row))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use std::collections::BTreeMap;

    fn dataset() -> Dataset {
        let mut column_info = BTreeMap::new();
        column_info.insert(
            "load".to_string(),
            crate::data::model::ColumnDescriptor {
                column_type: ColumnType::Numeric,
                sample_values: Vec::new(),
                unique_count: 0,
                null_count: 0,
            },
        );
        column_info.insert(
            "adhesive".to_string(),
            crate::data::model::ColumnDescriptor {
                column_type: ColumnType::Categorical,
                sample_values: vec!["Fuller".into(), "Sika".into()],
                unique_count: 2,
                null_count: 0,
            },
        );
        Dataset {
            id: "ds".into(),
            name: "test".into(),
            columns: vec!["load".into(), "adhesive".into()],
            rows: Vec::new(),
            column_info,
            suggestions: Vec::new(),
        }
    }

    fn row(load: f64, adhesive: &str) -> Row {
        let mut r = Row::new();
        r.insert("load".into(), CellValue::Number(load));
        r.insert("adhesive".into(), CellValue::Text(adhesive.into()));
        r
    }

    #[test]
    fn operator_vocabulary_is_fixed_per_type() {
        assert_eq!(operators_for(ColumnType::Numeric).len(), 7);
        assert_eq!(operators_for(ColumnType::Categorical).len(), 6);
        assert!(operators_for(ColumnType::Numeric).contains(&FilterOp::Between));
        assert!(!operators_for(ColumnType::Numeric).contains(&FilterOp::Contains));
        assert!(operators_for(ColumnType::Categorical).contains(&FilterOp::In));
        assert!(!operators_for(ColumnType::Categorical).contains(&FilterOp::Between));
    }

    #[test]
    fn add_defaults_to_first_column_and_equals() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        assert!(filters.add(&ds));
        let spec = &filters.list()[0];
        assert_eq!(spec.column, "load");
        assert_eq!(spec.op, FilterOp::Equals);
        assert!(spec.value.is_empty());
    }

    #[test]
    fn add_without_columns_is_a_noop() {
        let mut ds = dataset();
        ds.columns.clear();
        let mut filters = FilterSet::default();
        assert!(!filters.add(&ds));
        assert!(filters.is_empty());
    }

    #[test]
    fn set_column_resets_operator_and_values() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let id = filters.list()[0].id;
        filters.set_operator(id, FilterOp::Between);
        filters.set_value(id, ValueField::Min("1".into()));
        filters.set_value(id, ValueField::Max("5".into()));

        filters.set_column(id, "adhesive", ColumnType::Categorical);
        let spec = &filters.list()[0];
        assert_eq!(spec.op, FilterOp::Equals);
        assert!(spec.min_value.is_empty() && spec.max_value.is_empty());
        assert!(spec.value.is_empty() && spec.values.is_empty());
    }

    #[test]
    fn set_operator_clears_values_and_rejects_foreign_ops() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let id = filters.list()[0].id;
        filters.set_value(id, ValueField::Value("42".into()));

        assert!(filters.set_operator(id, FilterOp::GreaterThan));
        assert!(filters.list()[0].value.is_empty());

        // `contains` is not in the numeric vocabulary.
        assert!(!filters.set_operator(id, FilterOp::Contains));
        assert_eq!(filters.list()[0].op, FilterOp::GreaterThan);
    }

    #[test]
    fn remove_is_noop_for_unknown_id() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        assert!(!filters.remove(999));
        assert!(filters.remove(filters.list()[0].id));
        assert!(filters.is_empty());
    }

    #[test]
    fn empty_collection_accepts_every_row() {
        let filters = FilterSet::default();
        assert!(filters.evaluate_all(&row(1.0, "Fuller")));
        assert!(filters.evaluate_all(&Row::new()));
    }

    #[test]
    fn equals_matches_stringified_value_case_sensitively() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let id = filters.list()[0].id;
        filters.set_column(id, "adhesive", ColumnType::Categorical);
        filters.set_value(id, ValueField::Value("Fuller".into()));

        assert!(filters.evaluate_all(&row(1.0, "Fuller")));
        assert!(!filters.evaluate_all(&row(1.0, "fuller")));
        assert!(!filters.evaluate_all(&row(1.0, "Sika")));
    }

    #[test]
    fn substring_operators() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let id = filters.list()[0].id;
        filters.set_column(id, "adhesive", ColumnType::Categorical);

        filters.set_operator(id, FilterOp::Contains);
        filters.set_value(id, ValueField::Value("ull".into()));
        assert!(filters.evaluate_all(&row(1.0, "Fuller")));
        assert!(!filters.evaluate_all(&row(1.0, "Sika")));

        filters.set_operator(id, FilterOp::StartsWith);
        filters.set_value(id, ValueField::Value("Si".into()));
        assert!(filters.evaluate_all(&row(1.0, "Sika")));

        filters.set_operator(id, FilterOp::EndsWith);
        filters.set_value(id, ValueField::Value("ka".into()));
        assert!(filters.evaluate_all(&row(1.0, "Sika")));
        assert!(!filters.evaluate_all(&row(1.0, "Fuller")));
    }

    #[test]
    fn numeric_comparison_excludes_unparseable_cells() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let id = filters.list()[0].id;
        filters.set_operator(id, FilterOp::GreaterEqual);
        filters.set_value(id, ValueField::Value("300".into()));

        assert!(filters.evaluate_all(&row(450.0, "Fuller")));
        assert!(!filters.evaluate_all(&row(150.0, "Fuller")));

        let mut bad = Row::new();
        bad.insert("load".into(), CellValue::Text("n/a".into()));
        assert!(!filters.evaluate_all(&bad));
        // Missing column never matches a numeric comparison either.
        assert!(!filters.evaluate_all(&Row::new()));
    }

    #[test]
    fn between_is_inclusive_and_bounds_are_optional() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let id = filters.list()[0].id;
        filters.set_operator(id, FilterOp::Between);
        filters.set_value(id, ValueField::Min("0.2".into()));
        filters.set_value(id, ValueField::Max("0.5".into()));

        assert!(filters.evaluate_all(&row(0.2, "x")));
        assert!(filters.evaluate_all(&row(0.5, "x")));
        assert!(!filters.evaluate_all(&row(0.1, "x")));
        assert!(!filters.evaluate_all(&row(0.6, "x")));

        // Open upper bound.
        filters.set_value(id, ValueField::Max(String::new()));
        assert!(filters.evaluate_all(&row(1e9, "x")));
        assert!(!filters.evaluate_all(&row(0.1, "x")));

        // Both bounds open: any numeric cell passes, non-numeric never does.
        filters.set_value(id, ValueField::Min(String::new()));
        assert!(filters.evaluate_all(&row(-5.0, "x")));
        let mut text = Row::new();
        text.insert("load".into(), CellValue::Text("abc".into()));
        assert!(!filters.evaluate_all(&text));
    }

    #[test]
    fn in_with_empty_set_matches_nothing() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let id = filters.list()[0].id;
        filters.set_column(id, "adhesive", ColumnType::Categorical);
        filters.set_operator(id, FilterOp::In);

        assert!(!filters.evaluate_all(&row(1.0, "Fuller")));

        let set: BTreeSet<String> = ["Fuller".to_string(), "Dow".to_string()].into();
        filters.set_value(id, ValueField::Values(set));
        assert!(filters.evaluate_all(&row(1.0, "Fuller")));
        assert!(!filters.evaluate_all(&row(1.0, "Sika")));
    }

    #[test]
    fn rules_combine_with_logical_and() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let a = filters.list()[0].id;
        filters.set_operator(a, FilterOp::GreaterThan);
        filters.set_value(a, ValueField::Value("200".into()));

        filters.add(&ds);
        let b = filters.list()[1].id;
        filters.set_column(b, "adhesive", ColumnType::Categorical);
        filters.set_value(b, ValueField::Value("Sika".into()));

        assert!(filters.evaluate_all(&row(250.0, "Sika")));
        assert!(!filters.evaluate_all(&row(250.0, "Fuller")));
        assert!(!filters.evaluate_all(&row(150.0, "Sika")));
    }

    #[test]
    fn filtered_indices_keeps_row_order() {
        let ds = dataset();
        let rows = vec![row(100.0, "Fuller"), row(300.0, "Sika"), row(500.0, "Fuller")];
        let mut filters = FilterSet::default();
        filters.add(&ds);
        let id = filters.list()[0].id;
        filters.set_operator(id, FilterOp::GreaterThan);
        filters.set_value(id, ValueField::Value("200".into()));

        assert_eq!(filtered_indices(&rows, &filters), vec![1, 2]);
    }
}
