//! In-memory representation of one dataset's rows.
//!
//! The backend speaks in row objects (`{column: value}`); the grid view needs
//! positional cells. [`Grid`] carries the column labels next to the cells so
//! the conversion in both directions goes through labels, never through
//! whatever order a map happens to enumerate its keys in.
//!
//! ```
//! use serde_json::json;
//! use wrangler::grid::{Grid, Record};
//!
//! let record: Record = serde_json::from_value(json!({"q1": 10, "q2": 20})).unwrap();
//! let grid = Grid::from_records(&[record.clone()]);
//! assert_eq!(grid.columns(), ["q1", "q2"]);
//! assert_eq!(grid.to_records(), vec![record]);
//! ```

use crate::error::{Result, WranglerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// One backend row: column label -> value, in the order the backend sent it.
pub type Record = serde_json::Map<String, Value>;

/// A single spreadsheet cell. Serialized as `{"value": ...}`, the shape the
/// positional fetch payload uses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: Value,
}

impl Cell {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Text shown in the grid. Null renders as an empty cell.
    pub fn display_text(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Interprets edited text, keeping the type of the value it replaces where
    /// the text allows it.
    pub fn from_input(text: &str, previous: &Value) -> Self {
        let trimmed = text.trim();
        let value = match previous {
            Value::String(_) => Value::String(text.to_owned()),
            _ if trimmed.is_empty() => Value::Null,
            Value::Number(_) => parse_number(trimmed).unwrap_or_else(|| Value::String(text.to_owned())),
            Value::Bool(_) => parse_bool(trimmed).unwrap_or_else(|| Value::String(text.to_owned())),
            Value::Null => parse_number(trimmed)
                .or_else(|| parse_bool(trimmed))
                .unwrap_or_else(|| Value::String(text.to_owned())),
            Value::Array(_) | Value::Object(_) => {
                serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(text.to_owned()))
            }
        };
        Self { value }
    }
}

/// Integers beyond `u64` have no exact JSON number here and stay as text.
fn parse_number(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Value::from(u));
    }
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn parse_bool(text: &str) -> Option<Value> {
    match text.to_ascii_lowercase().as_str() {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Rectangular, labelled block of cells.
///
/// Grids are values: edits produce a new grid ([`Grid::with_cell`]) rather
/// than patching one that somebody else may be rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Builds a grid, checking that labels are unique and every row is as
    /// wide as the label list.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(WranglerError::Validation(format!(
                "duplicate column label '{dup}'"
            )));
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(WranglerError::Validation(format!(
                "row {idx} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Converts backend row objects into positional cells.
    ///
    /// Labels come from the first row in its order; keys that only appear in
    /// later rows are appended as new columns. Missing keys become null.
    pub fn from_records(records: &[Record]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|col| Cell::new(record.get(col).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Adopts rows that arrive already positional. Labels are generated as
    /// `column1..N`; short rows are padded with null.
    pub fn from_cell_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns = (1..=width).map(|i| format!("column{i}")).collect();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize_with(width, Cell::default);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Converts back to row objects keyed by the grid's column labels.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(col, cell)| (col.clone(), cell.value.clone()))
                    .collect()
            })
            .collect()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Returns a copy of the grid with one cell replaced.
    pub fn with_cell(&self, row: usize, col: usize, cell: Cell) -> Result<Self> {
        let mut next = self.clone();
        let slot = next
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or_else(|| {
                WranglerError::Validation(format!(
                    "cell ({row}, {col}) is outside a {}x{} grid",
                    self.row_count(),
                    self.column_count()
                ))
            })?;
        *slot = cell;
        Ok(next)
    }

    /// First `limit` rows, for previews.
    pub fn head(&self, limit: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(limit).cloned().collect(),
        }
    }
}
