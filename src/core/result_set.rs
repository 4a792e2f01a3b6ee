//! Tabular view of a query result, ready for rendering

use serde_json::Value;

use crate::core::engine::{EngineError, QueryOutput, Row};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    /// Convert engine rows into positional cells.
    ///
    /// Headers come from the first row; every later row must carry the same
    /// columns in the same order. With no rows, the reported schema (if any)
    /// supplies the headers.
    pub fn from_output(output: QueryOutput) -> Result<Self, EngineError> {
        let Some(first) = output.rows.first() else {
            return Ok(Self {
                headers: output.columns.unwrap_or_default(),
                rows: Vec::new(),
            });
        };

        let headers: Vec<String> = first.keys().cloned().collect();
        let rows = output
            .rows
            .iter()
            .enumerate()
            .map(|(position, row)| to_cells(position, row, &headers))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { headers, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn to_cells(position: usize, row: &Row, headers: &[String]) -> Result<Vec<String>, EngineError> {
    if row.len() != headers.len() {
        return Err(EngineError::MalformedResult(format!(
            "row {position} has {} columns, expected {}",
            row.len(),
            headers.len()
        )));
    }

    row.iter()
        .zip(headers)
        .map(|((name, value), header)| {
            if name == header {
                Ok(format_cell(value))
            } else {
                Err(EngineError::MalformedResult(format!(
                    "row {position} has column '{name}' where '{header}' was expected"
                )))
            }
        })
        .collect()
}

/// Display text for one cell; NULL renders as an empty cell
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
