//! Numeric grid files.
//!
//! Cells are separated by whitespace, tabs or commas. A row is one line;
//! blank lines are skipped, so an empty file is an empty matrix.

use serde_json::{Number, Value};
use st_common::{Error, Result};
use std::path::Path;

use crate::fs_util;

pub struct MatrixReader;

impl MatrixReader {
    pub fn parse(content: &str, origin: &Path) -> Result<Value> {
        let mut rows = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let cells: Vec<&str> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|cell| !cell.is_empty())
                .collect();
            if cells.is_empty() {
                continue;
            }

            let mut row = Vec::with_capacity(cells.len());
            for (col, cell) in cells.iter().enumerate() {
                let location = format!("{}:{}:{}", origin.display(), line_no + 1, col + 1);
                row.push(parse_cell(cell, &location)?);
            }
            rows.push(Value::Array(row));
        }
        Ok(Value::Array(rows))
    }

    pub fn read(path: &Path) -> Result<Value> {
        Self::parse(&fs_util::read_to_string(path)?, path)
    }
}

fn parse_cell(cell: &str, location: &str) -> Result<Value> {
    if let Ok(n) = cell.parse::<i64>() {
        return Ok(Value::from(n));
    }
    cell.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| Error::coercion(location, "number", cell))
}

pub struct MatrixWriter;

impl MatrixWriter {
    /// Check that `value` is an array of arrays of numbers.
    pub fn check(value: &Value) -> Result<()> {
        let Value::Array(rows) = value else {
            return Err(Error::coercion("matrix", "array of rows", value.to_string()));
        };
        for (i, row) in rows.iter().enumerate() {
            let Value::Array(cells) = row else {
                return Err(Error::coercion(format!("row {}", i + 1), "array", row.to_string()));
            };
            if let Some(bad) = cells.iter().find(|c| !c.is_number()) {
                return Err(Error::coercion(format!("row {}", i + 1), "number", bad.to_string()));
            }
        }
        Ok(())
    }

    /// Tab-separated rows, each newline-terminated.
    pub fn render(value: &Value) -> Result<String> {
        Self::check(value)?;
        let mut out = String::new();
        if let Value::Array(rows) = value {
            for row in rows {
                if let Value::Array(cells) = row {
                    let line: Vec<String> = cells.iter().map(Value::to_string).collect();
                    out.push_str(&line.join("\t"));
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }

    pub fn write(path: &Path, value: &Value) -> Result<()> {
        let text = Self::render(value)?;
        fs_util::write_atomic(path, text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_mixed_separators() {
        let value = MatrixReader::parse("1\t2.5\t3\n4, 5 ,6\n\n", Path::new("m.txt")).unwrap();
        assert_eq!(value, json!([[1, 2.5, 3], [4, 5, 6]]));
    }

    #[test]
    fn test_empty_file_is_empty_matrix() {
        assert_eq!(MatrixReader::parse("", Path::new("m.txt")).unwrap(), json!([]));
        assert_eq!(MatrixReader::parse("\n\n", Path::new("m.txt")).unwrap(), json!([]));
    }

    #[test]
    fn test_non_numeric_cell_reports_location() {
        let err = MatrixReader::parse("1 2\n3 x\n", Path::new("m.txt")).unwrap_err();
        match err {
            Error::TypeCoercion { location, value, .. } => {
                assert_eq!(location, "m.txt:2:2");
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_tab_separated() {
        let text = MatrixWriter::render(&json!([[1, 2], [3.5, -4]])).unwrap();
        assert_eq!(text, "1\t2\n3.5\t-4\n");
        assert_eq!(MatrixWriter::render(&json!([])).unwrap(), "");
    }

    #[test]
    fn test_render_rejects_non_matrix() {
        assert!(MatrixWriter::render(&json!({"a": 1})).is_err());
        assert!(MatrixWriter::render(&json!([1, 2])).is_err());
        assert!(MatrixWriter::render(&json!([["a"]])).is_err());
    }
}
