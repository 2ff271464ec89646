//! Text form of typed field values.
//!
//! | kind     | text                      |
//! |----------|---------------------------|
//! | `Bool`   | `1` / `0`                 |
//! | `Int`    | `-3`                      |
//! | `Double` | `2.5`                     |
//! | `String` | `"steel"`                 |
//! | `Array3` | `[3](1.0,2.0,3.0)`        |
//! | `Vector` | `[2](0.5,1.5)`            |
//! | `Matrix` | `[2,2]((1,0),(0,1))`      |
//!
//! Vectorial values may contain whitespace; the scanner folds them into one
//! token before they reach [`parse_value`].

use crate::io::block::{BlockReader, parse_bool};
use crate::mesh_error::{MeshIoError, ParseErrorKind};
use crate::model::value::{Matrix, Value, VariableKind};
use itertools::Itertools;
use std::io::{BufRead, Seek};

/// Parse the text of a value of the given kind.
pub fn parse_value(kind: VariableKind, text: &str) -> Result<Value, String> {
    match kind {
        VariableKind::Bool => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| "expected a boolean".to_string()),
        VariableKind::Int => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| "expected an integer".to_string()),
        VariableKind::Double => parse_f64(text).map(Value::Double),
        VariableKind::String => Ok(Value::String(unquote(text).to_string())),
        VariableKind::Array3 => {
            let values = parse_vector(text)?;
            let array: [f64; 3] = values
                .try_into()
                .map_err(|v: Vec<f64>| format!("expected 3 components, found {}", v.len()))?;
            Ok(Value::Array3(array))
        }
        VariableKind::Vector => parse_vector(text).map(Value::Vector),
        VariableKind::Matrix => parse_matrix(text).map(Value::Matrix),
    }
}

fn parse_f64(text: &str) -> Result<f64, String> {
    text.parse::<f64>()
        .map_err(|_| "expected a floating point number".to_string())
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Split `[header](body)` into `header` and `body`.
fn split_sized(text: &str) -> Result<(&str, &str), String> {
    let rest = text
        .strip_prefix('[')
        .ok_or_else(|| "expected `[` to open the size".to_string())?;
    let close = rest
        .find(']')
        .ok_or_else(|| "expected `]` to close the size".to_string())?;
    let header = &rest[..close];
    let body = rest[close + 1..]
        .strip_prefix('(')
        .and_then(|b| b.strip_suffix(')'))
        .ok_or_else(|| "expected `(...)` after the size".to_string())?;
    Ok((header, body))
}

fn parse_size(text: &str) -> Result<usize, String> {
    text.trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid size `{text}`"))
}

fn parse_list(body: &str) -> Result<Vec<f64>, String> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    body.split(',').map(|v| parse_f64(v.trim())).collect()
}

fn parse_vector(text: &str) -> Result<Vec<f64>, String> {
    let (header, body) = split_sized(text)?;
    let size = parse_size(header)?;
    let values = parse_list(body)?;
    if values.len() != size {
        return Err(format!(
            "declared {size} components, found {}",
            values.len()
        ));
    }
    Ok(values)
}

fn parse_matrix(text: &str) -> Result<Matrix, String> {
    let (header, body) = split_sized(text)?;
    let (rows, cols) = header
        .split_once(',')
        .ok_or_else(|| "expected `[rows,cols]`".to_string())?;
    let rows = parse_size(rows)?;
    let cols = parse_size(cols)?;
    let mut data = Vec::with_capacity(rows * cols);
    let body = body.trim();
    let mut row_count = 0;
    if !body.is_empty() {
        let inner = body
            .strip_prefix('(')
            .and_then(|b| b.strip_suffix(')'))
            .ok_or_else(|| "expected parenthesized matrix rows".to_string())?;
        for row in inner.split("),(") {
            let values = parse_list(row)?;
            if values.len() != cols {
                return Err(format!(
                    "row {row_count} has {} columns, expected {cols}",
                    values.len()
                ));
            }
            data.extend(values);
            row_count += 1;
        }
    }
    // `[r,0]()` carries no row groups at all
    if body.is_empty() && cols == 0 {
        row_count = rows;
    }
    if row_count != rows {
        return Err(format!("declared {rows} rows, found {row_count}"));
    }
    Matrix::new(rows, cols, data).ok_or_else(|| "matrix size mismatch".to_string())
}

/// Format a float. `None` gives the shortest text that reads back exactly.
pub fn format_f64(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(p) => format!("{value:.p$e}"),
        None => format!("{value}"),
    }
}

fn format_list(values: &[f64], precision: Option<usize>) -> String {
    values.iter().map(|v| format_f64(*v, precision)).join(",")
}

/// Text form of `value`, accepted back by [`parse_value`].
pub fn format_value(value: &Value, precision: Option<usize>) -> String {
    match value {
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Int(i) => i.to_string(),
        Value::Double(d) => format_f64(*d, precision),
        Value::String(s) => format!("\"{s}\""),
        Value::Array3(a) => format!("[3]({})", format_list(a, precision)),
        Value::Vector(v) => format!("[{}]({})", v.len(), format_list(v, precision)),
        Value::Matrix(m) => {
            let rows = m
                .row_iter()
                .map(|row| format!("({})", format_list(row, precision)))
                .join(",");
            format!("[{},{}]({rows})", m.rows(), m.cols())
        }
    }
}

impl<R: BufRead + Seek> BlockReader<R> {
    /// Read the next value of `kind` in block `context`.
    pub fn read_value(&mut self, kind: VariableKind, context: &str) -> Result<Value, MeshIoError> {
        let text = if kind.is_vectorial() || kind == VariableKind::String {
            self.expect_bracketed(context)?
        } else {
            self.expect_word(context)?
        };
        parse_value(kind, &text).map_err(|reason| {
            self.error(ParseErrorKind::InvalidValue, reason)
                .with_found(text)
                .into()
        })
    }

    /// Consume one value of unknown kind: a bracketed value or a single word.
    pub fn skip_value(&mut self, context: &str) -> Result<(), MeshIoError> {
        self.expect_bracketed(context)?;
        Ok(())
    }
}
