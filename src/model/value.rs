//! Typed field values attached to model parts, properties and entities.

use serde::{Deserialize, Serialize};

/// Registered type of a field variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    Bool,
    Int,
    /// Scalar double; the only kind a degree of freedom can be fixed on.
    Double,
    String,
    /// Fixed size 3-component vector.
    Array3,
    /// Dynamically sized vector.
    Vector,
    Matrix,
}

impl VariableKind {
    /// Kinds that are written as `[n](..)` / `[r,c]((..))`.
    pub fn is_vectorial(self) -> bool {
        matches!(
            self,
            VariableKind::Array3 | VariableKind::Vector | VariableKind::Matrix
        )
    }

    /// Whether nodal data of this kind may carry a fixity flag.
    pub fn is_fixable(self) -> bool {
        matches!(self, VariableKind::Double)
    }
}

/// Dense row-major matrix value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Returns `None` when `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        (rows * cols == data.len()).then_some(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    /// Iterate over rows as slices.
    pub fn row_iter(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |r| &self.data[r * self.cols..(r + 1) * self.cols])
    }
}

/// A parsed field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array3([f64; 3]),
    Vector(Vec<f64>),
    Matrix(Matrix),
}

impl Value {
    pub fn kind(&self) -> VariableKind {
        match self {
            Value::Bool(_) => VariableKind::Bool,
            Value::Int(_) => VariableKind::Int,
            Value::Double(_) => VariableKind::Double,
            Value::String(_) => VariableKind::String,
            Value::Array3(_) => VariableKind::Array3,
            Value::Vector(_) => VariableKind::Vector,
            Value::Matrix(_) => VariableKind::Matrix,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            Value::Array3(v) => Some(v),
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }
}

/// A nodal value together with its degree-of-freedom fixity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodalValue {
    pub value: Value,
    pub fixed: bool,
}
