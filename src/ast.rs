//! AST and runtime values for npcli expressions
//!
//! An expression string parses into a `Program`: a list of statements where
//! the last statement supplies the value. Evaluation produces `Value`s, which
//! are also what the source reader binds into the scope:
//! - numeric data lives in `NdArray`, an `ndarray::ArrayD` tagged `Float` or `Bool`
//! - text data is a `Str` or a `StrArray`
//! - `pandas` input is a `Table` of named columns

use ndarray::{arr0, Array1, ArrayD, ArrayViewD, IxDyn, ShapeError};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

/// Binary operators, in no particular precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitAnd,
    BitOr,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
        }
    }

    /// Comparison operators always produce booleans
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,    // -x
    Pos,    // +x
    Invert, // ~x
    Not,    // not x
}

/// Short-circuiting `and` / `or`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// One component of a subscript: `x[i]`, `x[a:b:c]`, `x[i, :]`
#[derive(Debug, Clone, PartialEq)]
pub enum IndexExpr {
    Single(Expr),
    Slice {
        start: Option<Expr>,
        stop: Option<Expr>,
        step: Option<Expr>,
    },
}

/// An expression in the npcli language
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    None,

    /// A variable reference, resolved against the scope at eval time
    Name(String),

    /// List literal `[a, b, c]`
    List(Vec<Expr>),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `value.name`
    Attribute {
        value: Box<Expr>,
        name: String,
    },

    /// `func(args...)`
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `value[index, ...]`
    Index {
        value: Box<Expr>,
        index: Vec<IndexExpr>,
    },
}

impl Expr {
    /// Collect every name this expression reads.
    ///
    /// Attribute names are not variables, so `np.sum(d)` reads `np` and `d`.
    pub fn collect_names(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) | Expr::Str(_) | Expr::Bool(_) | Expr::None => {}
            Expr::Name(name) => {
                out.insert(name.clone());
            }
            Expr::List(items) => items.iter().for_each(|e| e.collect_names(out)),
            Expr::Unary { operand, .. } => operand.collect_names(out),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.collect_names(out);
                right.collect_names(out);
            }
            Expr::Attribute { value, .. } => value.collect_names(out),
            Expr::Call { func, args } => {
                func.collect_names(out);
                args.iter().for_each(|e| e.collect_names(out));
            }
            Expr::Index { value, index } => {
                value.collect_names(out);
                for part in index {
                    match part {
                        IndexExpr::Single(e) => e.collect_names(out),
                        IndexExpr::Slice { start, stop, step } => {
                            for e in [start, stop, step].into_iter().flatten() {
                                e.collect_names(out);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// A statement: either a bare expression or `name = expr`
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Assign { name: String, value: Expr },
}

/// A parsed expression string is a sequence of statements
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }

    /// Names read anywhere in the program (assignment targets excluded)
    pub fn names(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for stmt in &self.statements {
            match stmt {
                Stmt::Expr(e) | Stmt::Assign { value: e, .. } => e.collect_names(&mut out),
            }
        }
        out
    }
}

/// Element type of an `NdArray`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Float,
    /// Stored as 0.0 / 1.0
    Bool,
}

impl DType {
    pub fn name(&self) -> &'static str {
        match self {
            DType::Float => "float64",
            DType::Bool => "bool",
        }
    }
}

/// A dense n-dimensional numeric array
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    pub values: ArrayD<f64>,
    pub dtype: DType,
}

impl NdArray {
    pub fn new(values: ArrayD<f64>, dtype: DType) -> Self {
        NdArray { values, dtype }
    }

    /// Lay out row-major `data` as `shape`
    pub fn from_shape_vec(
        shape: &[usize],
        data: Vec<f64>,
        dtype: DType,
    ) -> Result<Self, ShapeError> {
        Ok(NdArray::new(ArrayD::from_shape_vec(IxDyn(shape), data)?, dtype))
    }

    /// A 1-D float array
    pub fn from_vec(data: Vec<f64>) -> Self {
        NdArray::new(Array1::from_vec(data).into_dyn(), DType::Float)
    }

    /// A 1-D bool array
    pub fn from_bools(bools: Vec<bool>) -> Self {
        let data = bools.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect::<Vec<_>>();
        NdArray::new(Array1::from_vec(data).into_dyn(), DType::Bool)
    }

    /// A 0-d array holding one element
    pub fn zero_dim(x: f64, dtype: DType) -> Self {
        NdArray::new(arr0(x).into_dyn(), dtype)
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn ndim(&self) -> usize {
        self.values.ndim()
    }

    /// Number of elements
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Length of the first axis (what `len()` reports)
    pub fn len(&self) -> usize {
        self.shape().first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_bool(&self) -> bool {
        self.dtype == DType::Bool
    }

    /// Elements in logical row-major order, whatever the memory layout
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    pub fn first(&self) -> Option<f64> {
        self.iter().next()
    }

    /// Element `i` of a 1-D array
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(IxDyn(&[i])).copied()
    }

    /// Wrap one stored element as a scalar value of this array's dtype
    pub fn scalar(&self, x: f64) -> Value {
        match self.dtype {
            DType::Float => Value::Number(x),
            DType::Bool => Value::Bool(x != 0.0),
        }
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        if dtype == DType::Bool {
            self.values.mapv_inplace(|x| if x != 0.0 { 1.0 } else { 0.0 });
        }
        self.dtype = dtype;
        self
    }
}

/// Tabular data with named, independently typed columns
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Each column is a 1-D `Value::Array` or a `Value::StrArray`
    pub columns: Vec<(String, Value)>,
}

impl Table {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Table { columns }
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// A runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(NdArray),
    /// A sequence of text values (`lines` input, string columns)
    StrArray(Vec<String>),
    /// Heterogeneous list
    List(Vec<Value>),
    Table(Table),
    /// A library namespace such as `np`
    Module(String),
    /// A callable library function, by qualified name (`np.sum`)
    Function(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "str",
            Value::Array(_) => "array",
            Value::StrArray(_) => "str array",
            Value::List(_) => "list",
            Value::Table(_) => "table",
            Value::Module(_) => "module",
            Value::Function(_) => "function",
        }
    }

    /// Length as reported by `len()`; scalars report 1
    pub fn len(&self) -> usize {
        match self {
            Value::Array(a) => a.len(),
            Value::StrArray(items) => items.len(),
            Value::List(items) => items.len(),
            Value::Table(t) => t.nrows(),
            Value::Str(s) => s.chars().count(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short description for debug logging
    pub fn summary(&self) -> String {
        match self {
            Value::Array(a) => format!("array(shape={:?}, dtype={})", a.shape(), a.dtype.name()),
            Value::StrArray(items) => format!("str array(len={})", items.len()),
            Value::List(items) => format!("list(len={})", items.len()),
            Value::Table(t) => format!("table(rows={}, columns={:?})", t.nrows(), t.names()),
            Value::Str(s) => format!("str(len={})", s.len()),
            Value::Number(n) => format!("number({})", format_number(*n)),
            Value::Bool(b) => format!("bool({})", b),
            Value::Module(m) => format!("module({})", m),
            Value::Function(f) => format!("function({})", f),
            Value::None => "None".to_string(),
        }
    }
}

/// Render a number the way npcli prints it: integral values drop the `.0`
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Convert a Value to JSON
pub fn value_to_json(v: &Value) -> JsonValue {
    match v {
        Value::None | Value::Module(_) | Value::Function(_) => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Array(a) => array_to_json(a, a.values.view()),
        Value::StrArray(items) => {
            JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
        }
        Value::List(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::Table(table) => {
            // Records orientation: one object per row
            let records = (0..table.nrows())
                .map(|row| {
                    let obj: serde_json::Map<String, JsonValue> = table
                        .columns
                        .iter()
                        .map(|(name, col)| {
                            let cell = match col {
                                Value::Array(a) => a
                                    .get(row)
                                    .map(|x| value_to_json(&a.scalar(x)))
                                    .unwrap_or(JsonValue::Null),
                                Value::StrArray(items) => items
                                    .get(row)
                                    .map(|s| JsonValue::String(s.clone()))
                                    .unwrap_or(JsonValue::Null),
                                _ => JsonValue::Null,
                            };
                            (name.clone(), cell)
                        })
                        .collect();
                    JsonValue::Object(obj)
                })
                .collect();
            JsonValue::Array(records)
        }
    }
}

fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        JsonValue::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

fn array_to_json(a: &NdArray, view: ArrayViewD<'_, f64>) -> JsonValue {
    match view.ndim() {
        0 => view
            .iter()
            .next()
            .map(|&x| value_to_json(&a.scalar(x)))
            .unwrap_or(JsonValue::Null),
        1 => JsonValue::Array(view.iter().map(|&x| value_to_json(&a.scalar(x))).collect()),
        _ => JsonValue::Array(view.outer_iter().map(|row| array_to_json(a, row)).collect()),
    }
}
