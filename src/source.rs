//! Source reader: one input stream plus an input format becomes one `Value`
//!
//! Sources are read in full before anything is evaluated. A source is
//! stdin (`-`), a file path, or an inherited file descriptor (`fd:N`, read
//! through `/dev/fd/N`).

use crate::ast::{DType, NdArray, Table, Value};
use crate::error::ConfigError;
use ndarray::ShapeError;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Stdin,
    Path(PathBuf),
    Descriptor(i32),
}

impl FromStr for Location {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ConfigError::InvalidSource(s.to_string()));
        }
        if s == "-" {
            return Ok(Location::Stdin);
        }
        if let Some(fd) = s.strip_prefix("fd:") {
            return fd
                .parse::<i32>()
                .ok()
                .filter(|n| *n >= 0)
                .map(Location::Descriptor)
                .ok_or_else(|| ConfigError::InvalidSource(s.to_string()));
        }
        Ok(Location::Path(PathBuf::from(s)))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Stdin => write!(f, "<stdin>"),
            Location::Path(p) => write!(f, "{}", p.display()),
            Location::Descriptor(n) => write!(f, "fd:{}", n),
        }
    }
}

/// One declared input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub location: Location,
    /// `None` for positional sources, which are numbered by the binder
    pub name: Option<String>,
}

impl InputSpec {
    pub fn unnamed(location: Location) -> Self {
        InputSpec { location, name: None }
    }

    pub fn named(name: impl Into<String>, location: Location) -> Self {
        InputSpec { location, name: Some(name.into()) }
    }

    /// Parse `NAME=SOURCE` as given to `--name`
    pub fn parse_named(arg: &str) -> Result<Self, ConfigError> {
        let (name, source) = arg
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidSourceName(arg.to_string()))?;
        if !is_identifier(name) {
            return Err(ConfigError::InvalidSourceName(arg.to_string()));
        }
        Ok(InputSpec::named(name, source.parse()?))
    }
}

/// A name the expression language can refer to
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
        && !matches!(name, "and" | "or" | "not" | "True" | "False" | "None")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// Whitespace-separated numbers, one row per line
    #[default]
    Auto,
    /// One string per line
    Lines,
    /// The whole input as one string
    Str,
    /// Headerless comma-separated values
    Csv,
    /// Comma-separated values with a header row, as a table
    Pandas,
}

impl InputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            InputFormat::Auto => "auto",
            InputFormat::Lines => "lines",
            InputFormat::Str => "str",
            InputFormat::Csv => "csv",
            InputFormat::Pandas => "pandas",
        }
    }
}

impl FromStr for InputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(InputFormat::Auto),
            "lines" => Ok(InputFormat::Lines),
            "str" => Ok(InputFormat::Str),
            "csv" => Ok(InputFormat::Csv),
            "pandas" => Ok(InputFormat::Pandas),
            other => Err(ConfigError::UnknownInputFormat(other.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{location}: {source}")]
    Io {
        location: String,
        source: std::io::Error,
    },
    #[error("{location}: input is not valid UTF-8")]
    Decode { location: String },
    #[error("{location}: line {line}: '{token}' is not a number")]
    NotANumber {
        location: String,
        line: usize,
        token: String,
    },
    #[error("{location}: line {line} has {got} columns, expected {expected}")]
    Ragged {
        location: String,
        line: usize,
        expected: usize,
        got: usize,
    },
    #[error("{location}: {source}")]
    Csv { location: String, source: csv::Error },
    #[error("{location}: table has no header row")]
    EmptyTable { location: String },
    #[error("{location}: {source}")]
    Shape { location: String, source: ShapeError },
}

/// Read one source to completion and convert it per `format`
pub fn read_source(
    spec: &InputSpec,
    format: InputFormat,
    stdin: &mut dyn Read,
) -> Result<Value, SourceError> {
    let location = spec.location.to_string();
    let io_err = |source| SourceError::Io { location: location.clone(), source };

    let bytes = match &spec.location {
        Location::Stdin => {
            let mut buf = Vec::new();
            stdin.read_to_end(&mut buf).map_err(io_err)?;
            buf
        }
        Location::Path(path) => std::fs::read(path).map_err(io_err)?,
        Location::Descriptor(fd) => std::fs::read(format!("/dev/fd/{}", fd)).map_err(io_err)?,
    };
    let text = String::from_utf8(bytes)
        .map_err(|_| SourceError::Decode { location: location.clone() })?;

    let value = parse_text(&text, format, &location)?;
    log::debug!("read {} as {}: {}", location, format.name(), value.summary());
    Ok(value)
}

/// Convert already-decoded input text
pub fn parse_text(text: &str, format: InputFormat, location: &str) -> Result<Value, SourceError> {
    match format {
        InputFormat::Auto => parse_numbers(text, location),
        InputFormat::Lines => Ok(Value::StrArray(text.lines().map(String::from).collect())),
        InputFormat::Str => Ok(Value::Str(text.to_string())),
        InputFormat::Csv => parse_csv(text, location),
        InputFormat::Pandas => parse_table(text, location),
    }
}

fn parse_numbers(text: &str, location: &str) -> Result<Value, SourceError> {
    let mut rows: Vec<(usize, Vec<f64>)> = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| SourceError::NotANumber {
                    location: location.to_string(),
                    line: i + 1,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((i + 1, row));
    }

    // A single column reads as a flat array
    if rows.iter().all(|(_, row)| row.len() == 1) {
        let data = rows.into_iter().map(|(_, row)| row[0]).collect();
        return Ok(Value::Array(NdArray::from_vec(data)));
    }

    let width = rows[0].1.len();
    if let Some((line, row)) = rows.iter().find(|(_, row)| row.len() != width) {
        return Err(SourceError::Ragged {
            location: location.to_string(),
            line: *line,
            expected: width,
            got: row.len(),
        });
    }
    let shape = [rows.len(), width];
    let data = rows.into_iter().flat_map(|(_, row)| row).collect();
    matrix(&shape, data, location)
}

fn matrix(shape: &[usize], data: Vec<f64>, location: &str) -> Result<Value, SourceError> {
    NdArray::from_shape_vec(shape, data, DType::Float)
        .map(Value::Array)
        .map_err(|source| SourceError::Shape { location: location.to_string(), source })
}

fn csv_err(location: &str) -> impl Fn(csv::Error) -> SourceError + '_ {
    move |source| SourceError::Csv { location: location.to_string(), source }
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

fn parse_csv(text: &str, location: &str) -> Result<Value, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(text.as_bytes());
    let records = reader
        .records()
        .map(|r| r.map(|rec| rec.iter().map(String::from).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err(location))?;

    if records.is_empty() {
        return Ok(Value::Array(NdArray::from_vec(vec![])));
    }

    let numeric: Option<Vec<f64>> = records.iter().flatten().map(|cell| parse_cell(cell)).collect();
    match numeric {
        Some(data) => matrix(&[records.len(), records[0].len()], data, location),
        None => Ok(Value::List(records.into_iter().map(Value::StrArray).collect())),
    }
}

fn parse_table(text: &str, location: &str) -> Result<Value, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());
    let headers: Vec<String> =
        reader.headers().map_err(csv_err(location))?.iter().map(String::from).collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SourceError::EmptyTable { location: location.to_string() });
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(csv_err(location))?;
        for (column, cell) in cells.iter_mut().zip(record.iter()) {
            column.push(cell.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, column)| {
            // Empty cells do not decide the column type; they read as NaN
            let numeric: Option<Vec<f64>> = column
                .iter()
                .map(|cell| if cell.trim().is_empty() { Some(f64::NAN) } else { parse_cell(cell) })
                .collect();
            let value = match numeric {
                Some(data) => Value::Array(NdArray::from_vec(data)),
                None => Value::StrArray(column),
            };
            (name, value)
        })
        .collect();
    Ok(Value::Table(Table::new(columns)))
}
