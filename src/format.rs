//! Result formatter: turns the final value into output bytes
//!
//! The whole output is built in memory so that a formatting error leaves
//! stdout untouched.

use crate::ast::{format_number, Value};
use crate::display::repr;
use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FormatError {
    #[error("cannot write a {0} as array output")]
    NotAnArray(&'static str),
    #[error("raw output needs a string, got {0}")]
    NotText(&'static str),
    #[error("text element '{0}' needs --array-format str")]
    TextElement(String),
    #[error("'{0}' is not representable as an integer")]
    NotAnInteger(String),
}

/// 2^63; `int` output covers the open range (-2^63, 2^63)
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// How each element of array output is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElementFormat {
    /// Integral numbers without a decimal point, others shortest round-trip
    #[default]
    Default,
    Str,
    Int,
    Float,
    /// Fixed number of decimals
    Fixed(usize),
}

impl FromStr for ElementFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownElementFormat(s.to_string());
        match s {
            "default" => Ok(ElementFormat::Default),
            "str" | "%s" => Ok(ElementFormat::Str),
            "int" | "%d" => Ok(ElementFormat::Int),
            "float" => Ok(ElementFormat::Float),
            _ => {
                let digits = s
                    .strip_prefix("%.")
                    .and_then(|rest| rest.strip_suffix('f'))
                    .or_else(|| s.strip_prefix('.'))
                    .ok_or_else(unknown)?;
                digits.parse().map(ElementFormat::Fixed).map_err(|_| unknown())
            }
        }
    }
}

impl fmt::Display for ElementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementFormat::Default => write!(f, "default"),
            ElementFormat::Str => write!(f, "str"),
            ElementFormat::Int => write!(f, "int"),
            ElementFormat::Float => write!(f, "float"),
            ElementFormat::Fixed(n) => write!(f, ".{}", n),
        }
    }
}

/// What the formatter writes. Exactly one per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Array { element: ElementFormat },
    Raw,
    Repr,
    Discard,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Array { element: ElementFormat::Default }
    }
}

/// One flattened element of array output
enum Element<'a> {
    Num(f64),
    Bool(bool),
    Text(&'a str),
}

fn flatten<'a>(val: &'a Value, out: &mut Vec<Element<'a>>) -> Result<(), FormatError> {
    match val {
        Value::Number(n) => out.push(Element::Num(*n)),
        Value::Bool(b) => out.push(Element::Bool(*b)),
        Value::Str(s) => out.push(Element::Text(s)),
        Value::Array(a) if a.is_bool() => out.extend(a.iter().map(|x| Element::Bool(x != 0.0))),
        Value::Array(a) => out.extend(a.iter().map(Element::Num)),
        Value::StrArray(items) => out.extend(items.iter().map(|s| Element::Text(s))),
        Value::List(items) => {
            for item in items {
                flatten(item, out)?;
            }
        }
        Value::None | Value::Table(_) | Value::Module(_) | Value::Function(_) => {
            return Err(FormatError::NotAnArray(val.type_name()))
        }
    }
    Ok(())
}

fn special(x: f64) -> Option<&'static str> {
    if x.is_nan() {
        Some("nan")
    } else if x == f64::INFINITY {
        Some("inf")
    } else if x == f64::NEG_INFINITY {
        Some("-inf")
    } else {
        None
    }
}

fn write_element(el: &Element<'_>, format: ElementFormat) -> Result<String, FormatError> {
    let x = match (el, format) {
        (Element::Text(s), ElementFormat::Str) => return Ok(s.to_string()),
        (Element::Text(s), _) => return Err(FormatError::TextElement(s.to_string())),
        (Element::Bool(b), ElementFormat::Default | ElementFormat::Str) => {
            return Ok(if *b { "True" } else { "False" }.to_string())
        }
        (Element::Bool(b), _) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        (Element::Num(x), _) => *x,
    };

    Ok(match format {
        ElementFormat::Default | ElementFormat::Str => format_number(x),
        ElementFormat::Int => {
            // Out of range values would saturate in the cast
            if !x.is_finite() || x.abs() >= I64_LIMIT {
                return Err(FormatError::NotAnInteger(format_number(x)));
            }
            format!("{}", x.trunc() as i64)
        }
        ElementFormat::Float => match special(x) {
            Some(s) => s.to_string(),
            None if x.fract() == 0.0 => format!("{:.1}", x),
            None => x.to_string(),
        },
        ElementFormat::Fixed(digits) => match special(x) {
            Some(s) => s.to_string(),
            None => format!("{:.*}", digits, x),
        },
    })
}

/// Render the final value for the chosen output mode
pub fn format_result(val: &Value, mode: &OutputMode) -> Result<Vec<u8>, FormatError> {
    match mode {
        OutputMode::Discard => Ok(Vec::new()),
        OutputMode::Raw => match val {
            Value::Str(s) => Ok(s.as_bytes().to_vec()),
            other => Err(FormatError::NotText(other.type_name())),
        },
        OutputMode::Repr => Ok(format!("{}\n", repr(val)).into_bytes()),
        OutputMode::Array { element } => {
            let mut elements = Vec::new();
            flatten(val, &mut elements)?;
            let mut out = String::new();
            for el in &elements {
                out.push_str(&write_element(el, *element)?);
                out.push('\n');
            }
            Ok(out.into_bytes())
        }
    }
}
