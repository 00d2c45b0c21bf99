//! Source binder: decides what each source is called and builds the scope
//!
//! Positional sources are numbered in declaration order: the first is `d`
//! (also `d1`, `data` and `data1`), the second `d2`/`data2`, and so on.
//! Named sources are bound only under their own name. Library names go in
//! first so data bindings win any collision.

use crate::ast::Value;
use crate::error::ConfigError;
use crate::eval::resolve_module;
use crate::scope::Scope;
use crate::source::InputSpec;

/// Options that add library names to the scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindOptions {
    pub kitchen_sink: bool,
    /// Extra imports, as given to `--module`
    pub modules: Vec<String>,
}

/// Convenience names merged by `--kitchen-sink`
pub const KITCHEN_SINK: &[(&str, &str)] = &[
    ("math", "module:math"),
    ("random", "module:random"),
    ("pi", "np.pi"),
    ("e", "np.e"),
    ("inf", "np.inf"),
    ("nan", "np.nan"),
    ("sqrt", "np.sqrt"),
    ("exp", "np.exp"),
    ("log", "np.log"),
    ("mean", "np.mean"),
    ("median", "np.median"),
    ("std", "np.std"),
    ("var", "np.var"),
    ("prod", "np.prod"),
    ("cumsum", "np.cumsum"),
    ("arange", "np.arange"),
    ("linspace", "np.linspace"),
];

/// The names one source will be bound under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Position in declaration order
    pub index: usize,
    pub names: Vec<String>,
}

impl Binding {
    /// The name used in generated code and logs
    pub fn primary(&self) -> &str {
        &self.names[0]
    }
}

/// Compute every source's names without reading anything
pub fn plan(specs: &[InputSpec]) -> Vec<Binding> {
    let mut positional = 0;
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let names = match &spec.name {
                Some(name) => vec![name.clone()],
                None => {
                    positional += 1;
                    let n = positional;
                    let mut names = vec![format!("d{}", n), format!("data{}", n)];
                    if n == 1 {
                        names.insert(0, "d".to_string());
                        names.push("data".to_string());
                    }
                    names
                }
            };
            Binding { index, names }
        })
        .collect()
}

/// Check every requested module before any source is opened
pub fn resolve_modules(modules: &[String]) -> Result<Vec<(String, Value)>, ConfigError> {
    modules
        .iter()
        .map(|m| resolve_module(m).ok_or_else(|| ConfigError::UnknownModule(m.clone())))
        .collect()
}

fn kitchen_sink_value(target: &str) -> Value {
    match target.strip_prefix("module:") {
        Some(module) => Value::Module(module.to_string()),
        None => match target {
            "np.pi" => Value::Number(std::f64::consts::PI),
            "np.e" => Value::Number(std::f64::consts::E),
            "np.inf" => Value::Number(f64::INFINITY),
            "np.nan" => Value::Number(f64::NAN),
            function => Value::Function(function.to_string()),
        },
    }
}

/// Build the evaluation scope from sources already read, in declaration order
pub fn bind(sources: Vec<(InputSpec, Value)>, options: &BindOptions) -> Result<Scope, ConfigError> {
    let mut scope = Scope::new();
    scope.set("np", Value::Module("np".into()));

    for (name, module) in resolve_modules(&options.modules)? {
        scope.set(name, module);
    }

    if options.kitchen_sink {
        for (name, target) in KITCHEN_SINK {
            scope.set(*name, kitchen_sink_value(target));
        }
    }

    let specs: Vec<InputSpec> = sources.iter().map(|(spec, _)| spec.clone()).collect();
    let mut claimed: Vec<String> = Vec::new();
    for (binding, (spec, value)) in plan(&specs).into_iter().zip(sources) {
        log::debug!("bind {} <- {}: {}", binding.names.join(", "), spec.location, value.summary());
        for name in binding.names {
            if claimed.contains(&name) {
                log::warn!("source {} rebinds '{}'; the later source wins", spec.location, name);
            } else {
                claimed.push(name.clone());
            }
            scope.set(name, value.clone());
        }
    }

    log::debug!("scope: {}", scope.names().join(", "));
    Ok(scope)
}
