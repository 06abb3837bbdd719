//! Dynamically typed option values and the type descriptors that check them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::core::{Podfile, Specification};
use crate::resolver::Lockfile;
use crate::util::GlobalContext;

/// The value of a configuration option.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    String(String),
    Path(PathBuf),
    Url(Url),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Podfile(Arc<Podfile>),
    Lockfile(Arc<Lockfile>),
    Specification(Arc<Specification>),
    Context(Arc<GlobalContext>),
    /// A value that failed to be computed, holding the failure message
    Error(String),
}

impl Value {
    /// Wrap a list of strings.
    pub fn strings<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Array(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// The runtime type name used in type-mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Path(_) => "path",
            Value::Url(_) => "url",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Podfile(_) => "podfile",
            Value::Lockfile(_) => "lockfile",
            Value::Specification(_) => "specification",
            Value::Context(_) => "context",
            Value::Error(_) => "error",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Interpret a string or path as a path.
    pub fn as_path(&self) -> Option<PathBuf> {
        match self {
            Value::Path(p) => Some(p.clone()),
            Value::String(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }

    /// Failure messages held by this value or, for arrays, by its elements.
    pub fn failures(&self) -> Vec<&str> {
        match self {
            Value::Error(message) => vec![message.as_str()],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Error(message) => Some(message.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// A debugging representation with quoted strings.
    pub fn repr(&self) -> String {
        match self {
            Value::String(s) => format!("{:?}", s),
            Value::Path(p) => format!("{:?}", p.display().to_string()),
            Value::Array(items) => format!(
                "[{}]",
                items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
            ),
            Value::Map(map) => format!(
                "{{{}}}",
                map.iter()
                    .map(|(k, v)| format!("{:?} => {}", k, v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            other => other.to_string(),
        }
    }

    /// Convert a YAML value. Numbers become strings; map keys are stringified.
    pub fn from_yaml(yaml: &serde_yaml::Value) -> Value {
        match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(*b),
            serde_yaml::Value::Number(n) => Value::String(n.to_string()),
            serde_yaml::Value::String(s) => Value::String(s.clone()),
            serde_yaml::Value::Sequence(items) => {
                Value::Array(items.iter().map(Value::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Map(
                map.iter()
                    .filter_map(|(k, v)| yaml_key(k).map(|k| (k, Value::from_yaml(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(&tagged.value),
        }
    }

    /// Convert to YAML. Values with no YAML form become null.
    pub fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            Value::Bool(b) => serde_yaml::Value::Bool(*b),
            Value::String(s) => serde_yaml::Value::String(s.clone()),
            Value::Path(p) => serde_yaml::Value::String(p.display().to_string()),
            Value::Url(u) => serde_yaml::Value::String(u.to_string()),
            Value::Array(items) => {
                serde_yaml::Value::Sequence(items.iter().map(Value::to_yaml).collect())
            }
            Value::Map(map) => serde_yaml::Value::Mapping(
                map.iter()
                    .map(|(k, v)| (serde_yaml::Value::String(k.clone()), v.to_yaml()))
                    .collect(),
            ),
            _ => serde_yaml::Value::Null,
        }
    }
}

fn yaml_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => f.write_str(s),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Url(u) => write!(f, "{}", u),
            Value::Array(items) => {
                let items: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Map(map) => {
                let entries: Vec<String> =
                    map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
            Value::Podfile(podfile) => match podfile.defined_in_file() {
                Some(path) => write!(f, "Podfile({})", path.display()),
                None => f.write_str("Podfile"),
            },
            Value::Lockfile(lockfile) => match lockfile.defined_in_file() {
                Some(path) => write!(f, "Lockfile({})", path.display()),
                None => f.write_str("Lockfile"),
            },
            Value::Specification(spec) => match spec.version() {
                Some(version) => write!(f, "{} ({})", spec.name(), version),
                None => f.write_str(spec.name()),
            },
            Value::Context(ctx) => write!(f, "Context({})", ctx.cwd().display()),
            Value::Error(message) => write!(f, "error: {}", message),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Path(p)
    }
}

/// A type an option value may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Null,
    Bool,
    String,
    Path,
    Url,
    Podfile,
    Lockfile,
    Specification,
    Context,
    /// Any array
    Array,
    /// Any map
    Map,
    /// An array whose every element matches one of the types
    ArrayOf(Vec<ValueType>),
    /// A map whose every key and value match one of the respective types
    MapOf {
        keys: Vec<ValueType>,
        values: Vec<ValueType>,
    },
}

impl ValueType {
    /// Check whether `value` is of this type. Empty containers always match.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Null, Value::Null)
            | (ValueType::Bool, Value::Bool(_))
            | (ValueType::String, Value::String(_))
            | (ValueType::Path, Value::Path(_))
            | (ValueType::Url, Value::Url(_))
            | (ValueType::Podfile, Value::Podfile(_))
            | (ValueType::Lockfile, Value::Lockfile(_))
            | (ValueType::Specification, Value::Specification(_))
            | (ValueType::Context, Value::Context(_))
            | (ValueType::Array, Value::Array(_))
            | (ValueType::Map, Value::Map(_)) => true,
            (ValueType::ArrayOf(types), Value::Array(items)) => items
                .iter()
                .all(|item| types.iter().any(|t| t.matches(item))),
            (ValueType::MapOf { keys, values }, Value::Map(map)) => map.iter().all(|(k, v)| {
                let key = Value::String(k.clone());
                keys.iter().any(|t| t.matches(&key)) && values.iter().any(|t| t.matches(v))
            }),
            _ => false,
        }
    }
}

/// Join type names with `|`.
pub fn type_list(types: &[ValueType]) -> String {
    types
        .iter()
        .map(ValueType::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Null => f.write_str("null"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::String => f.write_str("string"),
            ValueType::Path => f.write_str("path"),
            ValueType::Url => f.write_str("url"),
            ValueType::Podfile => f.write_str("podfile"),
            ValueType::Lockfile => f.write_str("lockfile"),
            ValueType::Specification => f.write_str("specification"),
            ValueType::Context => f.write_str("context"),
            ValueType::Array => f.write_str("array"),
            ValueType::Map => f.write_str("map"),
            ValueType::ArrayOf(types) => write!(f, "array<{}>", type_list(types)),
            ValueType::MapOf { keys, values } => {
                write!(f, "map<{} => {}>", type_list(keys), type_list(values))
            }
        }
    }
}
