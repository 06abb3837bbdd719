//! Declared configuration options.
//!
//! A ConfigOption describes one named slot of a Configuration: the types it
//! accepts, how its default is computed from the other options, how raw
//! input is coerced into it and how it is validated.

use std::path::Path;

use crate::config::configuration::Defaults;
use crate::config::schema::OptionKey;
use crate::config::value::{type_list, Value, ValueType};

/// Computes an option's default from the other options.
///
/// `Ok(None)` means the option has no value. An `Err` is captured as a
/// [`Value::Error`] and reported by validation.
pub type DefaultFn = fn(&mut Defaults<'_>) -> Result<Option<Value>, String>;

/// Checks a value, returning error fragments. An `Err` means the validator
/// itself could not run against the value.
pub type ValidatorFn = fn(&Value) -> Result<Vec<String>, String>;

/// Transforms a raw input value. Relative paths resolve against the base
/// directory. `None` means the input is treated as absent.
pub type CoercerFn = fn(Value, &Path) -> Option<Value>;

/// A declared configuration option.
#[derive(Clone)]
pub struct ConfigOption {
    pub key: OptionKey,
    pub types: Vec<ValueType>,
    pub default: DefaultFn,
    pub message: Option<&'static str>,
    pub arg_name: Option<&'static str>,
    pub validator: Option<ValidatorFn>,
    pub coercer: Option<CoercerFn>,
}

impl std::fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigOption")
            .field("name", &self.name())
            .field("types", &type_list(&self.types))
            .field("arg_name", &self.arg_name)
            .finish()
    }
}

impl ConfigOption {
    /// Declare an option with no user-facing surface.
    pub fn new(key: OptionKey, types: Vec<ValueType>, default: DefaultFn) -> Self {
        ConfigOption {
            key,
            types,
            default,
            message: None,
            arg_name: None,
            validator: None,
            coercer: None,
        }
    }

    /// Set the description, exposing the option on the command line.
    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// Set the argument placeholder, making the option take a value.
    pub fn arg_name(mut self, arg_name: &'static str) -> Self {
        self.arg_name = Some(arg_name);
        self
    }

    pub fn validator(mut self, validator: ValidatorFn) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn coercer(mut self, coercer: CoercerFn) -> Self {
        self.coercer = Some(coercer);
        self
    }

    /// The option's identifier.
    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    /// The command-line name, absent for options without a message.
    pub fn cli_name(&self) -> Option<String> {
        self.message.map(|_| self.name().replace('_', "-"))
    }

    /// The environment variable read for this option.
    pub fn env_name(&self) -> String {
        format!("{}{}", crate::config::layers::ENV_PREFIX, self.name().to_uppercase())
    }

    /// Whether the option is a toggle (takes no argument).
    pub fn is_flag(&self) -> bool {
        self.arg_name.is_none()
    }

    /// Coerce a raw value. Null coerces to absent.
    pub fn coerce(&self, value: Value, base_dir: &Path) -> Option<Value> {
        if value.is_null() {
            return None;
        }
        match self.coercer {
            Some(coercer) => coercer(value, base_dir),
            None => Some(value),
        }
    }

    /// Validate a resolved value, returning a single error message.
    ///
    /// Absent values are valid. A value that failed to compute (or an array
    /// holding failed elements) reports the failures. Otherwise the type is
    /// checked and the validator run, and every fragment is joined behind
    /// the value's representation.
    pub fn validate(&self, value: Option<&Value>) -> Option<String> {
        let value = match value {
            None | Some(Value::Null) => return None,
            Some(value) => value,
        };

        let mut errors = Vec::new();
        let failures = value.failures();
        if !failures.is_empty() {
            errors.push(format!("Error computing {}", self.name()));
            errors.extend(failures.into_iter().map(str::to_string));
        } else {
            if !self.types.iter().any(|t| t.matches(value)) {
                errors.push(format!(
                    "got type {}, expected object of type {}",
                    value.type_name(),
                    type_list(&self.types)
                ));
            }
            if let Some(validator) = self.validator {
                match validator(value) {
                    Ok(fragments) => errors.extend(fragments),
                    Err(e) => errors.push(format!("failed to run validator ({})", e)),
                }
            }
            if !errors.is_empty() {
                errors.insert(0, format!("{} invalid for {}", value.repr(), self.name()));
            }
        }

        (!errors.is_empty()).then(|| errors.join(", "))
    }
}
