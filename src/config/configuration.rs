//! The resolved configuration.
//!
//! A Configuration is built once from a map of explicitly provided values;
//! every other option gets its declared default. Defaults may read other
//! options, so they are evaluated lazily and memoized, in declaration order,
//! with cycle detection. A default that fails is stored as a
//! [`Value::Error`] and surfaces through [`Configuration::validate`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::schema::{options, OptionKey};
use crate::config::value::Value;
use crate::core::{Podfile, Specification};
use crate::resolver::Lockfile;
use crate::util::GlobalContext;

/// Option values keyed by option.
pub type ValueMap = BTreeMap<OptionKey, Value>;

/// Evaluation state for defaults, handed to each option's default function.
pub struct Defaults<'a> {
    explicit: &'a ValueMap,
    resolved: BTreeMap<OptionKey, Option<Value>>,
    in_progress: Vec<OptionKey>,
}

impl<'a> Defaults<'a> {
    fn new(explicit: &'a ValueMap) -> Self {
        Defaults {
            explicit,
            resolved: BTreeMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Get the value of an option, computing its default if needed.
    pub fn get(&mut self, key: OptionKey) -> Option<Value> {
        if let Some(value) = self.resolved.get(&key) {
            return value.clone();
        }
        if let Some(value) = self.explicit.get(&key) {
            let value = (!value.is_null()).then(|| value.clone());
            self.resolved.insert(key, value.clone());
            return value;
        }
        if self.in_progress.contains(&key) {
            let cycle: Vec<&str> = self.in_progress.iter().map(|k| k.name()).collect();
            return Some(Value::Error(format!(
                "cyclic default for `{}` (via {})",
                key,
                cycle.join(" -> ")
            )));
        }

        self.in_progress.push(key);
        let result = (key.option().default)(self);
        self.in_progress.pop();

        let value = match result {
            Ok(value) => value,
            Err(message) => {
                tracing::debug!("default for `{}` failed: {}", key, message);
                Some(Value::Error(message))
            }
        };
        self.resolved.insert(key, value.clone());
        value
    }

    /// Get a boolean option. Absent is `false`; a failed value is an error.
    pub fn flag(&mut self, key: OptionKey) -> Result<bool, String> {
        match self.get(key) {
            None | Some(Value::Bool(false)) => Ok(false),
            Some(Value::Error(_)) => Err(format!("`{}` could not be computed", key)),
            Some(_) => Ok(true),
        }
    }

    /// Get the global context.
    pub fn context(&mut self) -> Result<Arc<GlobalContext>, String> {
        match self.get(OptionKey::PodConfig) {
            Some(Value::Context(ctx)) => Ok(ctx),
            _ => Err(format!("`{}` could not be computed", OptionKey::PodConfig)),
        }
    }

    /// Get the parent Podfile, if any.
    pub fn podfile(&mut self) -> Result<Option<Arc<Podfile>>, String> {
        match self.get(OptionKey::Podfile) {
            Some(Value::Podfile(podfile)) => Ok(Some(podfile)),
            Some(Value::Error(_)) => Err(format!("`{}` could not be computed", OptionKey::Podfile)),
            _ => Ok(None),
        }
    }

    /// Get the parent Podfile when `use_podfile` is set.
    pub fn used_podfile(&mut self) -> Result<Option<Arc<Podfile>>, String> {
        if self.flag(OptionKey::UsePodfile)? {
            self.podfile()
        } else {
            Ok(None)
        }
    }

    /// Get the lockfile, if any.
    pub fn lockfile(&mut self) -> Result<Option<Arc<Lockfile>>, String> {
        match self.get(OptionKey::Lockfile) {
            Some(Value::Lockfile(lockfile)) => Ok(Some(lockfile)),
            Some(Value::Error(_)) => {
                Err(format!("`{}` could not be computed", OptionKey::Lockfile))
            }
            _ => Ok(None),
        }
    }
}

/// An immutable snapshot of resolved option values.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    values: ValueMap,
}

impl Configuration {
    /// Build a configuration from explicitly provided values.
    ///
    /// An explicit [`Value::Null`] leaves the option without a value instead
    /// of applying its default.
    pub fn new(explicit: ValueMap) -> Self {
        let mut defaults = Defaults::new(&explicit);
        let mut values = ValueMap::new();
        for key in OptionKey::ALL {
            if let Some(value) = defaults.get(key) {
                values.insert(key, value);
            }
        }
        Configuration { values }
    }

    /// Get the value of an option.
    pub fn get(&self, key: OptionKey) -> Option<&Value> {
        self.values.get(&key)
    }

    /// Validate every option, returning all errors.
    pub fn validate(&self) -> Vec<String> {
        options()
            .iter()
            .filter_map(|option| option.validate(self.get(option.key)))
            .collect()
    }

    /// Create a new configuration with some values replaced.
    pub fn with_changes(&self, changes: ValueMap) -> Configuration {
        let mut values = self.to_map();
        values.extend(changes);
        Configuration::new(values)
    }

    /// The present values.
    pub fn to_map(&self) -> ValueMap {
        self.values.clone()
    }

    fn bool(&self, key: OptionKey) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    fn path(&self, key: OptionKey) -> Option<PathBuf> {
        self.get(key).and_then(Value::as_path)
    }

    fn strings(&self, key: OptionKey) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn pod_config(&self) -> Option<&GlobalContext> {
        match self.get(OptionKey::PodConfig) {
            Some(Value::Context(ctx)) => Some(ctx),
            _ => None,
        }
    }

    pub fn podfile_path(&self) -> Option<PathBuf> {
        self.path(OptionKey::PodfilePath)
    }

    pub fn podfile(&self) -> Option<&Podfile> {
        match self.get(OptionKey::Podfile) {
            Some(Value::Podfile(podfile)) => Some(podfile),
            _ => None,
        }
    }

    pub fn use_podfile(&self) -> bool {
        self.bool(OptionKey::UsePodfile)
    }

    pub fn use_podfile_plugins(&self) -> bool {
        self.bool(OptionKey::UsePodfilePlugins)
    }

    pub fn podfile_plugins(&self) -> BTreeMap<String, Value> {
        self.get(OptionKey::PodfilePlugins)
            .and_then(Value::as_map)
            .cloned()
            .unwrap_or_default()
    }

    pub fn lockfile(&self) -> Option<&Lockfile> {
        match self.get(OptionKey::Lockfile) {
            Some(Value::Lockfile(lockfile)) => Some(lockfile),
            _ => None,
        }
    }

    pub fn use_lockfile(&self) -> bool {
        self.bool(OptionKey::UseLockfile)
    }

    pub fn use_lockfile_versions(&self) -> bool {
        self.bool(OptionKey::UseLockfileVersions)
    }

    pub fn use_libraries(&self) -> bool {
        self.bool(OptionKey::UseLibraries)
    }

    /// Whether to link pods as frameworks.
    pub fn use_frameworks(&self) -> bool {
        !self.use_libraries()
    }

    pub fn generate_multiple_pod_projects(&self) -> bool {
        self.bool(OptionKey::GenerateMultiplePodProjects)
    }

    pub fn incremental_installation(&self) -> bool {
        self.bool(OptionKey::IncrementalInstallation)
    }

    pub fn gen_directory(&self) -> PathBuf {
        self.path(OptionKey::GenDirectory)
            .unwrap_or_else(|| PathBuf::from("gen"))
    }

    pub fn auto_open(&self) -> bool {
        self.bool(OptionKey::AutoOpen)
    }

    pub fn clean(&self) -> bool {
        self.bool(OptionKey::Clean)
    }

    pub fn app_host_source_dir(&self) -> Option<PathBuf> {
        self.path(OptionKey::AppHostSourceDir)
    }

    pub fn podspec_paths(&self) -> &[Value] {
        self.get(OptionKey::PodspecPaths)
            .and_then(Value::as_array)
            .unwrap_or_default()
    }

    /// The successfully loaded podspecs.
    pub fn podspecs(&self) -> Vec<&Specification> {
        self.get(OptionKey::Podspecs)
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| match v {
                Value::Specification(spec) => Some(spec.as_ref()),
                _ => None,
            })
            .collect()
    }

    pub fn sources(&self) -> Vec<String> {
        self.strings(OptionKey::Sources)
    }

    pub fn local_sources(&self) -> Vec<String> {
        self.strings(OptionKey::LocalSources)
    }

    /// The platform allow-list, if one is set.
    pub fn platforms(&self) -> Option<Vec<String>> {
        self.get(OptionKey::Platforms)
            .map(|_| self.strings(OptionKey::Platforms))
    }

    pub fn repo_update(&self) -> bool {
        self.bool(OptionKey::RepoUpdate)
    }

    pub fn use_default_plugins(&self) -> bool {
        self.bool(OptionKey::UseDefaultPlugins)
    }

    pub fn deterministic_uuids(&self) -> bool {
        self.bool(OptionKey::DeterministicUuids)
    }

    pub fn disable_input_output_paths(&self) -> bool {
        self.bool(OptionKey::DisableInputOutputPaths)
    }

    /// `true`, `false` or a list of pod names.
    pub fn share_schemes_for_development_pods(&self) -> Value {
        self.get(OptionKey::ShareSchemesForDevelopmentPods)
            .cloned()
            .unwrap_or(Value::Bool(false))
    }

    pub fn warn_for_multiple_pod_sources(&self) -> bool {
        self.bool(OptionKey::WarnForMultiplePodSources)
    }

    pub fn use_modular_headers(&self) -> bool {
        self.bool(OptionKey::UseModularHeaders)
    }

    pub fn single_workspace(&self) -> bool {
        self.bool(OptionKey::SingleWorkspace)
    }

    /// The directory a workspace for `specs` is generated in.
    pub fn gen_dir_for_specs(&self, specs: &[&Specification]) -> PathBuf {
        self.gen_directory().join(combined_name(specs))
    }

    /// The name of the generated Xcode project for `specs`.
    ///
    /// A single spec generated with multiple pod projects gets a `Sample`
    /// suffix so it does not collide with the pod's own project.
    pub fn project_name_for_specs(&self, specs: &[&Specification]) -> String {
        let mut name = combined_name(specs);
        if specs.len() == 1 && self.generate_multiple_pod_projects() {
            name.push_str("Sample");
        }
        name
    }
}

fn combined_name(specs: &[&Specification]) -> String {
    match specs {
        [] => String::new(),
        [spec] => spec.name().to_string(),
        [first, ..] => format!("{}_Unified", first.name()),
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("`pod gen` configuration {")?;
        let shown = self
            .values
            .iter()
            .filter(|(key, _)| **key != OptionKey::PodConfig);
        for (i, (key, value)) in shown.enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "\n  {}: {}", key, value)?;
        }
        f.write_str(" }")
    }
}
