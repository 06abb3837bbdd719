//! The option table.
//!
//! Options are declared in a fixed order. That order is used for default
//! evaluation, for display and for the generated command-line flags.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use url::Url;

use crate::config::configuration::Defaults;
use crate::config::discovery;
use crate::config::option::ConfigOption;
use crate::config::value::{Value, ValueType};
use crate::core::Platform;
use crate::util::context::TRUNK_CDN_URL;
use crate::util::fs::expand_path;
use crate::util::GlobalContext;

/// Identifies a declared option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    PodConfig,
    PodfilePath,
    Podfile,
    UsePodfile,
    UsePodfilePlugins,
    PodfilePlugins,
    Lockfile,
    UseLockfile,
    UseLockfileVersions,
    UseLibraries,
    GenerateMultiplePodProjects,
    IncrementalInstallation,
    GenDirectory,
    AutoOpen,
    Clean,
    AppHostSourceDir,
    PodspecPaths,
    Podspecs,
    Sources,
    LocalSources,
    Platforms,
    RepoUpdate,
    UseDefaultPlugins,
    DeterministicUuids,
    DisableInputOutputPaths,
    ShareSchemesForDevelopmentPods,
    WarnForMultiplePodSources,
    UseModularHeaders,
    SingleWorkspace,
}

impl OptionKey {
    /// Every option, in declaration order.
    pub const ALL: [OptionKey; 29] = [
        OptionKey::PodConfig,
        OptionKey::PodfilePath,
        OptionKey::Podfile,
        OptionKey::UsePodfile,
        OptionKey::UsePodfilePlugins,
        OptionKey::PodfilePlugins,
        OptionKey::Lockfile,
        OptionKey::UseLockfile,
        OptionKey::UseLockfileVersions,
        OptionKey::UseLibraries,
        OptionKey::GenerateMultiplePodProjects,
        OptionKey::IncrementalInstallation,
        OptionKey::GenDirectory,
        OptionKey::AutoOpen,
        OptionKey::Clean,
        OptionKey::AppHostSourceDir,
        OptionKey::PodspecPaths,
        OptionKey::Podspecs,
        OptionKey::Sources,
        OptionKey::LocalSources,
        OptionKey::Platforms,
        OptionKey::RepoUpdate,
        OptionKey::UseDefaultPlugins,
        OptionKey::DeterministicUuids,
        OptionKey::DisableInputOutputPaths,
        OptionKey::ShareSchemesForDevelopmentPods,
        OptionKey::WarnForMultiplePodSources,
        OptionKey::UseModularHeaders,
        OptionKey::SingleWorkspace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OptionKey::PodConfig => "pod_config",
            OptionKey::PodfilePath => "podfile_path",
            OptionKey::Podfile => "podfile",
            OptionKey::UsePodfile => "use_podfile",
            OptionKey::UsePodfilePlugins => "use_podfile_plugins",
            OptionKey::PodfilePlugins => "podfile_plugins",
            OptionKey::Lockfile => "lockfile",
            OptionKey::UseLockfile => "use_lockfile",
            OptionKey::UseLockfileVersions => "use_lockfile_versions",
            OptionKey::UseLibraries => "use_libraries",
            OptionKey::GenerateMultiplePodProjects => "generate_multiple_pod_projects",
            OptionKey::IncrementalInstallation => "incremental_installation",
            OptionKey::GenDirectory => "gen_directory",
            OptionKey::AutoOpen => "auto_open",
            OptionKey::Clean => "clean",
            OptionKey::AppHostSourceDir => "app_host_source_dir",
            OptionKey::PodspecPaths => "podspec_paths",
            OptionKey::Podspecs => "podspecs",
            OptionKey::Sources => "sources",
            OptionKey::LocalSources => "local_sources",
            OptionKey::Platforms => "platforms",
            OptionKey::RepoUpdate => "repo_update",
            OptionKey::UseDefaultPlugins => "use_default_plugins",
            OptionKey::DeterministicUuids => "deterministic_uuids",
            OptionKey::DisableInputOutputPaths => "disable_input_output_paths",
            OptionKey::ShareSchemesForDevelopmentPods => "share_schemes_for_development_pods",
            OptionKey::WarnForMultiplePodSources => "warn_for_multiple_pod_sources",
            OptionKey::UseModularHeaders => "use_modular_headers",
            OptionKey::SingleWorkspace => "single_workspace",
        }
    }

    /// Look up an option by identifier.
    pub fn from_name(name: &str) -> Option<OptionKey> {
        OptionKey::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The declaration of this option.
    pub fn option(self) -> &'static ConfigOption {
        &OPTIONS[self as usize]
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionKey::from_name(s).ok_or_else(|| format!("unknown option `{}`", s))
    }
}

/// Every declared option, in declaration order.
pub fn options() -> &'static [ConfigOption] {
    &OPTIONS
}

static OPTIONS: LazyLock<Vec<ConfigOption>> = LazyLock::new(declare_options);

fn bool_type() -> Vec<ValueType> {
    vec![ValueType::Bool]
}

fn path_type() -> Vec<ValueType> {
    vec![ValueType::String, ValueType::Path]
}

fn string_array_type() -> Vec<ValueType> {
    vec![ValueType::ArrayOf(vec![ValueType::String])]
}

/// A boolean option that defaults to `false`.
fn toggle(key: OptionKey, message: &'static str) -> ConfigOption {
    ConfigOption::new(key, bool_type(), |_| Ok(Some(Value::Bool(false))))
        .message(message)
        .coercer(coerce_bool)
}

fn declare_options() -> Vec<ConfigOption> {
    use OptionKey::*;

    let options = vec![
        ConfigOption::new(PodConfig, vec![ValueType::Context], |_| {
            let ctx = GlobalContext::new().map_err(|e| format!("{:#}", e))?;
            Ok(Some(Value::Context(Arc::new(ctx))))
        }),
        ConfigOption::new(PodfilePath, path_type(), |d| {
            Ok(d.context()?.podfile_path().map(Value::Path))
        })
        .message("Path to podfile to use")
        .arg_name("PATH")
        .validator(|value| {
            let path = as_path(value)?;
            Ok(missing_unless(path.is_file(), "file does not exist"))
        })
        .coercer(coerce_path),
        ConfigOption::new(Podfile, vec![ValueType::Podfile], |d| {
            let Some(path) = d.get(PodfilePath) else {
                return Ok(None);
            };
            let path = path
                .as_path()
                .ok_or_else(|| format!("`{}` could not be computed", PodfilePath))?;
            if !path.is_file() {
                return Ok(None);
            }
            let podfile = crate::core::Podfile::from_file(&path).map_err(|e| e.to_string())?;
            Ok(Some(Value::Podfile(Arc::new(podfile))))
        }),
        ConfigOption::new(UsePodfile, bool_type(), |d| {
            Ok(Some(Value::Bool(d.podfile()?.is_some())))
        })
        .message("Whether restrictions should be copied from the podfile")
        .coercer(coerce_bool),
        ConfigOption::new(UsePodfilePlugins, bool_type(), |d| {
            Ok(Some(Value::Bool(d.flag(UsePodfile)?)))
        })
        .message("Whether plugins should be copied from the podfile")
        .coercer(coerce_bool),
        ConfigOption::new(
            PodfilePlugins,
            vec![ValueType::MapOf {
                keys: vec![ValueType::String],
                values: vec![
                    ValueType::Null,
                    ValueType::MapOf {
                        keys: vec![ValueType::String],
                        values: vec![
                            ValueType::Bool,
                            ValueType::Null,
                            ValueType::String,
                            ValueType::Map,
                            ValueType::Array,
                        ],
                    },
                ],
            }],
            |d| {
                let plugins = match d.used_podfile()? {
                    Some(podfile) => podfile
                        .plugins()
                        .iter()
                        .map(|(name, options)| (name.clone(), Value::from_yaml(options)))
                        .collect(),
                    None => BTreeMap::new(),
                };
                Ok(Some(Value::Map(plugins)))
            },
        ),
        ConfigOption::new(Lockfile, vec![ValueType::Lockfile], |d| {
            let Some(path) = d.context()?.lockfile_path() else {
                return Ok(None);
            };
            let lockfile = crate::resolver::Lockfile::load(&path).map_err(|e| e.to_string())?;
            Ok(Some(Value::Lockfile(Arc::new(lockfile))))
        }),
        ConfigOption::new(UseLockfile, bool_type(), |d| {
            Ok(Some(Value::Bool(d.lockfile()?.is_some())))
        })
        .message("Whether the lockfile should be used to discover transitive dependencies")
        .coercer(coerce_bool),
        ConfigOption::new(UseLockfileVersions, bool_type(), |d| {
            Ok(Some(Value::Bool(d.flag(UseLockfile)?)))
        })
        .message("Whether versions from the lockfile should be used")
        .coercer(coerce_bool),
        toggle(UseLibraries, "Whether to use libraries instead of frameworks"),
        toggle(
            GenerateMultiplePodProjects,
            "Whether to generate multiple Xcode projects",
        ),
        toggle(
            IncrementalInstallation,
            "Whether to use incremental installation",
        ),
        ConfigOption::new(GenDirectory, path_type(), |d| {
            Ok(Some(Value::Path(d.context()?.cwd().join("gen"))))
        })
        .message("Path to generate workspaces in")
        .arg_name("PATH")
        .validator(|value| {
            let path = as_path(value)?;
            Ok(missing_unless(!path.is_file(), "path is file"))
        })
        .coercer(coerce_path),
        toggle(
            AutoOpen,
            "Whether to automatically open the generated workspaces",
        ),
        toggle(
            Clean,
            "Whether to clean the generated directories before generating",
        ),
        ConfigOption::new(AppHostSourceDir, path_type(), |_| Ok(None))
            .message("A directory containing sources to use for the app host")
            .arg_name("DIR")
            .validator(|value| {
                let path = as_path(value)?;
                Ok(missing_unless(path.is_dir(), "not a directory"))
            })
            .coercer(coerce_path),
        ConfigOption::new(
            PodspecPaths,
            vec![ValueType::ArrayOf(vec![
                ValueType::String,
                ValueType::Path,
                ValueType::Url,
            ])],
            |d| Ok(Some(Value::Array(vec![Value::Path(d.context()?.cwd().to_path_buf())]))),
        )
        .validator(|value| {
            let paths = value.as_array().ok_or("expected a list of paths")?;
            let all_exist = paths.iter().all(|p| match p {
                Value::Url(_) => true,
                other => other.as_path().is_some_and(|p| p.exists()),
            });
            Ok(missing_unless(all_exist, "paths do not exist"))
        })
        .coercer(coerce_podspec_paths),
        ConfigOption::new(
            Podspecs,
            vec![ValueType::ArrayOf(vec![ValueType::Specification])],
            |d| {
                let paths = match d.get(PodspecPaths) {
                    Some(Value::Array(paths)) => paths,
                    Some(Value::Error(_)) => {
                        return Err(format!("`{}` could not be computed", PodspecPaths))
                    }
                    _ => Vec::new(),
                };
                let cwd = d.context()?.cwd().to_path_buf();
                Ok(Some(Value::Array(discovery::podspecs_from_paths(&paths, &cwd))))
            },
        )
        .validator(|value| {
            let specs = value.as_array().ok_or("expected a list of podspecs")?;
            Ok(missing_unless(!specs.is_empty(), "no podspecs found"))
        }),
        ConfigOption::new(Sources, string_array_type(), |d| {
            let sources = match d.used_podfile()? {
                Some(podfile) if !podfile.sources().is_empty() => podfile.sources().to_vec(),
                Some(_) => vec![TRUNK_CDN_URL.to_string()],
                None => {
                    let repos: Vec<String> =
                        d.context()?.spec_repos().into_iter().map(|r| r.url).collect();
                    if repos.is_empty() {
                        vec![TRUNK_CDN_URL.to_string()]
                    } else {
                        repos
                    }
                }
            };
            Ok(Some(Value::strings(sources)))
        })
        .message(
            "The sources from which to pull dependent pods (defaults to all repos in the \
             podfile if using the podfile, else all available repos). Can be a repo name \
             or URL. Multiple sources must be comma-delimited.",
        )
        .arg_name("SOURCE1,SOURCE2")
        .validator(|_| Ok(Vec::new()))
        .coercer(coerce_list),
        ConfigOption::new(LocalSources, string_array_type(), |_| {
            Ok(Some(Value::Array(Vec::new())))
        })
        .message(
            "Paths from which to find local podspecs for transitive dependencies. \
             Multiple local-sources must be comma-delimited.",
        )
        .arg_name("SOURCE1,SOURCE2")
        .validator(|_| Ok(Vec::new()))
        .coercer(coerce_list),
        ConfigOption::new(Platforms, string_array_type(), |_| Ok(None))
            .message(
                "Limit to specific platforms. Default is all platforms supported by the \
                 podspec. Multiple platforms must be comma-delimited.",
            )
            .arg_name("ios,macos")
            .validator(|value| {
                let platforms = value.as_array().ok_or("expected a list of platforms")?;
                let valid = Platform::filter_names();
                let all_valid = platforms
                    .iter()
                    .all(|p| p.as_str().is_some_and(|p| valid.contains(&p)));
                Ok(missing_unless(
                    all_valid,
                    &format!("must be a subset of {}", valid.join(", ")),
                ))
            })
            .coercer(coerce_list),
        toggle(
            RepoUpdate,
            "Force running `pod repo update` before install",
        ),
        toggle(
            UseDefaultPlugins,
            "Whether installation should activate default plugins",
        ),
        ConfigOption::new(DeterministicUuids, bool_type(), |d| {
            installation_option(d, "deterministic_uuids", true, false)
        })
        .message("Whether installation should use deterministic UUIDs for pods projects")
        .coercer(coerce_bool),
        ConfigOption::new(DisableInputOutputPaths, bool_type(), |d| {
            installation_option(d, "disable_input_output_paths", false, false)
        })
        .message(
            "Whether to disable the input & output paths of the CocoaPods script phases \
             (Copy Frameworks & Copy Resources)",
        )
        .coercer(coerce_bool),
        ConfigOption::new(
            ShareSchemesForDevelopmentPods,
            vec![ValueType::Bool, ValueType::Array],
            |d| installation_option(d, "share_schemes_for_development_pods", false, true),
        )
        .message("Whether installation should share schemes for development pods"),
        ConfigOption::new(WarnForMultiplePodSources, bool_type(), |d| {
            installation_option(d, "warn_for_multiple_pod_sources", true, false)
        })
        .message("Whether installation should warn when a pod is found in multiple sources")
        .coercer(coerce_bool),
        toggle(
            UseModularHeaders,
            "Whether the target should be generated as a clang module, treating dependencies \
             as modules, as if `use_modular_headers!` were specified. Will error if both this \
             option and a podfile are specified",
        ),
        toggle(
            SingleWorkspace,
            "Whether to produce a single workspace for all podspecs specified.",
        ),
    ];

    debug_assert!(options
        .iter()
        .zip(OptionKey::ALL)
        .all(|(option, key)| option.key == key));
    options
}

/// Read an `install!` option from the used Podfile.
///
/// `podfile_default` applies when the Podfile does not set the option,
/// `default` when no Podfile is used.
fn installation_option(
    d: &mut Defaults<'_>,
    name: &str,
    podfile_default: bool,
    default: bool,
) -> Result<Option<Value>, String> {
    let Some(podfile) = d.used_podfile()? else {
        return Ok(Some(Value::Bool(default)));
    };
    let value = podfile
        .installation_options()
        .get(name)
        .map(Value::from_yaml)
        .unwrap_or(Value::Bool(podfile_default));
    Ok(Some(value))
}

fn missing_unless(ok: bool, message: &str) -> Vec<String> {
    if ok {
        Vec::new()
    } else {
        vec![message.to_string()]
    }
}

fn as_path(value: &Value) -> Result<std::path::PathBuf, String> {
    value
        .as_path()
        .ok_or_else(|| format!("expected a path, got {}", value.type_name()))
}

/// `true`/`false` in any case become booleans; an empty string is absent.
pub fn coerce_bool(value: Value, _base_dir: &Path) -> Option<Value> {
    match value {
        Value::String(s) => match s.to_lowercase().as_str() {
            "" => None,
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => Some(Value::String(s)),
        },
        other => Some(other),
    }
}

/// Strings become absolute paths.
pub fn coerce_path(value: Value, base_dir: &Path) -> Option<Value> {
    match value {
        Value::String(s) => Some(Value::Path(expand_path(base_dir, Path::new(&s)))),
        Value::Path(p) => Some(Value::Path(expand_path(base_dir, &p))),
        other => Some(other),
    }
}

/// Each string is split on commas. Empty parts are dropped.
pub fn coerce_list(value: Value, _base_dir: &Path) -> Option<Value> {
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let split = items
        .into_iter()
        .flat_map(|item| match item {
            Value::String(s) => s
                .split(',')
                .filter(|part| !part.is_empty())
                .map(Value::from)
                .collect(),
            other => vec![other],
        })
        .collect();
    Some(Value::Array(split))
}

/// `http(s)://` entries become URLs, everything else absolute paths.
pub fn coerce_podspec_paths(value: Value, base_dir: &Path) -> Option<Value> {
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let coerced = items
        .into_iter()
        .map(|item| match item {
            Value::String(s) if s.starts_with("http://") || s.starts_with("https://") => {
                Url::parse(&s).map(Value::Url).unwrap_or(Value::String(s))
            }
            other => coerce_path(other.clone(), base_dir).unwrap_or(other),
        })
        .collect();
    Some(Value::Array(coerced))
}
