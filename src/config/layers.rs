//! Configuration layers and their merge.
//!
//! Values come from, lowest precedence first: environment variables,
//! `.gen_config.yml` files from the filesystem root down to the current
//! directory, in-memory overrides and finally the command line. Each layer
//! only holds the keys it explicitly sets, and layers merge by plain key
//! replacement.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::configuration::{Configuration, ValueMap};
use crate::config::schema::{options, OptionKey};
use crate::config::value::Value;
use crate::util::GlobalContext;

/// Prefix of the environment variables read for options.
pub const ENV_PREFIX: &str = "COCOAPODS_GENERATE_";

/// Name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = ".gen_config.yml";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("no configuration found at `{path}`")]
    NotFound { path: PathBuf },

    #[error("failed to read configuration at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration at `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("mapping not found in configuration at `{path}`, got {found}")]
    NotAMapping { path: PathBuf, found: String },
}

/// Build the environment layer.
///
/// Takes an iterator so tests can pass synthetic variables instead of
/// `std::env::vars()`. Relative paths resolve against `cwd`.
pub fn from_env(vars: impl IntoIterator<Item = (String, String)>, cwd: &Path) -> ValueMap {
    let vars: HashMap<String, String> = vars
        .into_iter()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect();

    let mut layer = ValueMap::new();
    for option in options() {
        let Some(raw) = vars.get(&option.env_name()) else {
            continue;
        };
        if let Some(value) = option.coerce(Value::from(raw.as_str()), cwd) {
            layer.insert(option.key, value);
        }
    }
    layer
}

/// Load one configuration file.
///
/// Keys may carry a leading `:`. Unknown keys are skipped with a warning and
/// relative paths resolve against the file's directory.
pub fn from_file(path: &Path) -> Result<ValueMap, ConfigFileError> {
    if !path.is_file() {
        return Err(ConfigFileError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(ValueMap::new());
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&contents).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let mapping = match yaml {
        serde_yaml::Value::Mapping(mapping) => mapping,
        serde_yaml::Value::Null => return Ok(ValueMap::new()),
        other => {
            return Err(ConfigFileError::NotAMapping {
                path: path.to_path_buf(),
                found: Value::from_yaml(&other).repr(),
            })
        }
    };

    let base_dir = path.parent().unwrap_or(Path::new("."));
    let mut layer = ValueMap::new();
    for (key, value) in &mapping {
        let Some(key) = key.as_str() else {
            tracing::warn!("ignoring non-string key in `{}`", path.display());
            continue;
        };
        let name = key.strip_prefix(':').unwrap_or(key);
        let Some(option_key) = OptionKey::from_name(name) else {
            tracing::warn!("ignoring unknown option `{}` in `{}`", name, path.display());
            continue;
        };
        if let Some(value) = option_key.option().coerce(Value::from_yaml(value), base_dir) {
            layer.insert(option_key, value);
        }
    }
    Ok(layer)
}

/// Every configuration file in `cwd` and its ancestors, root first.
pub fn config_files_from(cwd: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = cwd
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
        .collect();
    files.reverse();
    files
}

/// Inputs to [`resolve`].
#[derive(Debug, Clone)]
pub struct ResolveInput {
    /// Context the configuration is resolved in.
    pub context: Arc<GlobalContext>,
    /// Environment layer, see [`from_env`].
    pub env: ValueMap,
    /// Values already resolved elsewhere, such as by a parent process.
    pub overrides: ValueMap,
    /// Values given on the command line.
    pub cli: ValueMap,
}

impl ResolveInput {
    pub fn new(context: Arc<GlobalContext>) -> Self {
        ResolveInput {
            context,
            env: ValueMap::new(),
            overrides: ValueMap::new(),
            cli: ValueMap::new(),
        }
    }
}

/// Merge every layer into a configuration.
///
/// An empty `podspec_paths` on the command line gives way to any lower
/// layer that sets podspec paths.
pub fn resolve(input: ResolveInput) -> Result<Configuration, ConfigFileError> {
    let ResolveInput {
        context,
        env,
        overrides,
        mut cli,
    } = input;

    let mut files = Vec::new();
    for path in config_files_from(context.cwd()) {
        let layer = from_file(&path)?;
        tracing::debug!(
            "loaded {} option(s) from `{}`",
            layer.len(),
            path.display()
        );
        files.push(layer);
    }

    let mut lower = vec![env];
    lower.extend(files);
    lower.push(overrides);

    let cli_paths_empty = cli
        .get(&OptionKey::PodspecPaths)
        .and_then(Value::as_array)
        .is_some_and(<[Value]>::is_empty);
    if cli_paths_empty
        && lower
            .iter()
            .any(|layer| layer.contains_key(&OptionKey::PodspecPaths))
    {
        cli.remove(&OptionKey::PodspecPaths);
    }

    let mut merged = ValueMap::new();
    for layer in lower.into_iter().chain([cli]) {
        merged.extend(layer);
    }
    merged.insert(OptionKey::PodConfig, Value::Context(context));

    Ok(Configuration::new(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn context(dir: &Path) -> Arc<GlobalContext> {
        Arc::new(
            GlobalContext::with_cwd(dir.to_path_buf())
                .unwrap()
                .with_home(dir.join(".cocoapods")),
        )
    }

    #[test]
    fn test_from_env() {
        let cwd = Path::new("/work");
        let layer = from_env(
            vars(&[
                ("COCOAPODS_GENERATE_USE_LIBRARIES", "TRUE"),
                ("COCOAPODS_GENERATE_SOURCES", "a,b"),
                ("COCOAPODS_GENERATE_GEN_DIRECTORY", "out"),
                ("COCOAPODS_GENERATE_CLEAN", ""),
                ("COCOAPODS_GENERATE_NOPE", "1"),
                ("COCOAPODS_GENERATE_", "1"),
                ("HOME", "/root"),
            ]),
            cwd,
        );

        assert_eq!(layer.len(), 3);
        assert_eq!(layer[&OptionKey::UseLibraries], Value::Bool(true));
        assert_eq!(layer[&OptionKey::Sources], Value::strings(["a", "b"]));
        assert_eq!(
            layer[&OptionKey::GenDirectory],
            Value::Path(PathBuf::from("/work/out"))
        );
    }

    #[test]
    fn test_from_env_drops_empty_list_entries() {
        let layer = from_env(
            vars(&[
                ("COCOAPODS_GENERATE_SOURCES", ""),
                ("COCOAPODS_GENERATE_LOCAL_SOURCES", "a,"),
            ]),
            Path::new("/work"),
        );

        assert_eq!(layer[&OptionKey::Sources], Value::Array(Vec::new()));
        assert_eq!(layer[&OptionKey::LocalSources], Value::strings(["a"]));
    }

    #[test]
    fn test_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            ":use_libraries: true\nsources:\n  - x\ngen_directory: out\nunknown: 1\nplatforms: ios,tvos\n",
        )
        .unwrap();

        let layer = from_file(&path).unwrap();
        assert_eq!(layer[&OptionKey::UseLibraries], Value::Bool(true));
        assert_eq!(layer[&OptionKey::Sources], Value::strings(["x"]));
        assert_eq!(
            layer[&OptionKey::GenDirectory],
            Value::Path(tmp.path().join("out"))
        );
        assert_eq!(layer[&OptionKey::Platforms], Value::strings(["ios", "tvos"]));
        assert_eq!(layer.len(), 4);
    }

    #[test]
    fn test_from_file_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);

        assert!(matches!(
            from_file(&path),
            Err(ConfigFileError::NotFound { .. })
        ));

        std::fs::write(&path, "   \n").unwrap();
        assert!(from_file(&path).unwrap().is_empty());

        std::fs::write(&path, "- a\n- b\n").unwrap();
        let err = from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigFileError::NotAMapping { .. }));
        assert!(err.to_string().contains(r#"got ["a", "b"]"#));

        std::fs::write(&path, "a: [\n").unwrap();
        assert!(matches!(
            from_file(&path),
            Err(ConfigFileError::Parse { .. })
        ));
    }

    #[test]
    fn test_config_files_root_first() {
        let tmp = TempDir::new().unwrap();
        let child = tmp.path().join("a/b");
        std::fs::create_dir_all(&child).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();
        std::fs::write(child.join(CONFIG_FILE_NAME), "").unwrap();

        let files = config_files_from(&child);
        assert_eq!(
            files,
            [tmp.path().join(CONFIG_FILE_NAME), child.join(CONFIG_FILE_NAME)]
        );
    }

    #[test]
    fn test_cli_beats_env() {
        let tmp = TempDir::new().unwrap();
        let mut input = ResolveInput::new(context(tmp.path()));
        input.env = from_env(vars(&[("COCOAPODS_GENERATE_SOURCES", "a,b")]), tmp.path());
        input.cli.insert(OptionKey::Sources, Value::strings(["x", "y"]));

        let config = resolve(input).unwrap();
        assert_eq!(config.sources(), ["x", "y"]);
    }

    #[test]
    fn test_closer_files_win_and_lists_replace() {
        let tmp = TempDir::new().unwrap();
        let child = tmp.path().join("child");
        std::fs::create_dir_all(&child).unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "sources: [a, b]\nclean: true\n",
        )
        .unwrap();
        std::fs::write(child.join(CONFIG_FILE_NAME), "sources: [c]\n").unwrap();

        let config = resolve(ResolveInput::new(context(&child))).unwrap();
        assert_eq!(config.sources(), ["c"]);
        assert!(config.clean());
    }

    #[test]
    fn test_overrides_sit_below_cli() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "clean: false\nauto_open: true\n").unwrap();
        let mut input = ResolveInput::new(context(tmp.path()));
        input.overrides.insert(OptionKey::Clean, Value::Bool(true));
        input.overrides.insert(OptionKey::AutoOpen, Value::Bool(false));
        input.cli.insert(OptionKey::AutoOpen, Value::Bool(true));

        let config = resolve(input).unwrap();
        assert!(config.clean());
        assert!(config.auto_open());
    }

    #[test]
    fn test_empty_cli_paths_defer_to_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("Foo")).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "podspec_paths: [./Foo]\n").unwrap();

        let mut input = ResolveInput::new(context(tmp.path()));
        input.cli.insert(OptionKey::PodspecPaths, Value::Array(Vec::new()));
        let config = resolve(input).unwrap();
        assert_eq!(
            config.podspec_paths(),
            [Value::Path(tmp.path().join("Foo"))]
        );

        let mut input = ResolveInput::new(context(tmp.path()));
        input
            .cli
            .insert(OptionKey::PodspecPaths, Value::strings(["Bar.podspec"]));
        let config = resolve(input).unwrap();
        assert_eq!(config.podspec_paths(), [Value::from("Bar.podspec")]);
    }

    #[test]
    fn test_empty_cli_paths_kept_without_file() {
        let tmp = TempDir::new().unwrap();
        let mut input = ResolveInput::new(context(tmp.path()));
        input.cli.insert(OptionKey::PodspecPaths, Value::Array(Vec::new()));

        let config = resolve(input).unwrap();
        assert!(config.podspec_paths().is_empty());
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "true\n").unwrap();

        let err = resolve(ResolveInput::new(context(tmp.path()))).unwrap_err();
        assert!(matches!(err, ConfigFileError::NotAMapping { .. }));
    }
}
