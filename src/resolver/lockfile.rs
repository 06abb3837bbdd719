//! Podfile.lock reader.
//!
//! The lockfile records a previous resolution:
//!
//! ```yaml
//! PODS:
//!   - A (1.0):
//!     - B (~> 1.0)
//!   - B (1.2.0)
//! DEPENDENCIES:
//!   - A (from `../A`)
//! EXTERNAL SOURCES:
//!   A:
//!     :path: "../A"
//! SPEC REPOS:
//!   trunk:
//!     - B
//! COCOAPODS: 1.10.0
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::dependency::{Dependency, DependencyParseError};

/// Error loading a lockfile.
#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("failed to read lockfile `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lockfile `{origin}`: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    InvalidEntry(#[from] DependencyParseError),
}

/// A pod recorded in the `PODS` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPod {
    /// Pod name, possibly a subspec
    pub name: String,

    /// Resolved version
    pub version: Option<String>,

    /// Requirements the pod placed on its own dependencies
    pub dependencies: Vec<Dependency>,
}

/// A parsed Podfile.lock.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lockfile {
    pods: Vec<LockedPod>,
    dependencies: Vec<Dependency>,
    external_sources: BTreeMap<String, BTreeMap<String, String>>,
    spec_repos: BTreeMap<String, Vec<String>>,
    cocoapods_version: Option<String>,
    defined_in_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawLockfile {
    #[serde(rename = "PODS", default)]
    pods: Vec<RawPod>,

    #[serde(rename = "DEPENDENCIES", default)]
    dependencies: Vec<String>,

    #[serde(rename = "EXTERNAL SOURCES", default)]
    external_sources: BTreeMap<String, BTreeMap<String, serde_yaml::Value>>,

    #[serde(rename = "SPEC REPOS", default)]
    spec_repos: BTreeMap<String, Vec<String>>,

    #[serde(rename = "COCOAPODS", default)]
    cocoapods: Option<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPod {
    Plain(String),
    WithDependencies(BTreeMap<String, Vec<String>>),
}

impl Lockfile {
    /// Load a lockfile from disk.
    pub fn load(path: &Path) -> Result<Lockfile, LockfileError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LockfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut lockfile = Self::from_yaml(&contents, &path.display().to_string())?;
        lockfile.defined_in_file = Some(path.to_path_buf());
        Ok(lockfile)
    }

    /// Parse a lockfile from YAML text. `origin` names it in errors.
    pub fn from_yaml(contents: &str, origin: &str) -> Result<Lockfile, LockfileError> {
        if contents.trim().is_empty() {
            return Ok(Lockfile::default());
        }
        let raw: RawLockfile =
            serde_yaml::from_str(contents).map_err(|source| LockfileError::Parse {
                origin: origin.to_string(),
                source,
            })?;

        let mut pods = Vec::new();
        for entry in raw.pods {
            let (declaration, children) = match entry {
                RawPod::Plain(declaration) => (declaration, Vec::new()),
                RawPod::WithDependencies(map) => match map.into_iter().next() {
                    Some(pair) => pair,
                    None => continue,
                },
            };
            let pod = Dependency::from_lockfile_str(&declaration)?;
            let version = pod
                .requirements()
                .first()
                .and_then(|r| r.strip_prefix("= "))
                .map(str::to_string);
            let dependencies = children
                .iter()
                .map(|c| Dependency::from_lockfile_str(c))
                .collect::<Result<Vec<_>, _>>()?;
            pods.push(LockedPod {
                name: pod.name().to_string(),
                version,
                dependencies,
            });
        }

        let external_sources: BTreeMap<String, BTreeMap<String, String>> = raw
            .external_sources
            .into_iter()
            .map(|(name, source)| {
                let source = source
                    .into_iter()
                    .filter_map(|(key, value)| {
                        let key = key.trim_start_matches(':').to_string();
                        scalar_to_string(&value).map(|value| (key, value))
                    })
                    .collect();
                (name, source)
            })
            .collect();

        let mut dependencies = Vec::new();
        for declaration in &raw.dependencies {
            let dependency = Dependency::from_lockfile_str(declaration)?;
            let dependency = match external_sources.get(dependency.root_name()) {
                Some(source) => dependency.with_external_source(source.clone()),
                None => dependency,
            };
            dependencies.push(dependency);
        }

        Ok(Lockfile {
            pods,
            dependencies,
            external_sources,
            spec_repos: raw.spec_repos,
            cocoapods_version: raw.cocoapods.as_ref().and_then(scalar_to_string),
            defined_in_file: None,
        })
    }

    /// The top-level dependencies, with their external sources attached.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// The raw `PODS` entries.
    pub fn internal_pods(&self) -> &[LockedPod] {
        &self.pods
    }

    /// Names of every locked pod, in lockfile order.
    pub fn pod_names(&self) -> Vec<&str> {
        self.pods.iter().map(|p| p.name.as_str()).collect()
    }

    /// The locked version of a pod.
    pub fn version(&self, name: &str) -> Option<&str> {
        self.pods
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.version.as_deref())
    }

    /// The external source recorded for a root pod.
    pub fn external_source(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.external_sources.get(name)
    }

    /// Pods grouped by the spec repo they were fetched from.
    pub fn spec_repos(&self) -> &BTreeMap<String, Vec<String>> {
        &self.spec_repos
    }

    /// The CocoaPods version that wrote the lockfile.
    pub fn cocoapods_version(&self) -> Option<&str> {
        self.cocoapods_version.as_deref()
    }

    pub fn defined_in_file(&self) -> Option<&Path> {
        self.defined_in_file.as_deref()
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
