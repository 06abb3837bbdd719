//! Pod specifications (podspecs).
//!
//! Specifications are read from the JSON podspec format. A root spec may
//! nest library subspecs, test specs and app specs; nested specs are named
//! `Root/Child`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::dependency::{self, Dependency};
use crate::core::platform::{Platform, PlatformTarget};

/// Error loading a specification.
#[derive(Debug, Error)]
pub enum SpecificationError {
    #[error("no podspec exists at path `{}`", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read podspec `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse podspec `{origin}`: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("podspec `{origin}` has no name")]
    MissingName { origin: String },

    #[error("podspec `{origin}` declares unknown platform `{platform}`")]
    UnknownPlatform { origin: String, platform: String },
}

/// What kind of code a specification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecKind {
    /// Library code (root spec or library subspec)
    Library,
    /// Test-only code
    Test,
    /// App-only code
    App,
}

/// A pod specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    /// Full name (`A/Tests` for nested specs)
    name: String,

    /// Version, inherited from the root for nested specs
    version: Option<String>,

    /// Explicitly declared platforms
    platforms: Vec<PlatformTarget>,

    /// Direct dependencies
    dependencies: Vec<Dependency>,

    /// Library, test or app spec
    kind: SpecKind,

    /// Nested specs of every kind
    subspecs: Vec<Specification>,

    /// Supported Swift versions
    swift_versions: Vec<String>,

    /// The file this spec was loaded from
    defined_in_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawSpecification {
    name: Option<String>,

    #[serde(default)]
    version: Option<String>,

    #[serde(default)]
    platforms: BTreeMap<String, Option<String>>,

    #[serde(default)]
    dependencies: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    subspecs: Vec<RawSpecification>,

    #[serde(default)]
    testspecs: Vec<RawSpecification>,

    #[serde(default)]
    appspecs: Vec<RawSpecification>,

    #[serde(default)]
    swift_versions: Option<SwiftVersions>,

    #[serde(default)]
    swift_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SwiftVersions {
    One(String),
    Many(Vec<String>),
}

impl Specification {
    /// Create an empty library specification.
    pub fn new(name: impl Into<String>) -> Self {
        Specification {
            name: name.into(),
            version: None,
            platforms: Vec::new(),
            dependencies: Vec::new(),
            kind: SpecKind::Library,
            subspecs: Vec::new(),
            swift_versions: Vec::new(),
            defined_in_file: None,
        }
    }

    /// Add a direct dependency.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Add a nested test spec named `<self>/<name>`.
    pub fn with_test_spec(self, name: &str, dependencies: Vec<Dependency>) -> Self {
        self.with_nested(name, SpecKind::Test, dependencies)
    }

    fn with_nested(mut self, name: &str, kind: SpecKind, dependencies: Vec<Dependency>) -> Self {
        let mut nested = Specification::new(format!("{}/{}", self.name, name));
        nested.kind = kind;
        nested.version = self.version.clone();
        nested.dependencies = dependencies;
        nested.defined_in_file = self.defined_in_file.clone();
        self.subspecs.push(nested);
        self
    }

    /// Set the file this spec was defined in.
    ///
    /// Nested specs at every depth share the file.
    pub fn with_defined_in_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.set_defined_in_file(&path.into());
        self
    }

    fn set_defined_in_file(&mut self, path: &Path) {
        self.defined_in_file = Some(path.to_path_buf());
        for subspec in &mut self.subspecs {
            subspec.set_defined_in_file(path);
        }
    }

    /// Load a specification from a file.
    pub fn from_file(path: &Path) -> Result<Specification, SpecificationError> {
        if !path.is_file() {
            return Err(SpecificationError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| SpecificationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let spec = Self::from_string(&contents, &path.display().to_string())?;
        Ok(spec.with_defined_in_file(path))
    }

    /// Parse a specification from JSON text. `origin` names it in errors.
    pub fn from_string(contents: &str, origin: &str) -> Result<Specification, SpecificationError> {
        let raw: RawSpecification =
            serde_json::from_str(contents).map_err(|source| SpecificationError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        Self::from_raw(raw, None, SpecKind::Library, origin)
    }

    fn from_raw(
        raw: RawSpecification,
        parent: Option<(&str, Option<&str>)>,
        kind: SpecKind,
        origin: &str,
    ) -> Result<Specification, SpecificationError> {
        let base_name = raw.name.ok_or_else(|| SpecificationError::MissingName {
            origin: origin.to_string(),
        })?;
        let (name, version) = match parent {
            Some((parent_name, parent_version)) => (
                format!("{}/{}", parent_name, base_name),
                raw.version.or_else(|| parent_version.map(str::to_string)),
            ),
            None => (base_name, raw.version),
        };

        let mut platforms = Vec::new();
        for (platform, deployment_target) in raw.platforms {
            let name = platform
                .parse::<Platform>()
                .map_err(|_| SpecificationError::UnknownPlatform {
                    origin: origin.to_string(),
                    platform: platform.clone(),
                })?;
            platforms.push(PlatformTarget::new(name, deployment_target));
        }
        platforms.sort();

        let dependencies = raw
            .dependencies
            .into_iter()
            .map(|(dep_name, requirements)| Dependency::new(dep_name).with_requirements(requirements))
            .collect();

        let swift_versions = match (raw.swift_versions, raw.swift_version) {
            (Some(SwiftVersions::Many(versions)), _) => versions,
            (Some(SwiftVersions::One(version)), _) | (None, Some(version)) => vec![version],
            (None, None) => Vec::new(),
        };

        let mut subspecs = Vec::new();
        let nested = raw
            .subspecs
            .into_iter()
            .map(|s| (s, SpecKind::Library))
            .chain(raw.testspecs.into_iter().map(|s| (s, SpecKind::Test)))
            .chain(raw.appspecs.into_iter().map(|s| (s, SpecKind::App)));
        for (sub, sub_kind) in nested {
            subspecs.push(Self::from_raw(
                sub,
                Some((&name, version.as_deref())),
                sub_kind,
                origin,
            )?);
        }

        Ok(Specification {
            name,
            version,
            platforms,
            dependencies,
            kind,
            subspecs,
            swift_versions,
            defined_in_file: None,
        })
    }

    /// Get the full name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the root spec name.
    pub fn root_name(&self) -> &str {
        dependency::root_name(&self.name)
    }

    /// Get the name relative to the root (`Tests` for `A/Tests`).
    pub fn relative_name(&self) -> &str {
        self.name
            .strip_prefix(self.root_name())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.name)
    }

    /// Get the version.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Get the kind of spec.
    pub fn kind(&self) -> SpecKind {
        self.kind
    }

    /// Check if this is a test spec.
    pub fn is_test_spec(&self) -> bool {
        self.kind == SpecKind::Test
    }

    /// Check if this is an app spec.
    pub fn is_app_spec(&self) -> bool {
        self.kind == SpecKind::App
    }

    /// Get the direct dependencies.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Get the supported Swift versions.
    pub fn swift_versions(&self) -> &[String] {
        &self.swift_versions
    }

    /// Get the file this spec was loaded from.
    pub fn defined_in_file(&self) -> Option<&Path> {
        self.defined_in_file.as_deref()
    }

    /// Get the directly nested specs.
    pub fn subspecs(&self) -> &[Specification] {
        &self.subspecs
    }

    /// Get every nested spec, depth first.
    pub fn recursive_subspecs(&self) -> Vec<&Specification> {
        let mut all = Vec::new();
        for subspec in &self.subspecs {
            all.push(subspec);
            all.extend(subspec.recursive_subspecs());
        }
        all
    }

    /// Get every nested test spec.
    pub fn test_specs(&self) -> Vec<&Specification> {
        self.recursive_subspecs()
            .into_iter()
            .filter(|s| s.is_test_spec())
            .collect()
    }

    /// Get every nested app spec.
    pub fn app_specs(&self) -> Vec<&Specification> {
        self.recursive_subspecs()
            .into_iter()
            .filter(|s| s.is_app_spec())
            .collect()
    }

    /// Get the platforms this spec can be built for.
    ///
    /// A spec that declares no platform supports all of them.
    pub fn available_platforms(&self) -> Vec<PlatformTarget> {
        if self.platforms.is_empty() {
            Platform::ALL
                .iter()
                .map(|p| PlatformTarget::new(*p, None))
                .collect()
        } else {
            self.platforms.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PODSPEC: &str = r#"{
        "name": "A",
        "version": "1.2",
        "platforms": { "ios": "10.0", "osx": null },
        "dependencies": { "B": [], "C": ["~> 1.0"] },
        "swift_versions": ["4.2", "5"],
        "subspecs": [{ "name": "Core" }],
        "testspecs": [{ "name": "Tests", "test_type": "unit", "dependencies": { "D": [] } }],
        "appspecs": [{ "name": "App" }]
    }"#;

    #[test]
    fn test_parse_json_podspec() {
        let spec = Specification::from_string(PODSPEC, "A.podspec.json").unwrap();

        assert_eq!(spec.name(), "A");
        assert_eq!(spec.version(), Some("1.2"));
        assert_eq!(
            spec.available_platforms(),
            vec![
                PlatformTarget::new(Platform::Ios, Some("10.0".to_string())),
                PlatformTarget::new(Platform::Osx, None),
            ]
        );
        assert_eq!(spec.dependencies().len(), 2);
        assert_eq!(spec.swift_versions(), ["4.2", "5"]);

        let tests = spec.test_specs();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].name(), "A/Tests");
        assert_eq!(tests[0].relative_name(), "Tests");
        assert_eq!(tests[0].version(), Some("1.2"));
        assert_eq!(spec.app_specs()[0].name(), "A/App");
    }

    #[test]
    fn test_no_platforms_means_all() {
        let spec = Specification::from_string(r#"{"name": "A"}"#, "A").unwrap();
        assert_eq!(spec.available_platforms().len(), 4);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Specification::from_string("not json", "x"),
            Err(SpecificationError::Parse { .. })
        ));
        assert!(matches!(
            Specification::from_string("{}", "x"),
            Err(SpecificationError::MissingName { .. })
        ));
        assert!(matches!(
            Specification::from_string(r#"{"name": "A", "platforms": {"android": null}}"#, "x"),
            Err(SpecificationError::UnknownPlatform { .. })
        ));
    }

    #[test]
    fn test_from_file_records_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("A.podspec.json");
        std::fs::write(&path, PODSPEC).unwrap();

        let spec = Specification::from_file(&path).unwrap();
        assert_eq!(spec.defined_in_file(), Some(path.as_path()));
        assert_eq!(spec.test_specs()[0].defined_in_file(), Some(path.as_path()));

        let missing = Specification::from_file(&tmp.path().join("B.podspec.json"));
        assert!(matches!(missing, Err(SpecificationError::NotFound { .. })));
    }

    #[test]
    fn test_from_file_records_path_on_deeply_nested_specs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("A.podspec.json");
        std::fs::write(
            &path,
            r#"{"name": "A", "subspecs": [{"name": "Core", "testspecs": [{"name": "Tests"}]}]}"#,
        )
        .unwrap();

        let spec = Specification::from_file(&path).unwrap();
        let nested = spec.test_specs();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].name(), "A/Core/Tests");
        assert_eq!(nested[0].defined_in_file(), Some(path.as_path()));
    }
}
