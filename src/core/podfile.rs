//! Podfile model.
//!
//! A Podfile is a tree of target definitions rooted at the abstract `Pods`
//! target. It is read from and written to the YAML hash layout CocoaPods
//! uses for `Podfile.yaml`:
//!
//! ```yaml
//! target_definitions:
//!   - name: Pods
//!     abstract: true
//!     dependencies:
//!       - A
//!       - B: ["~> 1.0", { source: "https://cdn.cocoapods.org/" }]
//!     inhibit_warnings: { all: true, not_for_pods: [B] }
//!     children:
//!       - name: App
//! plugins: { cocoapods-generate: {} }
//! sources: ["https://cdn.cocoapods.org/"]
//! ```
//!
//! Per-pod `inhibit_warnings` / `modular_headers` options written inline on
//! a dependency are moved into the owning target's flag hashes on load, the
//! same way `pod 'A', inhibit_warnings: true` behaves in a Ruby Podfile.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::dependency::{Dependency, EXTERNAL_SOURCE_KEYS};
use crate::core::platform::{Platform, PlatformTarget};

/// Name of the implicit root target definition.
pub const ROOT_TARGET_NAME: &str = "Pods";

/// Error loading or writing a Podfile.
#[derive(Debug, Error)]
pub enum PodfileError {
    #[error("failed to read Podfile `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse Podfile `{origin}`: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize Podfile: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Podfile must have exactly one root target definition, found {count}")]
    RootCount { count: usize },

    #[error("invalid dependency `{name}`: {reason}")]
    InvalidDependency { name: String, reason: String },

    #[error("unknown platform `{0}`")]
    UnknownPlatform(String),
}

/// Per-pod toggle state for one compilation flag.
///
/// `all` applies to every pod; `for_pods` / `not_for_pods` list explicit
/// exceptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagHash {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub for_pods: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_for_pods: Vec<String>,
}

impl FlagHash {
    /// Check whether nothing is set.
    pub fn is_empty(&self) -> bool {
        self.all.is_none() && self.for_pods.is_empty() && self.not_for_pods.is_empty()
    }

    /// Whether the flag is set for every pod.
    pub fn is_all(&self) -> bool {
        self.all.unwrap_or(false)
    }

    /// Record an explicit per-pod setting.
    pub fn set_for_pod(&mut self, pod: &str, enabled: bool) {
        let (add, remove) = if enabled {
            (&mut self.for_pods, &mut self.not_for_pods)
        } else {
            (&mut self.not_for_pods, &mut self.for_pods)
        };
        remove.retain(|p| p != pod);
        if !add.iter().any(|p| p == pod) {
            add.push(pod.to_string());
        }
    }

    /// Check whether the flag applies to `pod`.
    pub fn enabled_for(&self, pod: &str) -> bool {
        if self.not_for_pods.iter().any(|p| p == pod) {
            false
        } else if self.for_pods.iter().any(|p| p == pod) {
            true
        } else {
            self.is_all()
        }
    }

    /// Layer this hash over the effective hash of a parent definition.
    fn inherit(&self, parent: &FlagHash) -> FlagHash {
        let mut for_pods: Vec<String> = parent
            .for_pods
            .iter()
            .filter(|p| !self.not_for_pods.contains(p))
            .cloned()
            .collect();
        let mut not_for_pods: Vec<String> = if self.is_all() {
            Vec::new()
        } else {
            parent
                .not_for_pods
                .iter()
                .filter(|p| !self.for_pods.contains(p))
                .cloned()
                .collect()
        };
        for pod in &self.for_pods {
            if !for_pods.contains(pod) {
                for_pods.push(pod.clone());
            }
        }
        for pod in &self.not_for_pods {
            if !not_for_pods.contains(pod) {
                not_for_pods.push(pod.clone());
            }
        }

        FlagHash {
            all: self.all.or(parent.all),
            for_pods,
            not_for_pods,
        }
    }
}

/// A target's framework linkage setting (`use_frameworks!`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsesFrameworks {
    /// `use_frameworks!` / `use_frameworks! false`
    Flag(bool),
    /// `use_frameworks! linkage: :static`
    Options(BTreeMap<String, String>),
}

/// A CocoaPods installation method with its options (`install!`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationMethod {
    pub name: String,

    #[serde(default)]
    pub options: BTreeMap<String, serde_yaml::Value>,
}

/// A node in the Podfile's target tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTargetDefinition", into = "RawTargetDefinition")]
pub struct TargetDefinition {
    name: String,
    is_abstract: bool,
    user_project_path: Option<String>,
    dependencies: Vec<Dependency>,
    inhibit_warnings: FlagHash,
    use_modular_headers: FlagHash,
    swift_version: Option<String>,
    uses_frameworks: Option<UsesFrameworks>,
    platform: Option<PlatformTarget>,
    children: Vec<TargetDefinition>,
}

impl TargetDefinition {
    /// Create a concrete target definition.
    pub fn new(name: impl Into<String>) -> Self {
        TargetDefinition {
            name: name.into(),
            is_abstract: false,
            user_project_path: None,
            dependencies: Vec::new(),
            inhibit_warnings: FlagHash::default(),
            use_modular_headers: FlagHash::default(),
            swift_version: None,
            uses_frameworks: None,
            platform: None,
            children: Vec::new(),
        }
    }

    /// Create an abstract target definition.
    pub fn new_abstract(name: impl Into<String>) -> Self {
        TargetDefinition {
            is_abstract: true,
            ..TargetDefinition::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Dependencies declared directly on this target.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn inhibit_warnings(&self) -> &FlagHash {
        &self.inhibit_warnings
    }

    pub fn use_modular_headers(&self) -> &FlagHash {
        &self.use_modular_headers
    }

    pub fn swift_version(&self) -> Option<&str> {
        self.swift_version.as_deref()
    }

    pub fn uses_frameworks(&self) -> Option<&UsesFrameworks> {
        self.uses_frameworks.as_ref()
    }

    pub fn platform(&self) -> Option<&PlatformTarget> {
        self.platform.as_ref()
    }

    pub fn children(&self) -> &[TargetDefinition] {
        &self.children
    }

    /// Declare a pod, moving per-pod compilation flags into the flag hashes.
    pub fn store_pod(
        &mut self,
        dependency: Dependency,
        inhibit_warnings: Option<bool>,
        modular_headers: Option<bool>,
    ) {
        if let Some(enabled) = inhibit_warnings {
            self.inhibit_warnings.set_for_pod(dependency.name(), enabled);
        }
        if let Some(enabled) = modular_headers {
            self.use_modular_headers.set_for_pod(dependency.name(), enabled);
        }
        self.dependencies.push(dependency);
    }

    /// `inhibit_all_warnings!`
    pub fn set_inhibit_all_warnings(&mut self, enabled: bool) {
        self.inhibit_warnings.all = Some(enabled);
    }

    /// `use_modular_headers!`
    pub fn set_use_modular_headers_for_all(&mut self, enabled: bool) {
        self.use_modular_headers.all = Some(enabled);
    }

    /// Replace both flag hashes.
    pub fn set_flag_hashes(&mut self, inhibit_warnings: FlagHash, use_modular_headers: FlagHash) {
        self.inhibit_warnings = inhibit_warnings;
        self.use_modular_headers = use_modular_headers;
    }

    pub fn set_swift_version(&mut self, version: impl Into<String>) {
        self.swift_version = Some(version.into());
    }

    pub fn set_uses_frameworks(&mut self, uses_frameworks: UsesFrameworks) {
        self.uses_frameworks = Some(uses_frameworks);
    }

    pub fn set_platform(&mut self, platform: PlatformTarget) {
        self.platform = Some(platform);
    }

    pub fn set_user_project_path(&mut self, path: impl Into<String>) {
        self.user_project_path = Some(path.into());
    }

    /// Append a child definition and return a handle to it.
    pub fn add_child(&mut self, child: TargetDefinition) -> &mut TargetDefinition {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    fn collect<'a>(
        &'a self,
        parent: Option<&ResolvedTargetDefinition<'a>>,
        out: &mut Vec<ResolvedTargetDefinition<'a>>,
    ) {
        let resolved = match parent {
            None => ResolvedTargetDefinition {
                definition: self,
                inhibit_warnings: self.inhibit_warnings.clone(),
                use_modular_headers: self.use_modular_headers.clone(),
                uses_frameworks: self.uses_frameworks.clone(),
            },
            Some(parent) => ResolvedTargetDefinition {
                definition: self,
                inhibit_warnings: self.inhibit_warnings.inherit(&parent.inhibit_warnings),
                use_modular_headers: self.use_modular_headers.inherit(&parent.use_modular_headers),
                uses_frameworks: self
                    .uses_frameworks
                    .clone()
                    .or_else(|| parent.uses_frameworks.clone()),
            },
        };
        out.push(resolved);
        let index = out.len() - 1;
        for child in &self.children {
            let parent = out[index].clone();
            child.collect(Some(&parent), out);
        }
    }
}

/// A target definition with the settings it inherits from its ancestors.
#[derive(Debug, Clone)]
pub struct ResolvedTargetDefinition<'a> {
    pub definition: &'a TargetDefinition,
    pub inhibit_warnings: FlagHash,
    pub use_modular_headers: FlagHash,
    pub uses_frameworks: Option<UsesFrameworks>,
}

impl ResolvedTargetDefinition<'_> {
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn is_abstract(&self) -> bool {
        self.definition.is_abstract()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        self.definition.dependencies()
    }

    pub fn swift_version(&self) -> Option<&str> {
        self.definition.swift_version()
    }

    /// Whether warnings are inhibited for `pod` in this target.
    pub fn inhibits_warnings_for_pod(&self, pod: &str) -> bool {
        self.inhibit_warnings.enabled_for(pod)
    }

    /// Whether `pod` is built with modular headers in this target.
    pub fn build_pod_as_module(&self, pod: &str) -> bool {
        self.use_modular_headers.enabled_for(pod)
    }

    /// Whether this target declares `pod`.
    pub fn declares(&self, pod: &str) -> bool {
        self.dependencies().iter().any(|d| d.name() == pod)
    }
}

/// A Podfile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPodfile", into = "RawPodfile")]
pub struct Podfile {
    root: TargetDefinition,
    plugins: BTreeMap<String, serde_yaml::Value>,
    sources: Vec<String>,
    installation_method: Option<InstallationMethod>,
    workspace: Option<String>,
    supports_swift_versions: Vec<String>,
    defined_in_file: Option<PathBuf>,
}

impl Default for Podfile {
    fn default() -> Self {
        Self::new()
    }
}

impl Podfile {
    /// Create an empty Podfile with an abstract `Pods` root.
    pub fn new() -> Self {
        Podfile {
            root: TargetDefinition::new_abstract(ROOT_TARGET_NAME),
            plugins: BTreeMap::new(),
            sources: Vec::new(),
            installation_method: None,
            workspace: None,
            supports_swift_versions: Vec::new(),
            defined_in_file: None,
        }
    }

    /// Load a Podfile from a YAML file.
    pub fn from_file(path: &Path) -> Result<Podfile, PodfileError> {
        let contents = std::fs::read_to_string(path).map_err(|source| PodfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut podfile = Self::from_yaml(&contents, &path.display().to_string())?;
        podfile.defined_in_file = Some(path.to_path_buf());
        Ok(podfile)
    }

    /// Parse a Podfile from YAML text. `origin` names it in errors.
    pub fn from_yaml(contents: &str, origin: &str) -> Result<Podfile, PodfileError> {
        if contents.trim().is_empty() {
            return Ok(Podfile::new());
        }
        serde_yaml::from_str(contents).map_err(|source| PodfileError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Serialize to the YAML hash layout.
    pub fn to_yaml(&self) -> Result<String, PodfileError> {
        serde_yaml::to_string(self).map_err(PodfileError::Serialize)
    }

    pub fn root(&self) -> &TargetDefinition {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut TargetDefinition {
        &mut self.root
    }

    pub fn plugins(&self) -> &BTreeMap<String, serde_yaml::Value> {
        &self.plugins
    }

    pub fn add_plugin(&mut self, name: impl Into<String>, options: serde_yaml::Value) {
        self.plugins.insert(name.into(), options);
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn add_source(&mut self, source: impl Into<String>) {
        let source = source.into();
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    pub fn installation_method(&self) -> Option<&InstallationMethod> {
        self.installation_method.as_ref()
    }

    /// Options passed to `install!`, empty when none were given.
    pub fn installation_options(&self) -> BTreeMap<String, serde_yaml::Value> {
        self.installation_method
            .as_ref()
            .map(|m| m.options.clone())
            .unwrap_or_default()
    }

    pub fn set_installation_method(
        &mut self,
        name: impl Into<String>,
        options: BTreeMap<String, serde_yaml::Value>,
    ) {
        self.installation_method = Some(InstallationMethod {
            name: name.into(),
            options,
        });
    }

    pub fn workspace(&self) -> Option<&str> {
        self.workspace.as_deref()
    }

    pub fn set_workspace(&mut self, workspace: impl Into<String>) {
        self.workspace = Some(workspace.into());
    }

    /// The user project path declared on the root target.
    pub fn project(&self) -> Option<&str> {
        self.root.user_project_path.as_deref()
    }

    pub fn set_project(&mut self, project: impl Into<String>) {
        self.root.set_user_project_path(project);
    }

    pub fn supports_swift_versions(&self) -> &[String] {
        &self.supports_swift_versions
    }

    pub fn set_supports_swift_versions(&mut self, requirements: Vec<String>) {
        self.supports_swift_versions = requirements;
    }

    pub fn defined_in_file(&self) -> Option<&Path> {
        self.defined_in_file.as_deref()
    }

    pub fn set_defined_in_file(&mut self, path: impl Into<PathBuf>) {
        self.defined_in_file = Some(path.into());
    }

    /// Every target definition, root first, with inherited settings applied.
    pub fn target_definition_list(&self) -> Vec<ResolvedTargetDefinition<'_>> {
        let mut list = Vec::new();
        self.root.collect(None, &mut list);
        list
    }

    /// Find a target definition by name.
    pub fn find_target(&self, name: &str) -> Option<&TargetDefinition> {
        self.target_definition_list()
            .into_iter()
            .map(|t| t.definition)
            .find(|t| t.name() == name)
    }

    /// Every dependency declared anywhere in the Podfile, deduplicated.
    pub fn dependencies(&self) -> Vec<Dependency> {
        let mut all: Vec<Dependency> = Vec::new();
        for target in self.target_definition_list() {
            for dependency in target.dependencies() {
                if !all.contains(dependency) {
                    all.push(dependency.clone());
                }
            }
        }
        all
    }
}

// Serialized forms

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPodfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    target_definitions: Vec<TargetDefinition>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    plugins: BTreeMap<String, serde_yaml::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    installation_method: Option<InstallationMethod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    workspace: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    supports_swift_versions: Vec<String>,
}

impl TryFrom<RawPodfile> for Podfile {
    type Error = PodfileError;

    fn try_from(raw: RawPodfile) -> Result<Self, Self::Error> {
        let mut roots = raw.target_definitions;
        let root = match roots.len() {
            0 => TargetDefinition::new_abstract(ROOT_TARGET_NAME),
            1 => roots.remove(0),
            count => return Err(PodfileError::RootCount { count }),
        };
        Ok(Podfile {
            root,
            plugins: raw.plugins,
            sources: raw.sources,
            installation_method: raw.installation_method,
            workspace: raw.workspace,
            supports_swift_versions: raw.supports_swift_versions,
            defined_in_file: None,
        })
    }
}

impl From<Podfile> for RawPodfile {
    fn from(podfile: Podfile) -> Self {
        RawPodfile {
            target_definitions: vec![podfile.root],
            plugins: podfile.plugins,
            sources: podfile.sources,
            installation_method: podfile.installation_method,
            workspace: podfile.workspace,
            supports_swift_versions: podfile.supports_swift_versions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTargetDefinition {
    name: String,

    #[serde(rename = "abstract", default, skip_serializing_if = "std::ops::Not::not")]
    is_abstract: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_project_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<RawDependency>,

    #[serde(default, skip_serializing_if = "FlagHash::is_empty")]
    inhibit_warnings: FlagHash,

    #[serde(default, skip_serializing_if = "FlagHash::is_empty")]
    use_modular_headers: FlagHash,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    swift_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    uses_frameworks: Option<UsesFrameworks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    platform: Option<BTreeMap<String, Option<String>>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<TargetDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Name(String),
    Detailed(BTreeMap<String, Vec<RawRequirement>>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Requirement(String),
    Options(BTreeMap<String, serde_yaml::Value>),
}

impl TryFrom<RawTargetDefinition> for TargetDefinition {
    type Error = PodfileError;

    fn try_from(raw: RawTargetDefinition) -> Result<Self, Self::Error> {
        let platform = match raw.platform.and_then(|p| p.into_iter().next()) {
            Some((name, deployment_target)) => {
                let name = name
                    .parse::<Platform>()
                    .map_err(|_| PodfileError::UnknownPlatform(name.clone()))?;
                Some(PlatformTarget::new(name, deployment_target))
            }
            None => None,
        };

        let mut definition = TargetDefinition {
            name: raw.name,
            is_abstract: raw.is_abstract,
            user_project_path: raw.user_project_path,
            dependencies: Vec::new(),
            inhibit_warnings: raw.inhibit_warnings,
            use_modular_headers: raw.use_modular_headers,
            swift_version: raw.swift_version,
            uses_frameworks: raw.uses_frameworks,
            platform,
            children: raw.children,
        };

        for entry in raw.dependencies {
            let (dependency, inhibit_warnings, modular_headers) = dependency_from_raw(entry)?;
            definition.store_pod(dependency, inhibit_warnings, modular_headers);
        }
        Ok(definition)
    }
}

impl From<TargetDefinition> for RawTargetDefinition {
    fn from(definition: TargetDefinition) -> Self {
        RawTargetDefinition {
            name: definition.name,
            is_abstract: definition.is_abstract,
            user_project_path: definition.user_project_path,
            dependencies: definition.dependencies.iter().map(dependency_to_raw).collect(),
            inhibit_warnings: definition.inhibit_warnings,
            use_modular_headers: definition.use_modular_headers,
            swift_version: definition.swift_version,
            uses_frameworks: definition.uses_frameworks,
            platform: definition.platform.map(|p| {
                BTreeMap::from([(p.name.as_str().to_string(), p.deployment_target)])
            }),
            children: definition.children,
        }
    }
}

fn dependency_to_raw(dependency: &Dependency) -> RawDependency {
    let mut requirements: Vec<RawRequirement> = dependency
        .requirements()
        .iter()
        .cloned()
        .map(RawRequirement::Requirement)
        .collect();

    let mut options = BTreeMap::new();
    if let Some(source) = dependency.external_source() {
        for (key, value) in source {
            options.insert(key.clone(), serde_yaml::Value::String(value.clone()));
        }
    }
    if let Some(repo) = dependency.podspec_repo() {
        options.insert("source".to_string(), serde_yaml::Value::String(repo.to_string()));
    }
    for (key, specs) in [
        ("testspecs", dependency.testspecs()),
        ("appspecs", dependency.appspecs()),
    ] {
        if !specs.is_empty() {
            let list = specs
                .iter()
                .map(|s| serde_yaml::Value::String(s.clone()))
                .collect();
            options.insert(key.to_string(), serde_yaml::Value::Sequence(list));
        }
    }

    if requirements.is_empty() && options.is_empty() {
        return RawDependency::Name(dependency.name().to_string());
    }
    if !options.is_empty() {
        requirements.push(RawRequirement::Options(options));
    }
    RawDependency::Detailed(BTreeMap::from([(dependency.name().to_string(), requirements)]))
}

type StoredPod = (Dependency, Option<bool>, Option<bool>);

fn dependency_from_raw(raw: RawDependency) -> Result<StoredPod, PodfileError> {
    let (name, entries) = match raw {
        RawDependency::Name(name) => return Ok((Dependency::new(name), None, None)),
        RawDependency::Detailed(map) => {
            let mut entries = map.into_iter();
            match (entries.next(), entries.next()) {
                (Some(entry), None) => entry,
                _ => {
                    return Err(PodfileError::InvalidDependency {
                        name: String::new(),
                        reason: "expected a single pod name per entry".to_string(),
                    })
                }
            }
        }
    };

    let invalid = |reason: String| PodfileError::InvalidDependency {
        name: name.clone(),
        reason,
    };

    let mut requirements = Vec::new();
    let mut external_source = BTreeMap::new();
    let mut podspec_repo = None;
    let mut testspecs = Vec::new();
    let mut appspecs = Vec::new();
    let mut inhibit_warnings = None;
    let mut modular_headers = None;

    for entry in entries {
        let options = match entry {
            RawRequirement::Requirement(requirement) => {
                requirements.push(requirement);
                continue;
            }
            RawRequirement::Options(options) => options,
        };
        for (key, value) in options {
            match key.as_str() {
                k if EXTERNAL_SOURCE_KEYS.contains(&k) => {
                    let value = yaml_scalar(&value)
                        .ok_or_else(|| invalid(format!("option `{}` must be a string", key)))?;
                    external_source.insert(key, value);
                }
                "source" => {
                    podspec_repo = Some(
                        yaml_scalar(&value)
                            .ok_or_else(|| invalid("option `source` must be a string".into()))?,
                    );
                }
                "testspecs" | "appspecs" => {
                    let list = value
                        .as_sequence()
                        .and_then(|seq| seq.iter().map(yaml_scalar).collect::<Option<Vec<_>>>())
                        .ok_or_else(|| invalid(format!("option `{}` must be a list", key)))?;
                    if key == "testspecs" {
                        testspecs = list;
                    } else {
                        appspecs = list;
                    }
                }
                "inhibit_warnings" | "modular_headers" => {
                    let flag = value
                        .as_bool()
                        .ok_or_else(|| invalid(format!("option `{}` must be a boolean", key)))?;
                    if key == "inhibit_warnings" {
                        inhibit_warnings = Some(flag);
                    } else {
                        modular_headers = Some(flag);
                    }
                }
                other => {
                    tracing::warn!("ignoring unknown option `{}` on pod `{}`", other, name);
                }
            }
        }
    }

    let mut dependency = Dependency::new(name.clone())
        .with_requirements(requirements)
        .with_external_source(external_source)
        .with_testspecs(testspecs)
        .with_appspecs(appspecs);
    if let Some(repo) = podspec_repo {
        dependency = dependency.with_podspec_repo(repo);
    }
    Ok((dependency, inhibit_warnings, modular_headers))
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PODFILE: &str = r#"
target_definitions:
  - name: Pods
    abstract: true
    inhibit_warnings:
      all: true
    uses_frameworks: true
    children:
      - name: App
        platform:
          ios: "10.0"
        swift_version: "4.2"
        dependencies:
          - A
          - B:
              - "~> 1.0"
              - inhibit_warnings: false
                modular_headers: true
          - C:
              - path: ../C
                testspecs: [Tests]
      - name: Other
        abstract: true
        use_modular_headers:
          all: true
        dependencies:
          - D: [{ source: "https://example.com/specs.git" }]
plugins:
  cocoapods-keys:
    keys: [Secret]
sources:
  - https://cdn.cocoapods.org/
installation_method:
  name: cocoapods
  options:
    deterministic_uuids: false
"#;

    #[test]
    fn test_parse_podfile_yaml() {
        let podfile = Podfile::from_yaml(PODFILE, "Podfile.yaml").unwrap();

        assert_eq!(podfile.root().name(), "Pods");
        assert!(podfile.root().is_abstract());
        assert_eq!(podfile.sources(), ["https://cdn.cocoapods.org/"]);
        assert!(podfile.plugins().contains_key("cocoapods-keys"));
        assert_eq!(
            podfile.installation_options().get("deterministic_uuids"),
            Some(&serde_yaml::Value::Bool(false))
        );

        let app = podfile.find_target("App").unwrap();
        assert_eq!(app.swift_version(), Some("4.2"));
        assert_eq!(
            app.platform(),
            Some(&PlatformTarget::new(Platform::Ios, Some("10.0".to_string())))
        );
        assert_eq!(app.dependencies().len(), 3);
        assert_eq!(app.dependencies()[1].requirements(), ["~> 1.0"]);
        assert_eq!(app.inhibit_warnings().not_for_pods, ["B"]);
        assert_eq!(app.use_modular_headers().for_pods, ["B"]);
        assert_eq!(
            app.dependencies()[2].external_source().unwrap()["path"],
            "../C"
        );
        assert_eq!(app.dependencies()[2].testspecs(), ["Tests"]);

        let deps = podfile.dependencies();
        assert_eq!(deps.len(), 4);
        assert_eq!(
            deps[3].podspec_repo(),
            Some("https://example.com/specs.git")
        );
    }

    #[test]
    fn test_flags_inherit_from_parent() {
        let podfile = Podfile::from_yaml(PODFILE, "Podfile.yaml").unwrap();
        let list = podfile.target_definition_list();
        assert_eq!(
            list.iter().map(|t| t.name()).collect::<Vec<_>>(),
            ["Pods", "App", "Other"]
        );

        let app = &list[1];
        assert!(app.inhibits_warnings_for_pod("A"));
        assert!(!app.inhibits_warnings_for_pod("B"));
        assert!(app.build_pod_as_module("B"));
        assert!(!app.build_pod_as_module("A"));
        assert_eq!(app.uses_frameworks, Some(UsesFrameworks::Flag(true)));

        let other = &list[2];
        assert!(other.build_pod_as_module("A"));
        assert!(other.inhibits_warnings_for_pod("D"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let podfile = Podfile::from_yaml(PODFILE, "Podfile.yaml").unwrap();
        let yaml = podfile.to_yaml().unwrap();
        let reparsed = Podfile::from_yaml(&yaml, "generated").unwrap();
        assert_eq!(reparsed, podfile);
    }

    #[test]
    fn test_store_pod_serializes_compactly() {
        let mut podfile = Podfile::new();
        podfile.set_workspace("A.xcworkspace");
        podfile.root_mut().store_pod(Dependency::new("A"), None, None);
        podfile.root_mut().store_pod(
            Dependency::new("B").with_requirements(["= 1.0"]),
            Some(true),
            None,
        );

        let yaml = podfile.to_yaml().unwrap();
        assert!(yaml.contains("- A\n"));
        assert!(yaml.contains("- B:\n"));
        assert!(yaml.contains("workspace: A.xcworkspace"));
        assert!(yaml.contains("for_pods:"));
    }

    #[test]
    fn test_empty_and_invalid_podfiles() {
        assert_eq!(Podfile::from_yaml("", "x").unwrap(), Podfile::new());
        assert!(Podfile::from_yaml("target_definitions: 3", "x").is_err());
        assert!(Podfile::from_yaml(
            "target_definitions:\n  - name: A\n  - name: B\n",
            "x"
        )
        .is_err());
    }

    #[test]
    fn test_from_file_records_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Podfile.yaml");
        std::fs::write(&path, PODFILE).unwrap();

        let podfile = Podfile::from_file(&path).unwrap();
        assert_eq!(podfile.defined_in_file(), Some(path.as_path()));
    }
}
