//! Dependency declarations.
//!
//! A Dependency names a pod (possibly a subspec, `A/Core`), the version
//! requirements placed on it, and optionally where it comes from: an
//! external source (`path`, `git`, ...) or a specific spec repo.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// The requirement implied when a dependency carries no explicit requirement.
pub const DEFAULT_REQUIREMENT: &str = ">= 0";

/// Keys of a dependency's options that describe an external source.
pub const EXTERNAL_SOURCE_KEYS: &[&str] = &["path", "podspec", "git", "branch", "tag", "commit", "http"];

/// Matches `Name` and `Name (inner)` as written in lockfiles.
static LOCKFILE_DEPENDENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^\s(]+)(?:\s+\((?P<inner>.*)\))?$").expect("valid regex")
});

/// Error parsing a lockfile dependency string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid dependency string `{input}`")]
pub struct DependencyParseError {
    pub input: String,
}

/// A dependency on a pod.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dependency {
    /// Full pod name, including any subspec path
    name: String,

    /// Version requirements (`~> 1.0`); empty means unconstrained
    requirements: Vec<String>,

    /// External source descriptor (`git`, `path`, ...)
    external_source: Option<BTreeMap<String, String>>,

    /// Spec repo the pod must come from
    podspec_repo: Option<String>,

    /// Test specs to include
    testspecs: Vec<String>,

    /// App specs to include
    appspecs: Vec<String>,
}

impl Dependency {
    /// Create an unconstrained dependency.
    pub fn new(name: impl Into<String>) -> Self {
        Dependency {
            name: name.into(),
            requirements: Vec::new(),
            external_source: None,
            podspec_repo: None,
            testspecs: Vec::new(),
            appspecs: Vec::new(),
        }
    }

    /// Set the version requirements.
    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = normalize_requirements(requirements.into_iter().map(Into::into));
        self
    }

    /// Set the external source descriptor.
    pub fn with_external_source(mut self, source: BTreeMap<String, String>) -> Self {
        self.external_source = (!source.is_empty()).then_some(source);
        self
    }

    /// Pin the dependency to a spec repo.
    pub fn with_podspec_repo(mut self, repo: impl Into<String>) -> Self {
        self.podspec_repo = Some(repo.into());
        self
    }

    /// Set the test specs to include.
    pub fn with_testspecs(mut self, testspecs: Vec<String>) -> Self {
        self.testspecs = testspecs;
        self
    }

    /// Set the app specs to include.
    pub fn with_appspecs(mut self, appspecs: Vec<String>) -> Self {
        self.appspecs = appspecs;
        self
    }

    /// Return a copy of this dependency under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Dependency {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Get the full pod name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the root pod name (`A` for `A/Core`).
    pub fn root_name(&self) -> &str {
        root_name(&self.name)
    }

    /// Get the explicit requirements.
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Get the requirements, defaulting to `>= 0` when unconstrained.
    pub fn requirement_list(&self) -> Vec<String> {
        if self.requirements.is_empty() {
            vec![DEFAULT_REQUIREMENT.to_string()]
        } else {
            self.requirements.clone()
        }
    }

    /// Get the external source descriptor.
    pub fn external_source(&self) -> Option<&BTreeMap<String, String>> {
        self.external_source.as_ref()
    }

    /// Get the spec repo.
    pub fn podspec_repo(&self) -> Option<&str> {
        self.podspec_repo.as_deref()
    }

    /// Get the test specs to include.
    pub fn testspecs(&self) -> &[String] {
        &self.testspecs
    }

    /// Get the app specs to include.
    pub fn appspecs(&self) -> &[String] {
        &self.appspecs
    }

    /// Check if this dependency comes from an external source.
    pub fn is_external(&self) -> bool {
        self.external_source.is_some()
    }

    /// Merge `other` into this dependency.
    ///
    /// Requirements are unioned. External sources are merged key by key and
    /// the spec repo is replaced, `other` winning in both cases.
    pub fn merge(&self, other: &Dependency) -> Dependency {
        let requirements = normalize_requirements(
            self.requirements
                .iter()
                .chain(other.requirements.iter())
                .cloned(),
        );

        let external_source = match (&self.external_source, &other.external_source) {
            (None, None) => None,
            (mine, theirs) => {
                let mut merged = mine.clone().unwrap_or_default();
                merged.extend(theirs.clone().unwrap_or_default());
                Some(merged)
            }
        };

        let mut testspecs = self.testspecs.clone();
        for spec in &other.testspecs {
            if !testspecs.contains(spec) {
                testspecs.push(spec.clone());
            }
        }
        let mut appspecs = self.appspecs.clone();
        for spec in &other.appspecs {
            if !appspecs.contains(spec) {
                appspecs.push(spec.clone());
            }
        }

        Dependency {
            name: self.name.clone(),
            requirements,
            external_source,
            podspec_repo: other.podspec_repo.clone().or_else(|| self.podspec_repo.clone()),
            testspecs,
            appspecs,
        }
    }

    /// Parse a dependency string as written in a lockfile.
    ///
    /// Accepts `A`, `A (1.0)` (an exact version), `A (~> 1.0, < 2)` and
    /// `A (from `path`)`. External source details are not part of the
    /// string; the lockfile attaches them separately.
    pub fn from_lockfile_str(input: &str) -> Result<Dependency, DependencyParseError> {
        let input = input.trim();
        let captures = LOCKFILE_DEPENDENCY
            .captures(input)
            .ok_or_else(|| DependencyParseError {
                input: input.to_string(),
            })?;

        let dependency = Dependency::new(&captures["name"]);
        let Some(inner) = captures.name("inner").map(|m| m.as_str().trim()) else {
            return Ok(dependency);
        };

        if inner.starts_with("from ") || inner.is_empty() {
            return Ok(dependency);
        }

        let requirements = inner.split(',').map(str::trim).map(|req| {
            if req.starts_with(|c: char| c.is_ascii_digit()) {
                format!("= {}", req)
            } else {
                req.to_string()
            }
        });
        Ok(dependency.with_requirements(requirements))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.is_external() {
            write!(f, " (external source)")
        } else if !self.requirements.is_empty() {
            write!(f, " ({})", self.requirements.join(", "))
        } else {
            Ok(())
        }
    }
}

/// Get the root pod name of a possibly-subspec name.
pub fn root_name(name: &str) -> &str {
    name.split('/').next().unwrap_or(name)
}

/// Deduplicate requirements, dropping the default when anything else constrains.
fn normalize_requirements(requirements: impl Iterator<Item = String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for requirement in requirements {
        let requirement = requirement.trim().to_string();
        if !requirement.is_empty() && !normalized.contains(&requirement) {
            normalized.push(requirement);
        }
    }
    if normalized.iter().any(|r| r != DEFAULT_REQUIREMENT) {
        normalized.retain(|r| r != DEFAULT_REQUIREMENT);
    }
    normalized
}
