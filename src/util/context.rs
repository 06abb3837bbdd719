//! Global context for generation runs.
//!
//! Provides centralized access to the working directory, the CocoaPods home
//! directory and the files CocoaPods itself would pick up: the Podfile, the
//! lockfile and the spec repos. A context is passed explicitly to everything
//! that needs it; there is no process-wide instance.
//!
//! ## Spec repos
//!
//! Spec repos live under `~/.cocoapods/repos/<name>`. Git-backed repos are
//! identified by their `origin` remote, CDN-backed repos by a `.url` file.
//! Repos are listed in name order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::Repository;

/// Trunk CDN URL, used when no other source is known.
pub const TRUNK_CDN_URL: &str = "https://cdn.cocoapods.org/";

/// Podfile names recognized in an installation root, in lookup order.
///
/// Only YAML Podfiles can be read; Ruby DSL Podfiles are not evaluated.
pub const PODFILE_NAMES: &[&str] = &["CocoaPods.podfile.yaml", "Podfile.yaml"];

/// Lockfile name in an installation root.
pub const LOCKFILE_NAME: &str = "Podfile.lock";

/// Remote whose URL identifies a git-backed spec repo.
const ORIGIN_REMOTE: &str = "origin";

/// Environment variable overriding the CocoaPods home directory.
pub const HOME_ENV: &str = "CP_HOME_DIR";

/// A locally configured spec repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRepo {
    /// Directory name under `repos/`
    pub name: String,

    /// Remote URL of the repo
    pub url: String,
}

impl SpecRepo {
    /// Create a new spec repo entry.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        SpecRepo {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Read a spec repo from its checkout directory.
    ///
    /// Returns `None` when the directory has no recognizable URL.
    fn from_dir(dir: &Path) -> Option<Self> {
        let name = dir.file_name()?.to_string_lossy().into_owned();

        if let Ok(url) = std::fs::read_to_string(dir.join(".url")) {
            let url = url.trim();
            if !url.is_empty() {
                return Some(SpecRepo::new(name, url));
            }
        }

        let repo = match Repository::open(dir) {
            Ok(repo) => repo,
            Err(e) => {
                tracing::debug!("skipping spec repo `{}`: {}", dir.display(), e.message());
                return None;
            }
        };
        let remote = repo.find_remote(ORIGIN_REMOTE).ok()?;
        let url = remote.url()?.to_string();
        Some(SpecRepo::new(name, url))
    }
}

/// Global context containing the paths generation runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// CocoaPods home directory (~/.cocoapods/)
    home: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext for the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::with_cwd(cwd)
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let home = match std::env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => directories::BaseDirs::new()
                .map(|b| b.home_dir().join(".cocoapods"))
                .context("failed to locate the home directory")?,
        };

        Ok(GlobalContext { cwd, home })
    }

    /// Use a specific CocoaPods home directory.
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = home;
        self
    }

    /// The same context working from another directory.
    pub fn relocated(&self, cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            home: self.home.clone(),
        }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the CocoaPods home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the spec repos directory.
    pub fn repos_dir(&self) -> PathBuf {
        self.home.join("repos")
    }

    /// Find the installation root: the closest ancestor of cwd holding a Podfile.
    ///
    /// Falls back to cwd when no Podfile is found.
    pub fn installation_root(&self) -> PathBuf {
        self.cwd
            .ancestors()
            .find(|dir| find_podfile(dir).is_some())
            .unwrap_or(&self.cwd)
            .to_path_buf()
    }

    /// Path of the Podfile in the installation root, if one exists.
    pub fn podfile_path(&self) -> Option<PathBuf> {
        find_podfile(&self.installation_root())
    }

    /// Path of the lockfile in the installation root, if one exists.
    pub fn lockfile_path(&self) -> Option<PathBuf> {
        let path = self.installation_root().join(LOCKFILE_NAME);
        path.is_file().then_some(path)
    }

    /// List the locally configured spec repos in name order.
    pub fn spec_repos(&self) -> Vec<SpecRepo> {
        let Ok(entries) = std::fs::read_dir(self.repos_dir()) else {
            return Vec::new();
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        dirs.iter().filter_map(|dir| SpecRepo::from_dir(dir)).collect()
    }
}

/// Find a recognized Podfile directly inside `dir`.
pub fn find_podfile(dir: &Path) -> Option<PathBuf> {
    PODFILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
