//! Resolving dependencies against podspecs on the local filesystem.
//!
//! With `local_sources` set, every dependency of the generated pods (and,
//! recursively, of the podspecs found) is looked up as `<root>.podspec` or
//! `<root>.podspec.json` in each search directory. The first hit wins and
//! is declared in the generated Podfile by path.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::Specification;
use crate::util::diagnostic::GenerateError;
use crate::util::fs::expand_path;

/// A dependency satisfied by a local podspec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDependency {
    /// Full name of the dependency as declared
    pub name: String,
    /// The podspec that satisfies it
    pub podspec: PathBuf,
}

/// Find local podspecs for the transitive dependencies of `specs`.
///
/// Relative search paths resolve against `cwd`. Results are in discovery
/// order; each dependency name appears once.
pub fn find_local_dependencies(
    specs: &[&Specification],
    search_paths: &[String],
    cwd: &Path,
) -> Result<Vec<LocalDependency>, GenerateError> {
    let search_paths: Vec<PathBuf> = search_paths
        .iter()
        .map(|p| expand_path(cwd, Path::new(p)))
        .collect();
    let mut finder = Finder {
        search_paths: &search_paths,
        seen: BTreeSet::new(),
        found: Vec::new(),
    };
    for spec in specs {
        finder.visit(spec, true)?;
    }
    Ok(finder.found)
}

struct Finder<'a> {
    search_paths: &'a [PathBuf],
    seen: BTreeSet<String>,
    found: Vec<LocalDependency>,
}

impl Finder<'_> {
    fn visit(&mut self, spec: &Specification, with_non_library: bool) -> Result<(), GenerateError> {
        if with_non_library {
            for subspec in spec.test_specs().into_iter().chain(spec.app_specs()) {
                self.visit(subspec, false)?;
            }
        }

        for dependency in spec.dependencies() {
            if self.seen.contains(dependency.name()) {
                continue;
            }
            let Some(podspec) = self.locate(dependency.root_name()) else {
                continue;
            };
            self.seen.insert(dependency.name().to_string());
            tracing::debug!(
                "found local podspec for `{}` at `{}`",
                dependency.name(),
                podspec.display()
            );
            self.found.push(LocalDependency {
                name: dependency.name().to_string(),
                podspec: podspec.clone(),
            });

            let local = Specification::from_file(&podspec).map_err(|source| {
                GenerateError::LocalPodspec {
                    path: podspec.clone(),
                    source,
                }
            })?;
            self.visit(&local, true)?;
        }
        Ok(())
    }

    fn locate(&self, root_name: &str) -> Option<PathBuf> {
        self.search_paths.iter().find_map(|dir| {
            let plain = dir.join(format!("{}.podspec", root_name));
            let json = dir.join(format!("{}.podspec.json", root_name));
            [plain, json].into_iter().find(|path| path.is_file())
        })
    }
}
