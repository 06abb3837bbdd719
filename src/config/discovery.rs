//! Locating and loading the podspecs to generate workspaces for.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;

use crate::config::value::Value;
use crate::core::Specification;
use crate::util::fs::{expand_path, glob_files};

/// File name patterns that identify a podspec.
pub const PODSPEC_PATTERNS: &[&str] = &["*.podspec", "*.podspec.json"];

/// Load the podspecs named by `paths`.
///
/// An empty list means the current directory. Directories contribute every
/// podspec directly inside them, sorted by name; URLs are fetched. Each
/// entry that fails becomes a [`Value::Error`] in the result instead of
/// failing the whole batch.
pub fn podspecs_from_paths(paths: &[Value], cwd: &Path) -> Vec<Value> {
    let default = [Value::Path(cwd.to_path_buf())];
    let paths = if paths.is_empty() { &default[..] } else { paths };

    let mut podspecs = Vec::new();
    for path in paths {
        match path {
            Value::Url(url) => podspecs.push(loaded(podspec_from_url(url))),
            other => match other.as_path() {
                Some(path) => {
                    let path = expand_path(cwd, &path);
                    if path.is_dir() {
                        podspecs.extend(podspecs_in_dir(&path));
                    } else {
                        podspecs.push(loaded(
                            Specification::from_file(&path).map_err(anyhow::Error::from),
                        ));
                    }
                }
                None => podspecs.push(Value::Error(format!(
                    "cannot load a podspec from {}",
                    other.repr()
                ))),
            },
        }
    }
    podspecs
}

fn loaded(result: Result<Specification>) -> Value {
    match result {
        Ok(spec) => Value::Specification(Arc::new(spec)),
        Err(e) => {
            tracing::debug!("failed to load podspec: {:#}", e);
            Value::Error(format!("{:#}", e))
        }
    }
}

fn podspecs_in_dir(dir: &Path) -> Vec<Value> {
    let files = match glob_files(dir, PODSPEC_PATTERNS) {
        Ok(files) => files,
        Err(e) => return vec![loaded(Err(e))],
    };
    if files.is_empty() {
        return vec![Value::Error(format!("no specs found in {}", dir.display()))];
    }

    let mut specs = Vec::new();
    let mut errors = Vec::new();
    for file in files {
        match Specification::from_file(&file) {
            Ok(spec) => specs.push(spec),
            Err(e) => errors.push(loaded(Err(e.into()))),
        }
    }
    specs.sort_by(|a, b| a.name().cmp(b.name()));

    specs
        .into_iter()
        .map(|spec| Value::Specification(Arc::new(spec)))
        .chain(errors)
        .collect()
}

fn podspec_from_url(url: &Url) -> Result<Specification> {
    tracing::debug!("fetching podspec from {}", url);
    let contents = reqwest::blocking::get(url.clone())
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .with_context(|| format!("failed to fetch podspec from {}", url))?;
    Ok(Specification::from_string(&contents, url.as_str())?)
}
