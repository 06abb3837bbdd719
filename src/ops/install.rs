//! Installing generated Podfiles.
//!
//! Generation stops at the Podfile: turning it into an Xcode workspace is
//! the job of an [`Installer`]. Each install runs against a configuration
//! whose context is rooted in the workspace's generation directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::{Configuration, OptionKey, Value, ValueMap};
use crate::core::{PlatformTarget, Podfile, Specification};
use crate::ops::generate::{PodfileGenerator, GENERATED_PODFILE_NAME};
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists, write_string};
use crate::util::hash::sha256_file;

/// Directory inside the generation directory receiving app host sources.
pub const APP_HOST_DIR_NAME: &str = "App";

/// A concrete target of an installed workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTarget {
    /// Target name (`App-iOS`)
    pub name: String,
    /// Platform the target builds for
    pub platform: Option<PlatformTarget>,
    /// Pods the target links, including inherited ones
    pub pods: Vec<String>,
    /// Module name of each pod under development
    pub product_module_names: Vec<String>,
}

/// What an install produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Directory the workspace was generated in
    pub gen_dir: PathBuf,
    /// The Podfile written for the installer
    pub podfile_path: PathBuf,
    /// The workspace CocoaPods will create, if the Podfile names one
    pub workspace_path: Option<PathBuf>,
    /// SHA-256 checksum of the written Podfile
    pub checksum: String,
    /// Concrete targets, in declaration order
    pub targets: Vec<InstalledTarget>,
}

/// Installs a generated Podfile for a set of podspecs.
pub trait Installer {
    fn install(
        &self,
        configuration: &Configuration,
        specs: &[&Specification],
        podfile: &Podfile,
    ) -> Result<InstallReport>;
}

/// Writes the generated Podfile into the generation directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkspaceWriter;

impl Installer for WorkspaceWriter {
    fn install(
        &self,
        configuration: &Configuration,
        specs: &[&Specification],
        podfile: &Podfile,
    ) -> Result<InstallReport> {
        let gen_dir = configuration
            .pod_config()
            .map(|ctx| ctx.cwd().to_path_buf())
            .unwrap_or_else(|| configuration.gen_dir_for_specs(specs));

        if configuration.clean() {
            tracing::info!("cleaning {}", gen_dir.display());
            remove_dir_all_if_exists(&gen_dir)?;
        }
        ensure_dir(&gen_dir)?;

        let podfile_path = gen_dir.join(GENERATED_PODFILE_NAME);
        let yaml = podfile
            .to_yaml()
            .with_context(|| format!("failed to serialize Podfile for {}", podfile_path.display()))?;
        write_string(&podfile_path, &yaml)?;
        let checksum = sha256_file(&podfile_path)?;
        tracing::info!("wrote {}", podfile_path.display());

        if let Some(source) = configuration.app_host_source_dir() {
            copy_dir(&source, &gen_dir.join(APP_HOST_DIR_NAME))?;
        }

        Ok(InstallReport {
            workspace_path: podfile.workspace().map(|name| gen_dir.join(name)),
            gen_dir,
            podfile_path,
            checksum,
            targets: installed_targets(specs, podfile),
        })
    }
}

fn installed_targets(specs: &[&Specification], podfile: &Podfile) -> Vec<InstalledTarget> {
    let product_module_names: Vec<String> =
        specs.iter().map(|s| product_module_name(s.name())).collect();

    podfile
        .target_definition_list()
        .into_iter()
        .filter(|td| !td.is_abstract())
        .map(|td| {
            let mut pods: Vec<String> = Vec::new();
            for dependency in podfile.root().dependencies().iter().chain(td.dependencies()) {
                if !pods.iter().any(|p| p == dependency.name()) {
                    pods.push(dependency.name().to_string());
                }
            }
            InstalledTarget {
                name: td.name().to_string(),
                platform: td.definition.platform().cloned(),
                pods,
                product_module_names: product_module_names.clone(),
            }
        })
        .collect()
}

/// The Swift/Clang module name for a pod name.
pub fn product_module_name(pod: &str) -> String {
    let mut name: String = pod
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

fn copy_dir(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("failed to read {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("unexpected path {}", entry.path().display()))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Call `f` with a copy of `configuration` that has `changes` applied.
///
/// `configuration` itself is never modified, whether `f` succeeds or not.
pub fn with_overrides<R>(
    configuration: &Configuration,
    changes: ValueMap,
    f: impl FnOnce(&Configuration) -> R,
) -> R {
    let overridden = configuration.with_changes(changes);
    f(&overridden)
}

/// Generate and install a workspace for every group of podspecs.
///
/// The configuration is expected to be valid.
pub fn generate(
    configuration: &Configuration,
    installer: &dyn Installer,
) -> Result<Vec<InstallReport>> {
    if configuration.repo_update() {
        tracing::warn!("skipping spec repo update, repositories are not updated by podgen");
    }

    let generator = PodfileGenerator::new(configuration);
    let podfiles = generator.podfiles_by_specs()?;

    let mut reports = Vec::with_capacity(podfiles.len());
    for (specs, podfile) in podfiles {
        let gen_dir = configuration.gen_dir_for_specs(&specs);
        let context = configuration
            .pod_config()
            .context("configuration has no context")?
            .relocated(gen_dir);
        let changes = ValueMap::from([(OptionKey::PodConfig, Value::Context(Arc::new(context)))]);

        let report = with_overrides(configuration, changes, |cfg| {
            installer.install(cfg, &specs, &podfile)
        })
        .with_context(|| {
            format!(
                "failed to install workspace for {}",
                specs
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?;
        tracing::info!(
            "generated workspace for {} in {}",
            specs.iter().map(|s| s.name()).collect::<Vec<_>>().join(", "),
            report.gen_dir.display()
        );
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::GlobalContext;
    use std::cell::RefCell;
    use tempfile::TempDir;

    const SPEC_A: &str = r#"{
        "name": "A",
        "version": "1",
        "platforms": {"ios": "10.0"},
        "testspecs": [{"name": "Tests"}]
    }"#;

    fn config(dir: &Path, extra: ValueMap) -> Configuration {
        let ctx = GlobalContext::with_cwd(dir.to_path_buf())
            .unwrap()
            .with_home(dir.join(".cocoapods"));
        let mut values = ValueMap::from([(OptionKey::PodConfig, Value::Context(Arc::new(ctx)))]);
        values.extend(extra);
        Configuration::new(values)
    }

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(PathBuf, Vec<String>)>>,
    }

    impl Installer for Recorder {
        fn install(
            &self,
            configuration: &Configuration,
            specs: &[&Specification],
            _podfile: &Podfile,
        ) -> Result<InstallReport> {
            let root = configuration.pod_config().unwrap().cwd().to_path_buf();
            self.seen.borrow_mut().push((
                root.clone(),
                specs.iter().map(|s| s.name().to_string()).collect(),
            ));
            Ok(InstallReport {
                gen_dir: root.clone(),
                podfile_path: root.join(GENERATED_PODFILE_NAME),
                workspace_path: None,
                checksum: String::new(),
                targets: Vec::new(),
            })
        }
    }

    struct Failing;

    impl Installer for Failing {
        fn install(&self, _: &Configuration, _: &[&Specification], _: &Podfile) -> Result<InstallReport> {
            anyhow::bail!("installer exploded")
        }
    }

    #[test]
    fn test_workspace_writer() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("A.podspec.json"), SPEC_A).unwrap();
        let host = tmp.path().join("host");
        std::fs::create_dir_all(host.join("Sources")).unwrap();
        std::fs::write(host.join("Sources/main.swift"), "print(1)").unwrap();
        let cfg = config(
            tmp.path(),
            ValueMap::from([(OptionKey::AppHostSourceDir, Value::Path(host))]),
        );

        let reports = generate(&cfg, &WorkspaceWriter).unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];

        assert_eq!(report.gen_dir, tmp.path().join("gen/A"));
        let written = std::fs::read_to_string(&report.podfile_path).unwrap();
        let podfile = Podfile::from_yaml(&written, "Podfile.yaml").unwrap();
        assert_eq!(podfile.workspace(), Some("A.xcworkspace"));
        assert_eq!(
            report.workspace_path,
            Some(tmp.path().join("gen/A/A.xcworkspace"))
        );
        assert_eq!(report.checksum, sha256_file(&report.podfile_path).unwrap());
        assert!(report.gen_dir.join("App/Sources/main.swift").is_file());

        assert_eq!(report.targets.len(), 1);
        let target = &report.targets[0];
        assert_eq!(target.name, "App-iOS");
        assert_eq!(target.pods, ["A"]);
        assert_eq!(target.product_module_names, ["A"]);
    }

    #[test]
    fn test_clean_removes_previous_output() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("A.podspec.json"), SPEC_A).unwrap();
        let stale = tmp.path().join("gen/A/stale.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        generate(&config(tmp.path(), ValueMap::new()), &WorkspaceWriter).unwrap();
        assert!(stale.exists());

        let cleaning = config(tmp.path(), ValueMap::from([(OptionKey::Clean, Value::Bool(true))]));
        generate(&cleaning, &WorkspaceWriter).unwrap();
        assert!(!stale.exists());
        assert!(tmp.path().join("gen/A/Podfile.yaml").is_file());
    }

    #[test]
    fn test_installer_runs_in_generation_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("A.podspec.json"), SPEC_A).unwrap();
        std::fs::write(
            tmp.path().join("B.podspec.json"),
            r#"{"name": "B", "version": "1"}"#,
        )
        .unwrap();
        let cfg = config(tmp.path(), ValueMap::new());
        let recorder = Recorder::default();

        generate(&cfg, &recorder).unwrap();
        let seen = recorder.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (tmp.path().join("gen/A"), vec!["A".to_string()]));
        assert_eq!(seen[1], (tmp.path().join("gen/B"), vec!["B".to_string()]));
        assert_eq!(cfg.pod_config().unwrap().cwd(), tmp.path());
    }

    #[test]
    fn test_with_overrides_leaves_original_untouched() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("A.podspec.json"), SPEC_A).unwrap();
        let cfg = config(tmp.path(), ValueMap::new());
        let before = cfg.clone();

        let result: Result<()> = with_overrides(
            &cfg,
            ValueMap::from([(OptionKey::AutoOpen, Value::Bool(true))]),
            |overridden| {
                assert!(overridden.auto_open());
                anyhow::bail!("failed inside")
            },
        );
        assert!(result.is_err());
        assert_eq!(cfg, before);
        assert!(!cfg.auto_open());

        let err = generate(&cfg, &Failing).unwrap_err();
        assert!(format!("{:#}", err).contains("installer exploded"));
        assert_eq!(cfg, before);
    }

    #[test]
    fn test_product_module_name() {
        assert_eq!(product_module_name("A"), "A");
        assert_eq!(product_module_name("Foo-Bar"), "Foo_Bar");
        assert_eq!(product_module_name("1Password"), "_1Password");
    }
}
