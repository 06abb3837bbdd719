//! Generating Podfiles for podspecs.
//!
//! Each generated Podfile declares the pod under development by path,
//! inherited by one concrete `App-<platform>` target per supported platform.
//! Everything it transitively depends on (per the lockfile) is pinned in a
//! shared abstract target so that versions, sources and external sources
//! match the parent project. Compilation flags, linkage, Swift version and
//! installation options are projected from the parent Podfile when one is
//! used.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rayon::prelude::*;

use crate::config::Configuration;
use crate::core::dependency::root_name;
use crate::core::podfile::ResolvedTargetDefinition;
use crate::core::{
    Dependency, Platform, PlatformTarget, Podfile, Specification, TargetDefinition,
    UsesFrameworks,
};
use crate::ops::local_sources::find_local_dependencies;
use crate::resolver::DependencyGraph;
use crate::util::diagnostic::GenerateError;
use crate::util::fs::{expand_path, relative_path};
use crate::util::version;

/// Name of the abstract target holding the pinned transitive dependencies.
pub const TRANSITIVE_TARGET_NAME: &str = "Transitive Dependencies";

/// File name of the generated Podfile inside the generation directory.
pub const GENERATED_PODFILE_NAME: &str = "Podfile.yaml";

/// Plugins every generated Podfile activates.
const GENERATE_PLUGIN: &str = "cocoapods-generate";
const DISABLE_VALIDATIONS_PLUGIN: &str = "cocoapods-disable-podfile-validations";

/// Per-pod compilation flags, set only where they differ from the global
/// setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilationFlags {
    pub inhibit_warnings: Option<bool>,
    pub modular_headers: Option<bool>,
}

/// The arguments of one `pod` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodArgs {
    pub dependency: Dependency,
    pub flags: CompilationFlags,
}

impl PodArgs {
    fn store_in(self, target: &mut TargetDefinition) {
        target.store_pod(
            self.dependency,
            self.flags.inhibit_warnings,
            self.flags.modular_headers,
        );
    }
}

/// Generates Podfiles for the podspecs of a configuration.
///
/// Derived data (the lockfile dependency graph, the parent Podfile's
/// target definitions) is computed once and shared by every Podfile the
/// generator produces.
pub struct PodfileGenerator<'a> {
    configuration: &'a Configuration,
    transitive_dependencies_by_pod: OnceLock<BTreeMap<String, Vec<Dependency>>>,
    podfile_dependencies: OnceLock<BTreeMap<String, Vec<Dependency>>>,
    lockfile_versions: OnceLock<BTreeMap<String, String>>,
    target_definition_list: OnceLock<Vec<ResolvedTargetDefinition<'a>>>,
}

impl<'a> PodfileGenerator<'a> {
    pub fn new(configuration: &'a Configuration) -> Self {
        PodfileGenerator {
            configuration,
            transitive_dependencies_by_pod: OnceLock::new(),
            podfile_dependencies: OnceLock::new(),
            lockfile_versions: OnceLock::new(),
            target_definition_list: OnceLock::new(),
        }
    }

    pub fn configuration(&self) -> &'a Configuration {
        self.configuration
    }

    /// One Podfile per podspec, or a single Podfile for all of them when
    /// `single_workspace` is set.
    pub fn podfiles_by_specs(
        &self,
    ) -> Result<Vec<(Vec<&'a Specification>, Podfile)>, GenerateError> {
        let specs = self.configuration.podspecs();
        if self.configuration.single_workspace() {
            let podfile = self.podfile_for_specs(&specs)?;
            return Ok(vec![(specs, podfile)]);
        }

        specs
            .par_iter()
            .map(|&spec| {
                self.podfile_for_specs(&[spec])
                    .map(|podfile| (vec![spec], podfile))
            })
            .collect()
    }

    /// Generate the Podfile that installs `specs` into one workspace.
    pub fn podfile_for_specs(&self, specs: &[&Specification]) -> Result<Podfile, GenerateError> {
        if self.configuration.use_modular_headers() && self.configuration.use_podfile() {
            return Err(GenerateError::ConflictingModularHeaders);
        }
        let platforms = self.platforms_for_specs(specs)?;

        let gen_dir = self.configuration.gen_dir_for_specs(specs);
        let project_name = self.configuration.project_name_for_specs(specs);

        let mut podfile = Podfile::new();
        podfile.set_project(format!("{}.xcodeproj", project_name));
        podfile.set_workspace(format!("{}.xcworkspace", project_name));
        for (name, options) in self.podfile_plugins() {
            podfile.add_plugin(name, options);
        }
        podfile.set_installation_method("cocoapods", self.installation_options());
        podfile
            .root_mut()
            .set_uses_frameworks(self.use_frameworks_value()?);
        if let Some(versions) = self.supported_swift_versions() {
            podfile.set_supports_swift_versions(versions);
        }
        for source in self.configuration.sources() {
            podfile.add_source(source);
        }
        podfile.set_defined_in_file(gen_dir.join(GENERATED_PODFILE_NAME));

        let local_dependencies = self.local_dependencies(specs, &gen_dir)?;

        let mut transitive = TargetDefinition::new_abstract(TRANSITIVE_TARGET_NAME);
        for dependency in self.transitive_dependencies_for_specs(specs) {
            let shadowed = local_dependencies
                .iter()
                .any(|local| local.dependency.root_name() == dependency.root_name());
            if shadowed {
                continue;
            }
            self.pod_args_for_dependency(&gen_dir, &dependency)
                .store_in(&mut transitive);
        }
        // Per-pod flags recorded in the abstract target belong to the root so
        // every concrete target inherits them.
        let inhibit_warnings = transitive.inhibit_warnings().clone();
        let use_modular_headers = transitive.use_modular_headers().clone();
        transitive.set_flag_hashes(Default::default(), Default::default());

        let swift_version = self.swift_version();
        let root = podfile.root_mut();
        root.add_child(transitive);
        for platform in platforms {
            let mut target = TargetDefinition::new(format!("App-{}", platform.name.string_name()));
            target.set_platform(platform);
            if let Some(version) = &swift_version {
                target.set_swift_version(version.clone());
            }
            root.add_child(target);
        }
        root.set_flag_hashes(inhibit_warnings, use_modular_headers);
        if self.inhibit_all_warnings() {
            root.set_inhibit_all_warnings(true);
        }
        if self.use_modular_headers() {
            root.set_use_modular_headers_for_all(true);
        }

        for spec in specs {
            self.local_pod_args(spec, &gen_dir).store_in(root);
        }
        for local in local_dependencies {
            local.store_in(root);
        }

        tracing::debug!(
            "generated Podfile for {} with {} dependencies",
            spec_names(specs),
            podfile.dependencies().len()
        );
        Ok(podfile)
    }

    /// The platforms the workspace targets, sorted by display name.
    fn platforms_for_specs(
        &self,
        specs: &[&Specification],
    ) -> Result<Vec<PlatformTarget>, GenerateError> {
        let allowed = self.configuration.platforms();
        let mut targets: BTreeMap<Platform, Option<String>> = BTreeMap::new();
        for spec in specs {
            for available in spec.available_platforms() {
                let permitted = allowed
                    .as_ref()
                    .map_or(true, |allowed| allowed.iter().any(|p| p == available.name.filter_name()));
                if !permitted {
                    continue;
                }
                let target = targets.entry(available.name).or_default();
                *target = match (target.take(), available.deployment_target) {
                    (Some(a), Some(b)) => version::max([a.as_str(), b.as_str()]).map(str::to_string),
                    (a, b) => a.or(b),
                };
            }
        }

        if targets.is_empty() {
            return Err(GenerateError::NoPlatforms {
                pods: spec_names(specs),
                requested: allowed.unwrap_or_default().join(", "),
            });
        }
        Ok(targets
            .into_iter()
            .map(|(name, deployment_target)| PlatformTarget::new(name, deployment_target))
            .collect())
    }

    /// The pinned closure of everything `specs` and their test and app specs
    /// depend on, sorted by name, excluding the pods being generated.
    pub fn transitive_dependencies_for_specs(&self, specs: &[&Specification]) -> Vec<Dependency> {
        let mut pods: Vec<&str> = Vec::new();
        for spec in specs {
            pods.push(spec.name());
            for subspec in spec.test_specs().into_iter().chain(spec.app_specs()) {
                pods.push(subspec.name());
                pods.extend(subspec.dependencies().iter().map(Dependency::name));
            }
        }

        let by_pod = self.transitive_dependencies_by_pod();
        let mut dependencies: Vec<Dependency> = Vec::new();
        for pod in pods {
            for dependency in by_pod.get(pod).into_iter().flatten() {
                if !dependencies.contains(dependency) {
                    dependencies.push(dependency.clone());
                }
            }
        }
        dependencies.sort_by(|a, b| a.name().cmp(b.name()));
        dependencies.retain(|d| !specs.iter().any(|s| s.root_name() == d.root_name()));
        dependencies
    }

    /// The `pod` declaration for the pod under development.
    fn local_pod_args(&self, spec: &Specification, gen_dir: &Path) -> PodArgs {
        let short_names = |subspecs: Vec<&Specification>| -> Vec<String> {
            let mut names: Vec<String> = subspecs
                .iter()
                .map(|s| s.relative_name().to_string())
                .collect();
            names.sort();
            names
        };

        let mut dependency = Dependency::new(spec.name())
            .with_testspecs(short_names(spec.test_specs()))
            .with_appspecs(short_names(spec.app_specs()));
        if let Some(file) = spec.defined_in_file() {
            let path = relative_path(gen_dir, file);
            dependency = dependency.with_external_source(BTreeMap::from([(
                "path".to_string(),
                path.display().to_string(),
            )]));
        }
        PodArgs {
            dependency,
            flags: self.dependency_compilation_kwargs(spec.name()),
        }
    }

    /// Pods from `local_sources`, declared by path.
    fn local_dependencies(
        &self,
        specs: &[&Specification],
        gen_dir: &Path,
    ) -> Result<Vec<PodArgs>, GenerateError> {
        let search_paths = self.configuration.local_sources();
        if search_paths.is_empty() {
            return Ok(Vec::new());
        }
        let Some(cwd) = self.configuration.pod_config().map(|ctx| ctx.cwd()) else {
            return Ok(Vec::new());
        };

        let found = find_local_dependencies(specs, &search_paths, cwd)?;
        Ok(found
            .into_iter()
            .filter(|local| !specs.iter().any(|s| s.root_name() == root_name(&local.name)))
            .map(|local| {
                let path = relative_path(gen_dir, &local.podspec);
                PodArgs {
                    flags: self.dependency_compilation_kwargs(&local.name),
                    dependency: Dependency::new(local.name).with_external_source(BTreeMap::from(
                        [("path".to_string(), path.display().to_string())],
                    )),
                }
            })
            .collect())
    }

    /// The arguments for declaring a transitive dependency.
    ///
    /// Declarations of the same pod in the parent Podfile are merged in.
    /// Without an external source the requirements gain the locked version;
    /// `path` and `podspec` sources are rewritten relative to `gen_dir`.
    pub fn pod_args_for_dependency(&self, gen_dir: &Path, dependency: &Dependency) -> PodArgs {
        let merged = self
            .podfile_dependencies()
            .get(dependency.root_name())
            .into_iter()
            .flatten()
            .map(|declared| declared.renamed(dependency.name()))
            .chain(std::iter::once(dependency.clone()))
            .reduce(|acc, next| acc.merge(&next))
            .unwrap_or_else(|| dependency.clone());

        let mut args = Dependency::new(merged.name());
        if let Some(repo) = merged.podspec_repo() {
            args = args.with_podspec_repo(repo);
        }
        match merged.external_source() {
            Some(source) => {
                let base = self.parent_dir();
                let source = source
                    .iter()
                    .map(|(key, value)| {
                        let value = if key == "path" || key == "podspec" {
                            let absolute = expand_path(&base, Path::new(value));
                            relative_path(gen_dir, &absolute).display().to_string()
                        } else {
                            value.clone()
                        };
                        (key.clone(), value)
                    })
                    .collect();
                args = args.with_external_source(source);
            }
            None => {
                let mut requirements = merged.requirement_list();
                if let Some(version) = self.lockfile_versions().get(merged.name()) {
                    requirements.push(version.clone());
                }
                args = args.with_requirements(requirements);
            }
        }

        PodArgs {
            dependency: args,
            flags: self.dependency_compilation_kwargs(merged.name()),
        }
    }

    /// Directory that relative paths in the parent Podfile and lockfile
    /// are written against.
    fn parent_dir(&self) -> PathBuf {
        let parent_file = self
            .configuration
            .podfile()
            .and_then(Podfile::defined_in_file)
            .or_else(|| self.configuration.lockfile().and_then(|l| l.defined_in_file()));
        match parent_file.and_then(Path::parent) {
            Some(dir) => dir.to_path_buf(),
            None => self
                .configuration
                .pod_config()
                .map(|ctx| ctx.installation_root())
                .unwrap_or_default(),
        }
    }

    /// Compilation flags for `pod` that differ from the global settings.
    pub fn dependency_compilation_kwargs(&self, pod: &str) -> CompilationFlags {
        let inhibit = self.inhibit_warnings(pod);
        let modular = self.modular_headers(pod);
        CompilationFlags {
            inhibit_warnings: (inhibit != self.inhibit_all_warnings()).then_some(inhibit),
            modular_headers: (modular != self.use_modular_headers()).then_some(modular),
        }
    }

    /// Whether every relevant parent target inhibits all warnings.
    pub fn inhibit_all_warnings(&self) -> bool {
        self.configuration.use_podfile()
            && self
                .target_definition_list()
                .iter()
                .all(|td| td.inhibit_warnings.is_all())
    }

    /// Whether every pod is built with modular headers.
    pub fn use_modular_headers(&self) -> bool {
        if self.configuration.use_modular_headers() {
            return true;
        }
        self.configuration.use_podfile()
            && self
                .target_definition_list()
                .iter()
                .all(|td| td.use_modular_headers.is_all())
    }

    fn inhibit_warnings(&self, pod: &str) -> bool {
        self.configuration.use_podfile()
            && self
                .target_definitions_for_pod(pod)
                .iter()
                .all(|td| td.inhibits_warnings_for_pod(pod))
    }

    fn modular_headers(&self, pod: &str) -> bool {
        if self.configuration.use_modular_headers() {
            return true;
        }
        self.configuration.use_podfile()
            && self
                .target_definitions_for_pod(pod)
                .iter()
                .all(|td| td.build_pod_as_module(pod))
    }

    /// The linkage for the generated targets.
    ///
    /// With a parent Podfile its setting is used as is; it must be the same
    /// across every relevant target.
    pub fn use_frameworks_value(&self) -> Result<UsesFrameworks, GenerateError> {
        if !self.configuration.use_podfile() {
            return Ok(UsesFrameworks::Flag(self.configuration.use_frameworks()));
        }
        let mut values: Vec<UsesFrameworks> = Vec::new();
        for td in self.target_definition_list() {
            let value = td
                .uses_frameworks
                .clone()
                .unwrap_or(UsesFrameworks::Flag(false));
            if !values.contains(&value) {
                values.push(value);
            }
        }
        match values.len() {
            0 => Ok(UsesFrameworks::Flag(false)),
            1 => Ok(values.remove(0)),
            _ => Err(GenerateError::AmbiguousLinkage),
        }
    }

    /// The highest Swift version set by a relevant parent target.
    pub fn swift_version(&self) -> Option<String> {
        version::max(
            self.target_definition_list()
                .iter()
                .filter_map(|td| td.swift_version()),
        )
        .map(str::to_string)
    }

    /// The parent Podfile's `supports_swift_versions` requirements.
    fn supported_swift_versions(&self) -> Option<Vec<String>> {
        if !self.configuration.use_podfile() {
            return None;
        }
        let podfile = self.configuration.podfile()?;
        let versions = podfile.supports_swift_versions();
        (!versions.is_empty()).then(|| versions.to_vec())
    }

    /// Options for `install! 'cocoapods'`.
    pub fn installation_options(&self) -> BTreeMap<String, serde_yaml::Value> {
        let cfg = self.configuration;
        BTreeMap::from([
            (
                "deterministic_uuids".to_string(),
                cfg.deterministic_uuids().into(),
            ),
            (
                "disable_input_output_paths".to_string(),
                cfg.disable_input_output_paths().into(),
            ),
            (
                "generate_multiple_pod_projects".to_string(),
                cfg.generate_multiple_pod_projects().into(),
            ),
            (
                "incremental_installation".to_string(),
                cfg.incremental_installation().into(),
            ),
            (
                "share_schemes_for_development_pods".to_string(),
                cfg.share_schemes_for_development_pods().to_yaml(),
            ),
            (
                "warn_for_multiple_pod_sources".to_string(),
                cfg.warn_for_multiple_pod_sources().into(),
            ),
        ])
    }

    /// Plugins for the generated Podfile.
    ///
    /// The parent's plugins are kept when `use_podfile_plugins` is set; the
    /// built-in plugins are merged over them.
    pub fn podfile_plugins(&self) -> BTreeMap<String, serde_yaml::Value> {
        let mut plugins: BTreeMap<String, serde_yaml::Value> = BTreeMap::new();
        if self.configuration.use_podfile_plugins() {
            for (name, options) in self.configuration.podfile_plugins() {
                let options = match options.to_yaml() {
                    serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
                    other => other,
                };
                plugins.insert(name, options);
            }
        }

        plugins
            .entry(GENERATE_PLUGIN.to_string())
            .or_insert_with(|| serde_yaml::Value::Mapping(Default::default()));

        let validations = plugins
            .entry(DISABLE_VALIDATIONS_PLUGIN.to_string())
            .or_insert_with(|| serde_yaml::Value::Mapping(Default::default()));
        if let serde_yaml::Value::Mapping(options) = validations {
            options.insert("no_abstract_only_pods".into(), true.into());
        } else {
            *validations = serde_yaml::Value::Mapping(
                [("no_abstract_only_pods".into(), true.into())].into_iter().collect(),
            );
        }
        plugins
    }

    /// Transitive dependencies recorded in the lockfile, by pod.
    pub fn transitive_dependencies_by_pod(&self) -> &BTreeMap<String, Vec<Dependency>> {
        self.transitive_dependencies_by_pod.get_or_init(|| {
            match self.configuration.lockfile() {
                Some(lockfile) if self.configuration.use_lockfile() => {
                    DependencyGraph::from_lockfile(lockfile).transitive_dependencies_by_pod()
                }
                _ => BTreeMap::new(),
            }
        })
    }

    /// The parent Podfile's declarations grouped by root name.
    fn podfile_dependencies(&self) -> &BTreeMap<String, Vec<Dependency>> {
        self.podfile_dependencies.get_or_init(|| {
            let mut grouped: BTreeMap<String, Vec<Dependency>> = BTreeMap::new();
            if let Some(podfile) = self.used_podfile() {
                for dependency in podfile.dependencies() {
                    grouped
                        .entry(dependency.root_name().to_string())
                        .or_default()
                        .push(dependency);
                }
            }
            grouped
        })
    }

    /// `= <version>` pins for every locked pod.
    fn lockfile_versions(&self) -> &BTreeMap<String, String> {
        self.lockfile_versions.get_or_init(|| {
            let Some(lockfile) = self.configuration.lockfile() else {
                return BTreeMap::new();
            };
            if !self.configuration.use_lockfile_versions() {
                return BTreeMap::new();
            }
            lockfile
                .pod_names()
                .into_iter()
                .filter_map(|name| {
                    let version = lockfile.version(name)?;
                    Some((name.to_string(), format!("= {}", version)))
                })
                .collect()
        })
    }

    fn used_podfile(&self) -> Option<&'a Podfile> {
        if self.configuration.use_podfile() {
            self.configuration.podfile()
        } else {
            None
        }
    }

    /// The parent Podfile's concrete target definitions, or all of them
    /// when every one is abstract.
    fn target_definition_list(&self) -> &[ResolvedTargetDefinition<'a>] {
        self.target_definition_list.get_or_init(|| {
            let Some(podfile) = self.used_podfile() else {
                return Vec::new();
            };
            let mut list = podfile.target_definition_list();
            if !list.iter().all(|td| td.is_abstract()) {
                list.retain(|td| !td.is_abstract());
            }
            list
        })
    }

    /// The target definitions declaring `pod`, or all of them when none do.
    fn target_definitions_for_pod(&self, pod: &str) -> Vec<&ResolvedTargetDefinition<'a>> {
        let list = self.target_definition_list();
        let declaring: Vec<_> = list.iter().filter(|td| td.declares(pod)).collect();
        if declaring.is_empty() {
            list.iter().collect()
        } else {
            declaring
        }
    }
}

/// `A`, `A and B`, `A, B, and C`.
fn spec_names(specs: &[&Specification]) -> String {
    let names: Vec<&str> = specs.iter().map(|s| s.name()).collect();
    match names.as_slice() {
        [] => String::new(),
        [one] => one.to_string(),
        [a, b] => format!("{} and {}", a, b),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OptionKey, Value, ValueMap};
    use crate::util::GlobalContext;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                tmp: TempDir::new().unwrap(),
            }
        }

        fn path(&self) -> &Path {
            self.tmp.path()
        }

        fn write(&self, name: &str, contents: &str) -> PathBuf {
            let path = self.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, contents).unwrap();
            path
        }

        fn config(&self, extra: ValueMap) -> Configuration {
            let ctx = GlobalContext::with_cwd(self.path().to_path_buf())
                .unwrap()
                .with_home(self.path().join(".cocoapods"));
            let mut values = ValueMap::from([(OptionKey::PodConfig, Value::Context(Arc::new(ctx)))]);
            values.extend(extra);
            Configuration::new(values)
        }
    }

    const SPEC_A: &str = r#"{
        "name": "A",
        "version": "1",
        "platforms": {"ios": "10.0", "osx": "10.12"},
        "dependencies": {"B": []},
        "testspecs": [{"name": "Tests", "dependencies": {"C": []}}]
    }"#;

    fn dependency_names(target: &TargetDefinition) -> Vec<&str> {
        target.dependencies().iter().map(|d| d.name()).collect()
    }

    #[test]
    fn test_end_to_end_without_podfile_or_lockfile() {
        let fx = Fixture::new();
        let spec_path = fx.write("A.podspec.json", SPEC_A);
        let config = fx.config(ValueMap::new());
        assert!(config.validate().is_empty(), "{:?}", config.validate());

        let generator = PodfileGenerator::new(&config);
        let podfiles = generator.podfiles_by_specs().unwrap();
        assert_eq!(podfiles.len(), 1);
        let (specs, podfile) = &podfiles[0];
        assert_eq!(specs[0].name(), "A");

        assert_eq!(podfile.project(), Some("A.xcodeproj"));
        assert_eq!(podfile.workspace(), Some("A.xcworkspace"));
        assert_eq!(
            podfile.defined_in_file(),
            Some(fx.path().join("gen/A/Podfile.yaml").as_path())
        );
        assert!(podfile.plugins().contains_key("cocoapods-generate"));
        assert_eq!(
            podfile.plugins()["cocoapods-disable-podfile-validations"]["no_abstract_only_pods"],
            serde_yaml::Value::Bool(true)
        );
        assert_eq!(podfile.sources(), ["https://cdn.cocoapods.org/"]);
        assert_eq!(
            podfile.root().uses_frameworks(),
            Some(&UsesFrameworks::Flag(true))
        );

        let root = podfile.root();
        let local = &root.dependencies()[0];
        assert_eq!(local.name(), "A");
        assert_eq!(local.testspecs(), ["Tests"]);
        assert_eq!(
            local.external_source().unwrap()["path"],
            relative_path(&fx.path().join("gen/A"), &spec_path).display().to_string()
        );
        assert_eq!(local.external_source().unwrap()["path"], "../../A.podspec.json");

        let children: Vec<&str> = root.children().iter().map(|c| c.name()).collect();
        assert_eq!(children, [TRANSITIVE_TARGET_NAME, "App-iOS", "App-macOS"]);
        assert!(root.children()[0].is_abstract());
        assert!(root.children()[0].dependencies().is_empty());
        assert_eq!(
            root.children()[1].platform(),
            Some(&PlatformTarget::new(Platform::Ios, Some("10.0".to_string())))
        );
    }

    #[test]
    fn test_generation_is_idempotent() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", SPEC_A);
        fx.write("Podfile.yaml", "{}");
        fx.write(
            "Podfile.lock",
            "PODS:\n  - A (1):\n    - B\n  - B (1.0):\n    - C (~> 2.0)\n  - C (2.1)\nDEPENDENCIES:\n  - A\n",
        );
        let config = fx.config(ValueMap::new());
        let generator = PodfileGenerator::new(&config);
        let spec = config.podspecs()[0];

        let first = generator.podfile_for_specs(&[spec]).unwrap();
        let second = generator.podfile_for_specs(&[spec]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_yaml().unwrap(), second.to_yaml().unwrap());

        let again = PodfileGenerator::new(&config).podfile_for_specs(&[spec]).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_transitive_closure() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", r#"{"name": "A", "version": "1", "dependencies": {"B": []}}"#);
        fx.write("Podfile.yaml", "{}");
        fx.write(
            "Podfile.lock",
            "PODS:\n  - A (1):\n    - B\n  - B (1.0):\n    - C\n  - C (2.1)\n  - D (1.0):\n    - E\n  - E (1.0)\n\
             DEPENDENCIES:\n  - A\n  - D\n",
        );
        let config = fx.config(ValueMap::new());
        let generator = PodfileGenerator::new(&config);
        let spec = config.podspecs()[0];

        let closure: Vec<String> = generator
            .transitive_dependencies_for_specs(&[spec])
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(closure, ["B", "C"]);

        let podfile = generator.podfile_for_specs(&[spec]).unwrap();
        let transitive = podfile.find_target(TRANSITIVE_TARGET_NAME).unwrap();
        assert_eq!(dependency_names(transitive), ["B", "C"]);
        assert_eq!(transitive.dependencies()[0].requirements(), ["= 1.0"]);
        assert_eq!(transitive.dependencies()[1].requirements(), ["= 2.1"]);
    }

    #[test]
    fn test_lockfile_versions_can_be_disabled() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", r#"{"name": "A", "version": "1"}"#);
        fx.write("Podfile.yaml", "{}");
        fx.write("Podfile.lock", "PODS:\n  - A (1):\n    - B (~> 1.0)\n  - B (1.2)\nDEPENDENCIES:\n  - A\n");
        let config = fx.config(ValueMap::from([(
            OptionKey::UseLockfileVersions,
            Value::Bool(false),
        )]));
        let generator = PodfileGenerator::new(&config);
        let spec = config.podspecs()[0];

        let args = generator.pod_args_for_dependency(&fx.path().join("gen/A"), &Dependency::new("B"));
        assert_eq!(args.dependency.requirements(), [">= 0"]);
        assert_eq!(args.flags, CompilationFlags::default());
        assert_eq!(generator.transitive_dependencies_for_specs(&[spec]).len(), 1);
    }

    #[test]
    fn test_podfile_declarations_are_merged_and_paths_rewritten() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", r#"{"name": "A", "version": "1"}"#);
        fx.write(
            "Podfile.yaml",
            r#"
target_definitions:
  - name: Pods
    abstract: true
    children:
      - name: App
        dependencies:
          - B/Core:
              - path: vendor/B
          - C:
              - "~> 2.0"
              - source: https://example.com/private.git
              - inhibit_warnings: true
"#,
        );
        fx.write(
            "Podfile.lock",
            "PODS:\n  - A (1):\n    - B/Core\n    - C\n  - B/Core (1.0)\n  - C (2.1)\n\
             DEPENDENCIES:\n  - A\n  - B/Core (from `vendor/B`)\n  - C (~> 2.0)\n\
             EXTERNAL SOURCES:\n  B:\n    :path: vendor/B\n",
        );
        let config = fx.config(ValueMap::new());
        let generator = PodfileGenerator::new(&config);
        let gen_dir = fx.path().join("gen/A");

        let b = generator.pod_args_for_dependency(&gen_dir, &Dependency::new("B/Core"));
        assert_eq!(b.dependency.external_source().unwrap()["path"], "../../vendor/B");
        assert!(b.dependency.requirements().is_empty());

        let c = generator.pod_args_for_dependency(&gen_dir, &Dependency::new("C"));
        assert_eq!(c.dependency.requirements(), ["~> 2.0", "= 2.1"]);
        assert_eq!(c.dependency.podspec_repo(), Some("https://example.com/private.git"));
        assert_eq!(c.flags.inhibit_warnings, Some(true));
        assert_eq!(c.flags.modular_headers, None);

        let podfile = generator.podfile_for_specs(&[config.podspecs()[0]]).unwrap();
        assert!(podfile.root().inhibit_warnings().for_pods.contains(&"C".to_string()));
        let transitive = podfile.find_target(TRANSITIVE_TARGET_NAME).unwrap();
        assert!(transitive.inhibit_warnings().is_empty());
    }

    #[test]
    fn test_modular_headers_conflict() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", SPEC_A);
        fx.write("Podfile.yaml", "{}");
        let config = fx.config(ValueMap::from([(
            OptionKey::UseModularHeaders,
            Value::Bool(true),
        )]));
        assert!(config.use_podfile());

        let err = PodfileGenerator::new(&config).podfiles_by_specs().unwrap_err();
        assert!(matches!(err, GenerateError::ConflictingModularHeaders));
        assert_eq!(
            err.to_string(),
            "Conflicting `use_modular_headers` option. Cannot specify both \
             `--use-modular-headers` and `--use-podfile`."
        );

        let without_podfile = config.with_changes(ValueMap::from([(
            OptionKey::UsePodfile,
            Value::Bool(false),
        )]));
        let generator = PodfileGenerator::new(&without_podfile);
        let podfile = generator.podfile_for_specs(&[without_podfile.podspecs()[0]]).unwrap();
        assert!(podfile.root().use_modular_headers().is_all());
        assert_eq!(generator.dependency_compilation_kwargs("A"), CompilationFlags::default());
    }

    #[test]
    fn test_platform_filter() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", SPEC_A);
        let config = fx.config(ValueMap::from([(
            OptionKey::Platforms,
            Value::strings(["macos", "tvos"]),
        )]));
        let podfile = PodfileGenerator::new(&config)
            .podfile_for_specs(&[config.podspecs()[0]])
            .unwrap();
        let names: Vec<&str> = podfile.root().children().iter().map(|c| c.name()).collect();
        assert_eq!(names, [TRANSITIVE_TARGET_NAME, "App-macOS"]);

        let watch_only = config.with_changes(ValueMap::from([(
            OptionKey::Platforms,
            Value::strings(["watchos"]),
        )]));
        let err = PodfileGenerator::new(&watch_only)
            .podfile_for_specs(&[watch_only.podspecs()[0]])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No available platforms in podspecs A match requested platforms: watchos"
        );
    }

    #[test]
    fn test_parent_podfile_projection() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", SPEC_A);
        fx.write(
            "Podfile.yaml",
            r#"
target_definitions:
  - name: Pods
    abstract: true
    uses_frameworks: true
    inhibit_warnings:
      all: true
    children:
      - name: App
        swift_version: "4.2"
      - name: Other
        swift_version: "5.1"
supports_swift_versions: [">= 4.2"]
plugins:
  cocoapods-keys:
    keys: [Secret]
"#,
        );
        let config = fx.config(ValueMap::new());
        let generator = PodfileGenerator::new(&config);
        let podfile = generator.podfile_for_specs(&[config.podspecs()[0]]).unwrap();

        assert!(generator.inhibit_all_warnings());
        assert!(podfile.root().inhibit_warnings().is_all());
        assert_eq!(generator.swift_version().as_deref(), Some("5.1"));
        assert_eq!(podfile.find_target("App-iOS").unwrap().swift_version(), Some("5.1"));
        assert_eq!(podfile.supports_swift_versions(), [">= 4.2"]);
        assert_eq!(podfile.root().uses_frameworks(), Some(&UsesFrameworks::Flag(true)));
        assert!(podfile.plugins().contains_key("cocoapods-keys"));
        assert_eq!(
            podfile.installation_options()["deterministic_uuids"],
            serde_yaml::Value::Bool(true)
        );
    }

    #[test]
    fn test_ambiguous_linkage() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", SPEC_A);
        fx.write(
            "Podfile.yaml",
            r#"
target_definitions:
  - name: Pods
    abstract: true
    children:
      - name: App
        uses_frameworks: true
      - name: Legacy
"#,
        );
        let config = fx.config(ValueMap::new());
        let err = PodfileGenerator::new(&config).podfiles_by_specs().unwrap_err();
        assert!(matches!(err, GenerateError::AmbiguousLinkage));
    }

    #[test]
    fn test_single_workspace() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", SPEC_A);
        fx.write(
            "B.podspec.json",
            r#"{"name": "B", "version": "1", "platforms": {"tvos": "12.0"}}"#,
        );
        let config = fx.config(ValueMap::from([(
            OptionKey::SingleWorkspace,
            Value::Bool(true),
        )]));
        let podfiles = PodfileGenerator::new(&config).podfiles_by_specs().unwrap();
        assert_eq!(podfiles.len(), 1);

        let (specs, podfile) = &podfiles[0];
        assert_eq!(specs.len(), 2);
        assert_eq!(podfile.workspace(), Some("A_Unified.xcworkspace"));
        assert_eq!(dependency_names(podfile.root()), ["A", "B"]);
        let names: Vec<&str> = podfile.root().children().iter().map(|c| c.name()).collect();
        assert_eq!(names, [TRANSITIVE_TARGET_NAME, "App-iOS", "App-macOS", "App-tvOS"]);

        let separate = config.with_changes(ValueMap::from([(
            OptionKey::SingleWorkspace,
            Value::Bool(false),
        )]));
        let podfiles = PodfileGenerator::new(&separate).podfiles_by_specs().unwrap();
        assert_eq!(podfiles.len(), 2);
        assert_eq!(podfiles[1].1.workspace(), Some("B.xcworkspace"));
    }

    #[test]
    fn test_local_sources_shadow_closure() {
        let fx = Fixture::new();
        fx.write("A.podspec.json", SPEC_A);
        fx.write("local/B.podspec.json", r#"{"name": "B", "version": "9"}"#);
        fx.write("Podfile.yaml", "{}");
        fx.write(
            "Podfile.lock",
            "PODS:\n  - A (1):\n    - B\n  - B (1.0)\nDEPENDENCIES:\n  - A\n",
        );
        let config = fx.config(ValueMap::from([(
            OptionKey::LocalSources,
            Value::strings(["local"]),
        )]));
        let podfile = PodfileGenerator::new(&config)
            .podfile_for_specs(&[config.podspecs()[0]])
            .unwrap();

        let transitive = podfile.find_target(TRANSITIVE_TARGET_NAME).unwrap();
        assert!(dependency_names(transitive).is_empty());
        let b = &podfile.root().dependencies()[1];
        assert_eq!(b.name(), "B");
        assert_eq!(b.external_source().unwrap()["path"], "../../local/B.podspec.json");
    }

    #[test]
    fn test_spec_names() {
        let a = Specification::new("A");
        let b = Specification::new("B");
        let c = Specification::new("C");
        assert_eq!(spec_names(&[&a]), "A");
        assert_eq!(spec_names(&[&a, &b]), "A and B");
        assert_eq!(spec_names(&[&a, &b, &c]), "A, B, and C");
    }
}
