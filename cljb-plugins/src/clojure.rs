//! Support for Clojure source sets.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, RwLock};

use cljb_graph::{
    ConfigurationId, DirectorySetId, Error, FileCollection, Plugin, Project, Provider,
    SourceSetId, TaskId, TaskType,
};
use cljb_ore::assert_none;
use cljb_types::{Coordinate, ModuleId, SourceKind, SourceSetName};
use compact_str::{CompactString, format_compact};
use derivative::Derivative;

use crate::jvm::JvmBasePlugin;
use crate::resources::{self, BundledResources, ResourceLoader, VERSION_RESOURCE};

/// Configuration holding the tooling the Clojure tasks run with.
pub const TOOLS_CONFIGURATION_NAME: &str = "clojureTools";
/// Configuration holding the nREPL server.
pub const NREPL_CONFIGURATION_NAME: &str = "nrepl";

const TOOLS_GROUP: &str = "io.github.gradle-clojure";
const TOOLS_NAME: &str = "gradle-clojure-tools";
const NREPL_VERSION: &str = "0.3.1";
const NREPL_REPLACEMENT_REASON: &str = "nREPL was moved out of Clojure Contrib to its own project.";

/// Name of the task that aggregates the classes and AOT compiled Clojure of `source_set`.
///
/// ```
/// # use cljb_types::SourceSetName;
/// use cljb_plugins::clojure::classes_aot_task_name;
///
/// assert_eq!(classes_aot_task_name(&SourceSetName::main()), "classesAot");
/// assert_eq!(classes_aot_task_name(&"test".parse().unwrap()), "testClassesAot");
/// ```
pub fn classes_aot_task_name(source_set: &SourceSetName) -> CompactString {
    format_compact!("{}Aot", source_set.classes_task_name())
}

/// What [`ClojureBasePlugin`] registered for a single source set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClojureSourceSet {
    pub source_set: SourceSetId,
    /// The `clojure` directory set.
    pub clojure: DirectorySetId,
    pub check: TaskId,
    pub compile: TaskId,
    pub classes_aot: TaskId,
}

#[derive(Debug)]
struct Applied {
    version: semver::Version,
    tools: ConfigurationId,
    nrepl: ConfigurationId,
}

/// Adds a `clojure` directory set to every source set, along with tasks to check and compile
/// it.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ClojureBasePlugin {
    #[derivative(Debug = "ignore")]
    resources: Arc<dyn ResourceLoader>,
    version_resource: CompactString,

    applied: OnceLock<Applied>,
    source_sets: RwLock<BTreeMap<SourceSetId, ClojureSourceSet>>,
}

impl ClojureBasePlugin {
    pub const ID: &'static str = "clojure-base";

    /// Create a plugin that reads its version from `resources`.
    pub fn new(resources: Arc<dyn ResourceLoader>) -> Self {
        ClojureBasePlugin {
            resources,
            version_resource: CompactString::new(VERSION_RESOURCE),
            applied: OnceLock::new(),
            source_sets: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a plugin that reads its version from the resources bundled with this crate.
    pub fn bundled() -> Self {
        ClojureBasePlugin::new(Arc::new(BundledResources))
    }

    /// Read the version from the resource `name` instead of the default.
    pub fn with_version_resource(mut self, name: impl Into<CompactString>) -> Self {
        self.version_resource = name.into();
        self
    }

    /// Version of the plugin, `None` until the plugin is applied.
    pub fn version(&self) -> Option<&semver::Version> {
        self.applied.get().map(|applied| &applied.version)
    }

    /// The `clojureTools` configuration, `None` until the plugin is applied.
    pub fn tools_configuration(&self) -> Option<ConfigurationId> {
        self.applied.get().map(|applied| applied.tools)
    }

    /// The `nrepl` configuration, `None` until the plugin is applied.
    pub fn nrepl_configuration(&self) -> Option<ConfigurationId> {
        self.applied.get().map(|applied| applied.nrepl)
    }

    /// What was registered for `source_set`, if it has been configured.
    pub fn source_set(&self, source_set: SourceSetId) -> Option<ClojureSourceSet> {
        let source_sets = self.source_sets.read().expect("poisoned");
        source_sets.get(&source_set).copied()
    }
}

impl Plugin for ClojureBasePlugin {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn apply(&self, project: &mut Project) -> Result<(), Error> {
        if self.applied.get().is_some() {
            return Err(Error::AlreadyApplied(Self::ID));
        }
        project.apply_plugin(JvmBasePlugin::new())?;

        let version = resources::read_version(self.resources.as_ref(), &self.version_resource)?;

        let configurations = project.configurations_mut();
        let tools = configurations.create(TOOLS_CONFIGURATION_NAME)?;
        configurations
            .get_mut(tools)
            .default_dependency(Coordinate::new(TOOLS_GROUP, TOOLS_NAME, version.to_string()));
        let nrepl = configurations.create(NREPL_CONFIGURATION_NAME)?;
        configurations
            .get_mut(nrepl)
            .default_dependency(Coordinate::new("nrepl", "nrepl", NREPL_VERSION));

        project.modules_mut().replace(
            ModuleId::new("org.clojure", "tools.nrepl"),
            ModuleId::new("nrepl", "nrepl"),
            Some(NREPL_REPLACEMENT_REASON),
        );

        tracing::debug!(%version, "clojure tooling configured");
        let applied = Applied {
            version,
            tools,
            nrepl,
        };
        self.applied
            .set(applied)
            .map_err(|_| Error::AlreadyApplied(Self::ID))?;
        Ok(())
    }

    fn configure_source_set(&self, project: &mut Project, id: SourceSetId) -> Result<(), Error> {
        let name = project.source_set(id).name().clone();
        let tools = self.tools_configuration().ok_or_else(|| {
            crate::unmet(Self::ID, Self::ID, "the plugin has not been applied".to_string())
        })?;
        let jvm_plugin = project.plugins().get::<JvmBasePlugin>();
        let (lifecycle, jvm) = jvm_plugin
            .as_ref()
            .and_then(|jvm| Some((jvm.lifecycle()?, jvm.source_set(id)?)))
            .ok_or_else(|| {
                crate::unmet(
                    Self::ID,
                    JvmBasePlugin::ID,
                    format!("source set '{name}' has not been configured"),
                )
            })?;

        let kind = SourceKind::CLOJURE;
        let clojure = crate::register_kind(project, id, kind)?;

        let configurations = project.configurations_mut();
        configurations.extend_from(jvm.compile_classpath, tools)?;
        configurations.extend_from(jvm.runtime_classpath, tools)?;

        // Clojure is loaded from source at runtime.
        project
            .source_set_mut(id)
            .output_mut()
            .dir(Provider::new(move |project: &Project| {
                let dirs = project.directory_sets().get(clojure).src_dirs();
                Ok(dirs.iter().cloned().collect::<FileCollection>())
            }));

        let compile_classpath = jvm.compile_classpath;
        let classpath = Provider::new(move |project: &Project| {
            let mut classpath = project.resolve_files(compile_classpath)?;
            classpath.push(project.classes_dir(id));
            classpath.push(project.resources_dir(id));
            Ok(classpath)
        });

        let tasks = project.tasks_mut();

        let check = tasks.create(
            name.task_name(Some("check"), kind.display_name),
            TaskType::ClojureCheck,
        )?;
        tasks
            .get_mut(check)
            .set_description(format!("Checks the {name} Clojure source."))
            .set_source(clojure)
            .add_classpath(classpath.clone());
        tasks.depends_on(check, jvm.classes)?;
        tasks.depends_on(lifecycle.check, check)?;

        let output_dir = kind.output_dir(&name);
        let compile = tasks.create(
            name.compile_task_name(kind.display_name),
            TaskType::ClojureCompile,
        )?;
        tasks
            .get_mut(compile)
            .set_description(format!("Compiles the {name} Clojure source."))
            .set_source(clojure)
            .add_classpath(classpath)
            .set_destination_dir(Provider::new(move |project: &Project| {
                Ok(project.layout().build_dir().join(&output_dir))
            }));
        tasks.depends_on(compile, jvm.classes)?;

        let classes_aot = tasks.create(classes_aot_task_name(&name), TaskType::Lifecycle)?;
        tasks.depends_on(classes_aot, compile)?;
        tasks.depends_on(classes_aot, jvm.classes)?;

        tracing::debug!(source_set = %name, "configured clojure source set");
        let handle = ClojureSourceSet {
            source_set: id,
            clojure,
            check,
            compile,
            classes_aot,
        };
        let mut source_sets = self.source_sets.write().expect("poisoned");
        let prev = source_sets.insert(id, handle);
        assert_none!(prev, "source set {name} configured twice");

        Ok(())
    }
}
