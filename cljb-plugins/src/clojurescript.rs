//! Support for ClojureScript source sets, layered on top of [`ClojureBasePlugin`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use cljb_graph::{DirectorySetId, Error, Plugin, Project, Provider, SourceSetId, TaskId, TaskType};
use cljb_ore::assert_none;
use cljb_types::SourceKind;
use compact_str::CompactString;
use derivative::Derivative;

use crate::clojure::ClojureBasePlugin;
use crate::jvm::JvmBasePlugin;
use crate::resources::{BundledResources, ResourceLoader, VERSION_RESOURCE};

/// What [`ClojureScriptBasePlugin`] registered for a single source set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClojureScriptSourceSet {
    pub source_set: SourceSetId,
    /// The `clojurescript` directory set.
    pub clojurescript: DirectorySetId,
    pub compile: TaskId,
}

/// Adds a `clojurescript` directory set to every source set, and a task to compile it.
///
/// There is no check task for ClojureScript, only compilation.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ClojureScriptBasePlugin {
    /// Handed to the [`ClojureBasePlugin`] if this plugin is the one applying it.
    #[derivative(Debug = "ignore")]
    resources: Arc<dyn ResourceLoader>,
    version_resource: CompactString,
    source_sets: RwLock<BTreeMap<SourceSetId, ClojureScriptSourceSet>>,
}

impl ClojureScriptBasePlugin {
    pub const ID: &'static str = "clojurescript-base";

    pub fn new(resources: Arc<dyn ResourceLoader>) -> Self {
        ClojureScriptBasePlugin {
            resources,
            version_resource: CompactString::new(VERSION_RESOURCE),
            source_sets: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn bundled() -> Self {
        ClojureScriptBasePlugin::new(Arc::new(BundledResources))
    }

    /// See [`ClojureBasePlugin::with_version_resource`].
    pub fn with_version_resource(mut self, name: impl Into<CompactString>) -> Self {
        self.version_resource = name.into();
        self
    }

    /// What was registered for `source_set`, if it has been configured.
    pub fn source_set(&self, source_set: SourceSetId) -> Option<ClojureScriptSourceSet> {
        let source_sets = self.source_sets.read().expect("poisoned");
        source_sets.get(&source_set).copied()
    }
}

impl Plugin for ClojureScriptBasePlugin {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn apply(&self, project: &mut Project) -> Result<(), Error> {
        project.apply_plugin(JvmBasePlugin::new())?;
        let clojure = ClojureBasePlugin::new(Arc::clone(&self.resources))
            .with_version_resource(self.version_resource.clone());
        project.apply_plugin(clojure)?;
        Ok(())
    }

    fn configure_source_set(&self, project: &mut Project, id: SourceSetId) -> Result<(), Error> {
        let name = project.source_set(id).name().clone();

        // The Clojure wiring of this source set has to be in place, we hook into it.
        let base = project
            .plugins()
            .get::<ClojureBasePlugin>()
            .and_then(|clojure| clojure.source_set(id))
            .ok_or_else(|| {
                crate::unmet(
                    Self::ID,
                    ClojureBasePlugin::ID,
                    format!("source set '{name}' has no Clojure registration"),
                )
            })?;
        let jvm = project
            .plugins()
            .get::<JvmBasePlugin>()
            .and_then(|jvm| jvm.source_set(id))
            .ok_or_else(|| {
                crate::unmet(
                    Self::ID,
                    JvmBasePlugin::ID,
                    format!("source set '{name}' has not been configured"),
                )
            })?;

        let kind = SourceKind::CLOJURESCRIPT;
        let clojurescript = crate::register_kind(project, id, kind)?;

        let compile_classpath = jvm.compile_classpath;
        let output_dir = kind.output_dir(&name);

        let tasks = project.tasks_mut();
        let compile = tasks.create(
            name.compile_task_name(kind.display_name),
            TaskType::ClojureScriptCompile,
        )?;
        tasks
            .get_mut(compile)
            .set_description(format!("Compiles the {name} ClojureScript source."))
            .set_source(clojurescript)
            .add_classpath(Provider::new(move |project: &Project| {
                project.resolve_files(compile_classpath)
            }))
            .set_destination_dir(Provider::new(move |project: &Project| {
                Ok(project.layout().build_dir().join(&output_dir))
            }));
        tasks.depends_on(base.classes_aot, compile)?;

        tracing::debug!(source_set = %name, "configured clojurescript source set");
        let handle = ClojureScriptSourceSet {
            source_set: id,
            clojurescript,
            compile,
        };
        let mut source_sets = self.source_sets.write().expect("poisoned");
        let prev = source_sets.insert(id, handle);
        assert_none!(prev, "source set {name} configured twice");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn applies_prerequisites() {
        let mut project = Project::builder("demo", "/work/demo").build();
        project.apply_plugin(ClojureScriptBasePlugin::bundled()).unwrap();

        let ids: Vec<_> = project.plugins().ids().collect();
        assert_eq!(ids, [JvmBasePlugin::ID, ClojureBasePlugin::ID, ClojureScriptBasePlugin::ID]);
    }

    #[test]
    fn compile_wiring() {
        let mut project = Project::builder("demo", "/work/demo").build_dir("out").build();
        let cljs = project.apply_plugin(ClojureScriptBasePlugin::bundled()).unwrap();
        let main = project.add_source_set("main").unwrap();

        let handle = cljs.source_set(main).unwrap();
        let compile = project.tasks().get(handle.compile);
        assert_eq!(compile.name(), "compileClojureScript");
        assert_eq!(compile.task_type(), TaskType::ClojureScriptCompile);
        assert_eq!(compile.description(), Some("Compiles the main ClojureScript source."));
        assert_eq!(compile.source(), Some(handle.clojurescript));
        assert!(compile.dependencies().is_empty());
        assert!(project.tasks().find("checkClojureScript").is_none());

        assert_eq!(
            project.task_destination_dir(handle.compile).unwrap(),
            Some(PathBuf::from("/work/demo/out/classes/clojurescript/main"))
        );
        // Only the compile classpath, no class or resource outputs.
        let classpath = project.task_classpath(handle.compile).unwrap();
        assert_eq!(classpath.len(), 1);
        assert!(!classpath.contains(&project.classes_dir(main)));

        let dirs = project.directory_sets().get(handle.clojurescript);
        assert_eq!(dirs.src_dirs(), &[PathBuf::from("/work/demo/src/main/clojurescript")]);
        assert_eq!(dirs.includes(), &["**/*.cljs", "**/*.cljc"]);
        assert_eq!(
            project.source_set(main).all_source().len(),
            3,
            "java, clojure and clojurescript"
        );
    }

    #[test]
    fn requires_clojure_registration() {
        let mut project = Project::builder("demo", "/work/demo").build();
        project.apply_plugin(JvmBasePlugin::new()).unwrap();
        let main = project.add_source_set("main").unwrap();

        let cljs = ClojureScriptBasePlugin::bundled();
        let err = cljs.configure_source_set(&mut project, main).unwrap_err();
        assert!(matches!(
            err,
            Error::UnmetPrerequisite {
                plugin: ClojureScriptBasePlugin::ID,
                requires: ClojureBasePlugin::ID,
                ..
            }
        ));
        assert!(project.tasks().find("compileClojureScript").is_none());
    }
}
