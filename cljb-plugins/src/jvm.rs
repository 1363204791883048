//! The baseline every JVM language plugin builds on.

use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock};

use cljb_graph::{
    ConfigurationId, Error, Plugin, Project, Provider, SourceSetId, TaskId, TaskType,
};
use cljb_ore::assert_none;

pub const CHECK_TASK_NAME: &str = "check";
pub const ASSEMBLE_TASK_NAME: &str = "assemble";
pub const BUILD_TASK_NAME: &str = "build";

/// The project wide lifecycle tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub check: TaskId,
    pub assemble: TaskId,
    pub build: TaskId,
}

/// What [`JvmBasePlugin`] registered for a single source set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JvmSourceSet {
    pub compile_classpath: ConfigurationId,
    pub runtime_classpath: ConfigurationId,
    pub compile_java: TaskId,
    pub process_resources: TaskId,
    /// Aggregate of everything that produces the classes of the source set.
    pub classes: TaskId,
}

/// Provides classpath configurations, Java compilation, resource processing, and lifecycle
/// tasks.
#[derive(Debug, Default)]
pub struct JvmBasePlugin {
    lifecycle: OnceLock<Lifecycle>,
    source_sets: RwLock<BTreeMap<SourceSetId, JvmSourceSet>>,
}

impl JvmBasePlugin {
    pub const ID: &'static str = "jvm-base";

    pub fn new() -> Self {
        JvmBasePlugin::default()
    }

    /// The lifecycle tasks, `None` until the plugin is applied.
    pub fn lifecycle(&self) -> Option<Lifecycle> {
        self.lifecycle.get().copied()
    }

    /// What was registered for `source_set`, if it has been configured.
    pub fn source_set(&self, source_set: SourceSetId) -> Option<JvmSourceSet> {
        let source_sets = self.source_sets.read().expect("poisoned");
        source_sets.get(&source_set).copied()
    }
}

impl Plugin for JvmBasePlugin {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn apply(&self, project: &mut Project) -> Result<(), Error> {
        if self.lifecycle.get().is_some() {
            return Err(Error::AlreadyApplied(Self::ID));
        }
        let tasks = project.tasks_mut();

        let check = tasks.create(CHECK_TASK_NAME, TaskType::Lifecycle)?;
        tasks.get_mut(check).set_description("Runs all checks.");
        let assemble = tasks.create(ASSEMBLE_TASK_NAME, TaskType::Lifecycle)?;
        tasks
            .get_mut(assemble)
            .set_description("Assembles the outputs of this project.");
        let build = tasks.create(BUILD_TASK_NAME, TaskType::Lifecycle)?;
        tasks
            .get_mut(build)
            .set_description("Assembles and tests this project.");
        tasks.depends_on(build, assemble)?;
        tasks.depends_on(build, check)?;

        let lifecycle = Lifecycle {
            check,
            assemble,
            build,
        };
        self.lifecycle
            .set(lifecycle)
            .map_err(|_| Error::AlreadyApplied(Self::ID))?;
        Ok(())
    }

    fn configure_source_set(&self, project: &mut Project, id: SourceSetId) -> Result<(), Error> {
        let lifecycle = self.lifecycle().ok_or_else(|| {
            crate::unmet(Self::ID, Self::ID, "the plugin has not been applied".to_string())
        })?;
        let source_set = project.source_set(id);
        let name = source_set.name().clone();
        let (java, resources) = (source_set.java(), source_set.resources());

        let configurations = project.configurations_mut();
        let compile_classpath = configurations.create(name.compile_classpath_configuration_name())?;
        let runtime_classpath = configurations.create(name.runtime_classpath_configuration_name())?;

        let tasks = project.tasks_mut();

        let compile_java = tasks.create(name.compile_task_name("java"), TaskType::JavaCompile)?;
        tasks
            .get_mut(compile_java)
            .set_description(format!("Compiles the {name} Java source."))
            .set_source(java)
            .add_classpath(Provider::new(move |project: &Project| {
                project.resolve_files(compile_classpath)
            }))
            .set_destination_dir(Provider::new(move |project: &Project| {
                Ok(project.classes_dir(id))
            }));

        let process_resources =
            tasks.create(name.process_resources_task_name(), TaskType::ProcessResources)?;
        tasks
            .get_mut(process_resources)
            .set_description(format!("Processes the {name} resources."))
            .set_source(resources)
            .set_destination_dir(Provider::new(move |project: &Project| {
                Ok(project.resources_dir(id))
            }));

        let classes = tasks.create(name.classes_task_name(), TaskType::Lifecycle)?;
        tasks
            .get_mut(classes)
            .set_description(format!("Assembles the {name} classes."));
        tasks.depends_on(classes, compile_java)?;
        tasks.depends_on(classes, process_resources)?;

        if name.is_main() {
            tasks.depends_on(lifecycle.assemble, classes)?;
        }

        tracing::debug!(source_set = %name, "configured jvm source set");
        let handle = JvmSourceSet {
            compile_classpath,
            runtime_classpath,
            compile_java,
            process_resources,
            classes,
        };
        let mut source_sets = self.source_sets.write().expect("poisoned");
        let prev = source_sets.insert(id, handle);
        assert_none!(prev, "source set {name} configured twice");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_and_per_set_tasks() {
        let mut project = Project::builder("demo", "/work/demo").build();
        let main = project.add_source_set("main").unwrap();
        let jvm = project.apply_plugin(JvmBasePlugin::new()).unwrap();
        let test = project.add_source_set("test").unwrap();

        let lifecycle = jvm.lifecycle().unwrap();
        let tasks = project.tasks();
        assert_eq!(
            tasks.get(lifecycle.build).dependencies(),
            &[lifecycle.assemble, lifecycle.check]
        );

        for (id, prefix) in [(main, ""), (test, "Test")] {
            let handle = jvm.source_set(id).unwrap();
            assert_eq!(tasks.get(handle.compile_java).name(), format!("compile{prefix}Java"));
            assert_eq!(
                tasks.get(handle.process_resources).name(),
                format!("process{prefix}Resources")
            );
            assert_eq!(
                tasks.get(handle.classes).dependencies(),
                &[handle.compile_java, handle.process_resources]
            );
        }

        let main_classes = jvm.source_set(main).unwrap().classes;
        assert_eq!(tasks.get(lifecycle.assemble).dependencies(), &[main_classes]);
        assert_eq!(tasks.id("testClasses").unwrap(), jvm.source_set(test).unwrap().classes);
        assert!(project.configurations().id("testCompileClasspath").is_ok());
        assert!(project.configurations().id("runtimeClasspath").is_ok());
    }

    #[test]
    fn destinations_follow_the_build_dir() {
        let mut project = Project::builder("demo", "/work/demo").build();
        project.apply_plugin(JvmBasePlugin::new()).unwrap();
        project.add_source_set("main").unwrap();

        let compile = project.tasks().id("compileJava").unwrap();
        let resources = project.tasks().id("processResources").unwrap();
        project.layout_mut().set_build_dir("target");

        assert_eq!(
            project.task_destination_dir(compile).unwrap().unwrap(),
            std::path::PathBuf::from("/work/demo/target/classes/java/main")
        );
        assert_eq!(
            project.task_destination_dir(resources).unwrap().unwrap(),
            std::path::PathBuf::from("/work/demo/target/resources/main")
        );
    }

    #[test]
    fn an_instance_applies_to_one_project() {
        let mut project = Project::builder("demo", "/work/demo").build();
        let jvm = project.apply_plugin(JvmBasePlugin::new()).unwrap();

        let mut other = Project::builder("other", "/work/other").build();
        assert!(matches!(
            jvm.apply(&mut other),
            Err(Error::AlreadyApplied(JvmBasePlugin::ID))
        ));
        assert!(other.tasks().is_empty());
        assert!(jvm.apply(&mut project).is_err());
        assert_eq!(jvm.lifecycle().unwrap().check, project.tasks().id("check").unwrap());
    }

    #[test]
    fn configuring_before_apply_fails() {
        let mut project = Project::builder("demo", "/work/demo").build();
        let main = project.add_source_set("main").unwrap();

        let jvm = JvmBasePlugin::new();
        assert!(matches!(
            jvm.configure_source_set(&mut project, main),
            Err(Error::UnmetPrerequisite { .. })
        ));
    }
}
