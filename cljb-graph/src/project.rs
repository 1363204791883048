//! The [`Project`], what every plugin is handed to configure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cljb_types::{Coordinate, SourceSetName};
use compact_str::CompactString;
use derivative::Derivative;

use crate::{
    ArtifactResolver, ConfigurationId, Configurations, DefaultDirectorySetFactory,
    DirectorySetFactory, DirectorySetId, DirectorySets, Error, FileCollection, LocalRepository,
    ModuleReplacements, Plugin, PluginContainer, SourceSet, SourceSetId, SourceSets, TaskGraph,
    TaskId,
};

/// Where a project lives on disk.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    project_dir: PathBuf,
    build_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let build_dir = project_dir.join("build");
        ProjectLayout {
            project_dir,
            build_dir,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Move the build directory, relative paths are resolved against the project directory.
    pub fn set_build_dir(&mut self, dir: impl AsRef<Path>) {
        self.build_dir = self.file(dir);
    }

    /// Resolve `path` against the project directory.
    pub fn file(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}

/// An in-memory description of a build.
///
/// The project is the only context plugins get: every registry they read from or write to is
/// reached through it, and the services it can't provide itself (creating directory sets,
/// locating library artifacts) are injected when it's built.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Project {
    name: CompactString,
    layout: ProjectLayout,

    source_sets: SourceSets,
    directory_sets: DirectorySets,
    configurations: Configurations,
    modules: ModuleReplacements,
    tasks: TaskGraph,
    plugins: PluginContainer,

    #[derivative(Debug = "ignore")]
    directory_set_factory: Arc<dyn DirectorySetFactory>,
    #[derivative(Debug = "ignore")]
    artifacts: Arc<dyn ArtifactResolver>,
}

impl Project {
    pub fn builder(
        name: impl Into<CompactString>,
        project_dir: impl Into<PathBuf>,
    ) -> ProjectBuilder {
        ProjectBuilder {
            name: name.into(),
            layout: ProjectLayout::new(project_dir),
            directory_set_factory: None,
            artifacts: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut ProjectLayout {
        &mut self.layout
    }

    pub fn source_sets(&self) -> &SourceSets {
        &self.source_sets
    }

    pub fn directory_sets(&self) -> &DirectorySets {
        &self.directory_sets
    }

    pub fn directory_sets_mut(&mut self) -> &mut DirectorySets {
        &mut self.directory_sets
    }

    pub fn configurations(&self) -> &Configurations {
        &self.configurations
    }

    pub fn configurations_mut(&mut self) -> &mut Configurations {
        &mut self.configurations
    }

    pub fn modules(&self) -> &ModuleReplacements {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut ModuleReplacements {
        &mut self.modules
    }

    pub fn tasks(&self) -> &TaskGraph {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskGraph {
        &mut self.tasks
    }

    pub fn plugins(&self) -> &PluginContainer {
        &self.plugins
    }

    /// Apply `plugin` to this project.
    ///
    /// Applying a plugin of a type that has already been applied is a no-op that returns the
    /// existing instance. Otherwise the plugin is applied, and then configures every source set
    /// that already exists.
    pub fn apply_plugin<P: Plugin>(&mut self, plugin: P) -> Result<Arc<P>, Error> {
        if let Some(existing) = self.plugins.get::<P>() {
            tracing::trace!(plugin = existing.id(), "plugin already applied");
            return Ok(existing);
        }

        let plugin = Arc::new(plugin);
        tracing::info!(plugin = plugin.id(), "applying plugin");
        plugin.apply(self)?;
        // Registered after `apply`, so prerequisites applied from within `apply` configure each
        // source set before this plugin does.
        self.plugins.insert(Arc::clone(&plugin));

        let existing: Vec<SourceSetId> = self.source_sets.ids().collect();
        for source_set in existing {
            plugin.configure_source_set(self, source_set)?;
        }

        Ok(plugin)
    }

    /// Create a new [`SourceSet`] named `name` and let every applied plugin configure it.
    ///
    /// If a plugin fails to configure the new source set it's removed again, along with its
    /// directory sets, before the error is returned.
    pub fn add_source_set(&mut self, name: impl AsRef<str>) -> Result<SourceSetId, Error> {
        let name = SourceSetName::new(name)?;
        self.source_sets.check_available(&name)?;

        let java = self.create_directory_set("java", &format!("{name} Java source"));
        self.directory_sets
            .get_mut(java)
            .src_dir(format!("src/{name}/java"))
            .include(&["**/*.java"])?;
        let resources = self.create_directory_set("resources", &format!("{name} resources"));
        self.directory_sets
            .get_mut(resources)
            .src_dir(format!("src/{name}/resources"));

        let id = self
            .source_sets
            .insert(SourceSet::new(name.clone(), java, resources))?;
        tracing::info!(source_set = %name, "added source set");

        for plugin in self.plugins.in_order() {
            if let Err(err) = plugin.configure_source_set(self, id) {
                tracing::warn!(
                    source_set = %name,
                    plugin = plugin.id(),
                    %err,
                    "removing source set"
                );
                self.remove_source_set(id);
                return Err(err);
            }
        }
        Ok(id)
    }

    fn remove_source_set(&mut self, id: SourceSetId) {
        let Some(set) = self.source_sets.remove(id) else {
            return;
        };
        let owned = set.all_source().iter().copied();
        for dirs in owned.chain(std::iter::once(set.resources())) {
            self.directory_sets.remove(dirs);
        }
    }

    /// # Panics
    ///
    /// * If `id` doesn't belong to this project.
    pub fn source_set(&self, id: SourceSetId) -> &SourceSet {
        self.source_sets.get(id)
    }

    /// # Panics
    ///
    /// * If `id` doesn't belong to this project.
    pub fn source_set_mut(&mut self, id: SourceSetId) -> &mut SourceSet {
        self.source_sets.get_mut(id)
    }

    /// Create an empty directory set using the injected [`DirectorySetFactory`].
    pub fn create_directory_set(&mut self, name: &str, display_name: &str) -> DirectorySetId {
        let set = self.directory_set_factory.create(name, display_name);
        self.directory_sets.insert(set)
    }

    /// Files of the directory set `id`, see [`DirectorySets::files`].
    pub fn source_files(&self, id: DirectorySetId) -> Result<Vec<PathBuf>, Error> {
        self.directory_sets.files(id)
    }

    /// Coordinates the configuration `id` resolves to.
    pub fn resolve_configuration(&self, id: ConfigurationId) -> Vec<Coordinate> {
        self.configurations.resolve(id, &self.modules)
    }

    /// Files the configuration `id` resolves to.
    pub fn resolve_files(&self, id: ConfigurationId) -> Result<FileCollection, Error> {
        let coordinates = self.resolve_configuration(id);
        self.artifacts.resolve_all(&coordinates)
    }

    /// Directory the Java classes of a source set are compiled into.
    pub fn classes_dir(&self, id: SourceSetId) -> PathBuf {
        self.layout
            .build_dir()
            .join(self.source_set(id).output().classes_dir())
    }

    /// Directory the resources of a source set are processed into.
    pub fn resources_dir(&self, id: SourceSetId) -> PathBuf {
        self.layout
            .build_dir()
            .join(self.source_set(id).output().resources_dir())
    }

    /// Everything the source set `id` contributes to a runtime classpath.
    pub fn output_files(&self, id: SourceSetId) -> Result<FileCollection, Error> {
        let mut files = FileCollection::new();
        files.push(self.classes_dir(id));
        files.push(self.resources_dir(id));
        for dirs in self.source_set(id).output().dirs() {
            files = files.plus(dirs.get(self)?);
        }
        Ok(files)
    }

    /// Evaluate the classpath of `task`.
    pub fn task_classpath(&self, task: TaskId) -> Result<FileCollection, Error> {
        let mut classpath = FileCollection::new();
        for part in self.tasks.get(task).classpath() {
            classpath = classpath.plus(part.get(self)?);
        }
        Ok(classpath)
    }

    /// Evaluate the destination directory of `task`, if it has one.
    pub fn task_destination_dir(&self, task: TaskId) -> Result<Option<PathBuf>, Error> {
        self.tasks
            .get(task)
            .destination_dir()
            .map(|dir| dir.get(self))
            .transpose()
    }
}

/// Builder for a [`Project`].
pub struct ProjectBuilder {
    name: CompactString,
    layout: ProjectLayout,
    directory_set_factory: Option<Arc<dyn DirectorySetFactory>>,
    artifacts: Option<Arc<dyn ArtifactResolver>>,
}

impl ProjectBuilder {
    pub fn build_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.layout.set_build_dir(dir);
        self
    }

    pub fn directory_set_factory(mut self, factory: Arc<dyn DirectorySetFactory>) -> Self {
        self.directory_set_factory = Some(factory);
        self
    }

    pub fn artifact_resolver(mut self, resolver: Arc<dyn ArtifactResolver>) -> Self {
        self.artifacts = Some(resolver);
        self
    }

    /// Build the [`Project`].
    ///
    /// Without an explicit [`DirectorySetFactory`], directory sets resolve against the project
    /// directory. Without an explicit [`ArtifactResolver`], artifacts are located in a Maven
    /// layout repository at `<project>/.cljb/repository`.
    pub fn build(self) -> Project {
        let ProjectBuilder {
            name,
            layout,
            directory_set_factory,
            artifacts,
        } = self;

        let directory_set_factory: Arc<dyn DirectorySetFactory> = match directory_set_factory {
            Some(factory) => factory,
            None => Arc::new(DefaultDirectorySetFactory::new(layout.project_dir())),
        };
        let artifacts: Arc<dyn ArtifactResolver> = match artifacts {
            Some(artifacts) => artifacts,
            None => Arc::new(LocalRepository::new(layout.file(".cljb/repository"))),
        };

        Project {
            name,
            layout,
            source_sets: SourceSets::new(),
            directory_sets: DirectorySets::new(),
            configurations: Configurations::new(),
            modules: ModuleReplacements::default(),
            tasks: TaskGraph::new(),
            plugins: PluginContainer::default(),
            directory_set_factory,
            artifacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::Rng;

    use super::*;
    use crate::TaskType;

    /// Records the source sets it configures and registers one task per set.
    #[derive(Default)]
    struct Recorder {
        applied: AtomicUsize,
    }

    impl Plugin for Recorder {
        fn id(&self) -> &'static str {
            "recorder"
        }

        fn apply(&self, _project: &mut Project) -> Result<(), Error> {
            self.applied.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn configure_source_set(
            &self,
            project: &mut Project,
            source_set: SourceSetId,
        ) -> Result<(), Error> {
            let name = project.source_set(source_set).name().clone();
            project
                .tasks_mut()
                .create(name.task_name(Some("record"), "sources"), TaskType::Lifecycle)?;
            Ok(())
        }
    }

    #[test]
    fn plugins_see_existing_and_future_source_sets() {
        let mut project = Project::builder("demo", "/work/demo").build();
        project.add_source_set("main").unwrap();

        let recorder = project.apply_plugin(Recorder::default()).unwrap();
        project.add_source_set("test").unwrap();

        assert!(project.tasks().find("recordSources").is_some());
        assert!(project.tasks().find("recordTestSources").is_some());

        // Applying again hands back the same instance and doesn't re-run anything.
        let again = project.apply_plugin(Recorder::default()).unwrap();
        assert!(Arc::ptr_eq(&recorder, &again));
        assert_eq!(recorder.applied.load(Ordering::SeqCst), 1);
        assert_eq!(project.tasks().len(), 2);
        assert!(project.plugins().has("recorder"));
    }

    /// Fails to configure any source set called `broken`, after registering a task for it.
    struct Picky;

    impl Plugin for Picky {
        fn id(&self) -> &'static str {
            "picky"
        }

        fn apply(&self, _project: &mut Project) -> Result<(), Error> {
            Ok(())
        }

        fn configure_source_set(
            &self,
            project: &mut Project,
            source_set: SourceSetId,
        ) -> Result<(), Error> {
            let name = project.source_set(source_set).name().clone();
            let dirs = project.create_directory_set("picky", &format!("{name} picky source"));
            project.source_set_mut(source_set).add_source(dirs);
            if name.as_str() == "broken" {
                return Err(Error::UnknownTask(CompactString::new("broken")));
            }
            Ok(())
        }
    }

    #[test]
    fn conflicting_source_set_names() {
        let mut project = Project::builder("demo", "/work/demo").build();
        project.apply_plugin(Recorder::default()).unwrap();
        project.add_source_set("test").unwrap();
        project.add_source_set("integration-test").unwrap();
        let directory_sets = project.directory_sets().len();

        for name in ["test_", "Test", "integrationTest"] {
            let err = project.add_source_set(name).unwrap_err();
            assert!(
                matches!(err, Error::ConflictingSourceSet { .. }),
                "{name}: {err:?}"
            );
        }

        // Nothing was created for the rejected names.
        assert_eq!(project.source_sets().len(), 2);
        assert_eq!(project.directory_sets().len(), directory_sets);
        assert_eq!(project.tasks().len(), 2);
    }

    #[test]
    fn failed_source_sets_are_removed() {
        let mut project = Project::builder("demo", "/work/demo").build();
        project.apply_plugin(Recorder::default()).unwrap();
        project.apply_plugin(Picky).unwrap();
        project.add_source_set("main").unwrap();
        let directory_sets = project.directory_sets().len();

        assert!(matches!(
            project.add_source_set("broken"),
            Err(Error::UnknownTask(_))
        ));
        assert_eq!(project.source_sets().len(), 1);
        assert!(project.source_sets().id("broken").is_err());
        assert_eq!(project.directory_sets().len(), directory_sets);

        // Every source set that's left is fully configured.
        let test = project.add_source_set("test").unwrap();
        assert_eq!(project.source_sets().len(), 2);
        assert_eq!(project.source_set(test).all_source().len(), 2);
        assert!(project.tasks().find("recordTestSources").is_some());
    }

    #[test]
    fn random_number_of_source_sets() {
        let mut rng = rand::rng();
        let count = rng.random_range(0..16);

        let mut project = Project::builder("demo", "/work/demo").build();
        project.apply_plugin(Recorder::default()).unwrap();
        for idx in 0..count {
            project.add_source_set(format!("set{idx}")).unwrap();
        }
        assert_eq!(project.source_sets().len(), count);
        assert_eq!(project.tasks().len(), count);
    }

    #[test]
    fn source_set_conventions() {
        let mut project = Project::builder("demo", "/work/demo").build_dir("out").build();
        let test = project.add_source_set("test").unwrap();

        assert!(matches!(
            project.add_source_set("test"),
            Err(Error::DuplicateSourceSet(_))
        ));
        assert!(matches!(
            project.add_source_set("not valid"),
            Err(Error::Name(_))
        ));
        assert_eq!(project.source_sets().id("test").unwrap(), test);

        let set = project.source_set(test);
        assert_eq!(
            project.directory_sets().get(set.java()).src_dirs(),
            &[PathBuf::from("/work/demo/src/test/java")]
        );
        assert_eq!(
            project.directory_sets().get(set.resources()).src_dirs(),
            &[PathBuf::from("/work/demo/src/test/resources")]
        );
        assert_eq!(
            project.classes_dir(test),
            PathBuf::from("/work/demo/out/classes/java/test")
        );
        assert_eq!(
            project.output_files(test).unwrap(),
            [
                "/work/demo/out/classes/java/test",
                "/work/demo/out/resources/test"
            ]
            .into_iter()
            .collect::<FileCollection>()
        );
    }
}
