//! Configures a [`Project`] from its project file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use cljb_cfg::ConfigSet;
use cljb_graph::{Error, LocalRepository, Project, SourceSetId};
use cljb_plugins::{
    BundledResources, ClojureBasePlugin, ClojureScriptBasePlugin, DirectoryResources,
    ResourceLoader,
};
use cljb_types::{Coordinate, SourceSetName};
use derivative::Derivative;

use crate::defs::{
    ProjectSpec, SourceSetSpec, BUILD_DIR, PROJECT_FILENAME, RESOURCES_DIR, STRICT_PLUGINS,
    VERSION_RESOURCE,
};

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Engine {
    /// Directory the project file lives in.
    project_dir: PathBuf,
    /// Specification of the project, read from the project file.
    spec: ProjectSpec,
    /// Dynamic configs for `cljb`.
    configs: ConfigSet,
    /// Where plugins read their resources from.
    #[derivative(Debug = "ignore")]
    resources: Arc<dyn ResourceLoader>,
}

impl Engine {
    /// Read the project file in `project_dir`.
    pub fn new(configs: ConfigSet, project_dir: impl Into<PathBuf>) -> Result<Self, anyhow::Error> {
        let project_dir = project_dir.into();

        let filename = PROJECT_FILENAME.read(&configs);
        let path = project_dir.join(filename.as_str());
        tracing::info!(?path, "reading project spec");
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading project file {}", path.display()))?;
        let spec = ProjectSpec::from_toml(&raw)
            .with_context(|| format!("parsing project file {}", path.display()))?;

        Ok(Engine::with_spec(configs, project_dir, spec))
    }

    /// Create an [`Engine`] for an already parsed project.
    pub fn with_spec(
        configs: ConfigSet,
        project_dir: impl Into<PathBuf>,
        spec: ProjectSpec,
    ) -> Self {
        let project_dir = project_dir.into();

        let resources_dir = RESOURCES_DIR.read(&configs);
        let resources: Arc<dyn ResourceLoader> = if resources_dir.is_empty() {
            Arc::new(BundledResources)
        } else {
            Arc::new(DirectoryResources::new(project_dir.join(resources_dir.as_str())))
        };

        Engine {
            project_dir,
            spec,
            configs,
            resources,
        }
    }

    pub fn spec(&self) -> &ProjectSpec {
        &self.spec
    }

    pub fn configs(&self) -> &ConfigSet {
        &self.configs
    }

    /// Build a [`Project`], apply its plugins, and create its source sets and dependencies.
    pub fn configure(&self) -> Result<Project, anyhow::Error> {
        let name = self.spec.name.clone().unwrap_or_else(|| project_name(&self.project_dir));
        let build_dir = match &self.spec.build_dir {
            Some(dir) => dir.clone(),
            None => BUILD_DIR.read(&self.configs).to_string(),
        };

        let mut builder = Project::builder(name, &self.project_dir).build_dir(build_dir);
        if let Some(repository) = &self.spec.repository {
            let root = self.project_dir.join(repository);
            builder = builder.artifact_resolver(Arc::new(LocalRepository::new(root)));
        }
        let mut project = builder.build();

        self.apply_plugins(&mut project)?;

        for (name, spec) in self.source_sets() {
            let id = project
                .add_source_set(name)
                .with_context(|| format!("adding source set '{name}'"))?;
            add_source_dirs(&mut project, id, &spec)
                .with_context(|| format!("configuring source set '{name}'"))?;
        }

        for (configuration, coordinates) in &self.spec.dependencies {
            let id = project.configurations().id(configuration)?;
            for raw in coordinates {
                let coordinate: Coordinate = raw
                    .parse()
                    .with_context(|| format!("dependency of '{configuration}'"))?;
                tracing::debug!(%coordinate, %configuration, "adding dependency");
                project.configurations_mut().get_mut(id).add_dependency(coordinate);
            }
        }

        tracing::info!(
            project = project.name(),
            source_sets = project.source_sets().len(),
            tasks = project.tasks().len(),
            "configured project"
        );
        Ok(project)
    }

    fn apply_plugins(&self, project: &mut Project) -> Result<(), anyhow::Error> {
        let strict = STRICT_PLUGINS.read(&self.configs);
        let version_resource = VERSION_RESOURCE.read(&self.configs);

        for id in &self.spec.plugins {
            let result = cljb_plugins::apply_by_id(
                project,
                id,
                Arc::clone(&self.resources),
                &version_resource,
            );
            match result {
                Ok(()) => (),
                Err(Error::UnknownPlugin(id)) if !strict => {
                    tracing::warn!(plugin = %id, "ignoring unknown plugin");
                }
                Err(err @ Error::UnknownPlugin(_)) => {
                    return Err(err).with_context(|| {
                        format!(
                            "applying plugin '{id}', set `{}=false` to ignore unknown plugins",
                            STRICT_PLUGINS.name()
                        )
                    });
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("applying plugin '{id}'"));
                }
            }
        }
        Ok(())
    }

    /// Source sets to create, `main` first.
    fn source_sets(&self) -> Vec<(&str, SourceSetSpec)> {
        if self.spec.source_sets.is_empty() {
            return vec![(SourceSetName::MAIN, SourceSetSpec::default())];
        }

        let mut source_sets: Vec<_> = self
            .spec
            .source_sets
            .iter()
            .map(|(name, spec)| (name.as_str(), spec.clone()))
            .collect();
        source_sets.sort_by_key(|(name, _)| *name != SourceSetName::MAIN);
        source_sets
    }
}

fn project_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

fn add_source_dirs(
    project: &mut Project,
    id: SourceSetId,
    spec: &SourceSetSpec,
) -> Result<(), anyhow::Error> {
    let resources = project.source_set(id).resources();
    for dir in &spec.resources {
        project.directory_sets_mut().get_mut(resources).src_dir(dir);
    }

    if !spec.clojure.is_empty() {
        let Some(clojure) = project
            .plugins()
            .get::<ClojureBasePlugin>()
            .and_then(|plugin| plugin.source_set(id))
        else {
            anyhow::bail!("clojure source dirs need the '{}' plugin", ClojureBasePlugin::ID);
        };
        for dir in &spec.clojure {
            project.directory_sets_mut().get_mut(clojure.clojure).src_dir(dir);
        }
    }

    if !spec.clojurescript.is_empty() {
        let Some(clojurescript) = project
            .plugins()
            .get::<ClojureScriptBasePlugin>()
            .and_then(|plugin| plugin.source_set(id))
        else {
            anyhow::bail!(
                "clojurescript source dirs need the '{}' plugin",
                ClojureScriptBasePlugin::ID
            );
        };
        for dir in &spec.clojurescript {
            project
                .directory_sets_mut()
                .get_mut(clojurescript.clojurescript)
                .src_dir(dir);
        }
    }

    Ok(())
}
