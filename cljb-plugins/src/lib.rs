//! Plugins that teach a [`Project`] about Clojure and ClojureScript.
//!
//! * [`JvmBasePlugin`] is the baseline every other plugin builds on: per source set it provides
//!   the classpath configurations, Java compilation, resource processing, and the `classes`
//!   aggregate, plus the project wide `check`, `assemble`, and `build` tasks.
//! * [`ClojureBasePlugin`] adds a `clojure` directory set, a check task, a compile task, and a
//!   `classesAot` aggregate to every source set.
//! * [`ClojureScriptBasePlugin`] layers a `clojurescript` directory set and compile task on top,
//!   hooking its compile task into the `classesAot` aggregate.
//!
//! [`Project`]: cljb_graph::Project

use std::sync::Arc;

use cljb_graph::{DirectorySetId, Error, Project, SourceSetId};
use cljb_types::SourceKind;

pub mod clojure;
pub mod clojurescript;
pub mod jvm;
pub mod properties;
pub mod resources;

pub use clojure::{ClojureBasePlugin, ClojureSourceSet};
pub use clojurescript::{ClojureScriptBasePlugin, ClojureScriptSourceSet};
pub use jvm::{JvmBasePlugin, JvmSourceSet, Lifecycle};
pub use resources::{BundledResources, DirectoryResources, ResourceLoader, StaticResources};

/// IDs of every plugin that can be applied by name.
pub static PLUGIN_IDS: &[&str] = &[
    JvmBasePlugin::ID,
    ClojureBasePlugin::ID,
    ClojureScriptBasePlugin::ID,
];

/// Apply the plugin with `id` to `project`.
///
/// Plugins that need a version read it from the resource `version_resource` of `resources`.
///
/// # Errors
///
/// * [`Error::UnknownPlugin`] if no plugin is named `id`.
/// * Anything applying the plugin itself fails with.
pub fn apply_by_id(
    project: &mut Project,
    id: &str,
    resources: Arc<dyn ResourceLoader>,
    version_resource: &str,
) -> Result<(), Error> {
    match id {
        JvmBasePlugin::ID => {
            project.apply_plugin(JvmBasePlugin::new())?;
        }
        ClojureBasePlugin::ID => {
            let plugin = ClojureBasePlugin::new(resources).with_version_resource(version_resource);
            project.apply_plugin(plugin)?;
        }
        ClojureScriptBasePlugin::ID => {
            let plugin =
                ClojureScriptBasePlugin::new(resources).with_version_resource(version_resource);
            project.apply_plugin(plugin)?;
        }
        other => return Err(Error::UnknownPlugin(other.to_string())),
    }
    Ok(())
}

/// Shorthand for the error a plugin reports when something it builds on is missing.
pub(crate) fn unmet(plugin: &'static str, requires: &'static str, detail: String) -> Error {
    Error::UnmetPrerequisite {
        plugin,
        requires,
        detail,
    }
}

/// Register the directory set of `kind` for `source_set`.
///
/// The directory set is added to the all-source of the source set, and anything it claims is
/// excluded from the resources of the source set.
pub(crate) fn register_kind(
    project: &mut Project,
    source_set: SourceSetId,
    kind: SourceKind,
) -> Result<DirectorySetId, Error> {
    let (name, resources) = {
        let set = project.source_set(source_set);
        (set.name().clone(), set.resources())
    };

    let display_name = format!("{name} {} source", kind.display_name);
    let dirs = project.create_directory_set(kind.name, &display_name);
    project
        .directory_sets_mut()
        .get_mut(dirs)
        .src_dir(kind.conventional_src_dir(&name))
        .include(kind.includes)?;
    // Sources may share a directory with resources, those files aren't resources.
    project
        .directory_sets_mut()
        .get_mut(resources)
        .exclude_claimed_by(dirs);
    project.source_set_mut(source_set).add_source(dirs);

    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_every_plugin_by_id() {
        for id in PLUGIN_IDS {
            let mut project = Project::builder("demo", "/work/demo").build();
            apply_by_id(&mut project, id, Arc::new(BundledResources), resources::VERSION_RESOURCE)
                .unwrap();
            assert!(project.plugins().has(id));
        }
    }

    #[test]
    fn unknown_and_misconfigured_plugins() {
        let mut project = Project::builder("demo", "/work/demo").build();
        let resources: Arc<dyn ResourceLoader> = Arc::new(BundledResources);

        assert!(matches!(
            apply_by_id(&mut project, "kotlin-base", Arc::clone(&resources), "cljb.properties"),
            Err(Error::UnknownPlugin(id)) if id == "kotlin-base"
        ));
        assert!(matches!(
            apply_by_id(&mut project, ClojureScriptBasePlugin::ID, resources, "other.properties"),
            Err(Error::MissingResource(name)) if name == "other.properties"
        ));
    }
}
