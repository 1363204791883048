//! Plugins configure a [`Project`].

use std::any::Any;
use std::sync::Arc;

use crate::{Error, Project, SourceSetId};

/// A unit of configuration that can be applied to a [`Project`].
///
/// [`Plugin::apply`] runs once, when the plugin is applied. [`Plugin::configure_source_set`]
/// runs for every source set, those that already existed when the plugin was applied and those
/// added afterwards, in the order plugins were applied.
pub trait Plugin: Any + Send + Sync {
    /// Stable identifier, e.g. `clojure-base`.
    fn id(&self) -> &'static str;

    fn apply(&self, project: &mut Project) -> Result<(), Error>;

    fn configure_source_set(
        &self,
        project: &mut Project,
        source_set: SourceSetId,
    ) -> Result<(), Error> {
        let _ = (project, source_set);
        Ok(())
    }
}

struct AppliedPlugin {
    plugin: Arc<dyn Plugin>,
    any: Arc<dyn Any + Send + Sync>,
}

/// The plugins applied to a project, in application order.
#[derive(Default)]
pub struct PluginContainer {
    applied: Vec<AppliedPlugin>,
}

impl PluginContainer {
    /// Returns the applied instance of `P`, if any.
    pub fn get<P: Plugin>(&self) -> Option<Arc<P>> {
        self.applied
            .iter()
            .find_map(|applied| Arc::clone(&applied.any).downcast::<P>().ok())
    }

    pub fn has(&self, id: &str) -> bool {
        self.applied.iter().any(|applied| applied.plugin.id() == id)
    }

    /// IDs of the applied plugins, in application order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.applied.iter().map(|applied| applied.plugin.id())
    }

    pub(crate) fn insert<P: Plugin>(&mut self, plugin: Arc<P>) {
        let any: Arc<dyn Any + Send + Sync> = plugin.clone();
        self.applied.push(AppliedPlugin { plugin, any });
    }

    pub(crate) fn in_order(&self) -> Vec<Arc<dyn Plugin>> {
        self.applied
            .iter()
            .map(|applied| Arc::clone(&applied.plugin))
            .collect()
    }
}

impl std::fmt::Debug for PluginContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
