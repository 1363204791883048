//! Dependency configurations, named sets of external libraries.

use std::collections::BTreeMap;
use std::path::PathBuf;

use cljb_ore::{assert_none, id_gen::Gen};
use cljb_types::{Coordinate, ModuleId};
use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{Error, FileCollection};

/// ID for a [`Configuration`] in a [`Configurations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigurationId(u64);

impl From<u64> for ConfigurationId {
    fn from(value: u64) -> Self {
        ConfigurationId(value)
    }
}

/// A named, resolvable, set of dependencies.
#[derive(Debug, Clone)]
pub struct Configuration {
    name: CompactString,
    /// Dependencies declared directly on this configuration.
    dependencies: Vec<Coordinate>,
    /// Used in place of `dependencies` if nothing was declared by the time we resolve.
    default_dependencies: Vec<Coordinate>,
    /// Configurations whose dependencies are inherited by this one.
    extends_from: SmallVec<[ConfigurationId; 2]>,
}

impl Configuration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[Coordinate] {
        &self.dependencies
    }

    pub fn default_dependencies(&self) -> &[Coordinate] {
        &self.default_dependencies
    }

    pub fn extends_from(&self) -> &[ConfigurationId] {
        &self.extends_from
    }

    pub fn add_dependency(&mut self, coordinate: Coordinate) -> &mut Self {
        self.dependencies.push(coordinate);
        self
    }

    pub fn default_dependency(&mut self, coordinate: Coordinate) -> &mut Self {
        self.default_dependencies.push(coordinate);
        self
    }

    /// The dependencies this configuration contributes on its own.
    fn effective_dependencies(&self) -> &[Coordinate] {
        if self.dependencies.is_empty() {
            &self.default_dependencies
        } else {
            &self.dependencies
        }
    }
}

/// All of the [`Configuration`]s in a project.
#[derive(Debug, Default)]
pub struct Configurations {
    configs: BTreeMap<ConfigurationId, Configuration>,
    by_name: BTreeMap<CompactString, ConfigurationId>,
    id_gen: Gen<ConfigurationId>,
}

impl Configurations {
    pub fn new() -> Self {
        Configurations::default()
    }

    /// Create a new, empty, [`Configuration`].
    ///
    /// # Errors
    ///
    /// * If a configuration named `name` already exists.
    pub fn create(&mut self, name: impl Into<CompactString>) -> Result<ConfigurationId, Error> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateConfiguration(name));
        }

        let id = self.id_gen.next();
        tracing::debug!(configuration = %name, "creating configuration");
        let config = Configuration {
            name: name.clone(),
            dependencies: Vec::new(),
            default_dependencies: Vec::new(),
            extends_from: SmallVec::new(),
        };
        let prev = self.configs.insert(id, config);
        assert_none!(prev);
        self.by_name.insert(name, id);

        Ok(id)
    }

    /// Returns the ID of the configuration named `name`.
    pub fn id(&self, name: &str) -> Result<ConfigurationId, Error> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownConfiguration(CompactString::new(name)))
    }

    /// # Panics
    ///
    /// * If `id` was not handed out by this [`Configurations`].
    pub fn get(&self, id: ConfigurationId) -> &Configuration {
        self.configs.get(&id).expect("unknown ConfigurationId")
    }

    /// # Panics
    ///
    /// * If `id` was not handed out by this [`Configurations`].
    pub fn get_mut(&mut self, id: ConfigurationId) -> &mut Configuration {
        self.configs.get_mut(&id).expect("unknown ConfigurationId")
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConfigurationId, &Configuration)> {
        self.configs.iter().map(|(id, config)| (*id, config))
    }

    /// Make `child` inherit all of the dependencies of `parent`.
    ///
    /// # Errors
    ///
    /// * If `parent` already (transitively) extends from `child`.
    pub fn extend_from(
        &mut self,
        child: ConfigurationId,
        parent: ConfigurationId,
    ) -> Result<(), Error> {
        if self.hierarchy(parent).contains(&child) {
            return Err(Error::ConfigurationCycle {
                child: self.get(child).name.clone(),
                parent: self.get(parent).name.clone(),
            });
        }
        let config = self.get_mut(child);
        if !config.extends_from.contains(&parent) {
            config.extends_from.push(parent);
        }
        Ok(())
    }

    /// Returns `id` followed by every configuration it transitively extends from.
    pub fn hierarchy(&self, id: ConfigurationId) -> Vec<ConfigurationId> {
        let mut seen = vec![id];
        let mut idx = 0;
        while let Some(current) = seen.get(idx).copied() {
            for parent in &self.get(current).extends_from {
                if !seen.contains(parent) {
                    seen.push(*parent);
                }
            }
            idx += 1;
        }
        seen
    }

    /// Resolve the dependencies of `id`.
    ///
    /// Walks the hierarchy of `id` collecting dependencies, picks the highest version when a
    /// module is requested more than once, and finally applies `replacements`.
    pub fn resolve(
        &self,
        id: ConfigurationId,
        replacements: &ModuleReplacements,
    ) -> Vec<Coordinate> {
        let mut resolved: Vec<Coordinate> = Vec::new();
        for config in self.hierarchy(id) {
            for dep in self.get(config).effective_dependencies() {
                match resolved.iter_mut().find(|r| r.module == dep.module) {
                    Some(existing) => {
                        if dep.cmp_version(existing).is_gt() {
                            *existing = dep.clone();
                        }
                    }
                    None => resolved.push(dep.clone()),
                }
            }
        }
        replacements.apply(&mut resolved);
        resolved
    }
}

/// A module that has been superseded by another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub replaced_by: ModuleId,
    pub reason: Option<CompactString>,
}

/// Declarations that one module replaces another.
///
/// When both modules end up in the same resolution result, the replaced module is dropped.
#[derive(Debug, Clone, Default)]
pub struct ModuleReplacements {
    replacements: BTreeMap<ModuleId, Replacement>,
}

impl ModuleReplacements {
    pub fn replace(
        &mut self,
        module: ModuleId,
        replaced_by: ModuleId,
        reason: Option<&str>,
    ) -> &mut Self {
        tracing::debug!(%module, %replaced_by, ?reason, "declaring module replacement");
        let replacement = Replacement {
            replaced_by,
            reason: reason.map(CompactString::new),
        };
        self.replacements.insert(module, replacement);
        self
    }

    pub fn get(&self, module: &ModuleId) -> Option<&Replacement> {
        self.replacements.get(module)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &Replacement)> {
        self.replacements.iter()
    }

    /// Drop every coordinate whose replacement (direct or further down a chain) is present.
    pub fn apply(&self, coordinates: &mut Vec<Coordinate>) {
        let present: Vec<ModuleId> = coordinates.iter().map(|c| c.module.clone()).collect();
        coordinates.retain(|coordinate| {
            let mut current = &coordinate.module;
            // Bounded so a replacement cycle can't spin forever.
            for _ in 0..self.replacements.len() {
                let Some(replacement) = self.replacements.get(current) else {
                    break;
                };
                if present.contains(&replacement.replaced_by) {
                    tracing::debug!(
                        module = %coordinate.module,
                        replaced_by = %replacement.replaced_by,
                        "evicting replaced module"
                    );
                    return false;
                }
                current = &replacement.replaced_by;
            }
            true
        });
    }
}

/// Turns a [`Coordinate`] into a file on disk.
///
/// Actually fetching libraries is the job of whatever executes the build, the graph only needs
/// to know where they'll end up.
pub trait ArtifactResolver: Send + Sync {
    fn resolve(&self, coordinate: &Coordinate) -> Result<PathBuf, Error>;

    /// Resolve every coordinate into a [`FileCollection`], keeping their order.
    fn resolve_all(&self, coordinates: &[Coordinate]) -> Result<FileCollection, Error> {
        coordinates.iter().map(|c| self.resolve(c)).collect()
    }
}

/// An [`ArtifactResolver`] for a local repository with the Maven directory layout.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalRepository { root: root.into() }
    }
}

impl ArtifactResolver for LocalRepository {
    fn resolve(&self, coordinate: &Coordinate) -> Result<PathBuf, Error> {
        let Some(version) = coordinate.version.as_ref() else {
            return Err(Error::UnresolvableCoordinate(coordinate.clone()));
        };
        let ModuleId { group, name } = &coordinate.module;

        let mut path = self.root.clone();
        path.extend(group.split('.'));
        path.push(name.as_str());
        path.push(version.as_str());
        path.push(format!("{name}-{version}.jar"));
        Ok(path)
    }
}
