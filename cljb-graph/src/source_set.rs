//! Source sets, named groupings of source code like `main` or `test`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use cljb_ore::{assert_none, id_gen::Gen};
use cljb_types::SourceSetName;
use compact_str::CompactString;
use derivative::Derivative;
use smallvec::SmallVec;

use crate::{DirectorySetId, Error, FileCollection, Provider};

/// ID for a [`SourceSet`] in a [`SourceSets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceSetId(u64);

impl From<u64> for SourceSetId {
    fn from(value: u64) -> Self {
        SourceSetId(value)
    }
}

/// A named grouping of source directories and the outputs compiled from them.
#[derive(Debug, Clone)]
pub struct SourceSet {
    name: SourceSetName,
    java: DirectorySetId,
    resources: DirectorySetId,
    /// Every directory set holding source code for this source set, `java` included.
    all_source: SmallVec<[DirectorySetId; 4]>,
    output: SourceSetOutput,
}

impl SourceSet {
    pub fn new(name: SourceSetName, java: DirectorySetId, resources: DirectorySetId) -> Self {
        let output = SourceSetOutput {
            classes_dir: PathBuf::from(format!("classes/java/{name}")),
            resources_dir: PathBuf::from(format!("resources/{name}")),
            dirs: Vec::new(),
        };
        SourceSet {
            name,
            java,
            resources,
            all_source: SmallVec::from_slice(&[java]),
            output,
        }
    }

    pub fn name(&self) -> &SourceSetName {
        &self.name
    }

    pub fn java(&self) -> DirectorySetId {
        self.java
    }

    pub fn resources(&self) -> DirectorySetId {
        self.resources
    }

    pub fn all_source(&self) -> &[DirectorySetId] {
        &self.all_source
    }

    /// Register another directory set as source code of this source set.
    pub fn add_source(&mut self, set: DirectorySetId) -> &mut Self {
        if !self.all_source.contains(&set) {
            self.all_source.push(set);
        }
        self
    }

    pub fn output(&self) -> &SourceSetOutput {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut SourceSetOutput {
        &mut self.output
    }
}

/// Everything a [`SourceSet`] contributes to a runtime classpath.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct SourceSetOutput {
    /// Compiled classes, relative to the build directory.
    classes_dir: PathBuf,
    /// Processed resources, relative to the build directory.
    resources_dir: PathBuf,
    /// Additional directories, e.g. sources that are shipped as-is.
    #[derivative(Debug = "ignore")]
    dirs: Vec<Provider<FileCollection>>,
}

impl SourceSetOutput {
    pub fn classes_dir(&self) -> &PathBuf {
        &self.classes_dir
    }

    pub fn resources_dir(&self) -> &PathBuf {
        &self.resources_dir
    }

    pub fn dirs(&self) -> &[Provider<FileCollection>] {
        &self.dirs
    }

    pub fn dir(&mut self, dirs: Provider<FileCollection>) -> &mut Self {
        self.dirs.push(dirs);
        self
    }
}

/// All of the [`SourceSet`]s in a project.
#[derive(Debug, Default)]
pub struct SourceSets {
    sets: BTreeMap<SourceSetId, SourceSet>,
    by_name: BTreeMap<SourceSetName, SourceSetId>,
    id_gen: Gen<SourceSetId>,
}

impl SourceSets {
    pub fn new() -> Self {
        SourceSets::default()
    }

    /// Whether a source set named `name` could be inserted.
    ///
    /// # Errors
    ///
    /// * If a source set with the same name already exists.
    /// * If an existing source set derives the same task and configuration names.
    pub fn check_available(&self, name: &SourceSetName) -> Result<(), Error> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateSourceSet(name.clone()));
        }
        let spliced = name.spliced();
        if let Some(existing) = self.by_name.keys().find(|other| other.spliced() == spliced) {
            return Err(Error::ConflictingSourceSet {
                name: name.clone(),
                existing: existing.clone(),
            });
        }
        Ok(())
    }

    /// # Errors
    ///
    /// * See [`SourceSets::check_available`].
    pub fn insert(&mut self, set: SourceSet) -> Result<SourceSetId, Error> {
        self.check_available(&set.name)?;
        let id = self.id_gen.next();
        self.by_name.insert(set.name.clone(), id);
        let prev = self.sets.insert(id, set);
        assert_none!(prev);
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Result<SourceSetId, Error> {
        SourceSetName::new(name)
            .ok()
            .and_then(|name| self.by_name.get(&name).copied())
            .ok_or_else(|| Error::UnknownSourceSet(CompactString::new(name)))
    }

    /// Forget the source set `id`, its ID is never handed out again.
    pub fn remove(&mut self, id: SourceSetId) -> Option<SourceSet> {
        let set = self.sets.remove(&id)?;
        self.by_name.remove(&set.name);
        Some(set)
    }

    /// # Panics
    ///
    /// * If `id` was not handed out by this [`SourceSets`].
    pub fn get(&self, id: SourceSetId) -> &SourceSet {
        self.sets.get(&id).expect("unknown SourceSetId")
    }

    /// # Panics
    ///
    /// * If `id` was not handed out by this [`SourceSets`].
    pub fn get_mut(&mut self, id: SourceSetId) -> &mut SourceSet {
        self.sets.get_mut(&id).expect("unknown SourceSetId")
    }

    /// IDs of every source set, in the order they were created.
    pub fn ids(&self) -> impl Iterator<Item = SourceSetId> + '_ {
        self.sets.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceSetId, &SourceSet)> {
        self.sets.iter().map(|(id, set)| (*id, set))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
