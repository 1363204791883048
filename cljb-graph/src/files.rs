//! Collections of files, and the directory sets that source code lives in.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use cljb_ore::{assert_none, id_gen::Gen};
use compact_str::CompactString;
use globset::{GlobSet, GlobSetBuilder};

use crate::Error;

/// An ordered set of paths, e.g. a classpath.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCollection {
    files: Vec<PathBuf>,
}

impl FileCollection {
    pub fn new() -> Self {
        FileCollection::default()
    }

    /// Appends `path` unless it's already part of this collection.
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    /// Returns the union of `self` and `other`, keeping the order of `self` first.
    pub fn plus(mut self, other: FileCollection) -> FileCollection {
        for path in other.files {
            self.push(path);
        }
        self
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for FileCollection {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut collection = FileCollection::new();
        for path in iter {
            collection.push(path);
        }
        collection
    }
}

impl IntoIterator for FileCollection {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// ID for a [`SourceDirectorySet`] in a [`DirectorySets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DirectorySetId(u64);

impl From<u64> for DirectorySetId {
    fn from(value: u64) -> Self {
        DirectorySetId(value)
    }
}

/// Creates new, empty, [`SourceDirectorySet`]s.
pub trait DirectorySetFactory: Send + Sync {
    fn create(&self, name: &str, display_name: &str) -> SourceDirectorySet;
}

/// A [`DirectorySetFactory`] that resolves relative source directories against a fixed base,
/// normally the project directory.
#[derive(Debug, Clone)]
pub struct DefaultDirectorySetFactory {
    base_dir: PathBuf,
}

impl DefaultDirectorySetFactory {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        DefaultDirectorySetFactory {
            base_dir: base_dir.into(),
        }
    }
}

impl DirectorySetFactory for DefaultDirectorySetFactory {
    fn create(&self, name: &str, display_name: &str) -> SourceDirectorySet {
        SourceDirectorySet::new(name, display_name, self.base_dir.clone())
    }
}

/// A named set of source directories, filtered by include patterns and by the files other
/// sets claim.
#[derive(Debug, Clone)]
pub struct SourceDirectorySet {
    name: CompactString,
    display_name: CompactString,
    /// Relative source directories are resolved against this.
    base_dir: PathBuf,
    src_dirs: Vec<PathBuf>,

    includes: Vec<CompactString>,
    /// Compiled form of `includes`, `None` means everything is included.
    include_set: Option<GlobSet>,
    /// Files belonging to any of these sets are left out. Evaluated when files are listed, so
    /// source directories added to those sets later on are still honored.
    claimed_by: Vec<DirectorySetId>,
}

impl SourceDirectorySet {
    pub fn new(
        name: impl Into<CompactString>,
        display_name: impl Into<CompactString>,
        base_dir: PathBuf,
    ) -> Self {
        SourceDirectorySet {
            name: name.into(),
            display_name: display_name.into(),
            base_dir,
            src_dirs: Vec::new(),
            includes: Vec::new(),
            include_set: None,
            claimed_by: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Adds a source directory, relative paths are resolved against the base directory.
    pub fn src_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        let dir = self.resolve(dir.as_ref());
        if !self.src_dirs.contains(&dir) {
            self.src_dirs.push(dir);
        }
        self
    }

    /// The resolved source directories, in the order they were added.
    pub fn src_dirs(&self) -> &[PathBuf] {
        &self.src_dirs
    }

    /// Only files matching one of `patterns` are part of this set.
    pub fn include(&mut self, patterns: &[&str]) -> Result<&mut Self, Error> {
        self.includes.extend(patterns.iter().copied().map(CompactString::new));
        self.include_set = Some(compile(self.includes.iter())?);
        Ok(self)
    }

    pub fn includes(&self) -> &[CompactString] {
        &self.includes
    }

    /// Leave out every file that `other` contains.
    pub fn exclude_claimed_by(&mut self, other: DirectorySetId) -> &mut Self {
        if !self.claimed_by.contains(&other) {
            self.claimed_by.push(other);
        }
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Returns the source directory `file` lives in, and its path relative to it.
    fn locate<'a>(&'a self, file: &'a Path) -> Option<(&'a Path, &'a Path)> {
        self.src_dirs.iter().find_map(|dir| {
            file.strip_prefix(dir)
                .ok()
                .map(|relative| (dir.as_path(), relative))
        })
    }

    /// Whether a path, relative to one of our source directories, passes our include patterns.
    fn matches(&self, relative: &Path) -> bool {
        self.include_set
            .as_ref()
            .map(|set| set.is_match(relative))
            .unwrap_or(true)
    }
}

fn compile<'a>(patterns: impl Iterator<Item = &'a CompactString>) -> Result<GlobSet, Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // `*` stays within a single directory, `**/` spans any number of them (including none).
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// All of the [`SourceDirectorySet`]s in a project.
#[derive(Debug, Default)]
pub struct DirectorySets {
    sets: BTreeMap<DirectorySetId, SourceDirectorySet>,
    id_gen: Gen<DirectorySetId>,
}

impl DirectorySets {
    pub fn new() -> Self {
        DirectorySets::default()
    }

    pub fn insert(&mut self, set: SourceDirectorySet) -> DirectorySetId {
        let id = self.id_gen.next();
        let prev = self.sets.insert(id, set);
        assert_none!(prev);
        id
    }

    pub fn remove(&mut self, id: DirectorySetId) -> Option<SourceDirectorySet> {
        self.sets.remove(&id)
    }

    /// # Panics
    ///
    /// * If `id` was not handed out by this [`DirectorySets`].
    pub fn get(&self, id: DirectorySetId) -> &SourceDirectorySet {
        self.sets.get(&id).expect("unknown DirectorySetId")
    }

    /// # Panics
    ///
    /// * If `id` was not handed out by this [`DirectorySets`].
    pub fn get_mut(&mut self, id: DirectorySetId) -> &mut SourceDirectorySet {
        self.sets.get_mut(&id).expect("unknown DirectorySetId")
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Whether `file` is part of the directory set `id`.
    ///
    /// A file is part of a set when it lives in one of its source directories, matches its
    /// include patterns, and isn't claimed by another set.
    pub fn contains(&self, id: DirectorySetId, file: &Path) -> bool {
        let mut visiting = BTreeSet::new();
        self.contains_inner(id, file, &mut visiting)
    }

    fn contains_inner(
        &self,
        id: DirectorySetId,
        file: &Path,
        visiting: &mut BTreeSet<DirectorySetId>,
    ) -> bool {
        // We only get back to a set we're already evaluating through a cycle of claims, and
        // only after it located and matched the file. The set the query started from wins.
        if !visiting.insert(id) {
            return true;
        }
        let set = self.get(id);
        let file = set.resolve(file);
        let contained = match set.locate(&file) {
            Some((_dir, relative)) => {
                set.matches(relative) && !self.claimed_elsewhere(set, &file, visiting)
            }
            None => false,
        };
        visiting.remove(&id);
        contained
    }

    fn claimed_elsewhere(
        &self,
        set: &SourceDirectorySet,
        file: &Path,
        visiting: &mut BTreeSet<DirectorySetId>,
    ) -> bool {
        set.claimed_by
            .iter()
            .any(|other| self.contains_inner(*other, file, visiting))
    }

    /// Lists every file in the directory set `id`, sorted.
    ///
    /// Source directories that don't exist are skipped.
    pub fn files(&self, id: DirectorySetId) -> Result<Vec<PathBuf>, Error> {
        let set = self.get(id);
        let mut files = BTreeSet::new();

        for dir in &set.src_dirs {
            if !dir.is_dir() {
                tracing::trace!(
                    dir = %dir.display(),
                    set = %set.name,
                    "skipping missing source dir"
                );
                continue;
            }
            for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
                let entry = entry.map_err(|source| Error::Walk {
                    path: dir.clone(),
                    source,
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if self.contains(id, path) {
                    files.insert(path.to_path_buf());
                }
            }
        }

        Ok(files.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn file_collection_dedupes() {
        let mut files: FileCollection = ["a.jar", "b.jar"].into_iter().collect();
        files.push("a.jar");
        let files = files.plus(["b.jar", "c"].into_iter().collect());
        assert_eq!(files.len(), 3);
        assert!(files.contains(Path::new("c")));
    }

    #[test]
    fn contains_respects_includes() {
        let mut sets = DirectorySets::new();
        let mut clojure = SourceDirectorySet::new("clojure", "main Clojure source", "/p".into());
        clojure.src_dir("src/main/clojure");
        clojure.include(&["**/*.clj", "**/*.cljc"]).unwrap();
        let clojure = sets.insert(clojure);

        assert!(sets.contains(clojure, Path::new("/p/src/main/clojure/foo/core.clj")));
        assert!(sets.contains(clojure, Path::new("src/main/clojure/core.cljc")));
        assert!(!sets.contains(clojure, Path::new("/p/src/main/clojure/foo/data.edn")));
        assert!(!sets.contains(clojure, Path::new("/p/src/main/java/Foo.clj")));
    }

    #[test]
    fn claimed_files_are_excluded() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        // Clojure source and resources share a directory.
        touch(root, "src/main/shared/app/core.clj");
        touch(root, "src/main/shared/app/config.edn");
        touch(root, "src/main/shared/logback.xml");

        let mut sets = DirectorySets::new();
        let mut clojure = SourceDirectorySet::new("clojure", "Clojure", root.to_path_buf());
        clojure.include(&["**/*.clj"]).unwrap();
        let clojure = sets.insert(clojure);

        let mut resources = SourceDirectorySet::new("resources", "resources", root.to_path_buf());
        resources.src_dir("src/main/shared").exclude_claimed_by(clojure);
        let resources = sets.insert(resources);

        // Nothing is claimed until the Clojure set has a source directory.
        assert_eq!(sets.files(resources).unwrap().len(), 3);

        sets.get_mut(clojure).src_dir("src/main/shared");
        let files = sets.files(resources).unwrap();
        assert_eq!(
            files,
            vec![
                root.join("src/main/shared/app/config.edn"),
                root.join("src/main/shared/logback.xml"),
            ]
        );
        assert_eq!(
            sets.files(clojure).unwrap(),
            vec![root.join("src/main/shared/app/core.clj")]
        );
    }

    #[test]
    fn missing_dirs_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "res/a.txt");
        touch(root, "res/nested/b.edn");

        let mut sets = DirectorySets::new();
        let mut resources = SourceDirectorySet::new("resources", "resources", root.to_path_buf());
        resources.src_dir("res").src_dir("does/not/exist");
        let resources = sets.insert(resources);

        assert_eq!(
            sets.files(resources).unwrap(),
            vec![root.join("res/a.txt"), root.join("res/nested/b.edn")]
        );
    }

    #[test]
    fn mutual_claims_terminate() {
        let mut sets = DirectorySets::new();
        let a = sets.insert(SourceDirectorySet::new("a", "a", "/p".into()));
        let b = sets.insert(SourceDirectorySet::new("b", "b", "/p".into()));
        sets.get_mut(a).src_dir("src").exclude_claimed_by(b);
        sets.get_mut(b).src_dir("src").exclude_claimed_by(a);

        let file = Path::new("/p/src/x.clj");
        assert!(sets.contains(a, file));
        assert!(sets.contains(b, file));
    }
}
