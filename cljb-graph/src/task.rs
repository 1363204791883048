//! The graph of tasks a project declares.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use cljb_ore::{assert_none, id_gen::Gen};
use compact_str::CompactString;
use derivative::Derivative;
use smallvec::SmallVec;

use crate::{DirectorySetId, Error, FileCollection, Provider};

/// ID for a [`Task`] in a [`TaskGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        TaskId(value)
    }
}

/// What a task does when it's eventually executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskType {
    /// Does nothing on its own, only groups its dependencies.
    Lifecycle,
    JavaCompile,
    ProcessResources,
    ClojureCheck,
    ClojureCompile,
    ClojureScriptCompile,
}

/// A single unit of work in the [`TaskGraph`].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Task {
    name: CompactString,
    task_type: TaskType,
    description: Option<CompactString>,

    /// Source files the task reads.
    source: Option<DirectorySetId>,
    /// Pieces of the classpath, evaluated and concatenated in order.
    #[derivative(Debug = "ignore")]
    classpath: Vec<Provider<FileCollection>>,
    /// Where the task writes its output.
    #[derivative(Debug = "ignore")]
    destination_dir: Option<Provider<PathBuf>>,

    /// Tasks that must run before this one.
    depends_on: SmallVec<[TaskId; 4]>,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<CompactString>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn source(&self) -> Option<DirectorySetId> {
        self.source
    }

    pub fn set_source(&mut self, source: DirectorySetId) -> &mut Self {
        self.source = Some(source);
        self
    }

    pub fn classpath(&self) -> &[Provider<FileCollection>] {
        &self.classpath
    }

    pub fn add_classpath(&mut self, classpath: Provider<FileCollection>) -> &mut Self {
        self.classpath.push(classpath);
        self
    }

    pub fn destination_dir(&self) -> Option<&Provider<PathBuf>> {
        self.destination_dir.as_ref()
    }

    pub fn set_destination_dir(&mut self, dir: Provider<PathBuf>) -> &mut Self {
        self.destination_dir = Some(dir);
        self
    }

    /// Direct dependencies, in the order they were declared.
    pub fn dependencies(&self) -> &[TaskId] {
        &self.depends_on
    }
}

/// All of the tasks in a project and the edges between them.
///
/// Edges that would introduce a cycle are rejected when they're added, so the graph is always a
/// DAG.
#[derive(Debug)]
pub struct TaskGraph {
    /// Map of [`TaskId`] to [`Task`].
    tasks: BTreeMap<TaskId, Task>,
    /// Index of interned task names.
    by_name: BTreeMap<lasso::Spur, TaskId>,

    /// String interner.
    names: lasso::Rodeo,
    /// ID generator for all the tasks in our graph.
    id_gen: Gen<TaskId>,
}

impl Default for TaskGraph {
    fn default() -> Self {
        TaskGraph::new()
    }
}

impl TaskGraph {
    /// Create a new, empty, [`TaskGraph`].
    pub fn new() -> Self {
        TaskGraph {
            tasks: BTreeMap::default(),
            by_name: BTreeMap::default(),
            names: lasso::Rodeo::new(),
            id_gen: Gen::default(),
        }
    }

    /// Register a new [`Task`].
    ///
    /// # Errors
    ///
    /// * If a task named `name` already exists.
    pub fn create(
        &mut self,
        name: impl Into<CompactString>,
        task_type: TaskType,
    ) -> Result<TaskId, Error> {
        let name = name.into();
        let spur = self.names.get_or_intern(&name);
        if self.by_name.contains_key(&spur) {
            return Err(Error::DuplicateTask(name));
        }

        let id = self.id_gen.next();
        tracing::debug!(task = %name, ?task_type, "registering task");
        let task = Task {
            name,
            task_type,
            description: None,
            source: None,
            classpath: Vec::new(),
            destination_dir: None,
            depends_on: SmallVec::new(),
        };
        let prev = self.tasks.insert(id, task);
        assert_none!(prev);
        self.by_name.insert(spur, id);

        Ok(id)
    }

    /// Returns the ID of the task named `name`, if one exists.
    pub fn find(&self, name: &str) -> Option<TaskId> {
        let spur = self.names.get(name)?;
        self.by_name.get(&spur).copied()
    }

    /// Returns the ID of the task named `name`.
    pub fn id(&self, name: &str) -> Result<TaskId, Error> {
        self.find(name)
            .ok_or_else(|| Error::UnknownTask(CompactString::new(name)))
    }

    /// # Panics
    ///
    /// * If `id` was not handed out by this [`TaskGraph`].
    pub fn get(&self, id: TaskId) -> &Task {
        self.tasks.get(&id).expect("unknown TaskId")
    }

    /// # Panics
    ///
    /// * If `id` was not handed out by this [`TaskGraph`].
    pub fn get_mut(&mut self, id: TaskId) -> &mut Task {
        self.tasks.get_mut(&id).expect("unknown TaskId")
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate over all tasks in the order they were created.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks.iter().map(|(id, task)| (*id, task))
    }

    /// Declare that `task` depends on `dependency`.
    ///
    /// # Errors
    ///
    /// * If `dependency` already (transitively) depends on `task`.
    pub fn depends_on(&mut self, task: TaskId, dependency: TaskId) -> Result<(), Error> {
        if self.reachable(dependency).contains(&task) {
            return Err(Error::TaskCycle {
                task: self.get(task).name.clone(),
                dependency: self.get(dependency).name.clone(),
            });
        }
        let node = self.get_mut(task);
        if !node.depends_on.contains(&dependency) {
            node.depends_on.push(dependency);
        }
        Ok(())
    }

    /// Returns `root` and every task it transitively depends on.
    pub fn reachable(&self, root: TaskId) -> BTreeSet<TaskId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.get(id).depends_on.iter().copied());
            }
        }
        seen
    }

    /// Returns the order `roots` and their dependencies would run in.
    ///
    /// Every task appears after all of its dependencies, ties are broken by declaration order
    /// so the result is deterministic.
    pub fn execution_order(&self, roots: &[TaskId]) -> Vec<TaskId> {
        let mut order = Vec::new();
        let mut visited = BTreeSet::new();
        for root in roots {
            self.visit(*root, &mut visited, &mut order);
        }
        order
    }

    fn visit(&self, id: TaskId, visited: &mut BTreeSet<TaskId>, order: &mut Vec<TaskId>) {
        if !visited.insert(id) {
            return;
        }
        for dep in &self.get(id).depends_on {
            self.visit(*dep, visited, order);
        }
        order.push(id);
    }

    /// Return a [`PrettyTask`] rooted at `root` which can be pretty printed.
    pub fn pretty(&self, root: TaskId) -> PrettyTask<'_> {
        PrettyTask { graph: self, id: root }
    }
}

/// Helper struct for implementing [`ptree`]'s traits.
#[derive(Clone, Copy)]
pub struct PrettyTask<'a> {
    graph: &'a TaskGraph,
    id: TaskId,
}

impl<'a> ptree::TreeItem for PrettyTask<'a> {
    type Child = PrettyTask<'a>;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        style: &ptree::Style,
    ) -> std::io::Result<()> {
        let task = self.graph.get(self.id);
        write!(f, "{}", style.paint(task.name()))
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        let children: Vec<_> = self
            .graph
            .get(self.id)
            .depends_on
            .iter()
            .map(|id| PrettyTask {
                graph: self.graph,
                id: *id,
            })
            .collect();
        Cow::Owned(children)
    }
}

impl fmt::Display for PrettyTask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        ptree::write_tree(self, &mut buf).map_err(|_| fmt::Error)?;
        write!(f, "{}", String::from_utf8_lossy(&buf[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(graph: &TaskGraph, ids: &[TaskId]) -> Vec<String> {
        ids.iter().map(|id| graph.get(*id).name().to_string()).collect()
    }

    #[test]
    fn smoketest_create_and_lookup() {
        let mut graph = TaskGraph::new();
        let classes = graph.create("classes", TaskType::Lifecycle).unwrap();
        let compile = graph.create("compileClojure", TaskType::ClojureCompile).unwrap();

        assert_eq!(graph.find("classes"), Some(classes));
        assert_eq!(graph.id("compileClojure").unwrap(), compile);
        assert_eq!(graph.find("nope"), None);
        assert!(matches!(
            graph.create("classes", TaskType::Lifecycle),
            Err(Error::DuplicateTask(_))
        ));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn dependencies_dedupe_and_reject_cycles() {
        let mut graph = TaskGraph::new();
        let a = graph.create("a", TaskType::Lifecycle).unwrap();
        let b = graph.create("b", TaskType::Lifecycle).unwrap();
        let c = graph.create("c", TaskType::Lifecycle).unwrap();

        graph.depends_on(a, b).unwrap();
        graph.depends_on(a, b).unwrap();
        graph.depends_on(b, c).unwrap();
        assert_eq!(graph.get(a).dependencies(), &[b]);

        assert!(matches!(graph.depends_on(c, a), Err(Error::TaskCycle { .. })));
        assert!(matches!(graph.depends_on(a, a), Err(Error::TaskCycle { .. })));
    }

    #[test]
    fn execution_order_respects_edges() {
        let mut graph = TaskGraph::new();
        let build = graph.create("build", TaskType::Lifecycle).unwrap();
        let check = graph.create("check", TaskType::Lifecycle).unwrap();
        let classes = graph.create("classes", TaskType::Lifecycle).unwrap();
        let compile_java = graph.create("compileJava", TaskType::JavaCompile).unwrap();
        let check_clj = graph.create("checkClojure", TaskType::ClojureCheck).unwrap();

        graph.depends_on(build, check).unwrap();
        graph.depends_on(check, check_clj).unwrap();
        graph.depends_on(check_clj, classes).unwrap();
        graph.depends_on(classes, compile_java).unwrap();
        graph.depends_on(build, classes).unwrap();

        let order = graph.execution_order(&[build]);
        assert_eq!(
            names(&graph, &order),
            vec!["compileJava", "classes", "checkClojure", "check", "build"]
        );
    }

    #[test]
    fn pretty_prints_dependencies() {
        let mut graph = TaskGraph::new();
        let aot = graph.create("classesAot", TaskType::Lifecycle).unwrap();
        let compile = graph.create("compileClojure", TaskType::ClojureCompile).unwrap();
        let classes = graph.create("classes", TaskType::Lifecycle).unwrap();
        graph.depends_on(aot, compile).unwrap();
        graph.depends_on(aot, classes).unwrap();

        let rendered = graph.pretty(aot).to_string();
        assert!(rendered.starts_with("classesAot"));
        assert!(rendered.contains("compileClojure"));
        assert!(rendered.contains("classes\n"));
    }
}
