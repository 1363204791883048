//! Rendering of a configured [`Project`] for the `cljb` command line.

use std::borrow::Cow;
use std::fmt::Write;

use ansi_term::{Colour, Style};
use anyhow::Context;
use cljb_graph::{Project, TaskId};

/// How output gets styled.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormat {
    /// Whether or not ANSI color codes are supported.
    ///
    /// See: <https://no-color.org/>.
    ansi: bool,
}

impl OutputFormat {
    pub fn from_env() -> Self {
        OutputFormat {
            ansi: cljb_ore::env::ansi_enabled(),
        }
    }

    pub fn plain() -> Self {
        OutputFormat { ansi: false }
    }

    fn paint<'a>(&self, style: Style, text: &'a str) -> Cow<'a, str> {
        if self.ansi {
            Cow::Owned(style.paint(text).to_string())
        } else {
            Cow::Borrowed(text)
        }
    }

    fn name<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.paint(Style::new().bold(), text)
    }

    fn dimmed<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.paint(Style::new().dimmed(), text)
    }

    fn header<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.paint(Colour::Cyan.bold(), text)
    }
}

fn task(project: &Project, name: &str) -> Result<TaskId, anyhow::Error> {
    project
        .tasks()
        .id(name)
        .with_context(|| format!("run `cljb tasks` to list the tasks of '{}'", project.name()))
}

/// Every task, sorted by name, with its description.
pub fn tasks(project: &Project, format: OutputFormat) -> String {
    let mut tasks: Vec<_> = project.tasks().iter().map(|(_, task)| task).collect();
    tasks.sort_by(|a, b| a.name().cmp(b.name()));

    let mut out = String::new();
    for task in tasks {
        let _ = write!(out, "{}", format.name(task.name()));
        if let Some(description) = task.description() {
            let _ = write!(out, " - {}", format.dimmed(description));
        }
        out.push('\n');
    }
    out
}

/// The dependency tree of the task `name`.
pub fn graph(project: &Project, name: &str) -> Result<String, anyhow::Error> {
    let root = task(project, name)?;
    Ok(project.tasks().pretty(root).to_string())
}

/// The order the tasks `names` and everything they depend on would run in.
pub fn order(project: &Project, names: &[String]) -> Result<String, anyhow::Error> {
    let roots = names
        .iter()
        .map(|name| task(project, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = String::new();
    for (idx, id) in project.tasks().execution_order(&roots).into_iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", idx + 1, project.tasks().get(id).name());
    }
    Ok(out)
}

/// The evaluated classpath, and destination, of the task `name`.
pub fn classpath(
    project: &Project,
    name: &str,
    format: OutputFormat,
) -> Result<String, anyhow::Error> {
    let id = task(project, name)?;
    let classpath = project
        .task_classpath(id)
        .with_context(|| format!("evaluating the classpath of '{name}'"))?;
    let destination = project
        .task_destination_dir(id)
        .with_context(|| format!("evaluating the destination of '{name}'"))?;

    let mut out = String::new();
    let _ = writeln!(out, "{}", format.header("classpath"));
    for path in classpath.iter() {
        let _ = writeln!(out, "  {}", path.display());
    }
    if let Some(destination) = destination {
        let _ = writeln!(out, "{}", format.header("destination"));
        let _ = writeln!(out, "  {}", destination.display());
    }
    Ok(out)
}

/// Files of every directory set of the source set `name`.
pub fn sources(
    project: &Project,
    name: &str,
    format: OutputFormat,
) -> Result<String, anyhow::Error> {
    let id = project.source_sets().id(name)?;
    let set = project.source_set(id);

    let mut out = String::new();
    let all = set.all_source().iter().copied();
    for dirs in all.chain(std::iter::once(set.resources())) {
        let directory_set = project.directory_sets().get(dirs);
        let _ = writeln!(out, "{}", format.header(directory_set.display_name()));
        for file in project.source_files(dirs)? {
            let _ = writeln!(out, "  {}", file.display());
        }
    }
    Ok(out)
}

/// Resolved coordinates of the configuration `name`.
pub fn dependencies(
    project: &Project,
    name: &str,
    format: OutputFormat,
) -> Result<String, anyhow::Error> {
    let id = project.configurations().id(name)?;

    let mut out = String::new();
    let hierarchy: Vec<_> = project
        .configurations()
        .hierarchy(id)
        .into_iter()
        .map(|id| project.configurations().get(id).name())
        .collect();
    let _ = writeln!(out, "{}", format.dimmed(&hierarchy.join(" -> ")));
    for coordinate in project.resolve_configuration(id) {
        let _ = writeln!(out, "{coordinate}");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use cljb_plugins::ClojureScriptBasePlugin;

    use super::*;

    fn project() -> Project {
        let mut project = Project::builder("demo", "/work/demo").build();
        project
            .apply_plugin(ClojureScriptBasePlugin::bundled())
            .unwrap();
        project.add_source_set("main").unwrap();
        project
    }

    #[test]
    fn lists_tasks_sorted() {
        let out = tasks(&project(), OutputFormat::plain());
        let names: Vec<_> = out
            .lines()
            .map(|line| line.split(' ').next().unwrap())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(out.contains("compileClojure - Compiles the main Clojure source.\n"));
        assert!(out.contains("classesAot\n"));
    }

    #[test]
    fn order_ends_with_the_root() {
        let project = project();
        let out = order(&project, &["classesAot".to_string()]).unwrap();
        assert!(out.trim_end().ends_with("classesAot"));
        assert!(out.contains("compileClojureScript"));

        let err = order(&project, &["nope".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("'nope' not found"));
    }

    #[test]
    fn classpath_and_destination() {
        let out = classpath(&project(), "compileClojure", OutputFormat::plain()).unwrap();
        assert!(out.starts_with("classpath\n"));
        assert!(out.contains("  /work/demo/build/classes/java/main\n"));
        assert!(out.ends_with("destination\n  /work/demo/build/classes/clojure/main\n"));
    }

    #[test]
    fn dependencies_show_the_hierarchy() {
        let out = dependencies(&project(), "compileClasspath", OutputFormat::plain()).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("compileClasspath -> clojureTools"));
        let tools = lines.next().unwrap();
        assert!(tools.starts_with("io.github.gradle-clojure:gradle-clojure-tools:"));
    }

    #[test]
    fn ansi_only_when_asked() {
        let plain = OutputFormat::plain();
        assert_eq!(plain.name("check"), "check");

        let ansi = OutputFormat { ansi: true };
        assert_ne!(ansi.name("check"), "check");
        assert!(ansi.name("check").contains("check"));
    }
}
