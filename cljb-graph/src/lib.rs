//! An in-memory model of a JVM style build: source sets, directory sets, dependency
//! configurations, and a graph of tasks.
//!
//! Nothing here executes a task. Plugins use a [`Project`] to *describe* work: which tasks exist,
//! what they read, where they write, and what has to happen before them. Values that depend on
//! the state of the build when a task eventually runs, like classpaths and output directories,
//! are [`Provider`]s that get evaluated against the [`Project`] on demand.

use std::path::PathBuf;

use cljb_types::{Coordinate, NameError, SourceSetName};
use compact_str::CompactString;

pub mod configuration;
pub mod files;
pub mod plugin;
pub mod project;
pub mod provider;
pub mod source_set;
pub mod task;

pub use configuration::{
    ArtifactResolver, Configuration, ConfigurationId, Configurations, LocalRepository,
    ModuleReplacements, Replacement,
};
pub use files::{
    DefaultDirectorySetFactory, DirectorySetFactory, DirectorySetId, DirectorySets, FileCollection,
    SourceDirectorySet,
};
pub use plugin::{Plugin, PluginContainer};
pub use project::{Project, ProjectBuilder, ProjectLayout};
pub use provider::Provider;
pub use source_set::{SourceSet, SourceSetId, SourceSetOutput, SourceSets};
pub use task::{PrettyTask, Task, TaskGraph, TaskId, TaskType};

/// Everything that can go wrong while configuring a [`Project`].
///
/// None of these are retryable, a failure aborts configuration of the whole project.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task '{0}' already exists")]
    DuplicateTask(CompactString),
    #[error("task '{0}' not found")]
    UnknownTask(CompactString),
    #[error("task '{task}' cannot depend on '{dependency}', it would create a cycle")]
    TaskCycle {
        task: CompactString,
        dependency: CompactString,
    },

    #[error("configuration '{0}' already exists")]
    DuplicateConfiguration(CompactString),
    #[error("configuration '{0}' not found")]
    UnknownConfiguration(CompactString),
    #[error("configuration '{child}' cannot extend from '{parent}', it would create a cycle")]
    ConfigurationCycle {
        child: CompactString,
        parent: CompactString,
    },
    #[error("cannot resolve '{0}' without a version")]
    UnresolvableCoordinate(Coordinate),

    #[error("source set '{0}' already exists")]
    DuplicateSourceSet(SourceSetName),
    #[error("source set '{name}' derives the same names as existing source set '{existing}'")]
    ConflictingSourceSet {
        name: SourceSetName,
        existing: SourceSetName,
    },
    #[error("source set '{0}' not found")]
    UnknownSourceSet(CompactString),

    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),
    #[error("this instance of plugin '{0}' was already applied to a project")]
    AlreadyApplied(&'static str),
    #[error("plugin '{plugin}' requires '{requires}': {detail}")]
    UnmetPrerequisite {
        plugin: &'static str,
        requires: &'static str,
        detail: String,
    },

    #[error("resource '{0}' not found")]
    MissingResource(String),
    #[error("resource '{resource}' does not define '{key}'")]
    MissingResourceKey { resource: String, key: String },
    #[error("failed to read resource '{resource}'")]
    ResourceIo {
        resource: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid version '{version}' in resource '{resource}'")]
    InvalidVersion {
        resource: String,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("failed to list files under '{}'", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Glob(#[from] globset::Error),
    #[error(transparent)]
    Name(#[from] NameError),
}
