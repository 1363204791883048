use std::collections::BTreeMap;

use cljb_cfg::Config;
use serde::Deserialize;

pub static PROJECT_FILENAME: Config<&'static str> = Config::new(
    "project_filename",
    "The filename of what defines a project.",
    "project.cljb.toml",
);

pub static BUILD_DIR: Config<&'static str> = Config::new(
    "build_dir",
    "Directory outputs are written to, relative to the project, unless the project sets one.",
    "build",
);

pub static VERSION_RESOURCE: Config<&'static str> = Config::new(
    "version_resource",
    "Resource the plugin version is read from.",
    "cljb.properties",
);

pub static RESOURCES_DIR: Config<&'static str> = Config::new(
    "resources_dir",
    "Directory to read plugin resources from, empty for the bundled resources.",
    "",
);

pub static STRICT_PLUGINS: Config<bool> = Config::new(
    "strict_plugins",
    "Fail when a project applies a plugin that doesn't exist.",
    true,
);

/// Definition of a [`Project`], parsed from a [`PROJECT_FILENAME`].
///
/// ```toml
/// name = "demo"
/// plugins = ["clojurescript-base"]
///
/// [source_sets.main]
/// clojure = ["src/shared"]
///
/// [source_sets.test]
///
/// [dependencies]
/// compileClasspath = ["org.clojure:clojure:1.9.0"]
/// ```
///
/// [`Project`]: cljb_graph::Project
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSpec {
    /// Defaults to the name of the project directory.
    pub name: Option<String>,
    /// IDs of the plugins to apply, in order.
    #[serde(default)]
    pub plugins: Vec<String>,
    /// Overrides [`BUILD_DIR`].
    pub build_dir: Option<String>,
    /// Root of a Maven layout repository that libraries are located in.
    pub repository: Option<String>,
    /// Source sets of the project, `main` is created if none are listed.
    #[serde(default)]
    pub source_sets: BTreeMap<String, SourceSetSpec>,
    /// Coordinates to add to a configuration, keyed by configuration name.
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
}

impl ProjectSpec {
    pub fn from_toml(raw: &str) -> Result<Self, anyhow::Error> {
        let project = toml::from_str(raw)?;
        Ok(project)
    }
}

/// Extra source directories for a source set, on top of the conventional ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSetSpec {
    #[serde(default)]
    pub clojure: Vec<String>,
    #[serde(default)]
    pub clojurescript: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}
