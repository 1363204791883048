/// A language whose sources live in their own directory set within every source set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceKind {
    /// Name of the directory set, also used in source and output directory paths.
    pub name: &'static str,
    /// Human readable name, also the target segment of task names.
    pub display_name: &'static str,
    /// Patterns of files within a source directory that belong to this kind.
    pub includes: &'static [&'static str],
}

impl SourceKind {
    pub const CLOJURE: SourceKind = SourceKind {
        name: "clojure",
        display_name: "Clojure",
        includes: &["**/*.clj", "**/*.cljc"],
    };

    pub const CLOJURESCRIPT: SourceKind = SourceKind {
        name: "clojurescript",
        display_name: "ClojureScript",
        includes: &["**/*.cljs", "**/*.cljc"],
    };

    /// Conventional source directory for this kind, relative to the project directory.
    pub fn conventional_src_dir(&self, source_set: &crate::SourceSetName) -> String {
        format!("src/{source_set}/{}", self.name)
    }

    /// Output directory for this kind, relative to the build directory.
    pub fn output_dir(&self, source_set: &crate::SourceSetName) -> String {
        format!("classes/{}/{source_set}", self.name)
    }
}
