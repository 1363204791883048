//! Names of source sets and everything derived from them.

use std::fmt;

use compact_str::CompactString;

use crate::NameError;

/// Name of a source set, e.g. `main` or `integrationTest`.
///
/// Task and configuration names are derived from this following the usual JVM build tool
/// convention: the `main` source set contributes nothing to derived names, every other source
/// set is spliced in camel-cased. So `main` gets `compileJava` and `classes`, while `test` gets
/// `compileTestJava` and `testClasses`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceSetName(CompactString);

impl SourceSetName {
    /// Name of the source set holding production code.
    pub const MAIN: &'static str = "main";
    /// Name of the source set holding tests.
    pub const TEST: &'static str = "test";

    pub fn new(name: impl AsRef<str>) -> Result<Self, NameError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(NameError::EmptySourceSet);
        }
        if let Some(found) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(NameError::InvalidSourceSet {
                name: name.to_string(),
                found,
            });
        }
        Ok(SourceSetName(CompactString::new(name)))
    }

    pub fn main() -> Self {
        SourceSetName(CompactString::const_new(Self::MAIN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_main(&self) -> bool {
        self.0 == Self::MAIN
    }

    /// This name as it appears within derived names, e.g. `integrationTest` for
    /// `integration-test`. Two source sets with the same spliced name would derive the same
    /// task and configuration names.
    pub fn spliced(&self) -> CompactString {
        lower_camel_case(&[self.0.as_str()])
    }

    /// The segment this source set contributes to derived names.
    fn base_name(&self) -> &str {
        if self.is_main() { "" } else { self.0.as_str() }
    }

    /// Name of a task that does `verb` to `target` for this source set.
    ///
    /// ```
    /// # use cljb_types::SourceSetName;
    /// let test = SourceSetName::new("test").unwrap();
    /// assert_eq!(test.task_name(Some("check"), "Clojure"), "checkTestClojure");
    /// assert_eq!(SourceSetName::main().task_name(None, "classes"), "classes");
    /// ```
    pub fn task_name(&self, verb: Option<&str>, target: &str) -> CompactString {
        lower_camel_case(&[verb.unwrap_or(""), self.base_name(), target])
    }

    pub fn compile_task_name(&self, language: &str) -> CompactString {
        self.task_name(Some("compile"), language)
    }

    pub fn classes_task_name(&self) -> CompactString {
        self.task_name(None, "classes")
    }

    pub fn process_resources_task_name(&self) -> CompactString {
        self.task_name(Some("process"), "resources")
    }

    /// Name of a configuration owned by this source set.
    pub fn configuration_name(&self, base: &str) -> CompactString {
        lower_camel_case(&[self.base_name(), base])
    }

    pub fn compile_classpath_configuration_name(&self) -> CompactString {
        self.configuration_name("compileClasspath")
    }

    pub fn runtime_classpath_configuration_name(&self) -> CompactString {
        self.configuration_name("runtimeClasspath")
    }
}

impl fmt::Display for SourceSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SourceSetName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceSetName::new(s)
    }
}

/// Joins `parts` into a single lower camel case identifier.
///
/// Every part is split on non-alphanumeric characters, each word has its first character
/// upper-cased (the rest is kept as is), and finally the first character of the result is
/// lower-cased. Empty parts are skipped.
pub fn lower_camel_case(parts: &[&str]) -> CompactString {
    let mut out = CompactString::default();
    let words = parts
        .iter()
        .flat_map(|part| part.split(|c: char| !c.is_ascii_alphanumeric()))
        .filter(|word| !word.is_empty());

    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if out.is_empty() {
                out.push(first.to_ascii_lowercase());
            } else {
                out.push(first.to_ascii_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_names() {
        let main = SourceSetName::main();
        assert_eq!(main.compile_task_name("Clojure"), "compileClojure");
        assert_eq!(main.compile_task_name("ClojureScript"), "compileClojureScript");
        assert_eq!(main.task_name(Some("check"), "clojure"), "checkClojure");
        assert_eq!(main.classes_task_name(), "classes");
        assert_eq!(main.process_resources_task_name(), "processResources");
        assert_eq!(main.compile_classpath_configuration_name(), "compileClasspath");
        assert_eq!(main.runtime_classpath_configuration_name(), "runtimeClasspath");
    }

    #[test]
    fn non_main_names() {
        let test = SourceSetName::new("test").unwrap();
        assert_eq!(test.compile_task_name("Clojure"), "compileTestClojure");
        assert_eq!(test.classes_task_name(), "testClasses");
        assert_eq!(test.process_resources_task_name(), "processTestResources");
        assert_eq!(test.compile_classpath_configuration_name(), "testCompileClasspath");

        let it = SourceSetName::new("integration-test").unwrap();
        assert_eq!(it.compile_task_name("Java"), "compileIntegrationTestJava");
        assert_eq!(it.classes_task_name(), "integrationTestClasses");

        let camel = SourceSetName::new("devCards").unwrap();
        assert_eq!(camel.classes_task_name(), "devCardsClasses");
    }

    #[test]
    fn spliced_names() {
        let spliced = |name: &str| SourceSetName::new(name).unwrap().spliced();
        assert_eq!(spliced("integration-test"), spliced("integrationTest"));
        assert_eq!(spliced("test_"), "test");
        assert_eq!(spliced("Test"), "test");
        assert_ne!(spliced("devCards"), spliced("devcards"));
    }

    #[test]
    fn invalid_names() {
        assert_eq!(SourceSetName::new(""), Err(NameError::EmptySourceSet));
        assert!(matches!(
            SourceSetName::new("has space"),
            Err(NameError::InvalidSourceSet { found: ' ', .. })
        ));
    }

    #[test]
    fn camel_case_skips_empty_parts() {
        assert_eq!(lower_camel_case(&["", "classes"]), "classes");
        assert_eq!(lower_camel_case(&["Compile", "", "java"]), "compileJava");
        assert_eq!(lower_camel_case(&[]), "");
    }
}
