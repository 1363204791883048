//! Resources bundled with the plugins, and reading the plugin version out of them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use cljb_graph::Error;

use crate::properties;

/// Name of the resource the plugin version is read from.
pub const VERSION_RESOURCE: &str = "cljb.properties";
/// Key of the plugin version within [`VERSION_RESOURCE`].
pub const VERSION_KEY: &str = "version";

/// Source of named text resources.
pub trait ResourceLoader: Send + Sync {
    /// Returns the contents of the resource `name`, `None` if no such resource exists.
    fn load(&self, name: &str) -> io::Result<Option<Cow<'static, str>>>;
}

/// Resources compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledResources;

impl ResourceLoader for BundledResources {
    fn load(&self, name: &str) -> io::Result<Option<Cow<'static, str>>> {
        let contents = match name {
            VERSION_RESOURCE => include_str!("../resources/cljb.properties"),
            _ => return Ok(None),
        };
        Ok(Some(Cow::Borrowed(contents)))
    }
}

/// Resources read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryResources { root: root.into() }
    }
}

impl ResourceLoader for DirectoryResources {
    fn load(&self, name: &str) -> io::Result<Option<Cow<'static, str>>> {
        match std::fs::read_to_string(self.root.join(name)) {
            Ok(contents) => Ok(Some(Cow::Owned(contents))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// In-memory resources, mostly useful for tests.
#[derive(Debug, Default, Clone)]
pub struct StaticResources {
    resources: BTreeMap<String, String>,
}

impl StaticResources {
    pub fn with(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.resources.insert(name.into(), contents.into());
        self
    }
}

impl ResourceLoader for StaticResources {
    fn load(&self, name: &str) -> io::Result<Option<Cow<'static, str>>> {
        Ok(self.resources.get(name).cloned().map(Cow::Owned))
    }
}

/// Read the plugin version from the `.properties` resource `name`.
///
/// # Errors
///
/// * [`Error::MissingResource`] if `loader` doesn't have the resource.
/// * [`Error::ResourceIo`] if the resource can't be read or isn't a valid `.properties` file.
/// * [`Error::MissingResourceKey`] if the resource doesn't define [`VERSION_KEY`].
/// * [`Error::InvalidVersion`] if the version isn't a semantic version.
pub fn read_version(loader: &dyn ResourceLoader, name: &str) -> Result<semver::Version, Error> {
    let contents = loader
        .load(name)
        .map_err(|source| Error::ResourceIo {
            resource: name.to_string(),
            source,
        })?
        .ok_or_else(|| Error::MissingResource(name.to_string()))?;

    let props = properties::parse(&contents).map_err(|err| Error::ResourceIo {
        resource: name.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidData, err),
    })?;
    let raw = props.get(VERSION_KEY).ok_or_else(|| Error::MissingResourceKey {
        resource: name.to_string(),
        key: VERSION_KEY.to_string(),
    })?;

    let version = semver::Version::parse(raw.trim()).map_err(|source| Error::InvalidVersion {
        resource: name.to_string(),
        version: raw.clone(),
        source,
    })?;
    tracing::debug!(resource = name, %version, "read plugin version");
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_version_is_valid() {
        let version = read_version(&BundledResources, VERSION_RESOURCE).unwrap();
        assert!(version.pre.is_empty());
        assert!(BundledResources.load("nope.properties").unwrap().is_none());
    }

    #[test]
    fn version_errors() {
        let loader = StaticResources::default()
            .with("no-key.properties", "name=cljb\n")
            .with("bad.properties", "version=not.a.version\n")
            .with("escape.properties", "version=\\uzzzz\n");

        assert!(matches!(
            read_version(&loader, "missing.properties"),
            Err(Error::MissingResource(name)) if name == "missing.properties"
        ));
        assert!(matches!(
            read_version(&loader, "no-key.properties"),
            Err(Error::MissingResourceKey { key, .. }) if key == VERSION_KEY
        ));
        assert!(matches!(
            read_version(&loader, "bad.properties"),
            Err(Error::InvalidVersion { version, .. }) if version == "not.a.version"
        ));
        assert!(matches!(
            read_version(&loader, "escape.properties"),
            Err(Error::ResourceIo { .. })
        ));
    }

    #[test]
    fn directory_resources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VERSION_RESOURCE), "version = 1.2.3-rc.1\n").unwrap();

        let loader = DirectoryResources::new(dir.path());
        let version = read_version(&loader, VERSION_RESOURCE).unwrap();
        assert_eq!(version, semver::Version::parse("1.2.3-rc.1").unwrap());
        assert!(loader.load("other.properties").unwrap().is_none());
    }
}
