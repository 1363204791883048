//! Coordinates of external libraries, `group:name:version`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;

use crate::NameError;

/// Identifies a module independent of its version, `group:name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId {
    pub group: CompactString,
    pub name: CompactString,
}

impl ModuleId {
    pub fn new(group: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        ModuleId {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for ModuleId {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Coordinate::from_str(s)? {
            Coordinate {
                module,
                version: None,
            } => Ok(module),
            Coordinate { .. } => Err(NameError::InvalidCoordinate(s.to_string())),
        }
    }
}

/// A dependency on an external library.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub module: ModuleId,
    pub version: Option<CompactString>,
}

impl Coordinate {
    pub fn new(
        group: impl Into<CompactString>,
        name: impl Into<CompactString>,
        version: impl Into<CompactString>,
    ) -> Self {
        Coordinate {
            module: ModuleId::new(group, name),
            version: Some(version.into()),
        }
    }

    /// Compares the versions of two coordinates.
    ///
    /// Versions that parse as semantic versions are compared as such, anything else falls back
    /// to a plain string comparison. A missing version sorts before any version.
    pub fn cmp_version(&self, other: &Coordinate) -> Ordering {
        match (&self.version, &other.version) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => match (semver::Version::parse(a), semver::Version::parse(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            },
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

impl FromStr for Coordinate {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NameError::InvalidCoordinate(s.to_string());
        let mut parts = s.trim().split(':');
        let group = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        let name = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        let version = match parts.next() {
            None => None,
            Some(v) if !v.is_empty() => Some(CompactString::new(v)),
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Coordinate {
            module: ModuleId::new(group, name),
            version,
        })
    }
}
