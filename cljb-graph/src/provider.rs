//! Values that are computed when they're read, not when they're declared.

use std::sync::Arc;

use derivative::Derivative;

use crate::{Error, Project};

/// A deferred value.
///
/// Plugins run while the project is still being configured, before any task has produced
/// output and before a user has finished adding dependencies or source directories. Anything a
/// task consumes that is derived from that state is therefore captured as a [`Provider`] and
/// only computed against the [`Project`] when someone asks for it.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Provider<T> {
    #[derivative(Debug = "ignore")]
    compute: Arc<dyn Fn(&Project) -> Result<T, Error> + Send + Sync>,
}

impl<T> Clone for Provider<T> {
    fn clone(&self) -> Self {
        Provider {
            compute: Arc::clone(&self.compute),
        }
    }
}

impl<T: 'static> Provider<T> {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&Project) -> Result<T, Error> + Send + Sync + 'static,
    {
        Provider {
            compute: Arc::new(compute),
        }
    }

    /// Compute the value.
    pub fn get(&self, project: &Project) -> Result<T, Error> {
        (self.compute)(project)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Provider;
    use crate::Project;

    #[test]
    fn evaluated_on_read() {
        let mut project = Project::builder("demo", "/work/demo").build();
        let output = Provider::new(|p: &Project| Ok(p.layout().build_dir().join("classes")));

        assert_eq!(
            output.get(&project).unwrap(),
            PathBuf::from("/work/demo/build/classes")
        );

        // Moving the build directory after the fact is picked up.
        project.layout_mut().set_build_dir("out");
        assert_eq!(
            output.get(&project).unwrap(),
            PathBuf::from("/work/demo/out/classes")
        );
    }
}
