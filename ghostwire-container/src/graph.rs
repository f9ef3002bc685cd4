//! Construction path tracking.
//!
//! Resolution is recursive: constructing a class resolves its constructor
//! parameters, which may construct further classes. The container records
//! the classes currently under construction so that a class depending on
//! itself, directly or through others, fails with the full chain instead
//! of recursing forever.
//!
//! Each thread gets its own path. Two threads constructing the same class
//! at once is not a cycle.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{CircularDependencyError, ContainerError, Result};

/// Per-thread stacks of classes currently being constructed.
#[derive(Debug, Default)]
pub(crate) struct ResolutionPath {
    stacks: Mutex<HashMap<ThreadId, Vec<String>>>,
}

impl ResolutionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `class` onto the calling thread's path, or fails if it is
    /// already on it.
    ///
    /// The returned guard pops it again when dropped.
    ///
    /// # Errors
    /// [`ContainerError::CircularDependency`] with the chain from the
    /// first occurrence of `class` back to itself.
    pub fn enter(&self, class: &str) -> Result<PathGuard<'_>> {
        let thread = thread::current().id();
        let mut stacks = self.stacks.lock();
        let stack = stacks.entry(thread).or_default();

        if let Some(start) = stack.iter().position(|entry| entry == class) {
            let mut chain: Vec<String> = stack[start..].to_vec();
            chain.push(class.to_string());

            warn!(cycle = ?chain, "Circular dependency detected!");

            return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
        }

        stack.push(class.to_string());
        Ok(PathGuard { path: self, thread })
    }

    /// Depth of the calling thread's path.
    pub fn depth(&self) -> usize {
        let thread = thread::current().id();
        self.stacks.lock().get(&thread).map_or(0, Vec::len)
    }

    /// Number of threads with a construction in progress.
    pub fn active_threads(&self) -> usize {
        self.stacks.lock().len()
    }
}

/// Pops the most recently entered class on drop.
pub(crate) struct PathGuard<'a> {
    path: &'a ResolutionPath,
    thread: ThreadId,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        let mut stacks = self.path.stacks.lock();
        if let Some(stack) = stacks.get_mut(&self.thread) {
            stack.pop();
            if stack.is_empty() {
                stacks.remove(&self.thread);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_entries_pop_in_order() {
        let path = ResolutionPath::new();
        {
            let _a = path.enter("A").unwrap();
            let _b = path.enter("B").unwrap();
            assert_eq!(path.depth(), 2);
        }
        assert_eq!(path.depth(), 0);
        assert_eq!(path.active_threads(), 0);
    }

    #[test]
    fn threads_do_not_share_a_path() {
        let path = ResolutionPath::new();
        let _a = path.enter("A").unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let _a = path.enter("A").unwrap();
                assert_eq!(path.depth(), 1);
                assert_eq!(path.active_threads(), 2);
            });
        });

        assert_eq!(path.depth(), 1);
        assert_eq!(path.active_threads(), 1);
        assert!(path.enter("A").is_err());
    }

    #[test]
    fn reentry_is_a_cycle() {
        let path = ResolutionPath::new();
        let _a = path.enter("A").unwrap();
        let _b = path.enter("B").unwrap();

        match path.enter("A") {
            Err(ContainerError::CircularDependency(err)) => {
                assert_eq!(err.chain, vec!["A", "B", "A"]);
            }
            Err(other) => panic!("Expected CircularDependency, got: {other:?}"),
            Ok(_) => panic!("Expected CircularDependency, got a guard"),
        }
    }

    #[test]
    fn self_dependency_chain() {
        let path = ResolutionPath::new();
        let _a = path.enter("A").unwrap();
        let err = path.enter("A").err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("A → A"));
    }

    #[test]
    fn path_is_free_after_failure() {
        let path = ResolutionPath::new();
        {
            let _a = path.enter("A").unwrap();
            assert!(path.enter("A").is_err());
        }
        assert!(path.enter("A").is_ok());
    }
}
