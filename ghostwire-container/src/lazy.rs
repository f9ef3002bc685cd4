//! One-shot deferred initialization for ghost and proxy objects.
//!
//! ```text
//! Uninitialized ──first touch──> Initializing ──success──> Initialized
//!       ^                              │
//!       └────────── failure ───────────┘
//! ```
//!
//! A touch that arrives while the initializer is running (the constructor
//! writing its own fields) does not re-enter the initializer.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::Result;
use crate::object::Object;

/// Lifecycle of a lazy object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LazyState {
    /// Nothing has touched the object yet.
    Uninitialized,
    /// The initializer is running.
    Initializing,
    /// Terminal: the object behaves like any other instance.
    Initialized,
}

impl LazyState {
    /// Still before the end of initialization, where a constructor call is legal.
    #[inline]
    pub fn is_pre_initialization(&self) -> bool {
        !matches!(self, LazyState::Initialized)
    }
}

impl fmt::Display for LazyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyState::Uninitialized => write!(f, "uninitialized"),
            LazyState::Initializing => write!(f, "initializing"),
            LazyState::Initialized => write!(f, "initialized"),
        }
    }
}

/// Initializer receiving the object that was touched.
pub(crate) type Initializer<T> = Arc<dyn Fn(&Object) -> Result<T> + Send + Sync>;

/// Slot holding the deferred value of a lazy object.
pub(crate) struct LazyCell<T> {
    state: Mutex<LazyState>,
    value: OnceCell<T>,
    initializer: Mutex<Option<Initializer<T>>>,
}

impl<T> LazyCell<T> {
    pub fn new(initializer: Initializer<T>) -> Self {
        Self {
            state: Mutex::new(LazyState::Uninitialized),
            value: OnceCell::new(),
            initializer: Mutex::new(Some(initializer)),
        }
    }

    pub fn state(&self) -> LazyState {
        *self.state.lock()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Runs the initializer on first touch.
    ///
    /// Returns `Ok(None)` for a re-entrant touch during initialization.
    /// On failure the cell goes back to `Uninitialized` so that a later
    /// touch tries again.
    pub fn force(&self, owner: &Object) -> Result<Option<&T>> {
        {
            let mut state = self.state.lock();
            match *state {
                LazyState::Initialized => return Ok(self.value.get()),
                LazyState::Initializing => {
                    trace!(class = owner.class(), "Re-entrant touch during initialization");
                    return Ok(None);
                }
                LazyState::Uninitialized => *state = LazyState::Initializing,
            }
        }

        let initializer = self.initializer.lock().clone();
        let Some(initializer) = initializer else {
            *self.state.lock() = LazyState::Initialized;
            return Ok(self.value.get());
        };

        debug!(class = owner.class(), id = owner.id(), "Initializing lazy object");
        match initializer(owner) {
            Ok(value) => {
                let _ = self.value.set(value);
                // Dropping the initializer releases whatever it captured.
                self.initializer.lock().take();
                *self.state.lock() = LazyState::Initialized;
                Ok(self.value.get())
            }
            Err(err) => {
                *self.state.lock() = LazyState::Uninitialized;
                Err(err)
            }
        }
    }
}
