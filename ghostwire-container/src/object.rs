//! Object handles.
//!
//! An [`Object`] is a reference-counted instance tagged with its class
//! name. Identity is pointer identity: clones of a handle are the same
//! object. Besides plain (eager) objects there are two lazy flavours:
//!
//! - a **ghost** *is* the instance; its fields stay unset until the first
//!   touch runs the constructor,
//! - a **proxy** forwards every touch to a separately resolved instance.
//!
//! Field access and [`Object::receiver`] are the touches that trigger
//! initialization.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::Result;
use crate::lazy::{LazyCell, LazyState};
use crate::value::Value;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle to an instance.
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

/// Non-owning handle to an instance.
#[derive(Clone)]
pub struct WeakObject(Weak<ObjectInner>);

struct ObjectInner {
    id: u64,
    class: String,
    fields: Mutex<BTreeMap<String, Value>>,
    lazy: Option<LazyKind>,
}

enum LazyKind {
    Ghost(LazyCell<()>),
    Proxy(LazyCell<Object>),
}

impl Object {
    /// Allocates a plain instance of `class` with no fields set.
    pub fn new(class: impl Into<String>) -> Self {
        Self::allocate(class.into(), None)
    }

    /// Allocates a ghost whose `initializer` runs on first touch.
    pub(crate) fn ghost(
        class: impl Into<String>,
        initializer: impl Fn(&Object) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::allocate(
            class.into(),
            Some(LazyKind::Ghost(LazyCell::new(Arc::new(initializer)))),
        )
    }

    /// Allocates a proxy that forwards to whatever `initializer` returns.
    pub(crate) fn proxy(
        class: impl Into<String>,
        initializer: impl Fn(&Object) -> Result<Object> + Send + Sync + 'static,
    ) -> Self {
        Self::allocate(
            class.into(),
            Some(LazyKind::Proxy(LazyCell::new(Arc::new(initializer)))),
        )
    }

    fn allocate(class: String, lazy: Option<LazyKind>) -> Self {
        Object(Arc::new(ObjectInner {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            class,
            fields: Mutex::new(BTreeMap::new()),
            lazy,
        }))
    }

    #[inline]
    pub fn class(&self) -> &str {
        &self.0.class
    }

    /// Process-unique number, handy in logs.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Identity comparison.
    #[inline]
    pub fn same(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Arc::downgrade(&self.0))
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self.0.lazy, Some(LazyKind::Ghost(_)))
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.0.lazy, Some(LazyKind::Proxy(_)))
    }

    /// State of a lazy object, `None` for plain objects.
    pub fn lazy_state(&self) -> Option<LazyState> {
        match &self.0.lazy {
            None => None,
            Some(LazyKind::Ghost(cell)) => Some(cell.state()),
            Some(LazyKind::Proxy(cell)) => Some(cell.state()),
        }
    }

    /// True for lazy objects nothing has touched yet.
    pub fn is_uninitialized(&self) -> bool {
        self.lazy_state() == Some(LazyState::Uninitialized)
    }

    /// True for plain objects and for lazy objects past initialization.
    pub fn is_initialized(&self) -> bool {
        self.lazy_state().is_none_or(|state| state == LazyState::Initialized)
    }

    /// Whether a constructor may still run against this object.
    pub(crate) fn accepts_constructor(&self) -> bool {
        self.lazy_state()
            .is_some_and(|state| state.is_pre_initialization())
    }

    /// Returns the object that touches operate on.
    ///
    /// Initializes a ghost and returns it, or resolves a proxy and returns
    /// its target. Plain objects return themselves.
    pub fn receiver(&self) -> Result<Object> {
        match &self.0.lazy {
            None => Ok(self.clone()),
            Some(LazyKind::Ghost(cell)) => {
                cell.force(self)?;
                Ok(self.clone())
            }
            Some(LazyKind::Proxy(cell)) => Ok(cell
                .force(self)?
                .cloned()
                .unwrap_or_else(|| self.clone())),
        }
    }

    /// Forces initialization without reading anything.
    pub fn initialize(&self) -> Result<()> {
        self.receiver().map(drop)
    }

    /// Reads a field; unset fields read as [`Value::Null`].
    pub fn get(&self, field: &str) -> Result<Value> {
        let target = self.receiver()?;
        if target.same(self) {
            Ok(self.0.fields.lock().get(field).cloned().unwrap_or_default())
        } else {
            target.get(field)
        }
    }

    /// Writes a field.
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let target = self.receiver()?;
        if target.same(self) {
            self.0.fields.lock().insert(field.into(), value.into());
            Ok(())
        } else {
            target.set(field, value)
        }
    }

    /// Names of the fields currently set.
    pub fn field_names(&self) -> Result<Vec<String>> {
        let target = self.receiver()?;
        if target.same(self) {
            Ok(self.0.fields.lock().keys().cloned().collect())
        } else {
            target.field_names()
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lazy_state() {
            Some(state) => write!(f, "{}#{} ({state})", self.0.class, self.0.id),
            None => write!(f, "{}#{}", self.0.class, self.0.id),
        }
    }
}

impl WeakObject {
    /// Returns the object if something else still holds it.
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(object) => write!(f, "Weak({object:?})"),
            None => write!(f, "Weak(<dropped>)"),
        }
    }
}
