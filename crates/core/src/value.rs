//! Type-erased single value with checked retrieval.
//!
//! A [`Value`] stores one value of any `'static` type and hands it back only
//! when asked for the same concrete type. Asking for anything else fails with
//! [`ValueError::TypeMismatch`]. A value can also be *empty*, which is what a
//! freshly created payload slot holds.
//!
//! The stored value must implement `Debug`; the formatter is captured at
//! construction so erased values can still be printed.
//!
//! ```
//! use toolbox_core::Value;
//!
//! let mut v = Value::new(5_i32);
//! assert_eq!(v.get::<i32>(), Ok(&5));
//! assert!(v.get::<f64>().is_err());
//!
//! v.set("info string");
//! assert_eq!(v.get::<&str>(), Ok(&"info string"));
//! ```

use core::any::{Any, type_name};
use core::fmt;

use crate::error::{ValueError, ValueResult};

const EMPTY: &str = "<empty>";

type DebugFn = fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result;

struct Erased {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    debug: DebugFn,
}

impl Erased {
    fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
            debug: debug_erased::<T>,
        }
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }

    fn as_any_mut(&mut self) -> &mut (dyn Any + Send + Sync) {
        &mut *self.value
    }
}

fn debug_erased<T>(value: &(dyn Any + Send + Sync), f: &mut fmt::Formatter<'_>) -> fmt::Result
where
    T: Any + fmt::Debug,
{
    match value.downcast_ref::<T>() {
        Some(v) => fmt::Debug::fmt(v, f),
        None => f.write_str("<unknown>"),
    }
}

/// A type-erased value (possibly empty).
#[derive(Default)]
pub struct Value {
    inner: Option<Erased>,
}

impl Value {
    /// An empty value; every typed read fails until something is stored.
    pub const fn empty() -> Self {
        Self { inner: None }
    }

    /// Erase `value`. A `Value` passed in is taken as-is, never nested.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        let mut slot = Some(value);
        if let Some(nested) = (&mut slot as &mut dyn Any).downcast_mut::<Option<Value>>() {
            return nested.take().unwrap_or_default();
        }
        Self {
            inner: slot.map(Erased::new),
        }
    }

    /// Replace the stored value (of any type).
    pub fn set<T>(&mut self, value: T)
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        *self = Value::new(value);
    }

    /// Borrow the stored value as `T`.
    pub fn get<T: Any>(&self) -> ValueResult<&T> {
        let erased = self
            .inner
            .as_ref()
            .ok_or_else(|| ValueError::type_mismatch(type_name::<T>(), EMPTY))?;

        erased
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| ValueError::type_mismatch(type_name::<T>(), erased.type_name))
    }

    /// Mutably borrow the stored value as `T`.
    pub fn get_mut<T: Any>(&mut self) -> ValueResult<&mut T> {
        let erased = self
            .inner
            .as_mut()
            .ok_or_else(|| ValueError::type_mismatch(type_name::<T>(), EMPTY))?;

        let found = erased.type_name;
        erased
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| ValueError::type_mismatch(type_name::<T>(), found))
    }

    /// Consume the value and return the stored `T`.
    pub fn into_inner<T: Any>(self) -> ValueResult<T> {
        let erased = self
            .inner
            .ok_or_else(|| ValueError::type_mismatch(type_name::<T>(), EMPTY))?;

        let found = erased.type_name;
        erased
            .value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ValueError::type_mismatch(type_name::<T>(), found))
    }

    /// Returns `true` if the stored value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|erased| erased.as_any().is::<T>())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Name of the stored type, or `"<empty>"`.
    pub fn type_name(&self) -> &'static str {
        self.inner.as_ref().map_or(EMPTY, |erased| erased.type_name)
    }

    /// Drop the stored value, leaving the slot empty.
    pub fn clear(&mut self) {
        self.inner = None;
    }

    /// Move the stored value out, leaving this slot empty.
    pub fn take(&mut self) -> Value {
        core::mem::take(self)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(erased) => (erased.debug)(erased.as_any(), f),
            None => f.write_str(EMPTY),
        }
    }
}
