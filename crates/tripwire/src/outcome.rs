// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Fault, Promise};

/// A return shape that may carry a pending operation.
///
/// The handler inspects successful results through this trait: when
/// [`promise`][Eventual::promise] returns `Some`, a failure continuation is
/// registered on it, otherwise the result is treated as an immediate value.
///
/// # Examples
///
/// ```rust
/// use tripwire::{Eventual, Outcome, Promise};
///
/// let immediate: Outcome<u32, String> = Outcome::Immediate(5);
/// assert!(immediate.promise().is_none());
///
/// let pending: Outcome<u32, String> = Outcome::Pending(Promise::resolved(5));
/// assert!(pending.promise().is_some());
/// ```
pub trait Eventual {
    /// The value the pending operation eventually produces.
    type Value;

    /// The reason the pending operation may eventually be rejected with.
    type Reason: Fault;

    /// Returns the pending operation carried by this value, if any.
    fn promise(&self) -> Option<&Promise<Self::Value, Self::Reason>>;
}

/// The result of an operation that either completed at once or is still pending.
#[derive(Clone, Debug)]
pub enum Outcome<T, E> {
    /// The value is available now.
    Immediate(T),
    /// The value arrives later.
    Pending(Promise<T, E>),
}

impl<T, E> Outcome<T, E> {
    /// Returns the immediate value, if any.
    #[must_use]
    pub fn immediate(&self) -> Option<&T> {
        match self {
            Self::Immediate(value) => Some(value),
            Self::Pending(_) => None,
        }
    }

    /// Returns `true` if the outcome is still pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl<T, E> From<Promise<T, E>> for Outcome<T, E> {
    fn from(promise: Promise<T, E>) -> Self {
        Self::Pending(promise)
    }
}

impl<T, E: Fault> Eventual for Outcome<T, E> {
    type Value = T;
    type Reason = E;

    fn promise(&self) -> Option<&Promise<T, E>> {
        match self {
            Self::Immediate(_) => None,
            Self::Pending(promise) => Some(promise),
        }
    }
}

impl<T, E: Fault> Eventual for Promise<T, E> {
    type Value = T;
    type Reason = E;

    fn promise(&self) -> Option<&Self> {
        Some(self)
    }
}

impl Eventual for () {
    type Value = ();
    type Reason = ();

    fn promise(&self) -> Option<&Promise<(), ()>> {
        None
    }
}

/// A value that is empty at first and filled in when its promise is fulfilled.
///
/// Callers can hand the resource out immediately and read it once data is
/// available, or wait on [`promise`][Resource::promise] directly.
///
/// # Examples
///
/// ```rust
/// use tripwire::{Deferred, Resource};
///
/// let deferred = Deferred::<Vec<u32>, String>::new();
/// let resource = Resource::new(deferred.promise());
/// assert_eq!(resource.get(), None);
///
/// deferred.resolve(vec![1, 2, 3]);
/// assert_eq!(resource.get(), Some(vec![1, 2, 3]));
/// ```
pub struct Resource<T, E> {
    data: Arc<Mutex<Option<T>>>,
    promise: Promise<T, E>,
}

impl<T, E> Resource<T, E>
where
    T: Clone + Send + 'static,
    E: 'static,
{
    /// Creates a resource populated by `promise`.
    #[must_use]
    pub fn new(promise: Promise<T, E>) -> Self {
        let data = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&data);
        promise.on_fulfilled(move |value: &T| *slot.lock() = Some(value.clone()));

        Self { data, promise }
    }

    /// Returns a copy of the data if the promise has been fulfilled.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.data.lock().clone()
    }
}

impl<T, E> Resource<T, E> {
    /// The pending operation that populates this resource.
    #[must_use]
    pub fn promise(&self) -> &Promise<T, E> {
        &self.promise
    }

    /// Returns `true` once data is available.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.data.lock().is_some()
    }
}

impl<T, E> Clone for Resource<T, E> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            promise: self.promise.clone(),
        }
    }
}

impl<T: Debug, E> Debug for Resource<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("data", &*self.data.lock())
            .field("promise", &self.promise)
            .finish()
    }
}

impl<T, E: Fault> Eventual for Resource<T, E> {
    type Value = T;
    type Reason = E;

    fn promise(&self) -> Option<&Promise<T, E>> {
        Some(&self.promise)
    }
}
