// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::Descriptor;
use crate::handler::HandlerId;

pub(crate) type OperationFn<R, A, O, E> = Arc<dyn Fn(&R, A) -> Result<O, E> + Send + Sync>;

/// A named callable operating on a receiver of type `R`.
///
/// The function receives the receiver and the arguments `A` and either succeeds
/// with `O` or fails synchronously with `E`. Pending work is expressed through
/// an `O` that implements [`Eventual`][crate::Eventual], such as
/// [`Outcome`][crate::Outcome] or [`Promise`][crate::Promise].
///
/// Operations are cheap to clone; clones share the function.
///
/// # Examples
///
/// ```rust
/// use tripwire::{ErrorHandler, Failure, Operation, Outcome};
///
/// struct Inventory {
///     items: Vec<&'static str>,
/// }
///
/// let find = Operation::new("find_item", |inventory: &Inventory, index: usize| {
///     match inventory.items.get(index) {
///         Some(item) => Ok(Outcome::<_, Failure>::Immediate(*item)),
///         None => Err(Failure::from("no such item")),
///     }
/// })
/// .describe("find the item");
///
/// let inventory = Inventory { items: vec!["hammer"] };
/// let handler = ErrorHandler::default();
///
/// assert!(handler.call(&find, &inventory, 0).is_ok());
/// assert!(handler.call(&find, &inventory, 5).is_err());
/// assert_eq!(handler.errors().last().as_deref(), Some("Unable to find the item. no such item"));
/// ```
pub struct Operation<R: ?Sized, A, O, E> {
    descriptor: Descriptor,
    func: OperationFn<R, A, O, E>,
    wrapped_by: Vec<HandlerId>,
}

impl<R: ?Sized, A, O, E> Operation<R, A, O, E> {
    /// Creates an operation named `name` that runs `func`.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&R, A) -> Result<O, E> + Send + Sync + 'static,
    {
        Self {
            descriptor: Descriptor::new(name),
            func: Arc::new(func),
            wrapped_by: Vec::new(),
        }
    }

    /// Attaches a description used to prefix fault messages.
    #[must_use]
    pub fn describe(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.descriptor = self.descriptor.describe(description);
        self
    }

    /// The operation's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The operation's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Runs the operation.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error unchanged.
    pub fn invoke(&self, receiver: &R, args: A) -> Result<O, E> {
        (self.func)(receiver, args)
    }

    pub(crate) fn is_wrapped_by(&self, handler: HandlerId) -> bool {
        self.wrapped_by.contains(&handler)
    }

    pub(crate) fn replace(&mut self, func: OperationFn<R, A, O, E>, handler: HandlerId) {
        self.func = func;
        self.wrapped_by.push(handler);
    }
}

impl<R: ?Sized, A, O, E> Clone for Operation<R, A, O, E> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            func: Arc::clone(&self.func),
            wrapped_by: self.wrapped_by.clone(),
        }
    }
}

impl<R: ?Sized, A, O, E> Debug for Operation<R, A, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("descriptor", &self.descriptor)
            .field("wrapped", &!self.wrapped_by.is_empty())
            .finish_non_exhaustive()
    }
}
