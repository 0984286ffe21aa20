// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::telemetry::{FaultKind, Telemetry};
use crate::{Collaborator, Decorator, Descriptor, ErrorLog, Eventual, Fault, FaultCodes, Operation, Promise, Registry, RegistryError, normalize};

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Intercepts failures of operations and records them in an [`ErrorLog`].
///
/// Every failure that passes through the handler is normalized into a
/// user-facing message (see [`normalize`]) and appended to the log:
///
/// - A synchronous failure is logged **and** returned to the caller unchanged.
/// - A pending operation is returned unchanged; if it is later rejected, the
///   rejection is logged. Nothing is handed back to the caller for it, since
///   the caller already holds the pending operation.
/// - Successful results are never logged or altered.
///
/// The handler is cheap to clone; clones share the log and the code table.
///
/// # Examples
///
/// ```rust
/// use tripwire::{Deferred, ErrorHandler, Failure, Operation, Outcome, Promise};
///
/// struct Service;
///
/// let throws = Operation::new("throws_an_error", |_: &Service, (): ()| Err::<(), _>(Failure::from("X")));
/// let rejects = Operation::new("promise_rejects", |_: &Service, promise: Promise<(), Failure>| {
///     Ok::<_, Failure>(Outcome::Pending(promise))
/// })
/// .describe("perform some asynchronous operation");
///
/// let handler = ErrorHandler::default();
///
/// assert!(handler.call(&throws, &Service, ()).is_err());
/// assert_eq!(handler.errors().entries(), vec!["X"]);
///
/// let deferred = Deferred::new();
/// let outcome = handler.call(&rejects, &Service, deferred.promise()).unwrap();
/// assert!(outcome.is_pending());
/// assert_eq!(handler.errors().len(), 1);
///
/// deferred.reject(Failure::from("Y"));
/// assert_eq!(handler.errors().last().as_deref(), Some("Unable to perform some asynchronous operation. Y"));
/// ```
#[derive(Clone)]
pub struct ErrorHandler {
    inner: Arc<HandlerInner>,
}

struct HandlerInner {
    id: HandlerId,
    log: ErrorLog,
    codes: FaultCodes,
    telemetry: Telemetry,
}

impl ErrorHandler {
    /// Creates a handler translating coded faults with `codes`.
    #[must_use]
    pub fn new(codes: FaultCodes) -> Self {
        Self::builder().codes(codes).build()
    }

    /// Creates a builder for a handler with non-default configuration.
    #[must_use]
    pub fn builder() -> ErrorHandlerBuilder {
        ErrorHandlerBuilder::default()
    }

    /// The log of normalized fault messages.
    #[must_use]
    pub fn errors(&self) -> &ErrorLog {
        &self.inner.log
    }

    /// The code table used to translate coded faults.
    #[must_use]
    pub fn codes(&self) -> &FaultCodes {
        &self.inner.codes
    }

    /// Invokes `operation` on `receiver` and records any failure.
    ///
    /// # Errors
    ///
    /// Returns the operation's synchronous error unchanged, after logging it.
    pub fn call<R, A, O, E>(&self, operation: &Operation<R, A, O, E>, receiver: &R, args: A) -> Result<O, E>
    where
        R: ?Sized,
        O: Eventual,
        O::Value: 'static,
        O::Reason: 'static,
        E: Fault,
    {
        self.run(operation.descriptor(), || operation.invoke(receiver, args))
    }

    /// Runs `f` as the operation described by `descriptor` and records any failure.
    ///
    /// This is the building block of [`call`][ErrorHandler::call] for work that
    /// is not expressed as an [`Operation`].
    ///
    /// # Errors
    ///
    /// Returns the error of `f` unchanged, after logging it.
    pub fn run<O, E, F>(&self, descriptor: &Descriptor, f: F) -> Result<O, E>
    where
        F: FnOnce() -> Result<O, E>,
        O: Eventual,
        O::Value: 'static,
        O::Reason: 'static,
        E: Fault,
    {
        tracing::event!(
            name: "tripwire.call",
            tracing::Level::DEBUG,
            operation.name = %descriptor.name(),
        );

        match f() {
            Ok(output) => {
                if let Some(promise) = output.promise() {
                    self.observe(descriptor, promise);
                }
                Ok(output)
            }
            Err(fault) => {
                self.report(descriptor, &fault, FaultKind::Sync);
                Err(fault)
            }
        }
    }

    /// Records the eventual rejection of `promise` and hands the same promise back.
    ///
    /// The success path is untouched. The recorded rejection does not propagate
    /// any further through the handler; continuations that the caller registers
    /// on the returned promise still observe it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tripwire::{Deferred, Descriptor, ErrorHandler};
    ///
    /// let handler = ErrorHandler::default();
    /// let deferred = Deferred::<u32, String>::new();
    ///
    /// let promise = handler.watch(&Descriptor::new("fetch"), deferred.promise());
    /// assert!(handler.errors().is_empty());
    ///
    /// deferred.reject("connection refused".to_string());
    /// assert_eq!(handler.errors().entries(), vec!["connection refused"]);
    /// assert!(!promise.is_pending());
    /// ```
    pub fn watch<T, E>(&self, descriptor: &Descriptor, promise: Promise<T, E>) -> Promise<T, E>
    where
        T: 'static,
        E: Fault + 'static,
    {
        self.observe(descriptor, &promise);
        promise
    }

    /// Marks the named collaborators of `registry` for decoration by this handler.
    ///
    /// Every operation of a marked collaborator is wrapped with
    /// [`call`][ErrorHandler::call] when the collaborator is first resolved.
    /// Marking a name twice has no further effect.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if one of the collaborators was already
    /// resolved or is being resolved; in that case no name is marked.
    pub fn decorate<I>(&self, registry: &Registry, names: I) -> Result<(), RegistryError>
    where
        I: IntoIterator,
        I::Item: Into<Cow<'static, str>>,
    {
        registry.mark_for_decoration(names.into_iter().map(Into::into).collect(), self)
    }

    /// Wraps every operation of `collaborator` that this handler does not wrap yet.
    ///
    /// Returns the number of operations that were wrapped.
    pub fn wrap_all<C: Collaborator + ?Sized>(&self, collaborator: &mut C) -> usize {
        let mut decorator = Decorator::new(self);
        collaborator.operations(&mut decorator);
        decorator.wrapped()
    }

    pub(crate) fn id(&self) -> HandlerId {
        self.inner.id
    }

    pub(crate) fn report<F>(&self, descriptor: &Descriptor, fault: &F, kind: FaultKind)
    where
        F: Fault + ?Sized,
    {
        let message = normalize(descriptor, fault, &self.inner.codes);
        self.inner.telemetry.record(descriptor, kind, &message);
        self.inner.log.push(message);
    }

    fn observe<T, E>(&self, descriptor: &Descriptor, promise: &Promise<T, E>)
    where
        T: 'static,
        E: Fault + 'static,
    {
        let handler = self.clone();
        let descriptor = descriptor.clone();
        promise.on_rejected(move |reason: &E| handler.report(&descriptor, reason, FaultKind::Async));
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("id", &self.inner.id.0)
            .field("codes", &self.inner.codes)
            .field("errors", &self.inner.log.len())
            .finish()
    }
}

/// Builder for [`ErrorHandler`].
///
/// # Examples
///
/// ```rust
/// use tripwire::{ErrorHandler, FaultCodes};
///
/// let handler = ErrorHandler::builder()
///     .codes(FaultCodes::default().with(401, "Please sign in again."))
///     .build();
///
/// assert_eq!(handler.codes().get(401), Some("Please sign in again."));
/// ```
#[derive(Debug, Default)]
pub struct ErrorHandlerBuilder {
    codes: FaultCodes,
    telemetry: Telemetry,
}

impl ErrorHandlerBuilder {
    /// Replaces the code table. Defaults to [`FaultCodes::default`].
    #[must_use]
    pub fn codes(mut self, codes: FaultCodes) -> Self {
        self.codes = codes;
        self
    }

    /// Reports a `tripwire.fault` counter through `provider` for every logged fault.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn enable_metrics(mut self, provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        use crate::telemetry::metrics::{create_fault_counter, create_meter};

        self.telemetry.fault_counter = Some(create_fault_counter(&create_meter(provider)));
        self
    }

    /// Creates the handler with an empty log.
    #[must_use]
    pub fn build(self) -> ErrorHandler {
        ErrorHandler {
            inner: Arc::new(HandlerInner {
                id: HandlerId::next(),
                log: ErrorLog::default(),
                codes: self.codes,
                telemetry: self.telemetry,
            }),
        }
    }
}
