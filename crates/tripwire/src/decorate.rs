// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use crate::{ErrorHandler, Eventual, Fault, Operation};

/// A value whose operations can be intercepted as a whole.
///
/// Implementations hand each of their own operations to the decorator, in
/// declaration order. Fields that are not operations are simply left out.
///
/// # Examples
///
/// ```rust
/// use tripwire::{Collaborator, Decorator, ErrorHandler, Failure, Operation, Outcome};
///
/// struct DataService {
///     base_url: String,
///     load: Operation<DataService, (), Outcome<String, Failure>, Failure>,
/// }
///
/// impl Collaborator for DataService {
///     fn operations(&mut self, decorator: &mut Decorator<'_>) {
///         decorator.wrap(&mut self.load);
///     }
/// }
///
/// let mut service = DataService {
///     base_url: "https://example.com".to_string(),
///     load: Operation::new("load", |service: &DataService, (): ()| {
///         Err(Failure::from(format!("{} is unreachable", service.base_url)))
///     }),
/// };
///
/// let handler = ErrorHandler::default();
/// assert_eq!(handler.wrap_all(&mut service), 1);
///
/// assert!(service.load.invoke(&service, ()).is_err());
/// assert_eq!(handler.errors().entries(), vec!["https://example.com is unreachable"]);
/// ```
pub trait Collaborator: Send + Sync + 'static {
    /// Hands every operation of this collaborator to `decorator`.
    fn operations(&mut self, decorator: &mut Decorator<'_>);
}

/// Wraps the operations a [`Collaborator`] hands to it with an [`ErrorHandler`].
#[derive(Debug)]
pub struct Decorator<'a> {
    handler: &'a ErrorHandler,
    wrapped: usize,
}

impl<'a> Decorator<'a> {
    pub(crate) fn new(handler: &'a ErrorHandler) -> Self {
        Self { handler, wrapped: 0 }
    }

    /// Routes every future invocation of `operation` through the handler.
    ///
    /// The descriptor is preserved. An operation that this handler already
    /// wraps is left alone, so faults are never logged twice.
    pub fn wrap<R, A, O, E>(&mut self, operation: &mut Operation<R, A, O, E>)
    where
        R: ?Sized + 'static,
        A: 'static,
        O: Eventual + 'static,
        O::Value: 'static,
        O::Reason: 'static,
        E: Fault + 'static,
    {
        let id = self.handler.id();
        if operation.is_wrapped_by(id) {
            return;
        }

        let handler = self.handler.clone();
        let original = operation.clone();
        operation.replace(Arc::new(move |receiver: &R, args: A| handler.call(&original, receiver, args)), id);
        self.wrapped += 1;

        tracing::event!(
            name: "tripwire.decorate",
            tracing::Level::DEBUG,
            operation.name = %operation.name(),
        );
    }

    pub(crate) fn wrapped(&self) -> usize {
        self.wrapped
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use tracing_subscriber::util::SubscriberInitExt;

    use super::*;
    use crate::telemetry::testing::LogCapture;
    use crate::{Deferred, Failure, Outcome, Promise};

    type Op<A> = Operation<Demo, A, Outcome<u32, Failure>, Failure>;

    struct Demo {
        label: &'static str,
        sync: Op<()>,
        pending: Op<Promise<u32, Failure>>,
    }

    impl Collaborator for Demo {
        fn operations(&mut self, decorator: &mut Decorator<'_>) {
            decorator.wrap(&mut self.sync);
            decorator.wrap(&mut self.pending);
        }
    }

    fn demo() -> Demo {
        Demo {
            label: "demo",
            sync: Operation::new("perform_sync", |demo: &Demo, (): ()| Err(Failure::from(demo.label)))
                .describe("perform some synchronous operation"),
            pending: Operation::new("perform_async", |_: &Demo, promise: Promise<u32, Failure>| Ok(Outcome::Pending(promise)))
                .describe("perform some asynchronous operation"),
        }
    }

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Decorator<'static>: Send, Sync, std::fmt::Debug);
    }

    #[test]
    fn wrapped_operations_log_sync_and_async_faults() {
        let handler = ErrorHandler::default();
        let mut demo = demo();
        assert_eq!(handler.wrap_all(&mut demo), 2);

        assert!(demo.sync.invoke(&demo, ()).is_err());

        let deferred = Deferred::new();
        let outcome = demo.pending.invoke(&demo, deferred.promise()).unwrap();
        assert!(outcome.is_pending());
        deferred.reject(Failure::from("Something went wrong (asynchronously)."));

        assert_eq!(
            handler.errors().entries(),
            vec![
                "Unable to perform some synchronous operation. demo",
                "Unable to perform some asynchronous operation. Something went wrong (asynchronously).",
            ]
        );
    }

    #[test]
    fn wrapping_twice_with_same_handler_is_idempotent() {
        let handler = ErrorHandler::default();
        let mut demo = demo();

        assert_eq!(handler.wrap_all(&mut demo), 2);
        assert_eq!(handler.wrap_all(&mut demo), 0);
        let _ = demo.sync.invoke(&demo, ());

        assert_eq!(handler.errors().len(), 1);
    }

    #[test]
    fn distinct_handlers_each_log() {
        let first = ErrorHandler::default();
        let second = ErrorHandler::default();
        let mut demo = demo();

        first.wrap_all(&mut demo);
        second.wrap_all(&mut demo);
        let _ = demo.sync.invoke(&demo, ());

        assert_eq!(first.errors().len(), 1);
        assert_eq!(second.errors().len(), 1);
    }

    #[test]
    fn descriptor_is_preserved() {
        let handler = ErrorHandler::default();
        let mut demo = demo();
        handler.wrap_all(&mut demo);

        assert_eq!(demo.sync.name(), "perform_sync");
        assert_eq!(demo.sync.descriptor().description(), Some("perform some synchronous operation"));
    }

    #[test]
    fn emits_decorate_log() {
        let log_capture = LogCapture::new();
        let _guard = log_capture.subscriber().set_default();

        ErrorHandler::default().wrap_all(&mut demo());

        log_capture.assert_contains("DEBUG tripwire::decorate");
        log_capture.assert_contains("operation.name=perform_sync");
        log_capture.assert_contains("operation.name=perform_async");
    }
}
