// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for decorating registered collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tripwire::{
    Collaborator, Decorator, Deferred, ErrorHandler, Eventual, Failure, Operation, Outcome, Promise, Registry, RegistryErrorKind,
};

type Op<A, T> = Operation<DecoratedService, A, Outcome<T, Failure>, Failure>;

struct DecoratedService {
    calls: AtomicUsize,
    perform_sync: Op<(), ()>,
    perform_async: Op<Promise<String, Failure>, String>,
}

impl Collaborator for DecoratedService {
    fn operations(&mut self, decorator: &mut Decorator<'_>) {
        decorator.wrap(&mut self.perform_sync);
        decorator.wrap(&mut self.perform_async);
    }
}

fn decorated_service() -> DecoratedService {
    DecoratedService {
        calls: AtomicUsize::new(0),
        perform_sync: Operation::new("perform_sync", |service: &DecoratedService, (): ()| {
            service.calls.fetch_add(1, Ordering::SeqCst);
            Err(Failure::from("Something went wrong."))
        })
        .describe("perform some synchronous operation"),
        perform_async: Operation::new("perform_async", |service: &DecoratedService, promise: Promise<String, Failure>| {
            service.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::Pending(promise))
        })
        .describe("perform some asynchronous operation"),
    }
}

fn registry_with_service() -> Registry {
    let registry = Registry::new();
    registry.register("decorated_service", decorated_service).unwrap();
    registry
}

#[test]
fn decorated_operations_behave_like_undecorated_ones() {
    let plain = decorated_service();
    let registry = registry_with_service();
    let handler = ErrorHandler::default();
    handler.decorate(&registry, ["decorated_service"]).unwrap();
    let decorated = registry.resolve::<DecoratedService>("decorated_service").unwrap();

    let plain_error = plain.perform_sync.invoke(&plain, ()).unwrap_err();
    let decorated_error = decorated.perform_sync.invoke(&decorated, ()).unwrap_err();

    assert_eq!(plain_error.to_string(), decorated_error.to_string());
    assert_eq!(decorated.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        handler.errors().entries(),
        vec!["Unable to perform some synchronous operation. Something went wrong."]
    );
}

#[test]
fn decorated_pending_operation_logs_rejection() {
    let registry = registry_with_service();
    let handler = ErrorHandler::default();
    handler.decorate(&registry, ["decorated_service"]).unwrap();
    let service = registry.resolve::<DecoratedService>("decorated_service").unwrap();

    let deferred = Deferred::new();
    let outcome = service.perform_async.invoke(&service, deferred.promise()).unwrap();
    assert!(outcome.promise().unwrap().ptr_eq(&deferred.promise()));
    assert!(handler.errors().is_empty());

    deferred.reject(Failure::from("Something went wrong (asynchronously)."));

    assert_eq!(
        handler.errors().entries(),
        vec!["Unable to perform some asynchronous operation. Something went wrong (asynchronously)."]
    );
}

#[test]
fn decorated_success_is_untouched() {
    let registry = registry_with_service();
    let handler = ErrorHandler::default();
    handler.decorate(&registry, ["decorated_service"]).unwrap();
    let service = registry.resolve::<DecoratedService>("decorated_service").unwrap();

    let deferred = Deferred::new();
    let outcome = service.perform_async.invoke(&service, deferred.promise()).unwrap();
    deferred.resolve("done".to_string());

    assert!(handler.errors().is_empty());
    assert!(!outcome.promise().unwrap().is_pending());
}

#[test]
fn decorating_twice_does_not_double_log() {
    let registry = registry_with_service();
    let handler = ErrorHandler::default();
    handler.decorate(&registry, ["decorated_service"]).unwrap();
    handler.decorate(&registry, ["decorated_service"]).unwrap();
    let service = registry.resolve::<DecoratedService>("decorated_service").unwrap();

    let _ = service.perform_sync.invoke(&service, ());

    assert_eq!(handler.errors().len(), 1);
}

#[test]
fn decorating_after_resolution_is_rejected() {
    let registry = registry_with_service();
    let _ = registry.resolve::<DecoratedService>("decorated_service").unwrap();

    let error = ErrorHandler::default()
        .decorate(&registry, ["decorated_service"])
        .unwrap_err();

    assert_eq!(error.kind(), RegistryErrorKind::AlreadyResolved);
    assert_eq!(error.name(), "decorated_service");
}

#[test]
fn resolved_instance_is_shared() {
    let registry = registry_with_service();
    let handler = ErrorHandler::default();
    handler.decorate(&registry, ["decorated_service"]).unwrap();

    let first = registry.resolve::<DecoratedService>("decorated_service").unwrap();
    let second = registry.resolve::<DecoratedService>("decorated_service").unwrap();
    let _ = first.perform_sync.invoke(&first, ());
    let _ = second.perform_sync.invoke(&second, ());

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.calls.load(Ordering::SeqCst), 2);
    assert_eq!(handler.errors().len(), 2);
}

#[test]
fn two_handlers_both_record() {
    let registry = registry_with_service();
    let first = ErrorHandler::default();
    let second = ErrorHandler::default();
    first.decorate(&registry, ["decorated_service"]).unwrap();
    second.decorate(&registry, ["decorated_service"]).unwrap();

    let service = registry.resolve::<DecoratedService>("decorated_service").unwrap();
    let _ = service.perform_sync.invoke(&service, ());

    assert_eq!(first.errors().len(), 1);
    assert_eq!(second.errors().len(), 1);
}
