// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Walks through the ways failures reach the error log:
//!
//! 1. Manual interception of an undecorated service with `ErrorHandler::call`
//! 2. Automatic interception of a decorated collaborator resolved from a `Registry`
//! 3. A realistic scenario where loading data fails with a coded, HTTP-style failure

use std::time::Duration;

use tracing_subscriber::util::SubscriberInitExt;
use tripwire::{
    Collaborator, Decorator, ErrorHandler, Eventual, Failure, HttpFailure, Operation, Outcome, Promise, Registry, RegistryError, Resource,
};

struct UndecoratedService;

struct DecoratedService {
    throws_an_error: Operation<Self, (), Outcome<(), Failure>, Failure>,
    promise_rejects_after_a_while: Operation<Self, (), Outcome<(), Failure>, Failure>,
}

impl Collaborator for DecoratedService {
    fn operations(&mut self, decorator: &mut Decorator<'_>) {
        decorator.wrap(&mut self.throws_an_error);
        decorator.wrap(&mut self.promise_rejects_after_a_while);
    }
}

struct ExampleService {
    load_data: Operation<Self, bool, Resource<String, Failure>, Failure>,
}

impl Collaborator for ExampleService {
    fn operations(&mut self, decorator: &mut Decorator<'_>) {
        decorator.wrap(&mut self.load_data);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), RegistryError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .finish()
        .init();

    let handler = ErrorHandler::default();

    manual_handling(&handler).await;
    automatic_handling(&handler).await?;
    example_scenario(&handler).await?;

    println!("\nerror log:");
    for (index, entry) in handler.errors().iter().enumerate() {
        println!("{index}: {entry}");
    }

    Ok(())
}

async fn manual_handling(handler: &ErrorHandler) {
    let throws_an_error = Operation::new("throws_an_error", |_: &UndecoratedService, (): ()| {
        Err::<Outcome<(), Failure>, _>(Failure::error("This is an error from throws_an_error."))
    });
    let promise_rejects = Operation::new("promise_rejects", |_: &UndecoratedService, (): ()| {
        Ok::<_, Failure>(reject_later("Something went wrong (asynchronously)."))
    });

    // The failure is logged and still returned.
    if let Err(error) = handler.call(&throws_an_error, &UndecoratedService, ()) {
        println!("manual: call returned '{error}'");
    }

    // The rejection is only logged, once it happens.
    if let Ok(outcome) = handler.call(&promise_rejects, &UndecoratedService, ()) {
        settle(&outcome).await;
    }
}

async fn automatic_handling(handler: &ErrorHandler) -> Result<(), RegistryError> {
    let registry = Registry::new();
    registry
        .register("decorated_service", || DecoratedService {
            throws_an_error: Operation::new("throws_an_error", |_: &DecoratedService, (): ()| {
                Err(Failure::error("You won't believe what just happened!"))
            })
            .describe("perform some synchronous operation"),
            promise_rejects_after_a_while: Operation::new("promise_rejects_after_a_while", |_: &DecoratedService, (): ()| {
                Ok(reject_later("Something happened, but I'm not sure how to fix it."))
            })
            .describe("perform some asynchronous operation"),
        })?;
    handler.decorate(&registry, ["decorated_service"])?;

    let service = registry.resolve::<DecoratedService>("decorated_service")?;

    // No call site mentions the handler, yet both failures are logged.
    let _ = service.throws_an_error.invoke(&service, ());
    if let Ok(outcome) = service.promise_rejects_after_a_while.invoke(&service, ()) {
        settle(&outcome).await;
    }

    Ok(())
}

async fn example_scenario(handler: &ErrorHandler) -> Result<(), RegistryError> {
    let registry = Registry::new();
    registry
        .register("example_service", || ExampleService {
            load_data: Operation::new("load_data", |_: &ExampleService, successful: bool| Ok(Resource::new(fetch(successful))))
                .describe("load the example data from the 'realistic scenario'"),
        })?;
    handler.decorate(&registry, ["example_service"])?;

    let service = registry.resolve::<ExampleService>("example_service")?;

    for successful in [true, false] {
        if let Ok(data) = service.load_data.invoke(&service, successful) {
            settle(&data).await;
            println!("example: loaded {:?}", data.get());
        }
    }

    Ok(())
}

fn reject_later(reason: &'static str) -> Outcome<(), Failure> {
    let (promise, driver) = Promise::from_future(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Err(Failure::from(reason))
    });
    tokio::spawn(driver);
    Outcome::Pending(promise)
}

fn fetch(successful: bool) -> Promise<String, Failure> {
    let (promise, driver) = Promise::from_future(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if successful {
            Ok("data".to_string())
        } else {
            Err(Failure::from(HttpFailure::new(404).with_message("GET /doesnt_exist")))
        }
    });
    tokio::spawn(driver);
    promise
}

async fn settle<O>(outcome: &O)
where
    O: Eventual<Reason = Failure>,
    O::Value: Clone,
{
    if let Some(promise) = outcome.promise() {
        let _ = promise.settled().await;
    }
}
