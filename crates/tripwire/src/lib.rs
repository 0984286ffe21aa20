// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Capture, normalize, and log the failures of wrapped operations.
//!
//! An [`ErrorHandler`] runs operations on behalf of a caller. Whenever an
//! operation fails, synchronously or through the eventual rejection of a
//! pending operation, the failure is translated into a user-facing message and
//! appended to the handler's [`ErrorLog`]. The original failure still reaches
//! callers who want it.
//!
//! # Core Types
//!
//! - [`ErrorHandler`]: intercepts calls through [`call`][ErrorHandler::call] and
//!   pending operations through [`watch`][ErrorHandler::watch].
//! - [`Operation`]: a named, shareable callable with an optional description.
//! - [`Promise`] and [`Deferred`]: a pending operation and its producer side.
//! - [`Outcome`] and [`Eventual`]: return shapes that may carry a pending operation.
//! - [`Fault`]: the view of a failure value the normalizer works with.
//! - [`FaultCodes`]: the table translating failure codes into fixed messages.
//!
//! # Quick Start
//!
//! ```rust
//! use tripwire::{ErrorHandler, Failure, Operation, Outcome};
//!
//! struct Service;
//!
//! let throws_an_error = Operation::new("throws_an_error", |_: &Service, (): ()| {
//!     Err::<Outcome<(), Failure>, _>(Failure::from("Something went wrong."))
//! })
//! .describe("perform some synchronous operation");
//!
//! let handler = ErrorHandler::default();
//! let result = handler.call(&throws_an_error, &Service, ());
//!
//! assert!(result.is_err());
//! assert_eq!(
//!     handler.errors().entries(),
//!     vec!["Unable to perform some synchronous operation. Something went wrong."]
//! );
//! ```
//!
//! # Message Normalization
//!
//! [`normalize`] picks the most specific information a fault carries: a mapped
//! failure code, then an embedded message, then a fixed fallback for faults
//! that carry nothing, then the fault's own string form. A description on the
//! operation turns the message into `"Unable to <description>. <message>"`.
//!
//! # Synchronous and Asynchronous Failures
//!
//! A synchronous failure is logged and returned to the caller. A pending
//! operation is returned immediately; its rejection is logged when it happens
//! and is not handed back a second time. The log therefore records failures in
//! the order they complete, not the order in which the operations were called.
//!
//! Native futures are covered by the [`Report`] middleware, which plugs into
//! [`layered`] service stacks.
//!
//! # Decoration
//!
//! Types implementing [`Collaborator`] expose their operations to a
//! [`Decorator`]. [`ErrorHandler::decorate`] marks collaborators of a
//! [`Registry`] so that every one of their operations is intercepted from the
//! moment they are resolved, without changing any call site.
//!
//! # Telemetry
//!
//! Every recorded fault emits a `tripwire.fault` [`tracing`] event carrying the
//! operation name, the fault kind (`sync` or `async`) and the message.
//! Interception and decoration emit `tripwire.call` and `tripwire.decorate`
//! events at `DEBUG` level.
//!
//! ## Features
//!
//! - `metrics`: reports a `tripwire.fault` OpenTelemetry counter, see
//!   [`ErrorHandlerBuilder::enable_metrics`].
//! - `serde`: serialization of [`FaultCodes`] and [`FaultCodes::from_json`].

mod codes;
mod decorate;
mod descriptor;
mod fault;
mod handler;
mod layer;
mod log;
mod normalize;
mod operation;
mod outcome;
mod promise;
mod registry;
pub mod telemetry;

#[cfg(any(feature = "serde", test))]
pub use codes::FaultCodesError;
pub use codes::{FaultCodes, NOT_FOUND_MESSAGE, SERVER_ERROR_MESSAGE};
pub use decorate::{Collaborator, Decorator};
pub use descriptor::Descriptor;
pub use fault::{Failure, Fault, HttpFailure};
pub use handler::{ErrorHandler, ErrorHandlerBuilder};
pub use layer::{Report, ReportLayer};
pub use log::ErrorLog;
pub use normalize::{UNKNOWN_FAULT_MESSAGE, normalize};
pub use operation::Operation;
pub use outcome::{Eventual, Outcome, Resource};
pub use promise::{Deferred, Promise, PromiseDriver, Settled};
pub use registry::{Registry, RegistryError, RegistryErrorKind};
