// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{Descriptor, Fault, FaultCodes};

/// Message used when a fault carries no information at all.
pub const UNKNOWN_FAULT_MESSAGE: &str = "An unknown error occurred.";

/// Translates a fault into the user-facing message recorded in the error log.
///
/// The most specific information wins:
///
/// 1. a failure code with an entry in `codes` yields the mapped message;
/// 2. otherwise the fault's message, when it is exception-like;
/// 3. otherwise [`UNKNOWN_FAULT_MESSAGE`] when the fault is absent;
/// 4. otherwise the fault's own string form.
///
/// When the descriptor has a description the result reads
/// `"Unable to <description>. <message>"`.
///
/// # Examples
///
/// ```rust
/// use tripwire::{normalize, Descriptor, FaultCodes, HttpFailure};
///
/// let codes = FaultCodes::default();
/// let descriptor = Descriptor::new("load").describe("load the example data");
///
/// assert_eq!(
///     normalize(&descriptor, &HttpFailure::new(404).with_message("oops"), &codes),
///     "Unable to load the example data. The requested data or service could not be found."
/// );
/// ```
#[must_use]
pub fn normalize<F>(descriptor: &Descriptor, fault: &F, codes: &FaultCodes) -> String
where
    F: Fault + ?Sized,
{
    let message = fault
        .code()
        .and_then(|code| codes.get(code))
        .map(str::to_string)
        .or_else(|| fault.message().map(Into::into))
        .unwrap_or_else(|| {
            if fault.is_absent() {
                UNKNOWN_FAULT_MESSAGE.to_string()
            } else {
                fault.text().into_owned()
            }
        });

    match descriptor.description() {
        Some(description) => format!("Unable to {description}. {message}"),
        None => message,
    }
}
