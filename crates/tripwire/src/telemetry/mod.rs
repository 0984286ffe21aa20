// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! # Fault Telemetry
//!
//! Well-known attribute keys attached to the metrics and log events emitted
//! whenever a fault is recorded.
//!
//! Names follow the [OpenTelemetry naming guidelines](https://opentelemetry.io/docs/specs/semconv/general/naming/#general-naming-considerations).

#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;

#[cfg(test)]
pub(crate) mod testing;

use crate::Descriptor;

/// Key used to annotate the name of the operation that failed.
///
/// Values are operation names, preferably in `snake_case`.
/// Examples: `load_data`, `throws_an_error`.
pub const OPERATION_NAME: &str = "tripwire.operation.name";

/// Key used to annotate how the fault surfaced.
///
/// Values are `sync` for faults returned by the call itself and `async` for
/// rejections of a pending operation.
pub const FAULT_KIND: &str = "tripwire.fault.kind";

/// How a fault surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FaultKind {
    Sync,
    Async,
}

impl FaultKind {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Async => "async",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Telemetry {
    #[cfg(any(feature = "metrics", test))]
    pub(crate) fault_counter: Option<opentelemetry::metrics::Counter<u64>>,
}

impl Telemetry {
    pub(crate) fn record(&self, descriptor: &Descriptor, kind: FaultKind, message: &str) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(counter) = &self.fault_counter {
            counter.add(
                1,
                &[
                    opentelemetry::KeyValue::new(OPERATION_NAME, descriptor.name().to_string()),
                    opentelemetry::KeyValue::new(FAULT_KIND, kind.as_str()),
                ],
            );
        }

        tracing::event!(
            name: "tripwire.fault",
            tracing::Level::INFO,
            operation.name = %descriptor.name(),
            fault.kind = kind.as_str(),
            fault.message = %message,
        );
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_keys_are_expected() {
        assert_eq!(OPERATION_NAME, "tripwire.operation.name");
        assert_eq!(FAULT_KIND, "tripwire.fault.kind");
    }

    #[test]
    fn fault_kind_names() {
        assert_eq!(FaultKind::Sync.as_str(), "sync");
        assert_eq!(FaultKind::Async.as_str(), "async");
    }
}
