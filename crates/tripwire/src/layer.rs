// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use layered::{Layer, Service};

use crate::telemetry::FaultKind;
use crate::{Descriptor, ErrorHandler, Fault};

/// Middleware that records the failures of an asynchronous service.
///
/// `Report` wraps any [`Service`] whose output is a `Result` and hands every
/// `Err` output to an [`ErrorHandler`], which appends the normalized message to
/// its log. Outputs pass through unchanged, so callers still see the error.
///
/// This is the native-future counterpart of [`ErrorHandler::watch`].
///
/// # Examples
///
/// ```rust
/// use layered::{Execute, Layer, Service};
/// use tripwire::{Descriptor, ErrorHandler, Report};
///
/// # async fn example() {
/// let handler = ErrorHandler::default();
/// let layer = Report::layer(&handler, Descriptor::new("fetch_user").describe("fetch the user"));
///
/// let service = layer.layer(Execute::new(|id: u32| async move {
///     if id == 0 { Err("user 0 does not exist".to_string()) } else { Ok(id) }
/// }));
///
/// assert!(service.execute(0).await.is_err());
/// assert_eq!(
///     handler.errors().entries(),
///     vec!["Unable to fetch the user. user 0 does not exist"]
/// );
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Report<S> {
    handler: ErrorHandler,
    descriptor: Descriptor,
    inner: S,
}

/// Creates [`Report`] middleware. See [`Report::layer`].
#[derive(Clone, Debug)]
pub struct ReportLayer {
    handler: ErrorHandler,
    descriptor: Descriptor,
}

impl Report<()> {
    /// Creates a layer reporting failures to `handler` as the operation described by `descriptor`.
    #[must_use]
    pub fn layer(handler: &ErrorHandler, descriptor: impl Into<Descriptor>) -> ReportLayer {
        ReportLayer {
            handler: handler.clone(),
            descriptor: descriptor.into(),
        }
    }
}

impl<S> Layer<S> for ReportLayer {
    type Service = Report<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Report {
            handler: self.handler.clone(),
            descriptor: self.descriptor.clone(),
            inner,
        }
    }
}

impl<In, T, E, S> Service<In> for Report<S>
where
    In: Send,
    S: Service<In, Out = Result<T, E>>,
    E: Fault,
{
    type Out = Result<T, E>;

    async fn execute(&self, input: In) -> Self::Out {
        tracing::event!(
            name: "tripwire.call",
            tracing::Level::DEBUG,
            operation.name = %self.descriptor.name(),
        );

        let output = self.inner.execute(input).await;

        if let Err(fault) = &output {
            self.handler.report(&self.descriptor, fault, FaultKind::Async);
        }

        output
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(not(miri))]
#[cfg(test)]
mod tests {
    use layered::Execute;

    use super::*;
    use crate::{Failure, HttpFailure};

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(ReportLayer: Send, Sync, Clone);
        static_assertions::assert_impl_all!(Report<Execute<fn(u32) -> std::future::Ready<Result<u32, String>>>>: Send, Sync);
    }

    #[tokio::test]
    async fn passes_success_through_without_logging() {
        let handler = ErrorHandler::default();
        let service = Report::layer(&handler, "double").layer(Execute::new(|value: u32| async move { Ok::<_, Failure>(value * 2) }));

        assert_eq!(service.execute(4).await.unwrap(), 8);
        assert!(handler.errors().is_empty());
    }

    #[tokio::test]
    async fn reports_and_returns_errors() {
        let handler = ErrorHandler::default();
        let service = Report::layer(&handler, Descriptor::new("load").describe("load the example data"))
            .layer(Execute::new(|(): ()| async move { Err::<(), _>(HttpFailure::new(404)) }));

        let error = service.execute(()).await.unwrap_err();

        assert_eq!(error.status(), 404);
        assert_eq!(
            handler.errors().entries(),
            vec!["Unable to load the example data. The requested data or service could not be found."]
        );
    }

    #[tokio::test]
    async fn every_failure_is_reported() {
        let handler = ErrorHandler::default();
        let service = Report::layer(&handler, "parse").layer(Execute::new(|text: &'static str| async move {
            text.parse::<u32>().map_err(Failure::error)
        }));

        let _ = service.execute("x").await;
        let _ = service.execute("7").await;
        let _ = service.execute("y").await;

        assert_eq!(handler.errors().len(), 2);
    }
}
