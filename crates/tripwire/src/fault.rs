// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// A failure value as seen by the normalizer.
///
/// Faults come in heterogeneous shapes: transport failures carrying a status code,
/// exception-like errors carrying a message, bare rejection reasons, or no
/// information at all. `Fault` exposes each of these facets so that
/// [`normalize`][crate::normalize] can pick the most specific one.
///
/// Every method except [`text`][Fault::text] has a default, so implementing the
/// trait for a plain reason type only requires its string form.
///
/// # Examples
///
/// ```rust
/// use std::borrow::Cow;
///
/// use tripwire::Fault;
///
/// struct QuotaExceeded {
///     limit: u32,
/// }
///
/// impl Fault for QuotaExceeded {
///     fn code(&self) -> Option<u16> {
///         Some(429)
///     }
///
///     fn text(&self) -> Cow<'_, str> {
///         Cow::Owned(format!("quota of {} requests exceeded", self.limit))
///     }
/// }
/// ```
pub trait Fault {
    /// Failure code, such as an HTTP status, used to look up a fixed message.
    fn code(&self) -> Option<u16> {
        None
    }

    /// Message of an exception-like fault.
    fn message(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Returns `true` when the fault carries no information at all.
    fn is_absent(&self) -> bool {
        false
    }

    /// The fault's own string form.
    fn text(&self) -> Cow<'_, str>;
}

impl Fault for str {
    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Fault for String {
    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Fault for Cow<'_, str> {
    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Fault for () {
    fn is_absent(&self) -> bool {
        true
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }
}

impl<F: Fault> Fault for Option<F> {
    fn code(&self) -> Option<u16> {
        self.as_ref().and_then(Fault::code)
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        self.as_ref().and_then(Fault::message)
    }

    fn is_absent(&self) -> bool {
        self.as_ref().is_none_or(Fault::is_absent)
    }

    fn text(&self) -> Cow<'_, str> {
        self.as_ref().map_or(Cow::Borrowed(""), Fault::text)
    }
}

impl<F: Fault + ?Sized> Fault for &F {
    fn code(&self) -> Option<u16> {
        (**self).code()
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        (**self).message()
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn text(&self) -> Cow<'_, str> {
        (**self).text()
    }
}

impl<F: Fault + ?Sized> Fault for Box<F> {
    fn code(&self) -> Option<u16> {
        (**self).code()
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        (**self).message()
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn text(&self) -> Cow<'_, str> {
        (**self).text()
    }
}

impl<F: Fault + ?Sized> Fault for Arc<F> {
    fn code(&self) -> Option<u16> {
        (**self).code()
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        (**self).message()
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn text(&self) -> Cow<'_, str> {
        (**self).text()
    }
}

impl Fault for dyn StdError + Send + Sync {
    fn message(&self) -> Option<Cow<'_, str>> {
        non_empty(self.to_string())
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl Fault for std::io::Error {
    fn message(&self) -> Option<Cow<'_, str>> {
        non_empty(self.to_string())
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl Fault for http::StatusCode {
    fn code(&self) -> Option<u16> {
        Some(self.as_u16())
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

/// A transport-level failure: a status code and, optionally, the message the
/// remote side sent along with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpFailure {
    status: u16,
    message: Option<String>,
}

impl HttpFailure {
    /// Creates a failure with the given status code and no message.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self { status, message: None }
    }

    /// Attaches the message reported alongside the status.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message.as_deref().and_then(non_empty) {
            Some(message) => write!(f, "status {}: {message}", self.status),
            None => write!(f, "status {}", self.status),
        }
    }
}

impl StdError for HttpFailure {}

impl Fault for HttpFailure {
    fn code(&self) -> Option<u16> {
        Some(self.status)
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        self.message.as_deref().and_then(non_empty)
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl From<http::StatusCode> for HttpFailure {
    fn from(status: http::StatusCode) -> Self {
        Self::new(status.as_u16())
    }
}

/// A failure of any of the shapes the normalizer understands.
///
/// Useful as the error type of operations that may fail in more than one way,
/// for example a collaborator whose synchronous errors are exceptions but whose
/// pending operations reject with bare reasons.
///
/// # Examples
///
/// ```rust
/// use tripwire::{Failure, FaultCodes, HttpFailure, normalize, Descriptor};
///
/// let codes = FaultCodes::default();
/// let descriptor = Descriptor::new("load");
///
/// assert_eq!(normalize(&descriptor, &Failure::from("boom"), &codes), "boom");
/// assert_eq!(
///     normalize(&descriptor, &Failure::from(HttpFailure::new(404)), &codes),
///     "The requested data or service could not be found."
/// );
/// assert_eq!(normalize(&descriptor, &Failure::Unknown, &codes), "An unknown error occurred.");
/// ```
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Failure {
    /// A coded, transport-style failure.
    Status(HttpFailure),
    /// An exception-like failure; its display form is the message.
    Error(Arc<dyn StdError + Send + Sync>),
    /// A bare rejection reason.
    Reason(Cow<'static, str>),
    /// Nothing is known about the failure.
    Unknown,
}

impl Failure {
    /// Wraps an error value.
    pub fn error(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Error(Arc::from(error.into()))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => fmt::Display::fmt(status, f),
            Self::Error(error) => fmt::Display::fmt(error, f),
            Self::Reason(reason) => f.write_str(reason),
            Self::Unknown => f.write_str("unknown failure"),
        }
    }
}

impl Fault for Failure {
    fn code(&self) -> Option<u16> {
        match self {
            Self::Status(status) => status.code(),
            _ => None,
        }
    }

    fn message(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Status(status) => status.message(),
            Self::Error(error) => non_empty(error.to_string()),
            Self::Reason(_) | Self::Unknown => None,
        }
    }

    fn is_absent(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Reason(reason) => Cow::Borrowed(reason),
            Self::Unknown => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }
}

// An empty message carries no information and is treated as missing.
fn non_empty<'a>(message: impl Into<Cow<'a, str>>) -> Option<Cow<'a, str>> {
    let message = message.into();
    (!message.is_empty()).then_some(message)
}

impl From<&'static str> for Failure {
    fn from(reason: &'static str) -> Self {
        Self::Reason(Cow::Borrowed(reason))
    }
}

impl From<String> for Failure {
    fn from(reason: String) -> Self {
        Self::Reason(Cow::Owned(reason))
    }
}

impl From<HttpFailure> for Failure {
    fn from(status: HttpFailure) -> Self {
        Self::Status(status)
    }
}

impl From<http::StatusCode> for Failure {
    fn from(status: http::StatusCode) -> Self {
        Self::Status(status.into())
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        Self::error(error)
    }
}
