// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Message reported for faults with status `404`.
pub const NOT_FOUND_MESSAGE: &str = "The requested data or service could not be found.";

/// Message reported for faults with status `500`.
pub const SERVER_ERROR_MESSAGE: &str = "Unknown errors occurred at the server.";

/// Table mapping failure codes to user-facing messages.
///
/// The table is immutable once handed to an [`ErrorHandler`][crate::ErrorHandler].
/// Codes that are not in the table fall through to the generic message handling
/// of [`normalize`][crate::normalize].
///
/// The default table maps `404` and `500`:
///
/// ```rust
/// use tripwire::FaultCodes;
///
/// let codes = FaultCodes::default();
/// assert_eq!(codes.get(404), Some("The requested data or service could not be found."));
/// assert_eq!(codes.get(500), Some("Unknown errors occurred at the server."));
/// assert_eq!(codes.get(418), None);
/// ```
///
/// Custom tables are built fluently:
///
/// ```rust
/// use tripwire::FaultCodes;
///
/// let codes = FaultCodes::default()
///     .with(401, "Please sign in again.")
///     .with(503, "The service is down for maintenance.");
/// assert_eq!(codes.len(), 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(any(feature = "serde", test), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(feature = "serde", test), serde(transparent))]
pub struct FaultCodes {
    entries: BTreeMap<u16, Cow<'static, str>>,
}

impl FaultCodes {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds or replaces the message for `code`.
    #[must_use]
    pub fn with(mut self, code: u16, message: impl Into<Cow<'static, str>>) -> Self {
        self.entries.insert(code, message.into());
        self
    }

    /// Returns the message for `code`, if any.
    #[must_use]
    pub fn get(&self, code: u16) -> Option<&str> {
        self.entries.get(&code).map(AsRef::as_ref)
    }

    /// Number of mapped codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no code is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the mapped codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.entries.iter().map(|(code, message)| (*code, message.as_ref()))
    }

    /// Parses a table from a JSON object keyed by code.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCodesError`] when the text is not an object of
    /// `"<code>": "<message>"` pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "serde")]
    /// # {
    /// use tripwire::FaultCodes;
    ///
    /// let codes = FaultCodes::from_json(r#"{ "404": "Nothing here.", "409": "Someone else changed this." }"#).unwrap();
    /// assert_eq!(codes.get(409), Some("Someone else changed this."));
    /// # }
    /// ```
    #[cfg(any(feature = "serde", test))]
    pub fn from_json(text: &str) -> Result<Self, FaultCodesError> {
        serde_json::from_str(text).map_err(FaultCodesError::caused_by)
    }
}

impl Default for FaultCodes {
    fn default() -> Self {
        Self::new()
            .with(404, NOT_FOUND_MESSAGE)
            .with(500, SERVER_ERROR_MESSAGE)
    }
}

impl<M: Into<Cow<'static, str>>> Extend<(u16, M)> for FaultCodes {
    fn extend<T: IntoIterator<Item = (u16, M)>>(&mut self, iter: T) {
        self.entries.extend(iter.into_iter().map(|(code, message)| (code, message.into())));
    }
}

impl<M: Into<Cow<'static, str>>> FromIterator<(u16, M)> for FaultCodes {
    fn from_iter<T: IntoIterator<Item = (u16, M)>>(iter: T) -> Self {
        let mut codes = Self::new();
        codes.extend(iter);
        codes
    }
}

/// The fault code table could not be parsed.
#[cfg(any(feature = "serde", test))]
#[ohno::error]
#[display("invalid fault code table")]
pub struct FaultCodesError;
