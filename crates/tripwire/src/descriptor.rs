// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt;

/// Identifies an operation in logs and, through its optional description,
/// in user-facing fault messages.
///
/// The description completes the sentence "Unable to ...", so it should read as
/// a verb phrase such as `"load the customer list"`.
///
/// # Examples
///
/// ```rust
/// use tripwire::Descriptor;
///
/// let descriptor = Descriptor::new("load_customers").describe("load the customer list");
/// assert_eq!(descriptor.name(), "load_customers");
/// assert_eq!(descriptor.description(), Some("load the customer list"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Descriptor {
    name: Cow<'static, str>,
    description: Option<Cow<'static, str>>,
}

impl Descriptor {
    /// Creates a descriptor without a description. Prefer `snake_case` names.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Sets the human-readable description of what the operation does.
    #[must_use]
    pub fn describe(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description, if one was attached.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl From<&'static str> for Descriptor {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Descriptor {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
