// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Collaborator, ErrorHandler};

type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Named collaborators created on first use.
///
/// Each name is bound to a factory. The first [`resolve`][Registry::resolve]
/// of a name runs the factory, applies every handler that
/// [decorated][ErrorHandler::decorate] the name, and keeps the result; later
/// resolutions return the same instance.
///
/// # Examples
///
/// ```rust
/// use tripwire::{Collaborator, Decorator, ErrorHandler, Failure, Operation, Outcome, Registry};
///
/// struct ExampleService {
///     load_data: Operation<ExampleService, (), Outcome<Vec<u32>, Failure>, Failure>,
/// }
///
/// impl Collaborator for ExampleService {
///     fn operations(&mut self, decorator: &mut Decorator<'_>) {
///         decorator.wrap(&mut self.load_data);
///     }
/// }
///
/// let registry = Registry::new();
/// registry
///     .register("example_service", || ExampleService {
///         load_data: Operation::new("load_data", |_: &ExampleService, (): ()| Err(Failure::from("offline")))
///             .describe("load the example data"),
///     })
///     .unwrap();
///
/// let handler = ErrorHandler::default();
/// handler.decorate(&registry, ["example_service"]).unwrap();
///
/// let service = registry.resolve::<ExampleService>("example_service").unwrap();
/// assert!(service.load_data.invoke(&service, ()).is_err());
/// assert_eq!(handler.errors().entries(), vec!["Unable to load the example data. offline"]);
/// ```
#[derive(Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    factories: HashMap<Cow<'static, str>, Box<dyn Any + Send + Sync>>,
    instances: HashMap<Cow<'static, str>, Arc<dyn Any + Send + Sync>>,
    decorations: HashMap<Cow<'static, str>, Vec<ErrorHandler>>,
    resolving: HashMap<Cow<'static, str>, usize>,
}

impl RegistryState {
    fn check_decoratable(&self, name: &Cow<'static, str>) -> Result<(), RegistryError> {
        if self.instances.contains_key(name) {
            return Err(RegistryError::new(name.clone(), RegistryErrorKind::AlreadyResolved));
        }

        if self.resolving.contains_key(name) {
            return Err(RegistryError::new(name.clone(), RegistryErrorKind::Resolving));
        }

        Ok(())
    }
}

/// Marks a name as being resolved for as long as it lives.
struct Resolving<'a> {
    registry: &'a Registry,
    name: &'a str,
}

impl<'a> Resolving<'a> {
    fn start(state: &mut RegistryState, registry: &'a Registry, name: &'a str) -> Self {
        *state.resolving.entry(Cow::Owned(name.to_string())).or_default() += 1;
        Self { registry, name }
    }
}

impl Drop for Resolving<'_> {
    fn drop(&mut self) {
        let mut state = self.registry.state.lock();
        if let Some(count) = state.resolving.get_mut(self.name) {
            *count -= 1;
            if *count == 0 {
                state.resolving.remove(self.name);
            }
        }
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `factory`, replacing any previous factory.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if `name` was already resolved.
    pub fn register<T, F>(&self, name: impl Into<Cow<'static, str>>, factory: F) -> Result<(), RegistryError>
    where
        T: Collaborator,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let name = name.into();
        let mut state = self.state.lock();
        if state.instances.contains_key(&name) {
            return Err(RegistryError::new(name, RegistryErrorKind::AlreadyResolved));
        }

        let factory: Factory<T> = Arc::new(factory);
        state.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Returns the collaborator bound to `name`, creating and decorating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if nothing is registered under `name`, or if the
    /// registered collaborator is not a `T`.
    pub fn resolve<T: Collaborator>(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        let (factory, handlers, _resolving) = {
            let mut state = self.state.lock();
            if let Some(instance) = state.instances.get(name) {
                return downcast(name, Arc::clone(instance));
            }

            let factory = state
                .factories
                .get(name)
                .ok_or_else(|| RegistryError::new(name, RegistryErrorKind::NotRegistered))?
                .downcast_ref::<Factory<T>>()
                .ok_or_else(|| RegistryError::new(name, RegistryErrorKind::TypeMismatch))?;

            let factory = Arc::clone(factory);
            let handlers = state.decorations.get(name).cloned().unwrap_or_default();
            (factory, handlers, Resolving::start(&mut state, self, name))
        };

        // The factory and decoration run unlocked so that they may resolve other collaborators.
        // Decorating the name is rejected until the instance is stored.
        let mut instance = factory();
        for handler in &handlers {
            handler.wrap_all(&mut instance);
        }

        let mut state = self.state.lock();
        let instance = state
            .instances
            .entry(Cow::Owned(name.to_string()))
            .or_insert_with(|| Arc::new(instance) as Arc<dyn Any + Send + Sync>);
        downcast(name, Arc::clone(instance))
    }

    /// Returns `true` if `name` has been resolved.
    #[must_use]
    pub fn is_resolved(&self, name: &str) -> bool {
        self.state.lock().instances.contains_key(name)
    }

    pub(crate) fn mark_for_decoration(&self, names: Vec<Cow<'static, str>>, handler: &ErrorHandler) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        for name in &names {
            state.check_decoratable(name)?;
        }

        for name in names {
            let handlers = state.decorations.entry(name).or_default();
            if handlers.iter().all(|existing| existing.id() != handler.id()) {
                handlers.push(handler.clone());
            }
        }

        Ok(())
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        let mut registered: Vec<&str> = state.factories.keys().map(|name| &**name).collect();
        registered.sort_unstable();
        let mut resolved: Vec<&str> = state.instances.keys().map(|name| &**name).collect();
        resolved.sort_unstable();

        f.debug_struct("Registry")
            .field("registered", &registered)
            .field("resolved", &resolved)
            .finish()
    }
}

fn downcast<T: Collaborator>(name: &str, instance: Arc<dyn Any + Send + Sync>) -> Result<Arc<T>, RegistryError> {
    instance
        .downcast::<T>()
        .map_err(|_instance| RegistryError::new(name, RegistryErrorKind::TypeMismatch))
}

/// What went wrong when using a [`Registry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryErrorKind {
    /// No collaborator is registered under the name.
    NotRegistered,
    /// The collaborator registered under the name has a different type.
    TypeMismatch,
    /// The collaborator was already resolved, so it can no longer be changed.
    AlreadyResolved,
    /// The collaborator is being resolved right now, so it can no longer be decorated.
    Resolving,
}

impl Display for RegistryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotRegistered => "no collaborator registered",
            Self::TypeMismatch => "collaborator has a different type",
            Self::AlreadyResolved => "collaborator already resolved",
            Self::Resolving => "collaborator is being resolved",
        })
    }
}

/// A [`Registry`] operation failed.
#[ohno::error]
#[display("{kind}: {name}")]
pub struct RegistryError {
    name: String,
    kind: RegistryErrorKind,
}

impl RegistryError {
    /// The collaborator name the operation was about.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> RegistryErrorKind {
        self.kind
    }
}
