//! Binder registry lookup.
//!
//! The registry maps a target type to its custom binder. It is filled while
//! the application is built and frozen afterwards; requests only read it, so
//! lookups take no lock. The frozen registry is stored as a service in the
//! application's [`Container`], which is how binding finds it from a request's
//! service scope.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bindery_core::{Container, StartupError};

use crate::binder::ParameterBinder;

struct Registration {
    type_name: &'static str,
    // Holds an `Arc<dyn ParameterBinder<T>>` for the keyed `T`.
    binder: Box<dyn Any + Send + Sync>,
}

/// Frozen map from target type to custom binder.
#[derive(Default)]
pub struct BinderRegistry {
    binders: HashMap<TypeId, Registration>,
}

impl BinderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts collecting registrations.
    #[must_use]
    pub fn builder() -> BinderRegistryBuilder {
        BinderRegistryBuilder::default()
    }

    /// Looks up the custom binder registered for `T`.
    ///
    /// Emits a debug event stating whether one was found.
    #[must_use]
    pub fn lookup<T: Send + 'static>(&self) -> Option<Arc<dyn ParameterBinder<T>>> {
        let binder = self
            .binders
            .get(&TypeId::of::<T>())
            .and_then(|r| r.binder.downcast_ref::<Arc<dyn ParameterBinder<T>>>())
            .cloned();

        log_lookup::<T>(binder.is_some());
        binder
    }

    /// Returns `true` if a binder for `T` is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.binders.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered binders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.binders.len()
    }

    /// Returns `true` if no binders are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }

    /// Names of the types that have a custom binder.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.binders.values().map(|r| r.type_name)
    }
}

impl fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderRegistry")
            .field("types", &self.type_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects binder registrations at startup.
#[derive(Default)]
pub struct BinderRegistryBuilder {
    binders: HashMap<TypeId, Registration>,
}

impl BinderRegistryBuilder {
    /// Registers `binder` for parameters of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::DuplicateBinder`] when `T` already has a
    /// binder. The first registration is kept.
    pub fn register<T, B>(&mut self, binder: B) -> Result<&mut Self, StartupError>
    where
        T: Send + 'static,
        B: ParameterBinder<T>,
    {
        let key = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();
        if self.binders.contains_key(&key) {
            return Err(StartupError::DuplicateBinder { type_name });
        }

        let binder: Arc<dyn ParameterBinder<T>> = Arc::new(binder);
        self.binders.insert(
            key,
            Registration {
                type_name,
                binder: Box::new(binder),
            },
        );
        tracing::debug!(target_type = type_name, "parameter binder registered");
        Ok(self)
    }

    /// Freezes the registrations.
    #[must_use]
    pub fn build(self) -> BinderRegistry {
        BinderRegistry {
            binders: self.binders,
        }
    }
}

impl fmt::Debug for BinderRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderRegistryBuilder")
            .field("binder_count", &self.binders.len())
            .finish()
    }
}

/// Looks up the binder for `T` in a request's service scope.
///
/// A scope without a registry behaves like an empty registry.
#[must_use]
pub fn lookup_binder<T: Send + 'static>(
    services: &Container,
) -> Option<Arc<dyn ParameterBinder<T>>> {
    match services.resolve::<BinderRegistry>() {
        Some(registry) => registry.lookup::<T>(),
        None => {
            log_lookup::<T>(false);
            None
        }
    }
}

fn log_lookup<T>(found: bool) {
    let type_name = bindery_core::short_type_name(std::any::type_name::<T>());
    if found {
        tracing::debug!("ParameterBinder<{}> resolved from registry.", type_name);
    } else {
        tracing::debug!(
            "ParameterBinder<{}> not registered, using default binder.",
            type_name
        );
    }
}
