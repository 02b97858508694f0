//! Startup-frozen service container.
//!
//! Services are registered on a [`ContainerBuilder`] while the application is
//! being built. [`ContainerBuilder::build`] freezes them into a [`Container`]
//! which is shared read-only by every request, so lookups never lock.
//!
//! # Example
//!
//! ```rust
//! use bindery_core::di::ContainerBuilder;
//! use std::sync::Arc;
//!
//! struct Clock;
//!
//! let mut builder = ContainerBuilder::new();
//! builder.register(Arc::new(Clock)).unwrap();
//!
//! // Registering the same type twice is a startup error.
//! assert!(builder.register(Arc::new(Clock)).is_err());
//!
//! let container = builder.build();
//! assert!(container.resolve::<Clock>().is_some());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::StartupError;

/// Read-only service container shared by every request.
#[derive(Default)]
pub struct Container {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a service by type.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| Arc::clone(s).downcast::<T>().ok())
    }

    /// Returns `true` if a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.services.len())
            .finish()
    }
}

/// Collects service registrations during startup.
#[derive(Default)]
pub struct ContainerBuilder {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ContainerBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::DuplicateService`] if a service of the same
    /// type is already registered. The existing registration is kept.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        service: Arc<T>,
    ) -> Result<(), StartupError> {
        let key = TypeId::of::<T>();
        if self.services.contains_key(&key) {
            return Err(StartupError::DuplicateService {
                type_name: std::any::type_name::<T>(),
            });
        }
        self.services.insert(key, service);
        Ok(())
    }

    /// Returns `true` if a service of type `T` is already registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Freezes the registrations.
    #[must_use]
    pub fn build(self) -> Container {
        Container {
            services: self.services,
        }
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("service_count", &self.services.len())
            .finish()
    }
}
