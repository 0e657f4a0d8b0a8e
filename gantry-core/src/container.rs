// Dependency injection container

use crate::{Error, Provider};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// The dependency injection container.
///
/// A container may have a parent; resolution checks local registrations
/// first and falls back to the parent chain. Request-scoped containers are
/// created with [`Container::child`] and own only their local values.
#[derive(Clone)]
pub struct Container {
    providers: Arc<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>>,
    parent: Option<Arc<Container>>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new DI container");
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            parent: None,
        }
    }

    /// Create a child container that falls back to this container for
    /// anything not registered locally. Used as the per-request scope.
    pub fn child(&self) -> Self {
        trace!("Creating child container scope");
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Register a provider instance
    pub fn register<T: Provider>(&self, instance: T) {
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        trace!(provider = type_name, "Acquiring write lock for registration");
        let mut providers = self.providers.write().unwrap();
        providers.insert(type_id, Arc::new(instance));

        debug!(provider = type_name, "Provider registered in DI container");
    }

    /// Register a provider using a factory function
    pub fn register_factory<T: Provider, F>(&self, factory: F)
    where
        F: FnOnce() -> T,
    {
        let type_name = std::any::type_name::<T>();
        debug!(provider = type_name, "Creating provider from factory");

        let instance = factory();
        self.register(instance);
    }

    /// Resolve a provider by type, checking the parent chain on a local miss
    pub fn resolve<T: Provider>(&self) -> Result<Arc<T>, Error> {
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        trace!(provider = type_name, "Attempting to resolve provider");
        let local = {
            let providers = self.providers.read().unwrap();
            providers
                .get(&type_id)
                .and_then(|any| any.clone().downcast::<T>().ok())
        };

        if let Some(instance) = local {
            debug!(provider = type_name, "Provider resolved from local scope");
            return Ok(instance);
        }

        if let Some(parent) = &self.parent {
            trace!(provider = type_name, "Falling back to parent container");
            return parent.resolve::<T>();
        }

        debug!(provider = type_name, "Provider not found in container");
        Err(Error::ProviderNotFound(format!(
            "Provider not found: {}",
            type_name
        )))
    }

    /// Check if a provider is registered here or anywhere up the chain
    pub fn has<T: Provider>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        let local = self.providers.read().unwrap().contains_key(&type_id);
        let exists = local || self.parent.as_ref().is_some_and(|p| p.has::<T>());

        trace!(provider = type_name, exists = exists, "Checked provider existence");
        exists
    }

    /// Clear all locally registered providers (the parent is untouched)
    pub fn clear(&self) {
        let mut providers = self.providers.write().unwrap();
        let count = providers.len();
        providers.clear();

        debug!(provider_count = count, "Cleared all providers from container");
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
