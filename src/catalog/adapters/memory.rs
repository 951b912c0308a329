//! In-memory resource and prompt repositories.

use crate::catalog::{
    domain::{Prompt, PromptName, Resource, ResourceUri},
    ports::{
        CatalogRepositoryError, CatalogRepositoryResult, PromptRepository, ResourceRepository,
    },
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Ordered map shared by both repositories.
#[derive(Debug)]
struct Store<K, V> {
    entries: Arc<RwLock<BTreeMap<K, V>>>,
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

fn poisoned(err: &impl fmt::Display) -> CatalogRepositoryError {
    CatalogRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

impl<K: Ord + Clone, V: Clone> Store<K, V> {
    fn insert(&self, key: K, value: V) -> CatalogRepositoryResult<()> {
        self.entries.write().map_err(|err| poisoned(&err))?.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> CatalogRepositoryResult<Option<V>> {
        Ok(self.entries.read().map_err(|err| poisoned(&err))?.get(key).cloned())
    }

    fn values(&self) -> CatalogRepositoryResult<Vec<V>> {
        Ok(self.entries.read().map_err(|err| poisoned(&err))?.values().cloned().collect())
    }

    fn contains(&self, key: &K) -> CatalogRepositoryResult<bool> {
        Ok(self.entries.read().map_err(|err| poisoned(&err))?.contains_key(key))
    }

    fn len(&self) -> CatalogRepositoryResult<usize> {
        Ok(self.entries.read().map_err(|err| poisoned(&err))?.len())
    }

    fn remove(&self, key: &K) -> CatalogRepositoryResult<bool> {
        Ok(self.entries.write().map_err(|err| poisoned(&err))?.remove(key).is_some())
    }
}

/// Thread-safe in-memory resource repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceRepository {
    store: Store<ResourceUri, Resource>,
}

impl InMemoryResourceRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn save(&self, resource: &Resource) -> CatalogRepositoryResult<()> {
        self.store.insert(resource.uri().clone(), resource.clone())
    }

    async fn find_by_uri(&self, uri: &ResourceUri) -> CatalogRepositoryResult<Option<Resource>> {
        self.store.get(uri)
    }

    async fn find_all(&self) -> CatalogRepositoryResult<Vec<Resource>> {
        self.store.values()
    }

    async fn exists(&self, uri: &ResourceUri) -> CatalogRepositoryResult<bool> {
        self.store.contains(uri)
    }

    async fn count(&self) -> CatalogRepositoryResult<usize> {
        self.store.len()
    }

    async fn delete(&self, uri: &ResourceUri) -> CatalogRepositoryResult<bool> {
        self.store.remove(uri)
    }
}

/// Thread-safe in-memory prompt repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPromptRepository {
    store: Store<PromptName, Prompt>,
}

impl InMemoryPromptRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromptRepository for InMemoryPromptRepository {
    async fn save(&self, prompt: &Prompt) -> CatalogRepositoryResult<()> {
        self.store.insert(prompt.name().clone(), prompt.clone())
    }

    async fn find_by_name(&self, name: &PromptName) -> CatalogRepositoryResult<Option<Prompt>> {
        self.store.get(name)
    }

    async fn find_all(&self) -> CatalogRepositoryResult<Vec<Prompt>> {
        self.store.values()
    }

    async fn exists(&self, name: &PromptName) -> CatalogRepositoryResult<bool> {
        self.store.contains(name)
    }

    async fn count(&self) -> CatalogRepositoryResult<usize> {
        self.store.len()
    }

    async fn delete(&self, name: &PromptName) -> CatalogRepositoryResult<bool> {
        self.store.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resources_are_ordered_by_uri() {
        let repository = InMemoryResourceRepository::new();
        for uri in ["file:///b", "file:///a"] {
            let resource =
                Resource::new(ResourceUri::new(uri).expect("valid URI"), "doc").expect("valid");
            repository.save(&resource).await.expect("save");
        }

        let uris: Vec<String> = repository
            .find_all()
            .await
            .expect("list")
            .iter()
            .map(|resource| resource.uri().to_string())
            .collect();

        assert_eq!(uris, ["file:///a", "file:///b"]);
    }

    #[tokio::test]
    async fn prompt_delete_reports_presence() {
        let repository = InMemoryPromptRepository::new();
        let name = PromptName::new("greet").expect("valid name");
        repository
            .save(&Prompt::new(name.clone()))
            .await
            .expect("save");

        assert!(repository.exists(&name).await.expect("exists"));
        assert!(repository.delete(&name).await.expect("delete"));
        assert_eq!(repository.count().await.expect("count"), 0);
    }
}
