//! In-memory tool repository.

use crate::tool::{
    domain::{Tool, ToolName},
    ports::{ToolRepository, ToolRepositoryError, ToolRepositoryResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory tool repository ordered by tool name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolRepository {
    tools: Arc<RwLock<BTreeMap<ToolName, Tool>>>,
}

impl InMemoryToolRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ToolRepositoryResult<RwLockReadGuard<'_, BTreeMap<ToolName, Tool>>> {
        self.tools
            .read()
            .map_err(|err| ToolRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> ToolRepositoryResult<RwLockWriteGuard<'_, BTreeMap<ToolName, Tool>>> {
        self.tools
            .write()
            .map_err(|err| ToolRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn filtered(&self, predicate: impl Fn(&Tool) -> bool) -> ToolRepositoryResult<Vec<Tool>> {
        Ok(self
            .read()?
            .values()
            .filter(|tool| predicate(tool))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ToolRepository for InMemoryToolRepository {
    async fn save(&self, tool: &Tool) -> ToolRepositoryResult<()> {
        self.write()?.insert(tool.name().clone(), tool.clone());
        Ok(())
    }

    async fn find_by_name(&self, name: &ToolName) -> ToolRepositoryResult<Option<Tool>> {
        Ok(self.read()?.get(name).cloned())
    }

    async fn find_all(&self) -> ToolRepositoryResult<Vec<Tool>> {
        self.filtered(|_| true)
    }

    async fn find_by_category(&self, category: &str) -> ToolRepositoryResult<Vec<Tool>> {
        self.filtered(|tool| tool.category() == Some(category))
    }

    async fn find_by_tag(&self, tag: &str) -> ToolRepositoryResult<Vec<Tool>> {
        self.filtered(|tool| tool.has_tag(tag))
    }

    async fn find_enabled(&self) -> ToolRepositoryResult<Vec<Tool>> {
        self.filtered(Tool::is_enabled)
    }

    async fn exists(&self, name: &ToolName) -> ToolRepositoryResult<bool> {
        Ok(self.read()?.contains_key(name))
    }

    async fn count(&self) -> ToolRepositoryResult<usize> {
        Ok(self.read()?.len())
    }

    async fn delete(&self, name: &ToolName) -> ToolRepositoryResult<bool> {
        Ok(self.write()?.remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn tool(name: &str) -> Tool {
        Tool::new(
            ToolName::new(name).expect("valid name"),
            format!("{name} tool"),
            json!({"type": "object"}),
            &DefaultClock,
        )
        .expect("valid tool")
    }

    #[fixture]
    fn repository() -> InMemoryToolRepository {
        InMemoryToolRepository::new()
    }

    #[rstest]
    #[tokio::test]
    async fn save_replaces_by_name(repository: InMemoryToolRepository) {
        repository.save(&tool("echo")).await.expect("save");
        repository
            .save(&tool("echo").with_category("utility"))
            .await
            .expect("save");

        assert_eq!(repository.count().await.expect("count"), 1);
        let stored = repository
            .find_by_name(&ToolName::new("echo").expect("valid name"))
            .await
            .expect("lookup")
            .expect("stored");
        assert_eq!(stored.category(), Some("utility"));
    }

    #[rstest]
    #[tokio::test]
    async fn filters_by_category_tag_and_enabled(repository: InMemoryToolRepository) {
        let mut hidden = tool("hidden").with_tags(["internal"]);
        hidden.disable(&DefaultClock);
        repository.save(&hidden).await.expect("save");
        repository
            .save(&tool("search").with_category("web").with_tags(["network"]))
            .await
            .expect("save");

        let by_category = repository.find_by_category("web").await.expect("query");
        let by_tag = repository.find_by_tag("internal").await.expect("query");
        let enabled = repository.find_enabled().await.expect("query");

        assert_eq!(by_category.len(), 1);
        assert_eq!(by_tag.first().map(|t| t.name().as_str()), Some("hidden"));
        assert_eq!(enabled.first().map(|t| t.name().as_str()), Some("search"));
    }

    #[rstest]
    #[tokio::test]
    async fn delete_reports_presence(repository: InMemoryToolRepository) {
        let name = ToolName::new("echo").expect("valid name");
        repository.save(&tool("echo")).await.expect("save");

        assert!(repository.delete(&name).await.expect("delete"));
        assert!(!repository.delete(&name).await.expect("delete"));
        assert!(!repository.exists(&name).await.expect("exists"));
    }
}
