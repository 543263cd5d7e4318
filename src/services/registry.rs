//! Shared state of the current migration batch.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{ItemStatus, MigrationItem, ProgressEvent};

/// Items of the current batch plus a generation stamp. Replacing the
/// batch bumps the generation, which orphans any worker still holding
/// indices into the old one.
#[derive(Debug, Default)]
struct Batch {
    generation: u64,
    items: Vec<MigrationItem>,
}

/// Registry the status page polls and the workers write into.
#[derive(Debug, Clone, Default)]
pub struct StatusRegistry {
    inner: Arc<RwLock<Batch>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new batch, returning its generation.
    pub async fn replace_all(&self, items: Vec<MigrationItem>) -> u64 {
        let mut batch = self.inner.write().await;
        batch.generation += 1;
        batch.items = items;
        batch.generation
    }

    /// Current items in batch order.
    pub async fn snapshot(&self) -> Vec<MigrationItem> {
        self.inner.read().await.items.clone()
    }

    /// Claim a pending item for execution. False when the item was
    /// already claimed or belongs to a replaced batch.
    pub async fn start_item(&self, generation: u64, idx: usize) -> bool {
        let mut batch = self.inner.write().await;
        if batch.generation != generation {
            return false;
        }
        match batch.items.get_mut(idx) {
            Some(item) if item.status == ItemStatus::Pending => {
                item.start();
                true
            }
            _ => false,
        }
    }

    /// Fold a progress event into an item.
    pub async fn apply_event(&self, generation: u64, idx: usize, event: &ProgressEvent) {
        let mut batch = self.inner.write().await;
        if batch.generation != generation {
            return;
        }
        if let Some(item) = batch.items.get_mut(idx) {
            item.apply(event);
        }
    }

    pub async fn finish_ok(&self, generation: u64, idx: usize, message: &str) {
        let mut batch = self.inner.write().await;
        if batch.generation != generation {
            return;
        }
        if let Some(item) = batch.items.get_mut(idx) {
            item.finish_ok(message);
        }
    }

    pub async fn finish_error(&self, generation: u64, idx: usize, message: &str) {
        let mut batch = self.inner.write().await;
        if batch.generation != generation {
            return;
        }
        if let Some(item) = batch.items.get_mut(idx) {
            item.finish_error(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Step, StepState};

    fn two_items() -> Vec<MigrationItem> {
        vec![
            MigrationItem::new("111", "pasta_a", "/base/pasta_a"),
            MigrationItem::new("222", "pasta_b", "/base/pasta_b"),
        ]
    }

    #[tokio::test]
    async fn test_replace_bumps_generation() {
        let registry = StatusRegistry::new();
        let g1 = registry.replace_all(two_items()).await;
        let g2 = registry.replace_all(two_items()).await;
        assert!(g2 > g1);
        assert_eq!(registry.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_item_claimed_only_once() {
        let registry = StatusRegistry::new();
        let generation = registry.replace_all(two_items()).await;
        assert!(registry.start_item(generation, 0).await);
        assert!(!registry.start_item(generation, 0).await);

        let items = registry.snapshot().await;
        assert_eq!(items[0].status, ItemStatus::Running);
        assert_eq!(items[1].status, ItemStatus::Pending);
    }

    #[tokio::test]
    async fn test_stale_generation_is_ignored() {
        let registry = StatusRegistry::new();
        let old = registry.replace_all(two_items()).await;
        let fresh = registry.replace_all(two_items()).await;

        assert!(!registry.start_item(old, 0).await);
        registry
            .apply_event(old, 0, &ProgressEvent::running(Step::Login, "Fazendo login..."))
            .await;
        registry.finish_error(old, 1, "Erro: qualquer").await;

        // Stale writes left the fresh batch untouched.
        let items = registry.snapshot().await;
        assert_eq!(items[0].status, ItemStatus::Pending);
        assert_eq!(items[0].message, "");
        assert_eq!(items[1].status, ItemStatus::Pending);
        assert!(registry.start_item(fresh, 0).await);
    }

    #[tokio::test]
    async fn test_event_and_finish_update_item() {
        let registry = StatusRegistry::new();
        let generation = registry.replace_all(two_items()).await;
        assert!(registry.start_item(generation, 0).await);

        registry
            .apply_event(
                generation,
                0,
                &ProgressEvent::running(Step::Extraction, "Extraindo dados..."),
            )
            .await;
        let items = registry.snapshot().await;
        assert_eq!(items[0].progress, 40);
        assert_eq!(items[0].steps.extraction, StepState::Running);

        registry
            .finish_ok(generation, 0, "Migração concluída!")
            .await;
        let items = registry.snapshot().await;
        assert_eq!(items[0].status, ItemStatus::Done);
        assert_eq!(items[0].progress, 100);
        assert!(items[0].finished_at.is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_ignored() {
        let registry = StatusRegistry::new();
        let generation = registry.replace_all(two_items()).await;
        assert!(!registry.start_item(generation, 9).await);
        registry.finish_ok(generation, 9, "nada").await;
        assert_eq!(registry.snapshot().await.len(), 2);
    }
}
