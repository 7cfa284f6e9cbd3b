use common_types::Recap;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Recaps keyed by id.
#[derive(Default)]
pub struct RecapStore {
    recaps: RwLock<HashMap<String, Recap>>,
}

impl RecapStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, recap: Recap) {
        self.recaps.write().await.insert(recap.id.clone(), recap);
    }

    pub async fn remove(&self, recap_id: &str) -> Option<Recap> {
        self.recaps.write().await.remove(recap_id)
    }

    pub async fn find_by_id(&self, recap_id: &str) -> Option<Recap> {
        self.recaps.read().await.get(recap_id).cloned()
    }

    /// Recaps whose owner passes `is_readable`, newest first.
    pub async fn list_by_owner(&self, is_readable: impl Fn(&str) -> bool) -> Vec<Recap> {
        let mut recaps: Vec<Recap> = self
            .recaps
            .read()
            .await
            .values()
            .filter(|r| is_readable(&r.owner_id))
            .cloned()
            .collect();
        recaps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recaps
    }

    /// Applies `f` under the write lock and returns its result with the updated recap.
    pub async fn update<R>(
        &self,
        recap_id: &str,
        f: impl FnOnce(&mut Recap) -> R,
    ) -> Option<(R, Recap)> {
        let mut recaps = self.recaps.write().await;
        let recap = recaps.get_mut(recap_id)?;
        let result = f(recap);
        Some((result, recap.clone()))
    }
}
