use std::sync::Arc;

use harvest_common::{CommentRecord, HarvestError, PageRequest};
use harvest_store::CommentStore;

/// Read side for stored comments. Stateless apart from the store handle.
#[derive(Clone)]
pub struct CommentReader {
    store: Arc<dyn CommentStore>,
}

impl CommentReader {
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self { store }
    }

    /// One page, newest first. Never more than `page.page_size` records.
    pub async fn list_comments(
        &self,
        page: PageRequest,
    ) -> Result<Vec<CommentRecord>, HarvestError> {
        Ok(self.store.list_recent(page).await?)
    }

    pub async fn comments_for_run(
        &self,
        run_id: &str,
    ) -> Result<Vec<CommentRecord>, HarvestError> {
        Ok(self.store.list_by_run(run_id).await?)
    }
}
