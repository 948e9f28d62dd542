// In-memory CommentStore for tests. Counts writes and can be told to fail.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use harvest_common::{CommentRecord, PageRequest};

use crate::{page_newest_first, CommentStore, Result, StoreError};

#[derive(Default)]
pub struct MemoryCommentStore {
    records: Mutex<Vec<CommentRecord>>,
    insert_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CommentRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `insert_many` calls, including failed ones.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<CommentRecord> {
        self.records.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn insert_many(&self, records: &[CommentRecord]) -> Result<u64> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn list_recent(&self, page: PageRequest) -> Result<Vec<CommentRecord>> {
        self.check_available()?;
        let all = self.snapshot();
        Ok(page_newest_first(all.into_iter(), page))
    }

    async fn list_by_run(&self, run_id: &str) -> Result<Vec<CommentRecord>> {
        self.check_available()?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|r| r.run_id == run_id)
            .collect())
    }
}
