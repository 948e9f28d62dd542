use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use harvest_common::{CommentRecord, PageRequest};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{page_newest_first, CommentStore, Result};

/// Flat JSON file holding one array of records in insertion order.
///
/// Writers are serialized through a mutex and replace the file via
/// temp file + rename, so a reader never sees a half-written array.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<CommentRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, records: &[CommentRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CommentStore for JsonFileStore {
    async fn insert_many(&self, records: &[CommentRecord]) -> Result<u64> {
        let _guard = self.lock.lock().await;
        let mut all = self.load().await?;
        all.extend_from_slice(records);
        self.save(&all).await?;
        debug!(
            path = %self.path.display(),
            written = records.len(),
            total = all.len(),
            "Appended comment records"
        );
        Ok(records.len() as u64)
    }

    async fn list_recent(&self, page: PageRequest) -> Result<Vec<CommentRecord>> {
        let _guard = self.lock.lock().await;
        let all = self.load().await?;
        Ok(page_newest_first(all.into_iter(), page))
    }

    async fn list_by_run(&self, run_id: &str) -> Result<Vec<CommentRecord>> {
        let _guard = self.lock.lock().await;
        let all = self.load().await?;
        Ok(all.into_iter().filter(|r| r.run_id == run_id).collect())
    }
}
