use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::error::AttendanceError;
use crate::model::attendance::OwnerId;
use crate::subjects::SubjectDirectory;

/// Caches subject lists per owner in front of another directory.
/// Entries expire after `ttl`, so profile edits show up within that window.
pub struct CachedSubjectDirectory {
    inner: Arc<dyn SubjectDirectory>,
    cache: Cache<OwnerId, Arc<Vec<String>>>,
}

impl CachedSubjectDirectory {
    pub fn new(inner: Arc<dyn SubjectDirectory>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(100_000) // tune based on memory
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl SubjectDirectory for CachedSubjectDirectory {
    async fn subjects_for(&self, owner: OwnerId) -> Result<Vec<String>, AttendanceError> {
        if let Some(hit) = self.cache.get(&owner).await {
            return Ok(hit.as_ref().clone());
        }

        let subjects = self.inner.subjects_for(owner).await?;
        self.cache.insert(owner, Arc::new(subjects.clone())).await;
        tracing::debug!(owner, count = subjects.len(), "Subject list cached");

        Ok(subjects)
    }
}
