use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::error::AttendanceError;
use crate::model::attendance::OwnerId;

/// Read-only view of the subjects a user follows, in display order.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn subjects_for(&self, owner: OwnerId) -> Result<Vec<String>, AttendanceError>;
}

/// Reads the `user_subjects` table maintained by the profile service.
#[derive(Clone)]
pub struct MySqlSubjectDirectory {
    pool: MySqlPool,
}

impl MySqlSubjectDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectDirectory for MySqlSubjectDirectory {
    async fn subjects_for(&self, owner: OwnerId) -> Result<Vec<String>, AttendanceError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM user_subjects
            WHERE user_id = ?
            ORDER BY position, id
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, owner, "Failed to load subjects");
            AttendanceError::storage(e)
        })
    }
}

/// The same configured subject list for every user.
#[derive(Debug, Clone, Default)]
pub struct StaticSubjectDirectory {
    subjects: Vec<String>,
}

impl StaticSubjectDirectory {
    pub fn new(subjects: Vec<String>) -> Self {
        Self { subjects }
    }
}

#[async_trait]
impl SubjectDirectory for StaticSubjectDirectory {
    async fn subjects_for(&self, _owner: OwnerId) -> Result<Vec<String>, AttendanceError> {
        Ok(self.subjects.clone())
    }
}
