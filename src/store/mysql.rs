use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};

use super::AttendanceStore;
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, OwnerId, SubjectMark, SubjectMarks};

const SELECT_COLUMNS: &str = "SELECT id, user_id, date, subjects, created_at FROM attendance";

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    subjects: Json<Vec<SubjectMark>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AttendanceError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let subjects = SubjectMarks::try_from(row.subjects.0).map_err(|e| {
            AttendanceError::storage(anyhow::anyhow!(
                "attendance row {} holds invalid marks: {e}",
                row.id
            ))
        })?;

        Ok(AttendanceRecord {
            id: row.id,
            owner: row.user_id,
            date: row.date,
            subjects,
            created_at: row.created_at,
        })
    }
}

fn into_records(rows: Vec<AttendanceRow>) -> Result<Vec<AttendanceRecord>, AttendanceError> {
    rows.into_iter().map(AttendanceRecord::try_from).collect()
}

/// Deadlocks and duplicate keys on the (user_id, date) index surface as conflicts.
fn map_write_error(e: sqlx::Error, date: NaiveDate) -> AttendanceError {
    if let sqlx::Error::Database(db_err) = &e {
        if matches!(db_err.code().as_deref(), Some("40001") | Some("23000")) {
            tracing::warn!(error = %e, %date, "Attendance upsert conflicted");
            return AttendanceError::Conflict { date };
        }
    }
    AttendanceError::storage(e)
}

/// MySQL backed store. The `attendance` table carries
/// `UNIQUE KEY (user_id, date)`, and upsert is a single
/// `INSERT ... ON DUPLICATE KEY UPDATE`.
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn upsert(
        &self,
        owner: OwnerId,
        date: NaiveDate,
        subjects: &SubjectMarks,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(AttendanceError::storage)?;

        sqlx::query(
            r#"
            INSERT INTO attendance (user_id, date, subjects, created_at)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE subjects = VALUES(subjects)
            "#,
        )
        .bind(owner)
        .bind(date)
        .bind(Json(subjects.as_slice()))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, date))?;

        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND date = ?"
        ))
        .bind(owner)
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, date))?;

        tx.commit().await.map_err(|e| map_write_error(e, date))?;

        AttendanceRecord::try_from(row)
    }

    async fn get_by_date(
        &self,
        owner: OwnerId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND date = ?"
        ))
        .bind(owner)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(AttendanceError::storage)?;

        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn list_by_owner(&self, owner: OwnerId) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? ORDER BY id"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(AttendanceError::storage)?;

        into_records(rows)
    }

    async fn list_by_owner_in_range(
        &self,
        owner: OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let mut sql = format!("{SELECT_COLUMNS} WHERE user_id = ?");
        if start.is_some() {
            sql.push_str(" AND date >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND date <= ?");
        }
        sql.push_str(" ORDER BY date DESC");

        let mut query = sqlx::query_as::<_, AttendanceRow>(&sql).bind(owner);
        if let Some(start) = start {
            query = query.bind(start);
        }
        if let Some(end) = end {
            query = query.bind(end);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(AttendanceError::storage)?;

        into_records(rows)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
