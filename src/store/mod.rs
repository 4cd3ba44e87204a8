use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, OwnerId, SubjectMarks};

pub mod memory;
pub mod mysql;

pub use memory::MemoryAttendanceStore;
pub use mysql::MySqlAttendanceStore;

/// Persistence for attendance records.
///
/// Implementations keep at most one record per (owner, date) and perform
/// `upsert` as one atomic step: concurrent first writes for a key must end
/// with a single record holding one of the written mark lists.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Creates the record for (owner, date) or replaces its marks, keeping `created_at`.
    async fn upsert(
        &self,
        owner: OwnerId,
        date: NaiveDate,
        subjects: &SubjectMarks,
    ) -> Result<AttendanceRecord, AttendanceError>;

    async fn get_by_date(
        &self,
        owner: OwnerId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError>;

    async fn list_by_owner(&self, owner: OwnerId) -> Result<Vec<AttendanceRecord>, AttendanceError>;

    /// Records with `start <= date <= end`, newest first. A missing bound is open.
    async fn list_by_owner_in_range(
        &self,
        owner: OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError>;

    async fn close(&self) {}
}
