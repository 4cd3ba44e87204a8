use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use super::history::HistoryQuery;
use super::stats::aggregate;
use crate::error::AttendanceError;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, DailyAttendance, OwnerId, SubjectMark,
    SubjectMarks,
};
use crate::store::AttendanceStore;
use crate::subjects::SubjectDirectory;
use crate::utils::date::{parse_day, parse_optional_day};

/// One subject entry as submitted by a client; validated before use.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkInput {
    #[schema(example = "Math")]
    pub name: String,
    #[schema(example = "present")]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "date": "2024-01-01",
    "subjects": [
        { "name": "Math", "status": "present" },
        { "name": "Physics", "status": "absent" }
    ]
}))]
pub struct MarkAttendance {
    #[schema(example = "2024-01-01", format = "date")]
    pub date: String,
    pub subjects: Vec<MarkInput>,
}

impl MarkAttendance {
    /// Checks the request shape without touching storage.
    pub fn validate(&self) -> Result<(NaiveDate, SubjectMarks), AttendanceError> {
        let date = parse_day(&self.date)?;

        let marks = self
            .subjects
            .iter()
            .map(|input| {
                let status = AttendanceStatus::from_str(input.status.trim()).map_err(|_| {
                    AttendanceError::Validation(format!(
                        "Invalid status '{}' for subject '{}'. Allowed: present, absent",
                        input.status, input.name
                    ))
                })?;
                Ok(SubjectMark::new(input.name.clone(), status))
            })
            .collect::<Result<Vec<_>, AttendanceError>>()?;

        Ok((date, SubjectMarks::try_from(marks)?))
    }
}

/// Entry point for attendance operations of an authenticated owner.
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    subjects: Arc<dyn SubjectDirectory>,
    history: HistoryQuery,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn AttendanceStore>, subjects: Arc<dyn SubjectDirectory>) -> Self {
        Self {
            history: HistoryQuery::new(store.clone()),
            store,
            subjects,
        }
    }

    /// Creates or fully replaces the owner's record for the given day.
    ///
    /// A conflicting concurrent write is retried once; a second conflict is
    /// returned to the caller, who may retry the whole request.
    #[instrument(skip(self, request), fields(date = %request.date))]
    pub async fn mark_attendance(
        &self,
        owner: OwnerId,
        request: &MarkAttendance,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let (date, marks) = request.validate()?;
        if marks.is_empty() {
            debug!(owner, %date, "Clearing every mark of the day");
        }

        let record = match self.store.upsert(owner, date, &marks).await {
            Err(AttendanceError::Conflict { .. }) => {
                warn!(owner, %date, "Upsert conflicted, retrying once");
                self.store.upsert(owner, date, &marks).await?
            }
            other => other?,
        };

        info!(owner, %date, subjects = record.subjects.len(), "Attendance marked");
        Ok(record)
    }

    /// The stored record for the day, or an empty placeholder when there is none.
    /// With `fill_absent`, subjects the owner follows but the day omits are added as absent.
    pub async fn get_attendance_for_date(
        &self,
        owner: OwnerId,
        date: &str,
        fill_absent: bool,
    ) -> Result<DailyAttendance, AttendanceError> {
        let date = parse_day(date)?;

        let day = match self.store.get_by_date(owner, date).await? {
            Some(record) => DailyAttendance::Recorded(record),
            None => {
                debug!(owner, %date, "No attendance recorded yet");
                DailyAttendance::empty(date)
            }
        };

        if !fill_absent {
            return Ok(day);
        }
        debug!(owner, %date, recorded = day.marks().len(), "Filling unmarked subjects as absent");
        let known = self.subjects.subjects_for(owner).await?;
        Ok(day.with_absent_fill(&known))
    }

    pub async fn get_statistics(&self, owner: OwnerId) -> Result<AttendanceStats, AttendanceError> {
        let known = self.subjects.subjects_for(owner).await?;
        let records = self.store.list_by_owner(owner).await?;

        Ok(aggregate(&records, &known))
    }

    pub async fn get_history(
        &self,
        owner: OwnerId,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let start = parse_optional_day(start_date)?;
        let end = parse_optional_day(end_date)?;

        self.history.fetch(owner, start, end).await
    }

    pub async fn shutdown(&self) {
        self.store.close().await;
    }
}
