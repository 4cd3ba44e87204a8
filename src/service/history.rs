use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, OwnerId};
use crate::store::AttendanceStore;

/// Date ordered reads over the store, newest first.
#[derive(Clone)]
pub struct HistoryQuery {
    store: Arc<dyn AttendanceStore>,
}

impl HistoryQuery {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    pub async fn fetch(
        &self,
        owner: OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AttendanceError::Validation(
                    "start_date cannot be after end_date".into(),
                ));
            }
        }

        self.store.list_by_owner_in_range(owner, start, end).await
    }
}
