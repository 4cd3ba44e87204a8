use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::AttendanceStore;
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, OwnerId, SubjectMarks};

#[derive(Default)]
struct Inner {
    next_id: u64,
    records: HashMap<OwnerId, BTreeMap<NaiveDate, AttendanceRecord>>,
}

/// Process-local store. Each upsert runs under a single write lock.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    inner: RwLock<Inner>,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AttendanceError {
        AttendanceError::storage(anyhow::anyhow!("attendance store lock poisoned"))
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn upsert(
        &self,
        owner: OwnerId,
        date: NaiveDate,
        subjects: &SubjectMarks,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut guard = self.inner.write().map_err(|_| Self::poisoned())?;
        let inner = &mut *guard;

        let next_id = inner.next_id + 1;
        let days = inner.records.entry(owner).or_default();

        let record = match days.get_mut(&date) {
            Some(existing) => {
                existing.subjects = subjects.clone();
                existing.clone()
            }
            None => {
                let record = AttendanceRecord {
                    id: next_id,
                    owner,
                    date,
                    subjects: subjects.clone(),
                    created_at: Utc::now(),
                };
                days.insert(date, record.clone());
                inner.next_id = next_id;
                record
            }
        };

        Ok(record)
    }

    async fn get_by_date(
        &self,
        owner: OwnerId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .records
            .get(&owner)
            .and_then(|days| days.get(&date))
            .cloned())
    }

    async fn list_by_owner(&self, owner: OwnerId) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .records
            .get(&owner)
            .map(|days| days.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_by_owner_in_range(
        &self,
        owner: OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Ok(Vec::new());
            }
        }

        let lower = start.map_or(Bound::Unbounded, Bound::Included);
        let upper = end.map_or(Bound::Unbounded, Bound::Included);

        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .records
            .get(&owner)
            .map(|days| days.range((lower, upper)).rev().map(|(_, r)| r.clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceStatus, SubjectMark};
    use futures::executor::block_on;
    use std::thread;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn marks(pairs: &[(&str, AttendanceStatus)]) -> SubjectMarks {
        SubjectMarks::try_from(
            pairs
                .iter()
                .map(|(name, status)| SubjectMark::new(*name, *status))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[actix_web::test]
    async fn upsert_replaces_marks_and_keeps_created_at() {
        let store = MemoryAttendanceStore::new();
        let date = day(2024, 1, 1);

        let first = store
            .upsert(1, date, &marks(&[("Math", AttendanceStatus::Present), ("Physics", AttendanceStatus::Absent)]))
            .await
            .unwrap();
        let second = store
            .upsert(1, date, &marks(&[("Chemistry", AttendanceStatus::Present)]))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.subjects, marks(&[("Chemistry", AttendanceStatus::Present)]));
        assert_eq!(store.list_by_owner(1).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn owners_do_not_see_each_other() {
        let store = MemoryAttendanceStore::new();
        let date = day(2024, 1, 1);
        store
            .upsert(1, date, &marks(&[("Math", AttendanceStatus::Present)]))
            .await
            .unwrap();

        assert!(store.get_by_date(2, date).await.unwrap().is_none());
        assert!(store.list_by_owner(2).await.unwrap().is_empty());

        let other = store
            .upsert(2, date, &marks(&[("Math", AttendanceStatus::Absent)]))
            .await
            .unwrap();
        let mine = store.get_by_date(1, date).await.unwrap().unwrap();
        assert_ne!(other.id, mine.id);
        assert_eq!(mine.subjects.status_of("Math"), Some(AttendanceStatus::Present));
    }

    #[actix_web::test]
    async fn range_is_inclusive_and_newest_first() {
        let store = MemoryAttendanceStore::new();
        for date in [day(2024, 1, 2), day(2023, 12, 31), day(2024, 1, 1)] {
            store
                .upsert(1, date, &marks(&[("Math", AttendanceStatus::Present)]))
                .await
                .unwrap();
        }

        let dates = |records: Vec<AttendanceRecord>| -> Vec<NaiveDate> {
            records.into_iter().map(|r| r.date).collect()
        };

        let ranged = store
            .list_by_owner_in_range(1, Some(day(2024, 1, 1)), Some(day(2024, 1, 2)))
            .await
            .unwrap();
        assert_eq!(dates(ranged), [day(2024, 1, 2), day(2024, 1, 1)]);

        let all = store.list_by_owner_in_range(1, None, None).await.unwrap();
        assert_eq!(
            dates(all),
            [day(2024, 1, 2), day(2024, 1, 1), day(2023, 12, 31)]
        );

        let open_end = store
            .list_by_owner_in_range(1, Some(day(2024, 1, 1)), None)
            .await
            .unwrap();
        assert_eq!(dates(open_end), [day(2024, 1, 2), day(2024, 1, 1)]);

        let inverted = store
            .list_by_owner_in_range(1, Some(day(2024, 1, 2)), Some(day(2024, 1, 1)))
            .await
            .unwrap();
        assert!(inverted.is_empty());
    }

    #[test]
    fn concurrent_first_writes_leave_one_record() {
        let store = MemoryAttendanceStore::new();
        let date = day(2024, 3, 4);
        let present = marks(&[("Math", AttendanceStatus::Present)]);
        let absent = marks(&[("Math", AttendanceStatus::Absent)]);

        let ids: Vec<u64> = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let subjects = if i % 2 == 0 { &present } else { &absent };
                    let store = &store;
                    s.spawn(move || block_on(store.upsert(9, date, subjects)).unwrap().id)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(ids.iter().all(|id| *id == ids[0]));

        let stored = block_on(store.list_by_owner(9)).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, ids[0]);
        assert!(stored[0].subjects == present || stored[0].subjects == absent);
    }
}
