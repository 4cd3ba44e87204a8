use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::AttendanceError;

/// Identifier of the user a record belongs to, as issued by the identity provider.
pub type OwnerId = u64;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubjectMark {
    #[schema(example = "Math")]
    pub name: String,
    pub status: AttendanceStatus,
}

impl SubjectMark {
    pub fn new(name: impl Into<String>, status: AttendanceStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Marks of a single day. Subject names are non-empty and unique within the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "Vec<SubjectMark>", into = "Vec<SubjectMark>")]
pub struct SubjectMarks(Vec<SubjectMark>);

impl SubjectMarks {
    pub fn as_slice(&self) -> &[SubjectMark] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First mark recorded for `subject`.
    pub fn status_of(&self, subject: &str) -> Option<AttendanceStatus> {
        self.0.iter().find(|m| m.name == subject).map(|m| m.status)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectMark> {
        self.0.iter()
    }
}

impl TryFrom<Vec<SubjectMark>> for SubjectMarks {
    type Error = AttendanceError;

    fn try_from(marks: Vec<SubjectMark>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(marks.len());
        for mark in &marks {
            if mark.name.trim().is_empty() {
                return Err(AttendanceError::Validation(
                    "Subject name must not be empty".into(),
                ));
            }
            if !seen.insert(mark.name.as_str()) {
                return Err(AttendanceError::Validation(format!(
                    "Subject '{}' is marked more than once",
                    mark.name
                )));
            }
        }
        Ok(Self(marks))
    }
}

impl From<SubjectMarks> for Vec<SubjectMark> {
    fn from(marks: SubjectMarks) -> Self {
        marks.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "owner": 42,
    "date": "2024-01-01",
    "subjects": [
        { "name": "Math", "status": "present" },
        { "name": "Physics", "status": "absent" }
    ],
    "created_at": "2024-01-01T08:30:00Z"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub owner: OwnerId,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub subjects: SubjectMarks,
    #[schema(example = "2024-01-01T08:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Returned by a date lookup when nothing has been recorded for that day yet.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmptyDay {
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub subjects: Vec<SubjectMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DailyAttendance {
    Recorded(AttendanceRecord),
    Empty(EmptyDay),
}

impl DailyAttendance {
    pub fn empty(date: NaiveDate) -> Self {
        DailyAttendance::Empty(EmptyDay {
            date,
            subjects: Vec::new(),
        })
    }

    pub fn marks(&self) -> &[SubjectMark] {
        match self {
            DailyAttendance::Recorded(record) => record.subjects.as_slice(),
            DailyAttendance::Empty(day) => &day.subjects,
        }
    }

    /// Appends an `absent` mark for every known subject the day does not mention.
    pub fn with_absent_fill(self, known_subjects: &[String]) -> Self {
        match self {
            DailyAttendance::Recorded(mut record) => {
                fill_absent(&mut record.subjects.0, known_subjects);
                DailyAttendance::Recorded(record)
            }
            DailyAttendance::Empty(mut day) => {
                fill_absent(&mut day.subjects, known_subjects);
                DailyAttendance::Empty(day)
            }
        }
    }
}

/// Only adds non-empty names the list does not hold yet, so `SubjectMarks` stays valid.
fn fill_absent(marks: &mut Vec<SubjectMark>, known_subjects: &[String]) {
    for subject in known_subjects {
        if subject.trim().is_empty() || marks.iter().any(|m| &m.name == subject) {
            continue;
        }
        marks.push(SubjectMark::new(subject.clone(), AttendanceStatus::Absent));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct SubjectStat {
    #[schema(example = 1)]
    pub present: u64,
    #[schema(example = 1)]
    pub absent: u64,
    #[schema(example = 50.0)]
    pub percentage: f64,
}

impl SubjectStat {
    pub fn from_counts(present: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            present as f64 / total as f64 * 100.0
        };
        Self {
            present,
            absent: total - present,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "subject_stats": {
        "Math": { "present": 1, "absent": 1, "percentage": 50.0 },
        "Physics": { "present": 0, "absent": 1, "percentage": 0.0 }
    },
    "overall_stats": { "present": 1, "absent": 2, "percentage": 33.333333333333336 }
}))]
pub struct AttendanceStats {
    pub subject_stats: BTreeMap<String, SubjectStat>,
    pub overall_stats: SubjectStat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn marks(pairs: &[(&str, AttendanceStatus)]) -> Vec<SubjectMark> {
        pairs
            .iter()
            .map(|(name, status)| SubjectMark::new(*name, *status))
            .collect()
    }

    #[test]
    fn status_parses_any_case_and_rejects_unknown() {
        assert_eq!(
            AttendanceStatus::from_str("Present").unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!(
            AttendanceStatus::from_str("absent").unwrap(),
            AttendanceStatus::Absent
        );
        assert!(AttendanceStatus::from_str("late").is_err());
        assert_eq!(AttendanceStatus::Present.to_string(), "present");
    }

    #[test]
    fn subject_marks_reject_empty_names() {
        let err = SubjectMarks::try_from(marks(&[("  ", AttendanceStatus::Present)])).unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[test]
    fn subject_marks_reject_duplicate_names() {
        let err = SubjectMarks::try_from(marks(&[
            ("Math", AttendanceStatus::Present),
            ("Math", AttendanceStatus::Absent),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Math"));
    }

    #[test]
    fn subject_marks_keep_order() {
        let list = SubjectMarks::try_from(marks(&[
            ("Physics", AttendanceStatus::Absent),
            ("Math", AttendanceStatus::Present),
        ]))
        .unwrap();
        let names: Vec<_> = list.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Physics", "Math"]);
        assert_eq!(list.status_of("Math"), Some(AttendanceStatus::Present));
        assert_eq!(list.status_of("Chemistry"), None);
    }

    #[test]
    fn deserializing_marks_validates() {
        let json = r#"[{"name":"Math","status":"present"},{"name":"Math","status":"absent"}]"#;
        assert!(serde_json::from_str::<SubjectMarks>(json).is_err());

        let json = r#"[{"name":"Math","status":"excused"}]"#;
        assert!(serde_json::from_str::<SubjectMarks>(json).is_err());
    }

    #[test]
    fn absent_fill_appends_missing_known_subjects() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let known = vec!["Math".to_string(), "Physics".to_string()];

        let day = DailyAttendance::empty(date).with_absent_fill(&known);
        assert_eq!(
            day.marks(),
            marks(&[
                ("Math", AttendanceStatus::Absent),
                ("Physics", AttendanceStatus::Absent)
            ])
            .as_slice()
        );

        let record = AttendanceRecord {
            id: 1,
            owner: 7,
            date,
            subjects: SubjectMarks::try_from(marks(&[("Physics", AttendanceStatus::Present)]))
                .unwrap(),
            created_at: Utc::now(),
        };
        let day = DailyAttendance::Recorded(record).with_absent_fill(&known);
        assert_eq!(
            day.marks(),
            marks(&[
                ("Physics", AttendanceStatus::Present),
                ("Math", AttendanceStatus::Absent)
            ])
            .as_slice()
        );
    }

    #[test]
    fn absent_fill_skips_blank_and_repeated_known_subjects() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let known = vec![
            "Math".to_string(),
            " ".to_string(),
            "Physics".to_string(),
            "Physics".to_string(),
        ];
        let record = AttendanceRecord {
            id: 1,
            owner: 7,
            date,
            subjects: SubjectMarks::try_from(marks(&[("Math", AttendanceStatus::Present)]))
                .unwrap(),
            created_at: Utc::now(),
        };

        let DailyAttendance::Recorded(filled) =
            DailyAttendance::Recorded(record).with_absent_fill(&known)
        else {
            panic!("recorded day must stay recorded");
        };
        assert_eq!(
            filled.subjects.as_slice(),
            marks(&[
                ("Math", AttendanceStatus::Present),
                ("Physics", AttendanceStatus::Absent)
            ])
            .as_slice()
        );
        let revalidated = SubjectMarks::try_from(Vec::from(filled.subjects.clone())).unwrap();
        assert_eq!(revalidated, filled.subjects);
    }

    #[test]
    fn percentage_is_zero_without_marks() {
        let stat = SubjectStat::from_counts(0, 0);
        assert_eq!(stat, SubjectStat::default());
    }
}
