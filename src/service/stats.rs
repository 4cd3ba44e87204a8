use std::collections::BTreeMap;

use crate::model::attendance::{AttendanceRecord, AttendanceStats, AttendanceStatus, SubjectStat};

/// Per subject and overall attendance figures.
///
/// A subject is only counted on days that carry a mark for it, so its
/// denominator is the number of days it was marked. The overall bucket is a
/// flat sum over every mark of every record, including subjects that are no
/// longer in `known_subjects`.
pub fn aggregate(records: &[AttendanceRecord], known_subjects: &[String]) -> AttendanceStats {
    let mut subject_stats = BTreeMap::new();

    for subject in known_subjects {
        if subject_stats.contains_key(subject) {
            continue;
        }

        let (present, counted) = records
            .iter()
            .filter_map(|record| record.subjects.status_of(subject))
            .fold((0u64, 0u64), |(present, counted), status| {
                let hit = u64::from(status == AttendanceStatus::Present);
                (present + hit, counted + 1)
            });

        subject_stats.insert(subject.clone(), SubjectStat::from_counts(present, counted));
    }

    let (present, total) = records
        .iter()
        .flat_map(|record| record.subjects.iter())
        .fold((0u64, 0u64), |(present, total), mark| {
            let hit = u64::from(mark.status == AttendanceStatus::Present);
            (present + hit, total + 1)
        });

    AttendanceStats {
        subject_stats,
        overall_stats: SubjectStat::from_counts(present, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{SubjectMark, SubjectMarks};
    use chrono::{NaiveDate, Utc};

    fn record(id: u64, date: (i32, u32, u32), marks: &[(&str, AttendanceStatus)]) -> AttendanceRecord {
        AttendanceRecord {
            id,
            owner: 1,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            subjects: SubjectMarks::try_from(
                marks
                    .iter()
                    .map(|(name, status)| SubjectMark::new(*name, *status))
                    .collect::<Vec<_>>(),
            )
            .unwrap(),
            created_at: Utc::now(),
        }
    }

    fn subjects(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_records_yield_zeroes() {
        let stats = aggregate(&[], &subjects(&["Math", "Physics"]));

        assert_eq!(stats.subject_stats.len(), 2);
        for stat in stats.subject_stats.values() {
            assert_eq!(*stat, SubjectStat::default());
        }
        assert_eq!(stats.overall_stats, SubjectStat::default());
    }

    #[test]
    fn no_subjects_still_count_overall() {
        let records = [record(1, (2024, 1, 1), &[("Math", AttendanceStatus::Present)])];
        let stats = aggregate(&records, &[]);

        assert!(stats.subject_stats.is_empty());
        assert_eq!(stats.overall_stats.present, 1);
        assert_eq!(stats.overall_stats.percentage, 100.0);
    }

    #[test]
    fn two_day_scenario() {
        let records = [
            record(
                1,
                (2024, 1, 1),
                &[("Math", AttendanceStatus::Present), ("Physics", AttendanceStatus::Absent)],
            ),
            record(2, (2024, 1, 2), &[("Math", AttendanceStatus::Absent)]),
        ];
        let stats = aggregate(&records, &subjects(&["Math", "Physics"]));

        let math = stats.subject_stats["Math"];
        assert_eq!((math.present, math.absent), (1, 1));
        assert_eq!(math.percentage, 50.0);

        let physics = stats.subject_stats["Physics"];
        assert_eq!((physics.present, physics.absent), (0, 1));
        assert_eq!(physics.percentage, 0.0);

        let overall = stats.overall_stats;
        assert_eq!((overall.present, overall.absent), (1, 2));
        assert!((overall.percentage - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn subject_denominator_is_days_marked_not_days_recorded() {
        let records = [
            record(1, (2024, 1, 1), &[("Math", AttendanceStatus::Present)]),
            record(2, (2024, 1, 2), &[("Physics", AttendanceStatus::Present)]),
            record(3, (2024, 1, 3), &[("Physics", AttendanceStatus::Absent)]),
        ];
        let stats = aggregate(&records, &subjects(&["Math"]));

        assert_eq!(stats.subject_stats["Math"], SubjectStat::from_counts(1, 1));
        assert_eq!(stats.subject_stats["Math"].percentage, 100.0);
        // marks of subjects outside the known list still land in the overall bucket
        assert_eq!(stats.overall_stats, SubjectStat::from_counts(2, 3));
    }

    #[test]
    fn unknown_subject_in_list_is_all_zero() {
        let records = [record(1, (2024, 1, 1), &[("Math", AttendanceStatus::Present)])];
        let stats = aggregate(&records, &subjects(&["Biology", "Biology"]));

        assert_eq!(stats.subject_stats.len(), 1);
        assert_eq!(stats.subject_stats["Biology"], SubjectStat::default());
    }
}
