use crate::api::attendance::{DayQuery, HistoryFilter};
use crate::model::attendance::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, DailyAttendance, EmptyDay, SubjectMark,
    SubjectMarks, SubjectStat,
};
use crate::service::attendance::{MarkAttendance, MarkInput};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "0.1.0",
        description = r#"
## Attendance Tracker

Records which subjects a student attended on each calendar day and derives
attendance statistics from the accumulated history.

### Key Features
- **Daily attendance**
  - Mark a day (create or fully replace), look a day up
- **Statistics**
  - Per subject and overall present/absent counts and percentages
- **History**
  - Date range queries, newest first

### Security
All `/api` endpoints require a **JWT Bearer** access token. Records are
always scoped to the caller.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::get_attendance_for_date,
        crate::api::attendance::get_statistics,
        crate::api::attendance::get_history,

        crate::api::health::health
    ),
    components(
        schemas(
            MarkAttendance,
            MarkInput,
            AttendanceRecord,
            AttendanceStatus,
            SubjectMark,
            SubjectMarks,
            DailyAttendance,
            EmptyDay,
            AttendanceStats,
            SubjectStat,
            DayQuery,
            HistoryFilter
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance marking, statistics and history APIs"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
