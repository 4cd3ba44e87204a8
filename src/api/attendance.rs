use crate::auth::auth::AuthUser;
use crate::service::AttendanceService;
use crate::service::attendance::MarkAttendance;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DayQuery {
    /// Add an `absent` mark for followed subjects the day does not mention
    #[schema(example = false)]
    pub fill_absent: Option<bool>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryFilter {
    /// Inclusive lower bound (YYYY-MM-DD)
    #[schema(example = "2024-01-01")]
    #[serde(alias = "startDate")]
    pub start_date: Option<String>,
    /// Inclusive upper bound (YYYY-MM-DD)
    #[schema(example = "2024-01-31")]
    #[serde(alias = "endDate")]
    pub end_date: Option<String>,
}

/// Mark attendance for a day, replacing whatever was recorded for it
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body(
        content = MarkAttendance,
        description = "Day and per subject status",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Stored attendance record", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "Invalid date, status or subject name", body = Object, example = json!({
            "message": "Invalid status 'late' for subject 'Math'. Allowed: present, absent"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Concurrent update, retry", body = Object, example = json!({
            "message": "Attendance for 2024-01-01 was modified concurrently, please retry",
            "retryable": true
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    let record = service.mark_attendance(auth.user_id, &payload).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Attendance recorded for a day
#[utoipa::path(
    get,
    path = "/api/attendance/date/{date}",
    params(
        ("date" = String, Path, description = "Day to look up (YYYY-MM-DD)"),
        DayQuery
    ),
    responses(
        (status = 200, description = "Recorded day, or an empty subject list when nothing is recorded", body = crate::model::attendance::DailyAttendance),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_attendance_for_date(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<String>,
    query: web::Query<DayQuery>,
) -> actix_web::Result<impl Responder> {
    let date = path.into_inner();
    let day = service
        .get_attendance_for_date(auth.user_id, &date, query.fill_absent.unwrap_or(false))
        .await?;

    Ok(HttpResponse::Ok().json(day))
}

/// Per subject and overall attendance statistics
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    responses(
        (status = 200, description = "Statistics over the whole history", body = crate::model::attendance::AttendanceStats),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_statistics(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
) -> actix_web::Result<impl Responder> {
    tracing::debug!(user = %auth.username, "Computing attendance statistics");
    let stats = service.get_statistics(auth.user_id).await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// Attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryFilter),
    responses(
        (status = 200, description = "Records in the range, newest first", body = Vec<crate::model::attendance::AttendanceRecord>),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_history(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<HistoryFilter>,
) -> actix_web::Result<impl Responder> {
    let records = service
        .get_history(
            auth.user_id,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(records))
}
