use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::auth::policy::{Action, authorize};
use crate::error::AppError;
use crate::model::employee::EmployeeFilter;
use crate::service::{grid, summary};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct GridQuery {
    /// Month as YYYY-MM
    #[param(example = "2026-01")]
    pub month: String,
    /// Only employees of this department
    pub department: Option<String>,
    /// Only employees with this designation
    pub designation: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryQuery {
    /// Defaults to the first day of the current month
    #[param(value_type = Option<String>, format = Date, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    /// Defaults to today
    #[param(value_type = Option<String>, format = Date, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Monthly attendance grid
#[utoipa::path(
    get,
    path = "/api/reports/attendance-grid",
    params(GridQuery),
    responses(
        (status = 200, description = "One row per active employee", body = [GridRow]),
        (status = 400, description = "Malformed month", body = Object, example = json!({
            "message": "month must be YYYY-MM"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn attendance_grid(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<GridQuery>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::ViewGrid, None)?;
    let query = query.into_inner();
    let month = query.month.parse::<grid::YearMonth>()?;

    let mut filter = EmployeeFilter {
        department: non_empty(query.department),
        designation: non_empty(query.designation),
        only: None,
    };
    if auth.is_employee() {
        filter.only = Some(auth.employee()?);
    }

    let rows = grid::attendance_grid(state.store.as_ref(), &state.policy, &filter, month).await?;

    tracing::debug!(%month, rows = rows.len(), "Attendance grid built");

    Ok(HttpResponse::Ok().json(rows))
}

/// Organization attendance summary over a date range
#[utoipa::path(
    get,
    path = "/api/reports/attendance",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Attendance summary", body = AttendanceSummary),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<SummaryQuery>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::ViewOrgReports, None)?;

    let report = summary::attendance_summary(
        state.store.as_ref(),
        state.policy.today(Utc::now()),
        query.start_date,
        query.end_date,
    )
    .await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Organization leave report
#[utoipa::path(
    get,
    path = "/api/reports/leaves",
    responses(
        (status = 200, description = "Leave report", body = LeaveSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn leave_report(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::ViewOrgReports, None)?;

    let today = state.policy.today(Utc::now());
    let report = summary::leave_summary(state.store.as_ref(), today).await?;

    tracing::debug!(total = report.total, "Leave report built");

    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::Value;

    use crate::api::test_support::{bearer, request, state, test_app};
    use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Punch};
    use crate::model::leave_request::{LeaveType, NewLeave};
    use crate::model::role::Role;
    use crate::store::{AttendanceStore, LeaveStore};

    async fn seed(store: &crate::store::memory::MemoryStore) {
        store.add_employee(1, None);
        store.add_employee(2, Some(1));

        let mut record = AttendanceRecord::skeleton(
            2,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            AttendanceStatus::Late,
        );
        record.check_in = Some(Punch::at(Utc.with_ymd_and_hms(2026, 1, 5, 9, 10, 0).unwrap()));
        store.insert_attendance(record).await.unwrap();
    }

    #[actix_web::test]
    async fn hr_sees_every_row() {
        let (state, store) = state();
        seed(&store).await;
        let app = test_app!(state);

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/attendance-grid?month=2026-01&department=")
                .insert_header(bearer(Role::Hr, None))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["attendance"]["5"], "LT");
        assert_eq!(rows[1]["attendance"]["3"], "W");
        assert_eq!(rows[1]["punch_data"]["5"]["in"], "09:10:00");
        assert!(rows[1]["punch_data"]["6"].is_null());
    }

    #[actix_web::test]
    async fn employees_see_only_themselves() {
        let (state, store) = state();
        seed(&store).await;
        let app = test_app!(state);

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/attendance-grid?month=2026-01")
                .insert_header(bearer(Role::Employee, Some(2)))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["employee_id"], 2);
    }

    #[actix_web::test]
    async fn grid_rejects_managers_and_bad_months() {
        let (state, store) = state();
        seed(&store).await;
        let app = test_app!(state);

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/attendance-grid?month=2026-01")
                .insert_header(bearer(Role::Manager, Some(1)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/attendance-grid?month=2026-13")
                .insert_header(bearer(Role::Admin, None))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn summary_is_for_hr_and_admin() {
        let (state, store) = state();
        seed(&store).await;
        let app = test_app!(state);

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/attendance?start_date=2026-01-01&end_date=2026-01-31")
                .insert_header(bearer(Role::Admin, None))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total_records"], 1);
        assert_eq!(body["status_breakdown"]["late"], 1);
        assert_eq!(body["late_arrivals"][0]["employee"], "Employee 2");

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/attendance")
                .insert_header(bearer(Role::Employee, Some(2)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/attendance?start_date=2026-02-01&end_date=2026-01-01")
                .insert_header(bearer(Role::Hr, None))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn leave_report_is_for_hr_and_admin() {
        let (state, store) = state();
        seed(&store).await;
        store
            .insert_leave(NewLeave {
                employee_id: 2,
                leave_type: LeaveType::Casual,
                start_date: NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
                days: 3,
                reason: "Wedding".into(),
            })
            .await
            .unwrap();
        let app = test_app!(state);

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/leaves")
                .insert_header(bearer(Role::Hr, None))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["status_breakdown"]["pending"], 1);
        assert_eq!(body["type_breakdown"]["casual"], 1);
        assert_eq!(body["top_requesters"][0]["employee"], "Employee 2");
        assert_eq!(body["top_requesters"][0]["days"], 3);
        assert_eq!(body["recent_leaves"][0]["leave_type"], "casual");

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/reports/leaves")
                .insert_header(bearer(Role::Manager, Some(1)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
