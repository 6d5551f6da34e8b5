use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::client_ip;
use crate::auth::auth::AuthUser;
use crate::auth::policy::{Action, authorize};
use crate::error::AppError;
use crate::model::attendance::{GeoLocation, Punch};
use crate::service::attendance::{self as service, CorrectionKind};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PunchBody {
    pub location: Option<GeoLocation>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CorrectionQuery {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Biometric device was down")]
    pub reason: String,
    #[serde(rename = "type")]
    pub kind: CorrectionKind,
}

fn punch_now(req: &HttpRequest, body: Option<web::Json<PunchBody>>) -> Punch {
    Punch {
        time: Utc::now(),
        location: body.and_then(|b| b.into_inner().location),
        ip: client_ip(req),
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body(content = PunchBody, description = "Optional geolocation", content_type = "application/json"),
    responses(
        (status = 201, description = "Checked in", body = AttendanceRecord),
        (status = 409, description = "Already checked in for today", body = Object, example = json!({
            "message": "Already checked in for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<PunchBody>>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::RecordOwnAttendance, None)?;
    let employee_id = auth.employee()?;

    let record = service::check_in(
        state.store.as_ref(),
        &state.holidays,
        &state.policy,
        employee_id,
        punch_now(&req, body),
    )
    .await?;

    Ok(HttpResponse::Created().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body(content = PunchBody, description = "Optional geolocation", content_type = "application/json"),
    responses(
        (status = 200, description = "Checked out", body = AttendanceRecord),
        (status = 404, description = "No check-in record found for today", body = Object, example = json!({
            "message": "No check-in record found for today"
        })),
        (status = 409, description = "Already checked out for today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<PunchBody>>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::RecordOwnAttendance, None)?;
    let employee_id = auth.employee()?;

    let record = service::check_out(
        state.store.as_ref(),
        &state.policy,
        employee_id,
        punch_now(&req, body),
    )
    .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Caller's attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    responses(
        (status = 200, description = "Attendance records", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let records = service::my_attendance(state.store.as_ref(), auth.employee()?).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Raise a correction query for a missing punch
#[utoipa::path(
    post,
    path = "/api/attendance/query",
    request_body(content = CorrectionQuery, content_type = "application/json"),
    responses(
        (status = 200, description = "Correction query raised", body = AttendanceRecord),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn raise_query(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CorrectionQuery>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::RecordOwnAttendance, None)?;
    let query = payload.into_inner();

    let record = service::raise_correction_query(
        state.store.as_ref(),
        auth.employee()?,
        query.date,
        query.kind,
        query.reason,
    )
    .await?;

    Ok(HttpResponse::Ok().json(record))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::test_support::{bearer, request, state, test_app};
    use crate::model::role::Role;
    use crate::store::AttendanceStore;

    #[actix_web::test]
    async fn punch_in_then_out() {
        let (state, store) = state();
        let app = test_app!(state);

        let resp = test::call_service(
            &app,
            request()
                .method(actix_web::http::Method::POST)
                .uri("/api/attendance/check-in")
                .insert_header(bearer(Role::Employee, Some(7)))
                .set_json(json!({ "location": { "lat": 23.81, "lng": 90.41, "address": "HQ" } }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["employee_id"], 7);
        assert_eq!(body["check_in"]["location"]["address"], "HQ");
        assert_eq!(body["check_in"]["ip"], "127.0.0.1");

        let resp = test::call_service(
            &app,
            request()
                .method(actix_web::http::Method::POST)
                .uri("/api/attendance/check-in")
                .insert_header(bearer(Role::Employee, Some(7)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = test::call_service(
            &app,
            request()
                .method(actix_web::http::Method::POST)
                .uri("/api/attendance/check-out")
                .insert_header(bearer(Role::Employee, Some(7)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let history = store.attendance_for_employee(7).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].check_out.is_some());
    }

    #[actix_web::test]
    async fn punching_requires_a_token_and_a_profile() {
        let (state, _) = state();
        let app = test_app!(state);

        let resp = test::call_service(
            &app,
            request()
                .method(actix_web::http::Method::POST)
                .uri("/api/attendance/check-in")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            request()
                .method(actix_web::http::Method::POST)
                .uri("/api/attendance/check-in")
                .insert_header(bearer(Role::Admin, None))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            request()
                .method(actix_web::http::Method::POST)
                .uri("/api/attendance/check-out")
                .insert_header(bearer(Role::Employee, Some(7)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "No check-in record found for today");
    }

    #[actix_web::test]
    async fn correction_query_and_history() {
        let (state, _) = state();
        let app = test_app!(state);

        let resp = test::call_service(
            &app,
            request()
                .method(actix_web::http::Method::POST)
                .uri("/api/attendance/query")
                .insert_header(bearer(Role::Employee, Some(7)))
                .set_json(json!({ "date": "2026-01-05", "reason": "Forgot", "type": "login" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            request()
                .uri("/api/attendance/me")
                .insert_header(bearer(Role::Employee, Some(7)))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body[0]["status"], "absent");
        assert_eq!(body[0]["correction_requested"], true);
    }
}
