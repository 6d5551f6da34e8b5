use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::policy::{Action, authorize};
use crate::error::AppError;
use crate::model::{
    attendance::AttendanceRecord,
    regularization::{RegularizationRequest, RegularizationStatus},
};
use crate::service::regularization::{self as service, RegularizationForm};
use crate::state::AppState;
use crate::store::RegularizationStore;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegularizationDecision {
    pub status: RegularizationStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegularizationOutcome {
    pub request: RegularizationRequest,
    /// The corrected day, present when the request was accepted.
    pub attendance: Option<AttendanceRecord>,
}

#[utoipa::path(
    post,
    path = "/api/regularization",
    request_body(content = RegularizationForm, content_type = "application/json"),
    responses(
        (status = 201, description = "Regularization requested", body = RegularizationRequest),
        (status = 400, description = "Malformed times or missing reason", body = Object, example = json!({
            "message": "start_time must be HH:MM, got \"9am\""
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Regularization"
)]
pub async fn create_regularization(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<RegularizationForm>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::RecordOwnAttendance, None)?;

    let request =
        service::create_regularization(state.store.as_ref(), auth.employee()?, payload.into_inner())
            .await?;

    Ok(HttpResponse::Created().json(request))
}

#[utoipa::path(
    get,
    path = "/api/regularization/me",
    responses(
        (status = 200, description = "Caller's regularization requests", body = [RegularizationRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Regularization"
)]
pub async fn my_regularizations(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let requests = state
        .store
        .regularizations_for_employee(auth.employee()?)
        .await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/regularization",
    responses(
        (status = 200, description = "All regularization requests", body = [RegularizationRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR or admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Regularization"
)]
pub async fn list_regularizations(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::DecideRegularization, None)?;
    let requests = state.store.list_regularizations().await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// Accept or reject a pending request. Accepting writes the correction into
/// the attendance day.
#[utoipa::path(
    put,
    path = "/api/regularization/{id}",
    params(
        ("id" = u64, Path, description = "Regularization request id")
    ),
    request_body(content = RegularizationDecision, content_type = "application/json"),
    responses(
        (status = 200, description = "Request decided", body = RegularizationOutcome),
        (status = 400, description = "Request cannot be applied"),
        (status = 403, description = "HR or admin only"),
        (status = 404, description = "Regularization request not found"),
        (status = 409, description = "Request is no longer pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Regularization"
)]
pub async fn decide_regularization(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<RegularizationDecision>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::DecideRegularization, None)?;

    let (request, attendance) = service::decide(
        state.store.as_ref(),
        &state.policy,
        path.into_inner(),
        payload.status,
    )
    .await?;

    Ok(HttpResponse::Ok().json(RegularizationOutcome { request, attendance }))
}
