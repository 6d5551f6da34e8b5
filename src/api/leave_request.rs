use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::policy::{Action, authorize};
use crate::error::AppError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::service::leave::{self as service, LeaveApplication, LeaveFilter};
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": 1,
            "employee_id": 1000,
            "leave_type": "casual",
            "start_date": "2026-01-05",
            "end_date": "2026-01-09",
            "days": 5,
            "reason": "Family function",
            "status": "pending",
            "approver_id": null,
            "comments": null,
            "created_at": "2026-01-01T00:00:00Z"
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveListQuery {
    /// Filter by employee ID
    #[param(example = 123)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    #[param(inline)]
    pub status: Option<LeaveStatus>,
    /// Pagination page number (start with 1)
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[param(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveStatusUpdate {
    pub status: LeaveStatus,
    #[schema(example = "Enjoy your break")]
    pub comments: Option<String>,
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = LeaveApplication,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted successfully", body = LeaveRequest),
        (status = 400, description = "Invalid date range", body = Object, example = json!({
            "message": "start_date cannot be after end_date"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<LeaveApplication>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::RecordOwnAttendance, None)?;

    let leave =
        service::apply_leave(state.store.as_ref(), auth.employee()?, payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(leave))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveListQuery),
    responses(
        (status = 200, description = "Leave requests visible to the caller", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leaves(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let filter = LeaveFilter {
        employee_id: query.employee_id,
        status: query.status,
        page: query.page,
        per_page: query.per_page,
    };

    let page = service::list_leaves(state.store.as_ref(), &auth, filter).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: page.data,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}

/* =========================
Leave balance of the caller
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    responses(
        (status = 200, description = "Remaining days per leave type", body = [LeaveBalance]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let balances = service::balances(state.store.as_ref(), auth.employee()?).await?;
    Ok(HttpResponse::Ok().json(balances))
}

#[utoipa::path(
    get,
    path = "/api/leave/{id}",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave = service::get_leave(state.store.as_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Approve, reject or cancel
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    request_body(content = LeaveStatusUpdate, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequest),
        (status = 400, description = "Insufficient balance", body = Object, example = json!({
            "message": "Insufficient casual leave balance"
        })),
        (status = 403, description = "Not authorized to update this leave request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<LeaveStatusUpdate>,
) -> Result<HttpResponse, AppError> {
    let update = payload.into_inner();

    let leave = service::transition_leave(
        state.store.as_ref(),
        &auth,
        path.into_inner(),
        update.status,
        update.comments,
    )
    .await?;

    Ok(HttpResponse::Ok().json(leave))
}
