use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::policy::{Action, authorize};
use crate::error::AppError;
use crate::model::permission::PermissionStatus;
use crate::service::permission::{self as service, PermissionForm};
use crate::state::AppState;
use crate::store::PermissionStore;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionDecision {
    pub status: PermissionStatus,
}

#[utoipa::path(
    post,
    path = "/api/permissions",
    request_body(content = PermissionForm, content_type = "application/json"),
    responses(
        (status = 201, description = "Permission requested", body = PermissionRequest),
        (status = 409, description = "Monthly permission already used", body = Object, example = json!({
            "message": "You have already applied for/used your monthly permission"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Permissions"
)]
pub async fn apply_permission(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<PermissionForm>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::RecordOwnAttendance, None)?;

    let employee_id = auth.employee()?;
    let permission =
        service::apply_permission(state.store.as_ref(), employee_id, payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(permission))
}

#[utoipa::path(
    get,
    path = "/api/permissions/me",
    responses(
        (status = 200, description = "Caller's permissions", body = [PermissionRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Permissions"
)]
pub async fn my_permissions(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let permissions = state.store.permissions_for_employee(auth.employee()?).await?;
    Ok(HttpResponse::Ok().json(permissions))
}

#[utoipa::path(
    get,
    path = "/api/permissions",
    responses(
        (status = 200, description = "All permissions", body = [PermissionRequest]),
        (status = 403, description = "HR or admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Permissions"
)]
pub async fn list_permissions(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::DecidePermission, None)?;
    let permissions = state.store.list_permissions().await?;
    Ok(HttpResponse::Ok().json(permissions))
}

#[utoipa::path(
    put,
    path = "/api/permissions/{id}",
    params(
        ("id" = u64, Path, description = "Permission id")
    ),
    request_body(content = PermissionDecision, content_type = "application/json"),
    responses(
        (status = 200, description = "Permission decided", body = PermissionRequest),
        (status = 403, description = "HR or admin only"),
        (status = 404, description = "Permission not found"),
        (status = 409, description = "Permission is no longer pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Permissions"
)]
pub async fn decide_permission(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<PermissionDecision>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::DecidePermission, None)?;

    let permission =
        service::decide_permission(state.store.as_ref(), path.into_inner(), payload.status).await?;

    Ok(HttpResponse::Ok().json(permission))
}
