use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{
    employee::EmployeeId,
    permission::{NewPermission, PermissionRequest, PermissionStatus, PermissionType},
};
use crate::store::PermissionStore;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PermissionForm {
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub permission_type: PermissionType,
    #[schema(example = "Doctor's appointment")]
    pub reason: String,
}

fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let next = first
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(first);
    (first, next.pred_opt().unwrap_or(date))
}

/// One pending or approved permission per employee per calendar month.
pub async fn apply_permission<S>(
    store: &S,
    employee_id: EmployeeId,
    form: PermissionForm,
) -> Result<PermissionRequest, AppError>
where
    S: PermissionStore + ?Sized,
{
    if form.reason.trim().is_empty() {
        return Err(AppError::validation("reason is required"));
    }

    let (first, last) = month_bounds(form.date);
    if store.has_active_permission(employee_id, first, last).await? {
        return Err(AppError::conflict(
            "You have already applied for/used your monthly permission",
        ));
    }

    let permission = store
        .insert_permission(NewPermission {
            employee_id,
            date: form.date,
            permission_type: form.permission_type,
            reason: form.reason,
        })
        .await?;

    tracing::info!(
        employee_id,
        permission_id = permission.id,
        date = %permission.date,
        "Permission requested"
    );

    Ok(permission)
}

pub async fn decide_permission<S>(
    store: &S,
    permission_id: u64,
    to: PermissionStatus,
) -> Result<PermissionRequest, AppError>
where
    S: PermissionStore + ?Sized,
{
    let mut permission = store
        .find_permission(permission_id)
        .await?
        .ok_or_else(|| AppError::not_found("Permission"))?;

    if to == PermissionStatus::Pending {
        return Err(AppError::validation("status must be approved or rejected"));
    }
    if permission.status != PermissionStatus::Pending {
        return Err(AppError::conflict(format!(
            "Permission is already {}",
            permission.status
        )));
    }

    if !store
        .transition_permission(permission_id, PermissionStatus::Pending, to)
        .await?
    {
        return Err(AppError::conflict("Permission was updated by someone else"));
    }

    tracing::info!(permission_id, status = %to, "Permission decided");

    permission.status = to;
    Ok(permission)
}
