use chrono::NaiveDate;
use serde::Deserialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, Punch},
    employee::EmployeeId,
};
use crate::service::status::{AttendancePolicy, derive_check_in_status};
use crate::store::{AttendanceStore, CalendarStore, PermissionStore};
use crate::utils::holiday_cache::HolidayCache;

/// Which punch a correction query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CorrectionKind {
    Login,
    Logout,
}

/// Opens the employee's day. The punch time decides both the calendar day
/// and the status.
pub async fn check_in<S>(
    store: &S,
    holidays: &HolidayCache,
    policy: &AttendancePolicy,
    employee_id: EmployeeId,
    punch: Punch,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + CalendarStore + PermissionStore + ?Sized,
{
    let today = policy.today(punch.time);

    if store.find_attendance(employee_id, today).await?.is_some() {
        return Err(AppError::AlreadyCheckedIn);
    }

    let permission = store
        .approved_permission_on(employee_id, today)
        .await?
        .map(|p| p.permission_type);
    let threshold = policy.threshold_for(permission);
    let is_holiday = holidays.is_holiday(store, today).await?;

    let status =
        derive_check_in_status(policy.local_time(punch.time), today, threshold, is_holiday);

    let record = AttendanceRecord::checked_in(employee_id, today, punch, status);

    // The unique (employee, day) key catches a concurrent check-in.
    let record = match store.insert_attendance(record).await {
        Err(AppError::Duplicate(_)) => return Err(AppError::AlreadyCheckedIn),
        other => other?,
    };

    tracing::info!(
        employee_id,
        %today,
        status = %record.status,
        is_holiday,
        "Checked in"
    );

    Ok(record)
}

/// Closes the employee's day. The status decided at check-in is kept.
pub async fn check_out<S>(
    store: &S,
    policy: &AttendancePolicy,
    employee_id: EmployeeId,
    punch: Punch,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ?Sized,
{
    let today = policy.today(punch.time);

    let mut record = store
        .find_attendance(employee_id, today)
        .await?
        .filter(|r| r.check_in.is_some())
        .ok_or(AppError::NoCheckInFound)?;

    if record.check_out.is_some() {
        return Err(AppError::AlreadyCheckedOut);
    }

    record.check_out = Some(punch);
    record.recompute_work_hours();

    // A concurrent check-out already closed the day.
    if !store.close_attendance(&record).await? {
        return Err(AppError::AlreadyCheckedOut);
    }

    tracing::info!(employee_id, %today, work_hours = record.work_hours, "Checked out");

    Ok(record)
}

pub async fn my_attendance<S>(
    store: &S,
    employee_id: EmployeeId,
) -> Result<Vec<AttendanceRecord>, AppError>
where
    S: AttendanceStore + ?Sized,
{
    store.attendance_for_employee(employee_id).await
}

/// Flags a day for correction, creating an `absent` placeholder when the
/// employee has no record for it.
pub async fn raise_correction_query<S>(
    store: &S,
    employee_id: EmployeeId,
    date: NaiveDate,
    kind: CorrectionKind,
    reason: String,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ?Sized,
{
    if reason.trim().is_empty() {
        return Err(AppError::validation("reason is required"));
    }

    let mut record = match store.find_attendance(employee_id, date).await? {
        Some(record) => record,
        None => {
            store
                .insert_attendance(AttendanceRecord::skeleton(
                    employee_id,
                    date,
                    AttendanceStatus::Absent,
                ))
                .await?
        }
    };

    record.correction_requested = true;
    record.correction_reason = Some(reason);

    store.update_attendance(&record).await?;

    tracing::info!(employee_id, %date, %kind, "Correction query raised");

    Ok(record)
}
