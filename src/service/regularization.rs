use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, GeoLocation, Punch},
    employee::EmployeeId,
    regularization::{
        NewRegularization, RegularizationRequest, RegularizationStatus, RegularizationType,
    },
};
use crate::service::status::AttendancePolicy;
use crate::store::{AttendanceStore, RegularizationStore};

/// Address recorded on punches written by an accepted regularization.
const REGULARIZED: &str = "Regularized";

const LOST_RACE: &str = "Regularization request was updated by someone else";

/// Parses a wall-clock `HH:MM`.
pub fn parse_clock(field: &str, value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::validation(format!("{field} must be HH:MM, got {value:?}")))
}

fn parse_optional(field: &str, value: Option<&str>) -> Result<Option<NaiveTime>, AppError> {
    value.map(|v| parse_clock(field, v)).transpose()
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegularizationForm {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub attendance_date: NaiveDate,
    pub regularization_type: RegularizationType,
    #[schema(example = "Forgot to punch out")]
    pub reason: String,
    #[schema(example = "09:05")]
    pub start_time: Option<String>,
    #[schema(example = "18:10")]
    pub end_time: Option<String>,
}

pub async fn create_regularization<S>(
    store: &S,
    employee_id: EmployeeId,
    form: RegularizationForm,
) -> Result<RegularizationRequest, AppError>
where
    S: RegularizationStore + ?Sized,
{
    if form.reason.trim().is_empty() {
        return Err(AppError::validation("reason is required"));
    }
    let start = parse_optional("start_time", form.start_time.as_deref())?;
    let end = parse_optional("end_time", form.end_time.as_deref())?;
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::validation("end_time cannot be before start_time"));
        }
    }

    let request = store
        .insert_regularization(NewRegularization {
            employee_id,
            attendance_date: form.attendance_date,
            regularization_type: form.regularization_type,
            reason: form.reason,
            start_time: form.start_time,
            end_time: form.end_time,
        })
        .await?;

    tracing::info!(
        employee_id,
        regularization_id = request.id,
        kind = %request.regularization_type,
        "Regularization requested"
    );

    Ok(request)
}

fn regularized_punch(policy: &AttendancePolicy, date: NaiveDate, clock: NaiveTime) -> Punch {
    Punch {
        time: policy.instant_at(date, clock),
        location: Some(GeoLocation {
            address: Some(REGULARIZED.to_string()),
            ..GeoLocation::default()
        }),
        ip: None,
    }
}

/// Writes the correction a request carries into `record`. A mis-punch
/// replaces whichever punches it names; every type marks the day present.
fn correct_day(
    record: &mut AttendanceRecord,
    policy: &AttendancePolicy,
    mis_punch: bool,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<(), AppError> {
    if mis_punch {
        if end.is_some() && start.is_none() && record.check_in.is_none() {
            return Err(AppError::validation(
                "end_time needs a start_time when the day has no check-in",
            ));
        }
        if let Some(start) = start {
            record.check_in = Some(regularized_punch(policy, record.date, start));
        }
        if let Some(end) = end {
            record.check_out = Some(regularized_punch(policy, record.date, end));
        }
        if let (Some(check_in), Some(check_out)) = (&record.check_in, &record.check_out) {
            if check_out.time < check_in.time {
                return Err(AppError::validation(
                    "corrected check-out cannot be before the check-in",
                ));
            }
        }
    }

    record.status = AttendanceStatus::Present;
    record.recompute_work_hours();

    Ok(())
}

/// Writes the correction into the day. A missing day is inserted already
/// corrected; a day created meanwhile by a check-in is corrected in place.
async fn write_correction<S>(
    store: &S,
    policy: &AttendancePolicy,
    request: &RegularizationRequest,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ?Sized,
{
    let mis_punch = request.regularization_type == RegularizationType::MisPunch;
    let (employee_id, date) = (request.employee_id, request.attendance_date);

    if store.find_attendance(employee_id, date).await?.is_none() {
        let mut fresh = AttendanceRecord::skeleton(employee_id, date, AttendanceStatus::Present);
        correct_day(&mut fresh, policy, mis_punch, start, end)?;
        match store.insert_attendance(fresh).await {
            Err(AppError::Duplicate(_)) => {}
            other => return other,
        }
    }

    let mut record = store
        .find_attendance(employee_id, date)
        .await?
        .ok_or_else(|| AppError::not_found("Attendance record"))?;
    correct_day(&mut record, policy, mis_punch, start, end)?;
    store.update_attendance(&record).await?;

    Ok(record)
}

/// Accepts a pending request and writes its correction into the attendance
/// day, creating the day if needed. The correction is validated before the
/// status write; if applying it fails afterwards the request goes back to
/// pending.
pub async fn apply_approval<S>(
    store: &S,
    policy: &AttendancePolicy,
    request_id: u64,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + RegularizationStore + ?Sized,
{
    let request = store
        .find_regularization(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Regularization request"))?;

    if request.status != RegularizationStatus::Pending {
        return Err(AppError::conflict(format!(
            "Regularization request is already {}",
            request.status
        )));
    }

    let start = parse_optional("start_time", request.start_time.as_deref())?;
    let end = parse_optional("end_time", request.end_time.as_deref())?;
    let mis_punch = request.regularization_type == RegularizationType::MisPunch;

    // Dry run against the day as it stands now.
    let mut preview = store
        .find_attendance(request.employee_id, request.attendance_date)
        .await?
        .unwrap_or_else(|| {
            AttendanceRecord::skeleton(
                request.employee_id,
                request.attendance_date,
                AttendanceStatus::Present,
            )
        });
    correct_day(&mut preview, policy, mis_punch, start, end)?;

    if !store
        .transition_regularization(
            request_id,
            RegularizationStatus::Pending,
            RegularizationStatus::Accepted,
        )
        .await?
    {
        return Err(AppError::conflict(LOST_RACE));
    }

    let record = match write_correction(store, policy, &request, start, end).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(
                regularization_id = request_id,
                error = %e,
                "Regularization not applied, returning it to pending"
            );
            store
                .transition_regularization(
                    request_id,
                    RegularizationStatus::Accepted,
                    RegularizationStatus::Pending,
                )
                .await?;
            return Err(e);
        }
    };

    tracing::info!(
        regularization_id = request_id,
        employee_id = request.employee_id,
        date = %request.attendance_date,
        work_hours = record.work_hours,
        "Regularization applied"
    );

    Ok(record)
}

/// Decides a pending request. Returns the request and, when accepted, the
/// corrected attendance day.
pub async fn decide<S>(
    store: &S,
    policy: &AttendancePolicy,
    request_id: u64,
    to: RegularizationStatus,
) -> Result<(RegularizationRequest, Option<AttendanceRecord>), AppError>
where
    S: AttendanceStore + RegularizationStore + ?Sized,
{
    let record = match to {
        RegularizationStatus::Accepted => Some(apply_approval(store, policy, request_id).await?),
        RegularizationStatus::Rejected => {
            let request = store
                .find_regularization(request_id)
                .await?
                .ok_or_else(|| AppError::not_found("Regularization request"))?;

            if request.status != RegularizationStatus::Pending {
                return Err(AppError::conflict(format!(
                    "Regularization request is already {}",
                    request.status
                )));
            }
            if !store
                .transition_regularization(request_id, RegularizationStatus::Pending, to)
                .await?
            {
                return Err(AppError::conflict(LOST_RACE));
            }
            None
        }
        RegularizationStatus::Pending => {
            return Err(AppError::validation("status must be accepted or rejected"));
        }
    };

    let request = store
        .find_regularization(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Regularization request"))?;

    Ok((request, record))
}
