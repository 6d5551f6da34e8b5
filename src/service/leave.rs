use chrono::NaiveDate;
use serde::Deserialize;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::policy::{Action, authorize};
use crate::error::AppError;
use crate::model::{
    employee::EmployeeId,
    leave_request::{LeaveBalance, LeaveRequest, LeaveStatus, LeaveType, NewLeave},
    role::Role,
};
use crate::service::owner_of;
use crate::store::{EmployeeDirectory, LeaveQuery, LeaveStore};

/// What a status change does to the balance ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceEffect {
    Unchanged,
    Deduct,
    Restore,
}

/// Validates a move along the leave state machine and says how the balance
/// must follow. Unpaid leave never touches the ledger.
pub fn check_transition(
    from: LeaveStatus,
    to: LeaveStatus,
    leave_type: LeaveType,
) -> Result<BalanceEffect, AppError> {
    use LeaveStatus::*;

    let effect = match (from, to) {
        (Pending, Approved) => BalanceEffect::Deduct,
        (Pending, Rejected | Cancelled) => BalanceEffect::Unchanged,
        (Approved, Rejected | Cancelled) => BalanceEffect::Restore,
        _ => {
            return Err(AppError::conflict(format!(
                "Cannot move a {from} leave request to {to}"
            )));
        }
    };

    Ok(if leave_type.is_metered() {
        effect
    } else {
        BalanceEffect::Unchanged
    })
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveApplication {
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family function")]
    pub reason: String,
}

pub async fn apply_leave<S>(
    store: &S,
    employee_id: EmployeeId,
    application: LeaveApplication,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore + ?Sized,
{
    if application.start_date > application.end_date {
        return Err(AppError::validation("start_date cannot be after end_date"));
    }
    if application.reason.trim().is_empty() {
        return Err(AppError::validation("reason is required"));
    }

    let days = (application.end_date - application.start_date).num_days() as i32 + 1;

    let leave = store
        .insert_leave(NewLeave {
            employee_id,
            leave_type: application.leave_type,
            start_date: application.start_date,
            end_date: application.end_date,
            days,
            reason: application.reason,
        })
        .await?;

    tracing::info!(employee_id, leave_id = leave.id, days, "Leave request submitted");

    Ok(leave)
}

/// Moves a leave request to `to`, keeping the balance in step.
///
/// The deduction is a conditional decrement taken before the status write,
/// and the status write is itself conditional on the status read here. If
/// another writer moved the request in between, the deduction is given back
/// and the call fails with a conflict.
pub async fn transition_leave<S>(
    store: &S,
    actor: &AuthUser,
    leave_id: u64,
    to: LeaveStatus,
    comments: Option<String>,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore + EmployeeDirectory + ?Sized,
{
    let mut leave = store
        .find_leave(leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request"))?;

    let owner = owner_of(store, leave.employee_id).await?;
    authorize(actor, Action::TransitionLeave(to), Some(owner))?;

    let from = leave.status;
    let effect = check_transition(from, to, leave.leave_type)?;

    if effect == BalanceEffect::Deduct
        && !store
            .deduct_balance(leave.employee_id, leave.leave_type, leave.days)
            .await?
    {
        return Err(AppError::InsufficientBalance(leave.leave_type));
    }

    let moved = store
        .transition_leave(leave_id, from, to, actor.employee_id, comments.clone())
        .await?;

    if !moved {
        if effect == BalanceEffect::Deduct {
            store
                .restore_balance(leave.employee_id, leave.leave_type, leave.days)
                .await?;
        }
        tracing::warn!(leave_id, %from, %to, "Leave request changed concurrently");
        return Err(AppError::conflict("Leave request was updated by someone else"));
    }

    if effect == BalanceEffect::Restore {
        store
            .restore_balance(leave.employee_id, leave.leave_type, leave.days)
            .await?;
    }

    tracing::info!(
        leave_id,
        employee_id = leave.employee_id,
        %from,
        %to,
        ?effect,
        "Leave request status updated"
    );

    leave.status = to;
    leave.approver_id = actor.employee_id;
    leave.comments = comments;

    Ok(leave)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaveFilter {
    pub employee_id: Option<EmployeeId>,
    pub status: Option<LeaveStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

pub struct LeavePage {
    pub data: Vec<LeaveRequest>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

/// Employees see their own requests, managers their direct reports', HR and
/// admin everyone's.
pub async fn list_leaves<S>(
    store: &S,
    actor: &AuthUser,
    filter: LeaveFilter,
) -> Result<LeavePage, AppError>
where
    S: LeaveStore + EmployeeDirectory + ?Sized,
{
    let per_page = filter.per_page.unwrap_or(10).clamp(1, 100);
    let page = filter.page.unwrap_or(1).max(1);

    let mut query = LeaveQuery {
        employee_ids: None,
        employee_id: filter.employee_id,
        status: filter.status,
        page,
        per_page,
    };

    match actor.role {
        Role::Employee => query.employee_id = Some(actor.employee()?),
        Role::Manager => {
            query.employee_ids = Some(store.direct_reports(actor.employee()?).await?);
        }
        Role::Admin | Role::Hr => {}
    }

    let (data, total) = store.list_leaves(&query).await?;

    Ok(LeavePage {
        data,
        page,
        per_page,
        total,
    })
}

pub async fn get_leave<S>(
    store: &S,
    actor: &AuthUser,
    leave_id: u64,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore + EmployeeDirectory + ?Sized,
{
    let leave = store
        .find_leave(leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request"))?;

    let owner = owner_of(store, leave.employee_id).await?;
    authorize(actor, Action::ViewLeave, Some(owner))?;

    Ok(leave)
}

/// One entry per leave type. Types without a ledger row report their
/// default allowance.
pub async fn balances<S>(store: &S, employee_id: EmployeeId) -> Result<Vec<LeaveBalance>, AppError>
where
    S: LeaveStore + ?Sized,
{
    let stored = store.leave_balances(employee_id).await?;

    Ok(LeaveType::iter()
        .map(|leave_type| LeaveBalance {
            leave_type,
            balance: stored
                .iter()
                .find(|(t, _)| *t == leave_type)
                .map_or_else(|| leave_type.default_allowance(), |(_, b)| *b),
        })
        .collect())
}
