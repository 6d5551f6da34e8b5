//! Who may do what. Every handler that reads across employees or changes a
//! request's status asks [`authorize`] first.

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{employee::EmployeeId, leave_request::LeaveStatus, role::Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Punch in/out, correction queries, own requests.
    RecordOwnAttendance,
    ViewGrid,
    ViewOrgReports,
    /// List all regularizations and accept/reject them.
    DecideRegularization,
    /// List all permissions and approve/reject them.
    DecidePermission,
    ViewLeave,
    TransitionLeave(LeaveStatus),
    ManageHolidays,
    DeleteHolidays,
}

/// The employee a resource belongs to, and their reporting manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub employee_id: EmployeeId,
    pub manager_id: Option<EmployeeId>,
}

impl AuthUser {
    fn owns(&self, owner: Option<Owner>) -> bool {
        matches!((self.employee_id, owner), (Some(me), Some(o)) if o.employee_id == me)
    }

    fn manages(&self, owner: Option<Owner>) -> bool {
        matches!(
            (self.employee_id, owner),
            (Some(me), Some(Owner { manager_id: Some(m), .. })) if m == me
        )
    }
}

pub fn authorize(actor: &AuthUser, action: Action, owner: Option<Owner>) -> Result<(), AppError> {
    let role = actor.role;

    let allowed = match action {
        Action::RecordOwnAttendance => {
            if actor.employee_id.is_none() {
                return Err(AppError::forbidden("No employee profile linked to this account"));
            }
            true
        }
        Action::ViewGrid => matches!(role, Role::Admin | Role::Hr | Role::Employee),
        Action::ViewOrgReports
        | Action::DecideRegularization
        | Action::DecidePermission
        | Action::ManageHolidays => role.is_hr_or_admin(),
        Action::DeleteHolidays => role == Role::Admin,
        Action::ViewLeave => match role {
            Role::Admin | Role::Hr => true,
            Role::Manager => actor.owns(owner) || actor.manages(owner),
            Role::Employee => actor.owns(owner),
        },
        Action::TransitionLeave(target) => match role {
            Role::Admin | Role::Hr => true,
            Role::Manager => {
                actor.manages(owner) || (actor.owns(owner) && target == LeaveStatus::Cancelled)
            }
            Role::Employee => {
                if !actor.owns(owner) {
                    return Err(AppError::forbidden(
                        "Not authorized to update this leave request",
                    ));
                }
                target == LeaveStatus::Cancelled
            }
        },
    };

    if allowed {
        Ok(())
    } else {
        tracing::warn!(
            user_id = actor.user_id,
            username = %actor.username,
            role = ?role,
            action = ?action,
            "Authorization denied"
        );
        Err(AppError::forbidden(match action {
            Action::TransitionLeave(_) if role == Role::Employee => {
                "Employees can only cancel their leave requests"
            }
            Action::DeleteHolidays => "Admin only",
            _ => "Not authorized to perform this action",
        }))
    }
}
