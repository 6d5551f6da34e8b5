//! Persistence seams. Every service talks to storage through these traits;
//! `MySqlStore` backs them in production.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;
use crate::model::{
    attendance::AttendanceRecord,
    employee::{EmployeeFilter, EmployeeId, EmployeeProfile},
    holiday::{Holiday, NewHoliday},
    leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave},
    permission::{NewPermission, PermissionRequest, PermissionStatus},
    regularization::{NewRegularization, RegularizationRequest, RegularizationStatus},
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

pub type StoreResult<T> = Result<T, AppError>;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_attendance(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Inserts a new day record and returns it with its id. A second record
    /// for the same employee and day fails with `AppError::Duplicate`.
    async fn insert_attendance(&self, record: AttendanceRecord) -> StoreResult<AttendanceRecord>;

    async fn update_attendance(&self, record: &AttendanceRecord) -> StoreResult<()>;

    /// Writes the check-out punch and worked hours of `record`, only if the
    /// stored day has no check-out yet. Returns false otherwise.
    async fn close_attendance(&self, record: &AttendanceRecord) -> StoreResult<bool>;

    /// Newest first.
    async fn attendance_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    /// Inclusive on both ends.
    async fn attendance_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>>;
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn holiday_on(&self, date: NaiveDate) -> StoreResult<Option<Holiday>>;

    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>>;

    /// Sorted by date.
    async fn list_holidays(&self) -> StoreResult<Vec<Holiday>>;

    async fn insert_holiday(&self, holiday: NewHoliday) -> StoreResult<Holiday>;

    /// Returns false when nothing was deleted.
    async fn delete_holiday(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn insert_permission(&self, permission: NewPermission) -> StoreResult<PermissionRequest>;

    async fn find_permission(&self, id: u64) -> StoreResult<Option<PermissionRequest>>;

    /// The approved permission of an employee on a given day, if any.
    async fn approved_permission_on(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> StoreResult<Option<PermissionRequest>>;

    /// Whether a pending or approved permission exists between the two
    /// dates, inclusive.
    async fn has_active_permission(
        &self,
        employee_id: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<bool>;

    async fn permissions_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<PermissionRequest>>;

    async fn list_permissions(&self) -> StoreResult<Vec<PermissionRequest>>;

    /// Moves a permission from `from` to `to`. Returns false if the stored
    /// status was no longer `from`.
    async fn transition_permission(
        &self,
        id: u64,
        from: PermissionStatus,
        to: PermissionStatus,
    ) -> StoreResult<bool>;
}

/// Filters for listing leave requests.
#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    /// `Some` restricts the listing to these employees (possibly none).
    pub employee_ids: Option<Vec<EmployeeId>>,
    pub employee_id: Option<EmployeeId>,
    pub status: Option<LeaveStatus>,
    pub page: u64,
    pub per_page: u64,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert_leave(&self, leave: NewLeave) -> StoreResult<LeaveRequest>;

    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>>;

    /// One page of matching requests, newest first, plus the total count.
    async fn list_leaves(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRequest>, i64)>;

    /// Every request, newest first.
    async fn all_leaves(&self) -> StoreResult<Vec<LeaveRequest>>;

    /// Approved leaves overlapping the inclusive date range.
    async fn approved_leaves_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>>;

    /// Moves a request from `from` to `to`, recording who did it. Returns
    /// false if the stored status was no longer `from`.
    async fn transition_leave(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
        approver_id: Option<EmployeeId>,
        comments: Option<String>,
    ) -> StoreResult<bool>;

    /// Stored balances only; types without a row are absent.
    async fn leave_balances(&self, employee_id: EmployeeId) -> StoreResult<Vec<(LeaveType, i32)>>;

    /// Subtracts `days` only if the balance covers it, as one atomic step.
    /// Returns false when the balance was insufficient.
    async fn deduct_balance(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        days: i32,
    ) -> StoreResult<bool>;

    async fn restore_balance(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        days: i32,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait RegularizationStore: Send + Sync {
    async fn insert_regularization(
        &self,
        request: NewRegularization,
    ) -> StoreResult<RegularizationRequest>;

    async fn find_regularization(&self, id: u64) -> StoreResult<Option<RegularizationRequest>>;

    async fn regularizations_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<RegularizationRequest>>;

    async fn list_regularizations(&self) -> StoreResult<Vec<RegularizationRequest>>;

    async fn transition_regularization(
        &self,
        id: u64,
        from: RegularizationStatus,
        to: RegularizationStatus,
    ) -> StoreResult<bool>;
}

/// Read-only view of the employee directory.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find_employee(&self, id: EmployeeId) -> StoreResult<Option<EmployeeProfile>>;

    async fn find_employees(&self, ids: &[EmployeeId]) -> StoreResult<Vec<EmployeeProfile>>;

    /// Active employees matching the filter, ordered by id.
    async fn active_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<EmployeeProfile>>;

    async fn direct_reports(&self, manager_id: EmployeeId) -> StoreResult<Vec<EmployeeId>>;
}

pub trait Store:
    AttendanceStore
    + CalendarStore
    + PermissionStore
    + LeaveStore
    + RegularizationStore
    + EmployeeDirectory
{
}

impl<T> Store for T where
    T: AttendanceStore
        + CalendarStore
        + PermissionStore
        + LeaveStore
        + RegularizationStore
        + EmployeeDirectory
{
}
