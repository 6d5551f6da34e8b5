use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::AppError;
use crate::model::{
    attendance::AttendanceRecord,
    employee::{EmployeeFilter, EmployeeId, EmployeeProfile, EmployeeStatus},
    holiday::{Holiday, NewHoliday},
    leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave},
    permission::{NewPermission, PermissionRequest, PermissionStatus},
    regularization::{NewRegularization, RegularizationRequest, RegularizationStatus},
};
use crate::store::{
    AttendanceStore, CalendarStore, EmployeeDirectory, LeaveQuery, LeaveStore, PermissionStore,
    RegularizationStore, StoreResult,
};

#[derive(Default)]
struct Tables {
    next_id: u64,
    attendance: Vec<AttendanceRecord>,
    holidays: Vec<Holiday>,
    permissions: Vec<PermissionRequest>,
    leaves: Vec<LeaveRequest>,
    balances: HashMap<(EmployeeId, LeaveType), i32>,
    regularizations: Vec<RegularizationRequest>,
    employees: Vec<EmployeeProfile>,
}

impl Tables {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store kept in process memory, for tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn add_employee(&self, id: EmployeeId, manager: Option<EmployeeId>) -> EmployeeProfile {
        let profile = EmployeeProfile {
            id,
            employee_code: format!("EMP-{id:03}"),
            first_name: "Employee".into(),
            last_name: id.to_string(),
            department: "Engineering".into(),
            designation: "Engineer".into(),
            reporting_manager: manager,
            status: EmployeeStatus::Active,
        };
        self.tables.lock().unwrap().employees.push(profile.clone());
        profile
    }

    pub fn set_balance(&self, employee_id: EmployeeId, leave_type: LeaveType, balance: i32) {
        self.tables
            .lock()
            .unwrap()
            .balances
            .insert((employee_id, leave_type), balance);
    }

    pub fn balance(&self, employee_id: EmployeeId, leave_type: LeaveType) -> Option<i32> {
        self.tables
            .lock()
            .unwrap()
            .balances
            .get(&(employee_id, leave_type))
            .copied()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_attendance(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attendance
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn insert_attendance(
        &self,
        mut record: AttendanceRecord,
    ) -> StoreResult<AttendanceRecord> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .attendance
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(AppError::Duplicate(format!(
                "attendance for employee {} on {} already exists",
                record.employee_id, record.date
            )));
        }
        record.id = tables.id();
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn update_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(stored) = tables.attendance.iter_mut().find(|r| r.id == record.id) {
            *stored = record.clone();
        }
        Ok(())
    }

    async fn close_attendance(&self, record: &AttendanceRecord) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .attendance
            .iter_mut()
            .find(|r| r.id == record.id && r.check_out.is_none())
        {
            Some(stored) => {
                stored.check_out = record.check_out.clone();
                stored.work_hours = record.work_hours;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn attendance_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let tables = self.tables.lock().unwrap();
        let mut records: Vec<_> = tables
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn attendance_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .attendance
            .iter()
            .filter(|r| from <= r.date && r.date <= to)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn holiday_on(&self, date: NaiveDate) -> StoreResult<Option<Holiday>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.holidays.iter().find(|h| h.date == date).cloned())
    }

    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .holidays
            .iter()
            .filter(|h| from <= h.date && h.date <= to)
            .cloned()
            .collect())
    }

    async fn list_holidays(&self) -> StoreResult<Vec<Holiday>> {
        let tables = self.tables.lock().unwrap();
        let mut holidays = tables.holidays.clone();
        holidays.sort_by_key(|h| h.date);
        Ok(holidays)
    }

    async fn insert_holiday(&self, holiday: NewHoliday) -> StoreResult<Holiday> {
        let mut tables = self.tables.lock().unwrap();
        if tables.holidays.iter().any(|h| h.date == holiday.date) {
            return Err(AppError::Duplicate(format!(
                "a holiday on {} already exists",
                holiday.date
            )));
        }
        let holiday = Holiday {
            id: tables.id(),
            date: holiday.date,
            name: holiday.name,
            holiday_type: holiday.holiday_type,
            description: holiday.description,
        };
        tables.holidays.push(holiday.clone());
        Ok(holiday)
    }

    async fn delete_holiday(&self, id: u64) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.holidays.len();
        tables.holidays.retain(|h| h.id != id);
        Ok(tables.holidays.len() != before)
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn insert_permission(&self, permission: NewPermission) -> StoreResult<PermissionRequest> {
        let mut tables = self.tables.lock().unwrap();
        let request = PermissionRequest {
            id: tables.id(),
            employee_id: permission.employee_id,
            date: permission.date,
            permission_type: permission.permission_type,
            reason: permission.reason,
            status: PermissionStatus::Pending,
            created_at: Utc::now(),
        };
        tables.permissions.push(request.clone());
        Ok(request)
    }

    async fn find_permission(&self, id: u64) -> StoreResult<Option<PermissionRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.permissions.iter().find(|p| p.id == id).cloned())
    }

    async fn approved_permission_on(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> StoreResult<Option<PermissionRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .permissions
            .iter()
            .find(|p| {
                p.employee_id == employee_id
                    && p.date == date
                    && p.status == PermissionStatus::Approved
            })
            .cloned())
    }

    async fn has_active_permission(
        &self,
        employee_id: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.permissions.iter().any(|p| {
            p.employee_id == employee_id
                && from <= p.date
                && p.date <= to
                && matches!(p.status, PermissionStatus::Pending | PermissionStatus::Approved)
        }))
    }

    async fn permissions_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<PermissionRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .permissions
            .iter()
            .rev()
            .filter(|p| p.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn list_permissions(&self) -> StoreResult<Vec<PermissionRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.permissions.iter().rev().cloned().collect())
    }

    async fn transition_permission(
        &self,
        id: u64,
        from: PermissionStatus,
        to: PermissionStatus,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .permissions
            .iter_mut()
            .find(|p| p.id == id && p.status == from)
        {
            Some(p) => {
                p.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert_leave(&self, leave: NewLeave) -> StoreResult<LeaveRequest> {
        let mut tables = self.tables.lock().unwrap();
        let request = LeaveRequest {
            id: tables.id(),
            employee_id: leave.employee_id,
            leave_type: leave.leave_type,
            start_date: leave.start_date,
            end_date: leave.end_date,
            days: leave.days,
            reason: leave.reason,
            status: LeaveStatus::Pending,
            approver_id: None,
            comments: None,
            created_at: Utc::now(),
        };
        tables.leaves.push(request.clone());
        Ok(request)
    }

    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn list_leaves(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let tables = self.tables.lock().unwrap();
        let matching: Vec<_> = tables
            .leaves
            .iter()
            .rev()
            .filter(|l| query.employee_id.is_none_or(|id| l.employee_id == id))
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .filter(|l| {
                query
                    .employee_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&l.employee_id))
            })
            .cloned()
            .collect();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip((query.page.saturating_sub(1) * query.per_page) as usize)
            .take(query.per_page as usize)
            .collect();

        Ok((page, total))
    }

    async fn all_leaves(&self) -> StoreResult<Vec<LeaveRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.leaves.iter().rev().cloned().collect())
    }

    async fn approved_leaves_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .leaves
            .iter()
            .filter(|l| l.status == LeaveStatus::Approved)
            .filter(|l| l.start_date <= to && l.end_date >= from)
            .cloned()
            .collect())
    }

    async fn transition_leave(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
        approver_id: Option<EmployeeId>,
        comments: Option<String>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .leaves
            .iter_mut()
            .find(|l| l.id == id && l.status == from)
        {
            Some(leave) => {
                leave.status = to;
                leave.approver_id = approver_id;
                leave.comments = comments;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn leave_balances(&self, employee_id: EmployeeId) -> StoreResult<Vec<(LeaveType, i32)>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .balances
            .iter()
            .filter(|((id, _), _)| *id == employee_id)
            .map(|((_, leave_type), balance)| (*leave_type, *balance))
            .collect())
    }

    async fn deduct_balance(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        days: i32,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let balance = tables
            .balances
            .entry((employee_id, leave_type))
            .or_insert_with(|| leave_type.default_allowance());
        if *balance < days {
            return Ok(false);
        }
        *balance -= days;
        Ok(true)
    }

    async fn restore_balance(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        days: i32,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        *tables
            .balances
            .entry((employee_id, leave_type))
            .or_insert_with(|| leave_type.default_allowance()) += days;
        Ok(())
    }
}

#[async_trait]
impl RegularizationStore for MemoryStore {
    async fn insert_regularization(
        &self,
        request: NewRegularization,
    ) -> StoreResult<RegularizationRequest> {
        let mut tables = self.tables.lock().unwrap();
        let stored = RegularizationRequest {
            id: tables.id(),
            employee_id: request.employee_id,
            attendance_date: request.attendance_date,
            regularization_type: request.regularization_type,
            reason: request.reason,
            start_time: request.start_time,
            end_time: request.end_time,
            status: RegularizationStatus::Pending,
            created_at: Utc::now(),
        };
        tables.regularizations.push(stored.clone());
        Ok(stored)
    }

    async fn find_regularization(&self, id: u64) -> StoreResult<Option<RegularizationRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.regularizations.iter().find(|r| r.id == id).cloned())
    }

    async fn regularizations_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<RegularizationRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .regularizations
            .iter()
            .rev()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn list_regularizations(&self) -> StoreResult<Vec<RegularizationRequest>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.regularizations.iter().rev().cloned().collect())
    }

    async fn transition_regularization(
        &self,
        id: u64,
        from: RegularizationStatus,
        to: RegularizationStatus,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .regularizations
            .iter_mut()
            .find(|r| r.id == id && r.status == from)
        {
            Some(r) => {
                r.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn find_employee(&self, id: EmployeeId) -> StoreResult<Option<EmployeeProfile>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn find_employees(&self, ids: &[EmployeeId]) -> StoreResult<Vec<EmployeeProfile>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .employees
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }

    async fn active_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<EmployeeProfile>> {
        let tables = self.tables.lock().unwrap();
        let mut employees: Vec<_> = tables
            .employees
            .iter()
            .filter(|e| e.status == EmployeeStatus::Active)
            .filter(|e| filter.department.as_ref().is_none_or(|d| &e.department == d))
            .filter(|e| filter.designation.as_ref().is_none_or(|d| &e.designation == d))
            .filter(|e| filter.only.is_none_or(|id| e.id == id))
            .cloned()
            .collect();
        employees.sort_by_key(|e| e.id);
        Ok(employees)
    }

    async fn direct_reports(&self, manager_id: EmployeeId) -> StoreResult<Vec<EmployeeId>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .employees
            .iter()
            .filter(|e| e.reporting_manager == Some(manager_id))
            .map(|e| e.id)
            .collect())
    }
}
