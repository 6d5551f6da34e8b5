use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};
use std::str::FromStr;

use crate::error::AppError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, GeoLocation, Punch},
    employee::{EmployeeFilter, EmployeeId, EmployeeProfile, EmployeeStatus},
    holiday::{Holiday, HolidayType, NewHoliday},
    leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave},
    permission::{NewPermission, PermissionRequest, PermissionStatus, PermissionType},
    regularization::{
        NewRegularization, RegularizationRequest, RegularizationStatus, RegularizationType,
    },
};
use crate::store::{
    AttendanceStore, CalendarStore, EmployeeDirectory, LeaveQuery, LeaveStore, PermissionStore,
    RegularizationStore, StoreResult,
};
use crate::utils::db_utils::{Filters, SqlValue};

/// MySQL duplicate-key SQLSTATE.
const DUPLICATE_KEY: &str = "23000";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn is_duplicate(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(DUPLICATE_KEY))
}

/// Parses an enum column written by this store.
fn decode<T: FromStr>(column: &str, value: &str) -> Result<T, AppError> {
    value.parse().map_err(|_| {
        AppError::Database(sqlx::Error::Decode(
            format!("invalid {column} value {value:?}").into(),
        ))
    })
}

// -------------------------
// Rows
// -------------------------

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, date,
    check_in_time, check_in_lat, check_in_lng, check_in_address, check_in_ip,
    check_out_time, check_out_lat, check_out_lng, check_out_address, check_out_ip,
    status, work_hours, correction_requested, correction_reason
"#;

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in_time: Option<DateTime<Utc>>,
    check_in_lat: Option<f64>,
    check_in_lng: Option<f64>,
    check_in_address: Option<String>,
    check_in_ip: Option<String>,
    check_out_time: Option<DateTime<Utc>>,
    check_out_lat: Option<f64>,
    check_out_lng: Option<f64>,
    check_out_address: Option<String>,
    check_out_ip: Option<String>,
    status: String,
    work_hours: f64,
    correction_requested: bool,
    correction_reason: Option<String>,
}

fn punch_from_columns(
    time: Option<DateTime<Utc>>,
    lat: Option<f64>,
    lng: Option<f64>,
    address: Option<String>,
    ip: Option<String>,
) -> Option<Punch> {
    let time = time?;
    let location = if lat.is_some() || lng.is_some() || address.is_some() {
        Some(GeoLocation { lat, lng, address })
    } else {
        None
    };
    Some(Punch { time, location, ip })
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in: punch_from_columns(
                row.check_in_time,
                row.check_in_lat,
                row.check_in_lng,
                row.check_in_address,
                row.check_in_ip,
            ),
            check_out: punch_from_columns(
                row.check_out_time,
                row.check_out_lat,
                row.check_out_lng,
                row.check_out_address,
                row.check_out_ip,
            ),
            status: AttendanceStatus::from_stored(&row.status),
            work_hours: row.work_hours,
            correction_requested: row.correction_requested,
            correction_reason: row.correction_reason,
        }
    }
}

/// Flattened punch columns, ready to bind.
struct PunchColumns {
    time: Option<DateTime<Utc>>,
    lat: Option<f64>,
    lng: Option<f64>,
    address: Option<String>,
    ip: Option<String>,
}

impl From<&Option<Punch>> for PunchColumns {
    fn from(punch: &Option<Punch>) -> Self {
        let location = punch.as_ref().and_then(|p| p.location.clone()).unwrap_or_default();
        PunchColumns {
            time: punch.as_ref().map(|p| p.time),
            lat: location.lat,
            lng: location.lng,
            address: location.address,
            ip: punch.as_ref().and_then(|p| p.ip.clone()),
        }
    }
}

#[derive(FromRow)]
struct HolidayRow {
    id: u64,
    date: NaiveDate,
    name: String,
    holiday_type: String,
    description: Option<String>,
}

impl TryFrom<HolidayRow> for Holiday {
    type Error = AppError;

    fn try_from(row: HolidayRow) -> Result<Self, Self::Error> {
        Ok(Holiday {
            id: row.id,
            date: row.date,
            name: row.name,
            holiday_type: decode::<HolidayType>("holiday_type", &row.holiday_type)?,
            description: row.description,
        })
    }
}

#[derive(FromRow)]
struct PermissionRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    permission_type: String,
    reason: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PermissionRow> for PermissionRequest {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        Ok(PermissionRequest {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            permission_type: decode::<PermissionType>("permission_type", &row.permission_type)?,
            reason: row.reason,
            status: decode::<PermissionStatus>("status", &row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: i32,
    reason: String,
    status: String,
    approver_id: Option<u64>,
    comments: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: decode::<LeaveType>("leave_type", &row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            reason: row.reason,
            status: decode::<LeaveStatus>("status", &row.status)?,
            approver_id: row.approver_id,
            comments: row.comments,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct RegularizationRow {
    id: u64,
    employee_id: u64,
    attendance_date: NaiveDate,
    regularization_type: String,
    reason: String,
    start_time: Option<String>,
    end_time: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RegularizationRow> for RegularizationRequest {
    type Error = AppError;

    fn try_from(row: RegularizationRow) -> Result<Self, Self::Error> {
        Ok(RegularizationRequest {
            id: row.id,
            employee_id: row.employee_id,
            attendance_date: row.attendance_date,
            regularization_type: decode::<RegularizationType>(
                "regularization_type",
                &row.regularization_type,
            )?,
            reason: row.reason,
            start_time: row.start_time,
            end_time: row.end_time,
            status: decode::<RegularizationStatus>("status", &row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    employee_code: String,
    first_name: String,
    last_name: String,
    department: String,
    designation: String,
    reporting_manager_id: Option<u64>,
    status: String,
}

impl TryFrom<EmployeeRow> for EmployeeProfile {
    type Error = AppError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(EmployeeProfile {
            id: row.id,
            employee_code: row.employee_code,
            first_name: row.first_name,
            last_name: row.last_name,
            department: row.department,
            designation: row.designation,
            reporting_manager: row.reporting_manager_id,
            status: decode::<EmployeeStatus>("status", &row.status)?,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// -------------------------
// Attendance
// -------------------------

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find_attendance(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ? AND date = ?",
            ATTENDANCE_COLUMNS
        );

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AttendanceRecord::from))
    }

    async fn insert_attendance(
        &self,
        mut record: AttendanceRecord,
    ) -> StoreResult<AttendanceRecord> {
        let check_in = PunchColumns::from(&record.check_in);
        let check_out = PunchColumns::from(&record.check_out);

        let result = sqlx::query(
            r#"
            INSERT INTO attendance (
                employee_id, date,
                check_in_time, check_in_lat, check_in_lng, check_in_address, check_in_ip,
                check_out_time, check_out_lat, check_out_lng, check_out_address, check_out_ip,
                status, work_hours, correction_requested, correction_reason
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.date)
        .bind(check_in.time)
        .bind(check_in.lat)
        .bind(check_in.lng)
        .bind(check_in.address)
        .bind(check_in.ip)
        .bind(check_out.time)
        .bind(check_out.lat)
        .bind(check_out.lng)
        .bind(check_out.address)
        .bind(check_out.ip)
        .bind(record.status.as_ref())
        .bind(record.work_hours)
        .bind(record.correction_requested)
        .bind(record.correction_reason.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                record.id = done.last_insert_id();
                Ok(record)
            }
            Err(e) if is_duplicate(&e) => Err(AppError::Duplicate(format!(
                "attendance for employee {} on {} already exists",
                record.employee_id, record.date
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        let check_in = PunchColumns::from(&record.check_in);
        let check_out = PunchColumns::from(&record.check_out);

        sqlx::query(
            r#"
            UPDATE attendance
            SET check_in_time = ?, check_in_lat = ?, check_in_lng = ?,
                check_in_address = ?, check_in_ip = ?,
                check_out_time = ?, check_out_lat = ?, check_out_lng = ?,
                check_out_address = ?, check_out_ip = ?,
                status = ?, work_hours = ?,
                correction_requested = ?, correction_reason = ?
            WHERE id = ?
            "#,
        )
        .bind(check_in.time)
        .bind(check_in.lat)
        .bind(check_in.lng)
        .bind(check_in.address)
        .bind(check_in.ip)
        .bind(check_out.time)
        .bind(check_out.lat)
        .bind(check_out.lng)
        .bind(check_out.address)
        .bind(check_out.ip)
        .bind(record.status.as_ref())
        .bind(record.work_hours)
        .bind(record.correction_requested)
        .bind(record.correction_reason.as_deref())
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn close_attendance(&self, record: &AttendanceRecord) -> StoreResult<bool> {
        let check_out = PunchColumns::from(&record.check_out);

        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?, check_out_lat = ?, check_out_lng = ?,
                check_out_address = ?, check_out_ip = ?,
                work_hours = ?
            WHERE id = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(check_out.time)
        .bind(check_out.lat)
        .bind(check_out.lng)
        .bind(check_out.address)
        .bind(check_out.ip)
        .bind(record.work_hours)
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn attendance_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ? ORDER BY date DESC",
            ATTENDANCE_COLUMNS
        );

        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn attendance_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE date BETWEEN ? AND ? ORDER BY date, employee_id",
            ATTENDANCE_COLUMNS
        );

        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }
}

// -------------------------
// Holidays
// -------------------------

#[async_trait]
impl CalendarStore for MySqlStore {
    async fn holiday_on(&self, date: NaiveDate) -> StoreResult<Option<Holiday>> {
        let row = sqlx::query_as::<_, HolidayRow>(
            "SELECT id, date, name, holiday_type, description FROM holidays WHERE date = ?",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Holiday::try_from).transpose()
    }

    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>> {
        let rows = sqlx::query_as::<_, HolidayRow>(
            r#"
            SELECT id, date, name, holiday_type, description
            FROM holidays
            WHERE date BETWEEN ? AND ?
            ORDER BY date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn list_holidays(&self) -> StoreResult<Vec<Holiday>> {
        let rows = sqlx::query_as::<_, HolidayRow>(
            "SELECT id, date, name, holiday_type, description FROM holidays ORDER BY date",
        )
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn insert_holiday(&self, holiday: NewHoliday) -> StoreResult<Holiday> {
        let result = sqlx::query(
            r#"
            INSERT INTO holidays (date, name, holiday_type, description)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(holiday.date)
        .bind(&holiday.name)
        .bind(holiday.holiday_type.as_ref())
        .bind(holiday.description.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Holiday {
                id: done.last_insert_id(),
                date: holiday.date,
                name: holiday.name,
                holiday_type: holiday.holiday_type,
                description: holiday.description,
            }),
            Err(e) if is_duplicate(&e) => Err(AppError::Duplicate(format!(
                "a holiday on {} already exists",
                holiday.date
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_holiday(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// -------------------------
// Permissions
// -------------------------

const PERMISSION_COLUMNS: &str =
    "id, employee_id, date, permission_type, reason, status, created_at";

#[async_trait]
impl PermissionStore for MySqlStore {
    async fn insert_permission(&self, permission: NewPermission) -> StoreResult<PermissionRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO permissions (employee_id, date, permission_type, reason)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(permission.employee_id)
        .bind(permission.date)
        .bind(permission.permission_type.as_ref())
        .bind(&permission.reason)
        .execute(&self.pool)
        .await?;

        self.find_permission(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::not_found("Permission"))
    }

    async fn find_permission(&self, id: u64) -> StoreResult<Option<PermissionRequest>> {
        let sql = format!("SELECT {} FROM permissions WHERE id = ?", PERMISSION_COLUMNS);

        let row = sqlx::query_as::<_, PermissionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PermissionRequest::try_from).transpose()
    }

    async fn approved_permission_on(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> StoreResult<Option<PermissionRequest>> {
        let sql = format!(
            "SELECT {} FROM permissions WHERE employee_id = ? AND date = ? AND status = ? LIMIT 1",
            PERMISSION_COLUMNS
        );

        let row = sqlx::query_as::<_, PermissionRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .bind(PermissionStatus::Approved.as_ref())
            .fetch_optional(&self.pool)
            .await?;

        row.map(PermissionRequest::try_from).transpose()
    }

    async fn has_active_permission(
        &self,
        employee_id: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM permissions
                WHERE employee_id = ?
                AND date BETWEEN ? AND ?
                AND status IN (?, ?)
            )
            "#,
        )
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .bind(PermissionStatus::Pending.as_ref())
        .bind(PermissionStatus::Approved.as_ref())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists > 0)
    }

    async fn permissions_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<PermissionRequest>> {
        let sql = format!(
            "SELECT {} FROM permissions WHERE employee_id = ? ORDER BY created_at DESC",
            PERMISSION_COLUMNS
        );

        let rows = sqlx::query_as::<_, PermissionRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

        convert_all(rows)
    }

    async fn list_permissions(&self) -> StoreResult<Vec<PermissionRequest>> {
        let sql = format!(
            "SELECT {} FROM permissions ORDER BY created_at DESC",
            PERMISSION_COLUMNS
        );

        let rows = sqlx::query_as::<_, PermissionRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        convert_all(rows)
    }

    async fn transition_permission(
        &self,
        id: u64,
        from: PermissionStatus,
        to: PermissionStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE permissions SET status = ? WHERE id = ? AND status = ?")
            .bind(to.as_ref())
            .bind(id)
            .bind(from.as_ref())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

// -------------------------
// Leave
// -------------------------

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, leave_type, start_date, end_date, days, reason,
    status, approver_id, comments, created_at
"#;

fn leave_filters(query: &LeaveQuery) -> Filters {
    let mut filters = Filters::new()
        .eq_opt("employee_id", query.employee_id.map(SqlValue::U64))
        .eq_opt(
            "status",
            query.status.map(|s| SqlValue::String(s.as_ref().to_string())),
        );

    if let Some(ids) = &query.employee_ids {
        filters = filters.in_list("employee_id", ids.iter().copied().map(SqlValue::U64).collect());
    }

    filters
}

impl MySqlStore {
    /// Makes sure a balance row exists, seeded with the default allowance.
    async fn ensure_balance_row(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT IGNORE INTO leave_balances (employee_id, leave_type, balance)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(leave_type.as_ref())
        .bind(leave_type.default_allowance())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert_leave(&self, leave: NewLeave) -> StoreResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, days, reason)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.leave_type.as_ref())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.days)
        .bind(&leave.reason)
        .execute(&self.pool)
        .await?;

        self.find_leave(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::not_found("Leave request"))
    }

    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);

        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LeaveRequest::try_from).transpose()
    }

    async fn list_leaves(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let filters = leave_filters(query);

        // -------------------------
        // COUNT query
        // -------------------------
        let mut count_qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM leave_requests");
        filters.push_where(&mut count_qb);

        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        // -------------------------
        // DATA query
        // -------------------------
        let mut data_qb =
            QueryBuilder::<MySql>::new(format!("SELECT {} FROM leave_requests", LEAVE_COLUMNS));
        filters.push_where(&mut data_qb);
        data_qb
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(query.per_page)
            .push(" OFFSET ")
            .push_bind(query.page.saturating_sub(1) * query.per_page);

        let rows = data_qb
            .build_query_as::<LeaveRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((convert_all(rows)?, total))
    }

    async fn all_leaves(&self) -> StoreResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {} FROM leave_requests ORDER BY created_at DESC, id DESC",
            LEAVE_COLUMNS
        );

        let rows = sqlx::query_as::<_, LeaveRow>(&sql).fetch_all(&self.pool).await?;

        convert_all(rows)
    }

    async fn approved_leaves_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM leave_requests
            WHERE status = ?
            AND start_date <= ?
            AND end_date >= ?
            "#,
            LEAVE_COLUMNS
        );

        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(LeaveStatus::Approved.as_ref())
            .bind(to)
            .bind(from)
            .fetch_all(&self.pool)
            .await?;

        convert_all(rows)
    }

    async fn transition_leave(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
        approver_id: Option<EmployeeId>,
        comments: Option<String>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approver_id = ?, comments = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(to.as_ref())
        .bind(approver_id)
        .bind(comments)
        .bind(id)
        .bind(from.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn leave_balances(&self, employee_id: EmployeeId) -> StoreResult<Vec<(LeaveType, i32)>> {
        let rows = sqlx::query_as::<_, (String, i32)>(
            "SELECT leave_type, balance FROM leave_balances WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(leave_type, balance)| Ok((decode("leave_type", &leave_type)?, balance)))
            .collect()
    }

    async fn deduct_balance(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        days: i32,
    ) -> StoreResult<bool> {
        self.ensure_balance_row(employee_id, leave_type).await?;

        let result = sqlx::query(
            r#"
            UPDATE leave_balances
            SET balance = balance - ?
            WHERE employee_id = ?
            AND leave_type = ?
            AND balance >= ?
            "#,
        )
        .bind(days)
        .bind(employee_id)
        .bind(leave_type.as_ref())
        .bind(days)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn restore_balance(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        days: i32,
    ) -> StoreResult<()> {
        self.ensure_balance_row(employee_id, leave_type).await?;

        sqlx::query(
            r#"
            UPDATE leave_balances
            SET balance = balance + ?
            WHERE employee_id = ?
            AND leave_type = ?
            "#,
        )
        .bind(days)
        .bind(employee_id)
        .bind(leave_type.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// -------------------------
// Regularization
// -------------------------

const REGULARIZATION_COLUMNS: &str = r#"
    id, employee_id, attendance_date, regularization_type, reason,
    start_time, end_time, status, created_at
"#;

#[async_trait]
impl RegularizationStore for MySqlStore {
    async fn insert_regularization(
        &self,
        request: NewRegularization,
    ) -> StoreResult<RegularizationRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO regularizations
                (employee_id, attendance_date, regularization_type, reason, start_time, end_time)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.attendance_date)
        .bind(request.regularization_type.as_ref())
        .bind(&request.reason)
        .bind(request.start_time.as_deref())
        .bind(request.end_time.as_deref())
        .execute(&self.pool)
        .await?;

        self.find_regularization(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::not_found("Regularization request"))
    }

    async fn find_regularization(&self, id: u64) -> StoreResult<Option<RegularizationRequest>> {
        let sql = format!("SELECT {} FROM regularizations WHERE id = ?", REGULARIZATION_COLUMNS);

        let row = sqlx::query_as::<_, RegularizationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(RegularizationRequest::try_from).transpose()
    }

    async fn regularizations_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> StoreResult<Vec<RegularizationRequest>> {
        let sql = format!(
            "SELECT {} FROM regularizations WHERE employee_id = ? ORDER BY created_at DESC",
            REGULARIZATION_COLUMNS
        );

        let rows = sqlx::query_as::<_, RegularizationRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

        convert_all(rows)
    }

    async fn list_regularizations(&self) -> StoreResult<Vec<RegularizationRequest>> {
        let sql = format!(
            "SELECT {} FROM regularizations ORDER BY created_at DESC",
            REGULARIZATION_COLUMNS
        );

        let rows = sqlx::query_as::<_, RegularizationRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        convert_all(rows)
    }

    async fn transition_regularization(
        &self,
        id: u64,
        from: RegularizationStatus,
        to: RegularizationStatus,
    ) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE regularizations SET status = ? WHERE id = ? AND status = ?")
                .bind(to.as_ref())
                .bind(id)
                .bind(from.as_ref())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}

// -------------------------
// Employee directory
// -------------------------

const EMPLOYEE_COLUMNS: &str = r#"
    id, employee_code, first_name, last_name, department, designation,
    reporting_manager_id, status
"#;

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn find_employee(&self, id: EmployeeId) -> StoreResult<Option<EmployeeProfile>> {
        let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);

        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(EmployeeProfile::try_from).transpose()
    }

    async fn find_employees(&self, ids: &[EmployeeId]) -> StoreResult<Vec<EmployeeProfile>> {
        let filters =
            Filters::new().in_list("id", ids.iter().copied().map(SqlValue::U64).collect());

        let mut qb =
            QueryBuilder::<MySql>::new(format!("SELECT {} FROM employees", EMPLOYEE_COLUMNS));
        filters.push_where(&mut qb);

        let rows = qb.build_query_as::<EmployeeRow>().fetch_all(&self.pool).await?;

        convert_all(rows)
    }

    async fn active_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<EmployeeProfile>> {
        let filters = Filters::new()
            .eq("status", SqlValue::String(EmployeeStatus::Active.as_ref().to_string()))
            .eq_opt("department", filter.department.clone().map(SqlValue::String))
            .eq_opt("designation", filter.designation.clone().map(SqlValue::String))
            .eq_opt("id", filter.only.map(SqlValue::U64));

        let mut qb =
            QueryBuilder::<MySql>::new(format!("SELECT {} FROM employees", EMPLOYEE_COLUMNS));
        filters.push_where(&mut qb);
        qb.push(" ORDER BY id");

        tracing::debug!(sql = %qb.sql(), "Fetching active employees");

        let rows = qb.build_query_as::<EmployeeRow>().fetch_all(&self.pool).await?;

        convert_all(rows)
    }

    async fn direct_reports(&self, manager_id: EmployeeId) -> StoreResult<Vec<EmployeeId>> {
        let ids = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM employees WHERE reporting_manager_id = ?",
        )
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
