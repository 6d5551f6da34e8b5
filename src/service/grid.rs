use chrono::{Datelike, NaiveDate, NaiveTime};
use derive_more::Display;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, Punch},
    employee::{EmployeeFilter, EmployeeId, EmployeeProfile},
    holiday::Holiday,
    leave_request::LeaveRequest,
};
use crate::service::status::{AttendancePolicy, is_weekend};
use crate::store::{AttendanceStore, CalendarStore, EmployeeDirectory, LeaveStore};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "{:04}-{:02}", year, month)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AppError::validation(format!(
                "invalid month {year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or_default()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |d| *d <= last)
    }
}

impl FromStr for YearMonth {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AppError::validation("month must be formatted as YYYY-MM");

        let (year, month) = s.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(malformed());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;

        YearMonth::new(year, month)
    }
}

/// Code shown in one cell of the monthly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DayCode {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "P/2")]
    HalfDay,
    #[serde(rename = "LT")]
    Late,
    #[serde(rename = "A")]
    Absent,
    #[serde(rename = "W")]
    Weekend,
    #[serde(rename = "H")]
    Holiday,
    #[serde(rename = "L")]
    Leave,
}

impl From<AttendanceStatus> for DayCode {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => DayCode::Present,
            AttendanceStatus::HalfDay => DayCode::HalfDay,
            AttendanceStatus::Late => DayCode::Late,
            AttendanceStatus::Absent => DayCode::Absent,
        }
    }
}

/// Everything known about one employee on one day.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayContext {
    pub weekend: bool,
    pub holiday: bool,
    pub on_leave: bool,
    pub record: Option<AttendanceStatus>,
}

type DayRule = fn(&DayContext) -> Option<DayCode>;

/// Evaluated in order; the last rule that matches decides the cell.
const RULES: [DayRule; 4] = [
    |ctx| ctx.weekend.then_some(DayCode::Weekend),
    |ctx| ctx.holiday.then_some(DayCode::Holiday),
    |ctx| ctx.on_leave.then_some(DayCode::Leave),
    |ctx| ctx.record.map(DayCode::from),
];

pub fn resolve_day(ctx: &DayContext) -> DayCode {
    RULES
        .iter()
        .filter_map(|rule| rule(ctx))
        .last()
        .unwrap_or(DayCode::Absent)
}

/// Punch details attached to a day that has a record. Times are wall-clock
/// in the organization offset.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PunchInfo {
    #[serde(rename = "in")]
    #[schema(value_type = Option<String>, example = "09:02:11")]
    pub check_in: Option<NaiveTime>,
    #[serde(rename = "out")]
    #[schema(value_type = Option<String>, example = "18:10:00")]
    pub check_out: Option<NaiveTime>,
    /// Whether either punch carried coordinates.
    pub location: bool,
}

impl PunchInfo {
    fn from_record(record: &AttendanceRecord, policy: &AttendancePolicy) -> Self {
        let in_offset = |punch: &Option<Punch>| {
            punch.as_ref().map(|p| policy.local_time(p.time))
        };

        PunchInfo {
            check_in: in_offset(&record.check_in),
            check_out: in_offset(&record.check_out),
            location: record.check_in.as_ref().is_some_and(|p| p.has_coordinates())
                || record.check_out.as_ref().is_some_and(|p| p.has_coordinates()),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GridRow {
    pub employee_id: u64,
    pub name: String,
    pub employee_code: String,
    pub department: String,
    pub designation: String,
    /// Day of month -> code.
    #[schema(value_type = Object)]
    pub attendance: BTreeMap<u32, DayCode>,
    /// Day of month -> punch details, `null` when there is no record.
    #[schema(value_type = Object)]
    pub punch_data: BTreeMap<u32, Option<PunchInfo>>,
}

/// Builds the grid from already loaded data. Records and leaves are indexed
/// per employee first so each cell is a constant-time lookup.
pub fn build_grid(
    month: YearMonth,
    employees: &[EmployeeProfile],
    records: &[AttendanceRecord],
    leaves: &[LeaveRequest],
    holidays: &[Holiday],
    policy: &AttendancePolicy,
) -> Vec<GridRow> {
    let first = month.first_day();
    let last = month.last_day();

    let holiday_days: HashSet<NaiveDate> = holidays.iter().map(|h| h.date).collect();

    let mut records_by_employee: HashMap<EmployeeId, HashMap<NaiveDate, &AttendanceRecord>> =
        HashMap::new();
    for record in records.iter().filter(|r| first <= r.date && r.date <= last) {
        records_by_employee
            .entry(record.employee_id)
            .or_default()
            .insert(record.date, record);
    }

    let mut leave_days: HashMap<EmployeeId, HashSet<NaiveDate>> = HashMap::new();
    for leave in leaves {
        let start = leave.start_date.max(first);
        let end = leave.end_date.min(last);
        let days = leave_days.entry(leave.employee_id).or_default();
        days.extend(start.iter_days().take_while(|d| *d <= end));
    }

    let no_records = HashMap::new();
    let no_leave = HashSet::new();

    employees
        .iter()
        .map(|employee| {
            let records = records_by_employee.get(&employee.id).unwrap_or(&no_records);
            let leave = leave_days.get(&employee.id).unwrap_or(&no_leave);

            let mut attendance = BTreeMap::new();
            let mut punch_data = BTreeMap::new();

            for date in month.days() {
                let record = records.get(&date).copied();
                let ctx = DayContext {
                    weekend: is_weekend(date),
                    holiday: holiday_days.contains(&date),
                    on_leave: leave.contains(&date),
                    record: record.map(|r| r.status),
                };

                attendance.insert(date.day(), resolve_day(&ctx));
                punch_data.insert(
                    date.day(),
                    record.map(|r| PunchInfo::from_record(r, policy)),
                );
            }

            GridRow {
                employee_id: employee.id,
                name: employee.full_name(),
                employee_code: employee.employee_code.clone(),
                department: employee.department.clone(),
                designation: employee.designation.clone(),
                attendance,
                punch_data,
            }
        })
        .collect()
}

/// Loads a month of data for the filtered employees and builds their grid.
pub async fn attendance_grid<S>(
    store: &S,
    policy: &AttendancePolicy,
    filter: &EmployeeFilter,
    month: YearMonth,
) -> Result<Vec<GridRow>, AppError>
where
    S: AttendanceStore + CalendarStore + LeaveStore + EmployeeDirectory + ?Sized,
{
    let (from, to) = (month.first_day(), month.last_day());

    let employees = store.active_employees(filter).await?;
    let records = store.attendance_between(from, to).await?;
    let leaves = store.approved_leaves_between(from, to).await?;
    let holidays = store.holidays_between(from, to).await?;

    tracing::debug!(
        %month,
        employees = employees.len(),
        records = records.len(),
        leaves = leaves.len(),
        holidays = holidays.len(),
        "Building attendance grid"
    );

    Ok(build_grid(month, &employees, &records, &leaves, &holidays, policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        attendance::GeoLocation,
        employee::EmployeeStatus,
        holiday::HolidayType,
        leave_request::{LeaveStatus, LeaveType},
    };
    use chrono::{FixedOffset, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee(id: u64) -> EmployeeProfile {
        EmployeeProfile {
            id,
            employee_code: format!("EMP-{id:03}"),
            first_name: "Jane".into(),
            last_name: "Roe".into(),
            department: "Engineering".into(),
            designation: "Engineer".into(),
            reporting_manager: None,
            status: EmployeeStatus::Active,
        }
    }

    fn record(employee_id: u64, day: NaiveDate, status: AttendanceStatus) -> AttendanceRecord {
        let check_in = Utc
            .with_ymd_and_hms(day.year(), day.month(), day.day(), 9, 0, 0)
            .unwrap();
        AttendanceRecord::checked_in(employee_id, day, Punch::at(check_in), status)
    }

    fn holiday(day: NaiveDate) -> Holiday {
        Holiday {
            id: 1,
            date: day,
            name: "Holiday".into(),
            holiday_type: HolidayType::National,
            description: None,
        }
    }

    fn leave(employee_id: u64, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            employee_id,
            leave_type: LeaveType::Casual,
            start_date: start,
            end_date: end,
            days: (end - start).num_days() as i32 + 1,
            reason: "Trip".into(),
            status: LeaveStatus::Approved,
            approver_id: Some(12),
            comments: None,
            created_at: Utc::now(),
        }
    }

    fn month() -> YearMonth {
        "2026-01".parse().unwrap()
    }

    #[test]
    fn month_parsing() {
        let m: YearMonth = "2026-02".parse().unwrap();
        assert_eq!(m.to_string(), "2026-02");
        assert_eq!(m.last_day(), date(2026, 2, 28));
        assert_eq!(m.days().count(), 28);

        let december: YearMonth = "2025-12".parse().unwrap();
        assert_eq!(december.last_day(), date(2025, 12, 31));

        for bad in ["2026-13", "2026-00", "2026-1", "26-01", "2026/01", "", "abcd-ef"] {
            assert!(
                matches!(bad.parse::<YearMonth>(), Err(AppError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn later_rules_win() {
        let weekend_holiday = DayContext {
            weekend: true,
            holiday: true,
            ..DayContext::default()
        };
        assert_eq!(resolve_day(&weekend_holiday), DayCode::Holiday);

        let leave_on_holiday = DayContext {
            holiday: true,
            on_leave: true,
            ..DayContext::default()
        };
        assert_eq!(resolve_day(&leave_on_holiday), DayCode::Leave);

        let worked_on_leave = DayContext {
            on_leave: true,
            record: Some(AttendanceStatus::Late),
            ..DayContext::default()
        };
        assert_eq!(resolve_day(&worked_on_leave), DayCode::Late);

        assert_eq!(resolve_day(&DayContext::default()), DayCode::Absent);
    }

    #[test]
    fn grid_cells_follow_precedence() {
        let policy = AttendancePolicy::default();
        let records = vec![
            // 2026-01-01 is a Thursday and a holiday below.
            record(1, date(2026, 1, 1), AttendanceStatus::Present),
            record(1, date(2026, 1, 5), AttendanceStatus::HalfDay),
            record(1, date(2026, 1, 6), AttendanceStatus::Late),
            record(1, date(2026, 1, 7), AttendanceStatus::Absent),
            // Someone else's record must not leak into row 1.
            record(2, date(2026, 1, 8), AttendanceStatus::Present),
        ];
        let holidays = vec![holiday(date(2026, 1, 1)), holiday(date(2026, 1, 2))];
        let leaves = vec![leave(1, date(2026, 1, 12), date(2026, 1, 13))];

        let grid = build_grid(month(), &[employee(1)], &records, &leaves, &holidays, &policy);
        assert_eq!(grid.len(), 1);
        let row = &grid[0].attendance;

        assert_eq!(row.len(), 31);
        assert_eq!(row[&1], DayCode::Present);
        assert_eq!(row[&2], DayCode::Holiday);
        assert_eq!(row[&3], DayCode::Weekend);
        assert_eq!(row[&4], DayCode::Weekend);
        assert_eq!(row[&5], DayCode::HalfDay);
        assert_eq!(row[&6], DayCode::Late);
        assert_eq!(row[&7], DayCode::Absent);
        assert_eq!(row[&8], DayCode::Absent);
        assert_eq!(row[&12], DayCode::Leave);
        assert_eq!(row[&13], DayCode::Leave);
        assert_eq!(row[&14], DayCode::Absent);
    }

    #[test]
    fn leave_spanning_months_is_clipped() {
        let policy = AttendancePolicy::default();
        let leaves = vec![leave(1, date(2025, 12, 29), date(2026, 1, 2))];

        let grid = build_grid(month(), &[employee(1)], &[], &leaves, &[], &policy);
        let row = &grid[0].attendance;

        assert_eq!(row[&1], DayCode::Leave);
        assert_eq!(row[&2], DayCode::Leave);
        assert_eq!(row[&5], DayCode::Absent);
    }

    #[test]
    fn punch_data_uses_org_offset() {
        let policy = AttendancePolicy {
            offset: FixedOffset::east_opt(6 * 3600).unwrap(),
            ..AttendancePolicy::default()
        };
        let mut worked = record(1, date(2026, 1, 5), AttendanceStatus::Present);
        worked.check_out = Some(Punch {
            time: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
            location: Some(GeoLocation {
                lat: Some(23.81),
                lng: Some(90.41),
                address: None,
            }),
            ip: None,
        });

        let grid = build_grid(month(), &[employee(1)], &[worked], &[], &[], &policy);
        let punches = &grid[0].punch_data;

        assert_eq!(
            punches[&5],
            Some(PunchInfo {
                check_in: NaiveTime::from_hms_opt(15, 0, 0),
                check_out: NaiveTime::from_hms_opt(18, 0, 0),
                location: true,
            })
        );
        assert_eq!(punches[&6], None);
    }

    #[test]
    fn codes_serialize_as_grid_letters() {
        let codes = [
            DayCode::Present,
            DayCode::HalfDay,
            DayCode::Late,
            DayCode::Absent,
            DayCode::Weekend,
            DayCode::Holiday,
            DayCode::Leave,
        ];
        assert_eq!(
            serde_json::to_string(&codes).unwrap(),
            r#"["P","P/2","LT","A","W","H","L"]"#
        );
    }
}
