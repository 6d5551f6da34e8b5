use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    employee::{EmployeeFilter, EmployeeId, EmployeeProfile},
    leave_request::{LeaveRequest, LeaveStatus, LeaveType},
};
use crate::store::{AttendanceStore, EmployeeDirectory, LeaveStore};

const MAX_LATE_ARRIVALS: usize = 20;
const MAX_TOP_REQUESTERS: usize = 10;
const MAX_RECENT_LEAVES: usize = 20;
const TREND_MONTHS: u32 = 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct StatusBreakdown {
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    #[serde(rename = "half-day")]
    pub half_day: u64,
}

impl StatusBreakdown {
    fn count(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::HalfDay => self.half_day += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LateArrival {
    pub employee: String,
    pub department: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub total_records: u64,
    pub status_breakdown: StatusBreakdown,
    /// `YYYY-MM-DD` -> number of records that day.
    #[schema(value_type = Object)]
    pub daily_attendance: BTreeMap<NaiveDate, u64>,
    pub late_arrivals: Vec<LateArrival>,
    /// Rounded to two decimals.
    pub avg_work_hours: f64,
    /// Percentage, rounded to one decimal.
    pub attendance_rate: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn summarize(
    start_date: NaiveDate,
    end_date: NaiveDate,
    records: &[AttendanceRecord],
    employees: &[EmployeeProfile],
) -> AttendanceSummary {
    let directory: HashMap<u64, &EmployeeProfile> = employees.iter().map(|e| (e.id, e)).collect();

    let mut status_breakdown = StatusBreakdown::default();
    let mut daily_attendance = BTreeMap::new();
    let mut late_arrivals = Vec::new();
    let (mut total_hours, mut worked_records) = (0.0, 0u64);

    for record in records {
        status_breakdown.count(record.status);
        *daily_attendance.entry(record.date).or_insert(0) += 1;

        if matches!(record.status, AttendanceStatus::Late | AttendanceStatus::HalfDay)
            && late_arrivals.len() < MAX_LATE_ARRIVALS
        {
            let employee = directory.get(&record.employee_id);
            late_arrivals.push(LateArrival {
                employee: employee.map_or_else(|| "Unknown".to_string(), |e| e.full_name()),
                department: employee.map_or_else(|| "N/A".to_string(), |e| e.department.clone()),
                date: record.date,
                check_in_time: record.check_in.as_ref().map(|p| p.time),
            });
        }

        if record.work_hours > 0.0 {
            total_hours += record.work_hours;
            worked_records += 1;
        }
    }

    let avg_work_hours = if worked_records > 0 {
        round_to(total_hours / worked_records as f64, 2)
    } else {
        0.0
    };

    let working_days = daily_attendance.len();
    let attendance_rate = if working_days > 0 && !employees.is_empty() {
        let possible = (employees.len() * working_days) as f64;
        round_to(records.len() as f64 / possible * 100.0, 1)
    } else {
        0.0
    };

    AttendanceSummary {
        start_date,
        end_date,
        total_records: records.len() as u64,
        status_breakdown,
        daily_attendance,
        late_arrivals,
        avg_work_hours,
        attendance_rate,
    }
}

/// Summary over an inclusive range. The range defaults to the first of the
/// month containing `today` through `today`.
pub async fn attendance_summary<S>(
    store: &S,
    today: NaiveDate,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<AttendanceSummary, AppError>
where
    S: AttendanceStore + EmployeeDirectory + ?Sized,
{
    let start = start_date.unwrap_or_else(|| today.with_day0(0).unwrap_or(today));
    let end = end_date.unwrap_or(today);

    if start > end {
        return Err(AppError::validation("start_date must not be after end_date"));
    }

    let records = store.attendance_between(start, end).await?;
    let employees = store.active_employees(&EmployeeFilter::default()).await?;

    Ok(summarize(start, end, &records, &employees))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct LeaveStatusBreakdown {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub cancelled: u64,
}

impl LeaveStatusBreakdown {
    fn count(&mut self, status: LeaveStatus) {
        match status {
            LeaveStatus::Pending => self.pending += 1,
            LeaveStatus::Approved => self.approved += 1,
            LeaveStatus::Rejected => self.rejected += 1,
            LeaveStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveRequester {
    pub employee_id: EmployeeId,
    pub employee: String,
    pub department: String,
    /// Number of requests.
    pub count: u64,
    /// Days across all requests.
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecentLeave {
    pub id: u64,
    pub employee: String,
    pub department: String,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub days: i32,
    pub status: LeaveStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveSummary {
    pub total: u64,
    pub status_breakdown: LeaveStatusBreakdown,
    /// Leave type -> number of requests, every type present.
    #[schema(value_type = Object)]
    pub type_breakdown: BTreeMap<String, u64>,
    /// `YYYY-MM` -> requests created that month, over the last six months.
    #[schema(value_type = Object)]
    pub monthly_trends: BTreeMap<String, u64>,
    /// Most days requested first.
    pub top_requesters: Vec<LeaveRequester>,
    /// Newest first.
    pub recent_leaves: Vec<RecentLeave>,
}

/// Requests created before the cutoff still count everywhere except the
/// monthly trends. Requests of employees missing from the directory are left
/// out of the top requesters.
pub fn summarize_leaves(
    today: NaiveDate,
    leaves: &[LeaveRequest],
    employees: &[EmployeeProfile],
) -> LeaveSummary {
    let directory: HashMap<u64, &EmployeeProfile> = employees.iter().map(|e| (e.id, e)).collect();
    let cutoff = today.checked_sub_months(Months::new(TREND_MONTHS)).unwrap_or(today);

    let mut status_breakdown = LeaveStatusBreakdown::default();
    let mut type_breakdown: BTreeMap<String, u64> =
        LeaveType::iter().map(|t| (t.to_string(), 0)).collect();
    let mut monthly_trends = BTreeMap::new();
    let mut requesters: HashMap<EmployeeId, LeaveRequester> = HashMap::new();

    for leave in leaves {
        status_breakdown.count(leave.status);
        *type_breakdown.entry(leave.leave_type.to_string()).or_insert(0) += 1;

        if leave.created_at.date_naive() >= cutoff {
            let month = leave.created_at.format("%Y-%m").to_string();
            *monthly_trends.entry(month).or_insert(0) += 1;
        }

        if let Some(employee) = directory.get(&leave.employee_id) {
            let entry = requesters.entry(employee.id).or_insert_with(|| LeaveRequester {
                employee_id: employee.id,
                employee: employee.full_name(),
                department: employee.department.clone(),
                count: 0,
                days: 0,
            });
            entry.count += 1;
            entry.days += i64::from(leave.days);
        }
    }

    let mut top_requesters: Vec<_> = requesters.into_values().collect();
    top_requesters.sort_by(|a, b| b.days.cmp(&a.days).then(a.employee_id.cmp(&b.employee_id)));
    top_requesters.truncate(MAX_TOP_REQUESTERS);

    let mut newest: Vec<&LeaveRequest> = leaves.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let recent_leaves = newest
        .into_iter()
        .take(MAX_RECENT_LEAVES)
        .map(|leave| {
            let employee = directory.get(&leave.employee_id);
            RecentLeave {
                id: leave.id,
                employee: employee.map_or_else(|| "Unknown".to_string(), |e| e.full_name()),
                department: employee.map_or_else(|| "N/A".to_string(), |e| e.department.clone()),
                leave_type: leave.leave_type,
                start_date: leave.start_date,
                end_date: leave.end_date,
                days: leave.days,
                status: leave.status,
                created_at: leave.created_at,
            }
        })
        .collect();

    LeaveSummary {
        total: leaves.len() as u64,
        status_breakdown,
        type_breakdown,
        monthly_trends,
        top_requesters,
        recent_leaves,
    }
}

/// Organization-wide leave report as of `today`.
pub async fn leave_summary<S>(store: &S, today: NaiveDate) -> Result<LeaveSummary, AppError>
where
    S: LeaveStore + EmployeeDirectory + ?Sized,
{
    let leaves = store.all_leaves().await?;

    let mut ids: Vec<EmployeeId> = leaves.iter().map(|l| l.employee_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let employees = store.find_employees(&ids).await?;

    Ok(summarize_leaves(today, &leaves, &employees))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::Punch;
    use crate::store::memory::MemoryStore;
    use chrono::TimeZone;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn record(
        employee_id: u64,
        day: u32,
        status: AttendanceStatus,
        hours: f64,
    ) -> AttendanceRecord {
        let check_in = Punch::at(Utc.with_ymd_and_hms(2026, 1, day, 9, 30, 0).unwrap());
        let mut record = AttendanceRecord::checked_in(employee_id, date(day), check_in, status);
        record.work_hours = hours;
        record
    }

    #[test]
    fn summary_counts_and_rates() {
        let store = MemoryStore::default();
        let employees = vec![store.add_employee(1, None), store.add_employee(2, None)];

        let records = vec![
            record(1, 5, AttendanceStatus::Present, 8.0),
            record(2, 5, AttendanceStatus::HalfDay, 4.0),
            record(1, 6, AttendanceStatus::Late, 0.0),
            record(9, 6, AttendanceStatus::Absent, 0.0),
        ];

        let summary = summarize(date(1), date(31), &records, &employees);

        assert_eq!(summary.total_records, 4);
        assert_eq!(
            summary.status_breakdown,
            StatusBreakdown {
                present: 1,
                absent: 1,
                late: 1,
                half_day: 1,
            }
        );
        assert_eq!(summary.daily_attendance[&date(5)], 2);
        assert_eq!(summary.daily_attendance[&date(6)], 2);
        assert_eq!(summary.avg_work_hours, 6.0);
        // 4 records over 2 employees x 2 days.
        assert_eq!(summary.attendance_rate, 100.0);

        assert_eq!(summary.late_arrivals.len(), 2);
        assert_eq!(summary.late_arrivals[0].employee, "Employee 2");
        assert_eq!(summary.late_arrivals[0].department, "Engineering");
    }

    #[test]
    fn late_arrivals_are_capped() {
        let records: Vec<_> = (1..=25)
            .map(|id| record(id, 5, AttendanceStatus::Late, 0.0))
            .collect();

        let summary = summarize(date(1), date(31), &records, &[]);
        assert_eq!(summary.late_arrivals.len(), MAX_LATE_ARRIVALS);
        assert_eq!(summary.late_arrivals[0].employee, "Unknown");
        assert_eq!(summary.attendance_rate, 0.0);
    }

    #[actix_web::test]
    async fn range_defaults_to_month_to_date() {
        let store = MemoryStore::default();
        store.add_employee(1, None);
        store.insert_attendance(record(1, 2, AttendanceStatus::Present, 8.0)).await.unwrap();
        store.insert_attendance(record(1, 20, AttendanceStatus::Present, 8.0)).await.unwrap();

        let summary = attendance_summary(&store, date(10), None, None).await.unwrap();
        assert_eq!(summary.start_date.day(), 1);
        assert_eq!(summary.end_date, date(10));
        assert_eq!(summary.total_records, 1);

        let err = attendance_summary(&store, date(10), Some(date(9)), Some(date(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    fn leave(
        id: u64,
        employee_id: u64,
        leave_type: LeaveType,
        days: i32,
        status: LeaveStatus,
        created: DateTime<Utc>,
    ) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id,
            leave_type,
            start_date: date(5),
            end_date: date(5) + chrono::Days::new(days as u64 - 1),
            days,
            reason: "Trip".into(),
            status,
            approver_id: None,
            comments: None,
            created_at: created,
        }
    }

    #[test]
    fn leave_report_breakdowns_and_trends() {
        let store = MemoryStore::default();
        let employees = vec![store.add_employee(1, None), store.add_employee(2, None)];
        let created = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap();

        let leaves = vec![
            leave(1, 1, LeaveType::Casual, 2, LeaveStatus::Approved, created(2026, 3, 2)),
            leave(2, 2, LeaveType::Sick, 5, LeaveStatus::Pending, created(2026, 3, 20)),
            leave(3, 1, LeaveType::Casual, 1, LeaveStatus::Rejected, created(2026, 1, 15)),
            // Outside the six-month window.
            leave(4, 2, LeaveType::Unpaid, 3, LeaveStatus::Cancelled, created(2025, 8, 1)),
            // Not in the directory.
            leave(5, 9, LeaveType::Earned, 10, LeaveStatus::Approved, created(2026, 2, 1)),
        ];

        let today = NaiveDate::from_ymd_opt(2026, 3, 26).unwrap();
        let report = summarize_leaves(today, &leaves, &employees);

        assert_eq!(report.total, 5);
        assert_eq!(
            report.status_breakdown,
            LeaveStatusBreakdown {
                pending: 1,
                approved: 2,
                rejected: 1,
                cancelled: 1,
            }
        );
        assert_eq!(report.type_breakdown["casual"], 2);
        assert_eq!(report.type_breakdown["unpaid"], 1);
        assert_eq!(report.type_breakdown["bereavement"], 0);
        assert_eq!(report.type_breakdown.len(), LeaveType::iter().count());

        assert_eq!(report.monthly_trends.get("2026-03"), Some(&2));
        assert_eq!(report.monthly_trends.get("2026-01"), Some(&1));
        assert_eq!(report.monthly_trends.get("2026-02"), Some(&1));
        assert!(!report.monthly_trends.contains_key("2025-08"));

        assert_eq!(report.top_requesters.len(), 2);
        assert_eq!(report.top_requesters[0].employee_id, 2);
        assert_eq!(report.top_requesters[0].days, 8);
        assert_eq!(report.top_requesters[1].count, 2);
        assert_eq!(report.top_requesters[1].days, 3);

        let order: Vec<_> = report.recent_leaves.iter().map(|l| l.id).collect();
        assert_eq!(order, vec![2, 1, 5, 3, 4]);
        assert_eq!(report.recent_leaves[2].employee, "Unknown");
        assert_eq!(report.recent_leaves[2].department, "N/A");
    }

    #[actix_web::test]
    async fn leave_report_reads_the_store() {
        let store = MemoryStore::default();
        store.add_employee(7, None);
        store
            .insert_leave(crate::model::leave_request::NewLeave {
                employee_id: 7,
                leave_type: LeaveType::Sick,
                start_date: date(5),
                end_date: date(6),
                days: 2,
                reason: "Flu".into(),
            })
            .await
            .unwrap();

        let report = leave_summary(&store, Utc::now().date_naive()).await.unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.status_breakdown.pending, 1);
        assert_eq!(report.top_requesters[0].employee, "Employee 7");
        assert_eq!(report.monthly_trends.values().sum::<u64>(), 1);
    }
}
