use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
    Unpaid,
    Paternity,
    Bereavement,
}

impl LeaveType {
    /// Unpaid leave is unmetered: never checked against, deducted from or
    /// restored to a balance.
    pub fn is_metered(self) -> bool {
        self != LeaveType::Unpaid
    }

    /// Yearly allowance granted to an employee who has no balance row yet.
    pub fn default_allowance(self) -> i32 {
        match self {
            LeaveType::Casual => 24,
            LeaveType::Sick => 15,
            LeaveType::Earned => 20,
            LeaveType::Unpaid => 0,
            LeaveType::Paternity => 15,
            LeaveType::Bereavement => 10,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "leave_type": "casual",
    "start_date": "2026-01-05",
    "end_date": "2026-01-09",
    "days": 5,
    "reason": "Family function",
    "status": "approved",
    "approver_id": 12,
    "comments": "Enjoy",
    "created_at": "2026-01-01T00:00:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    /// Inclusive span in calendar days.
    pub days: i32,
    pub reason: String,
    pub status: LeaveStatus,
    pub approver_id: Option<u64>,
    pub comments: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A leave application before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewLeave {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveBalance {
    pub leave_type: LeaveType,
    #[schema(example = 19)]
    pub balance: i32,
}
