use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RegularizationType {
    MisPunch,
    LateEntry,
    EarlyExit,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RegularizationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "employee_id": 1000,
    "attendance_date": "2026-01-05",
    "regularization_type": "mis-punch",
    "reason": "Forgot to punch out",
    "start_time": "09:05",
    "end_time": "18:10",
    "status": "pending",
    "created_at": "2026-01-06T04:00:00Z"
}))]
pub struct RegularizationRequest {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub attendance_date: NaiveDate,
    pub regularization_type: RegularizationType,
    pub reason: String,
    /// Corrected check-in clock time, `HH:MM`.
    pub start_time: Option<String>,
    /// Corrected check-out clock time, `HH:MM`.
    pub end_time: Option<String>,
    pub status: RegularizationStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRegularization {
    pub employee_id: u64,
    pub attendance_date: NaiveDate,
    pub regularization_type: RegularizationType,
    pub reason: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}
