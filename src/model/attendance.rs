use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::employee::EmployeeId;

/// Attendance status of a day.
///
/// There is a single half-day value. Records serialize it as `half-day`; the
/// report grid renders it as `P/2`, and the legacy `P/2` spelling is accepted
/// when reading stored data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    #[serde(alias = "P/2")]
    #[strum(to_string = "half-day", serialize = "P/2")]
    HalfDay,
}

impl AttendanceStatus {
    /// Decodes a stored status. Values outside the vocabulary count as
    /// `present`, since a record exists for the day.
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(status = value, "Unknown stored attendance status");
            AttendanceStatus::Present
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoLocation {
    #[schema(example = 23.8103)]
    pub lat: Option<f64>,
    #[schema(example = 90.4125)]
    pub lng: Option<f64>,
    #[schema(example = "Head office, Dhaka")]
    pub address: Option<String>,
}

impl GeoLocation {
    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

/// One clock event (check-in or check-out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Punch {
    #[schema(example = "2026-01-05T09:02:11Z", format = "date-time", value_type = String)]
    pub time: DateTime<Utc>,
    pub location: Option<GeoLocation>,
    #[schema(example = "203.0.113.7")]
    pub ip: Option<String>,
}

impl Punch {
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            time,
            location: None,
            ip: None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.location
            .as_ref()
            .is_some_and(GeoLocation::has_coordinates)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub check_in: Option<Punch>,
    pub check_out: Option<Punch>,
    pub status: AttendanceStatus,
    #[schema(example = 9.5)]
    pub work_hours: f64,
    pub correction_requested: bool,
    pub correction_reason: Option<String>,
}

impl AttendanceRecord {
    /// A record with no punches, used when a day is created by a correction
    /// or a regularization instead of a check-in.
    pub fn skeleton(employee_id: EmployeeId, date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            id: 0,
            employee_id,
            date,
            check_in: None,
            check_out: None,
            status,
            work_hours: 0.0,
            correction_requested: false,
            correction_reason: None,
        }
    }

    pub fn checked_in(
        employee_id: EmployeeId,
        date: NaiveDate,
        punch: Punch,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            check_in: Some(punch),
            ..Self::skeleton(employee_id, date, status)
        }
    }

    /// Recomputes worked hours from the punches. Only meaningful once both
    /// exist; otherwise the stored value is left untouched.
    pub fn recompute_work_hours(&mut self) {
        if let (Some(check_in), Some(check_out)) = (&self.check_in, &self.check_out) {
            let millis = (check_out.time - check_in.time).num_milliseconds();
            self.work_hours = millis as f64 / 3_600_000.0;
        }
    }
}
