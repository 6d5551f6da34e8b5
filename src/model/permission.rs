use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Which end of the working day a permission frees up. Only a morning
/// permission moves the late-arrival threshold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PermissionType {
    Morning,
    Evening,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PermissionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PermissionRequest {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date", example = "2026-01-12")]
    pub date: NaiveDate,
    pub permission_type: PermissionType,
    pub reason: String,
    pub status: PermissionStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPermission {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub permission_type: PermissionType,
    pub reason: String,
}
