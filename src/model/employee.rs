use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub type EmployeeId = u64;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Terminated,
}

/// Directory entry for an employee, as far as attendance and leave care.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "department": "Engineering",
        "designation": "Software Engineer",
        "reporting_manager": 12,
        "status": "active"
    })
)]
pub struct EmployeeProfile {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub designation: String,
    pub reporting_manager: Option<u64>,
    pub status: EmployeeStatus,
}

impl EmployeeProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Which active employees a report covers.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub designation: Option<String>,
    /// Restricts the result to a single employee.
    pub only: Option<u64>,
}
