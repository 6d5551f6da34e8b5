use crate::api::attendance::{CorrectionQuery, PunchBody};
use crate::api::leave_request::{LeaveListResponse, LeaveStatusUpdate};
use crate::api::permission::PermissionDecision;
use crate::api::regularization::{RegularizationDecision, RegularizationOutcome};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, GeoLocation, Punch};
use crate::model::holiday::{Holiday, HolidayType, NewHoliday};
use crate::model::leave_request::{LeaveBalance, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::permission::{PermissionRequest, PermissionStatus, PermissionType};
use crate::model::regularization::{
    RegularizationRequest, RegularizationStatus, RegularizationType,
};
use crate::service::attendance::CorrectionKind;
use crate::service::grid::{DayCode, GridRow, PunchInfo};
use crate::service::leave::LeaveApplication;
use crate::service::permission::PermissionForm;
use crate::service::regularization::RegularizationForm;
use crate::service::summary::{
    AttendanceSummary, LateArrival, LeaveRequester, LeaveStatusBreakdown, LeaveSummary,
    RecentLeave, StatusBreakdown,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance & Leave

Attendance side of the **Human Resource Management (HRM)** system.

### 🔹 Key Features
- **Attendance**
  - Daily check-in and check-out with late / half-day detection
  - Correction queries for missed punches
- **Reports**
  - Monthly attendance grid (P, P/2, LT, A, W, H, L)
  - Organization attendance summary
  - Organization leave report
- **Regularization & Permissions**
  - Request and approve corrections to past days
  - One short permission per month, moving the late threshold
- **Leave**
  - Apply, approve, reject and cancel with a per-type balance ledger
- **Holidays**
  - Company holiday calendar

### 🔐 Security
Every endpoint requires a **JWT Bearer** access token.
Approvals and organization reports are limited to **Admin** and **HR**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::my_attendance,
        crate::api::attendance::raise_query,

        crate::api::reports::attendance_grid,
        crate::api::reports::attendance_summary,
        crate::api::reports::leave_report,

        crate::api::regularization::create_regularization,
        crate::api::regularization::my_regularizations,
        crate::api::regularization::list_regularizations,
        crate::api::regularization::decide_regularization,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::list_leaves,
        crate::api::leave_request::leave_balance,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::update_leave_status,

        crate::api::permission::apply_permission,
        crate::api::permission::my_permissions,
        crate::api::permission::list_permissions,
        crate::api::permission::decide_permission,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::delete_holiday
    ),
    components(
        schemas(
            GeoLocation,
            Punch,
            AttendanceStatus,
            AttendanceRecord,
            PunchBody,
            CorrectionKind,
            CorrectionQuery,
            DayCode,
            PunchInfo,
            GridRow,
            StatusBreakdown,
            LateArrival,
            AttendanceSummary,
            LeaveStatusBreakdown,
            LeaveRequester,
            RecentLeave,
            LeaveSummary,
            RegularizationType,
            RegularizationStatus,
            RegularizationRequest,
            RegularizationForm,
            RegularizationDecision,
            RegularizationOutcome,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveBalance,
            LeaveApplication,
            LeaveListResponse,
            LeaveStatusUpdate,
            PermissionType,
            PermissionStatus,
            PermissionRequest,
            PermissionForm,
            PermissionDecision,
            HolidayType,
            Holiday,
            NewHoliday
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Check-in, check-out and correction queries"),
        (name = "Reports", description = "Attendance grid and organization reports"),
        (name = "Regularization", description = "Corrections to past attendance days"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Permissions", description = "Monthly short permissions"),
        (name = "Holidays", description = "Holiday calendar"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
