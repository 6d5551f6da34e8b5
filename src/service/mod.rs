pub mod attendance;
pub mod grid;
pub mod leave;
pub mod permission;
pub mod regularization;
pub mod status;
pub mod summary;

use crate::auth::policy::Owner;
use crate::error::AppError;
use crate::model::employee::EmployeeId;
use crate::store::EmployeeDirectory;

/// Ownership of an employee's resources, for the capability policy. An
/// employee missing from the directory has no manager.
pub async fn owner_of<S>(store: &S, employee_id: EmployeeId) -> Result<Owner, AppError>
where
    S: EmployeeDirectory + ?Sized,
{
    let manager_id = store
        .find_employee(employee_id)
        .await?
        .and_then(|e| e.reporting_manager);

    Ok(Owner {
        employee_id,
        manager_id,
    })
}
