use actix_web::{HttpResponse, web};

use crate::auth::auth::AuthUser;
use crate::auth::policy::{Action, authorize};
use crate::error::AppError;
use crate::model::holiday::NewHoliday;
use crate::state::AppState;
use crate::store::CalendarStore;

#[utoipa::path(
    get,
    path = "/api/holidays",
    responses(
        (status = 200, description = "Holiday calendar sorted by date", body = [Holiday]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holidays"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let holidays = state.store.list_holidays().await?;
    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body(content = NewHoliday, content_type = "application/json"),
    responses(
        (status = 201, description = "Holiday added", body = Holiday),
        (status = 400, description = "Missing name"),
        (status = 403, description = "HR or admin only"),
        (status = 409, description = "A holiday already exists on that date", body = Object, example = json!({
            "message": "Holiday already exists for this date"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holidays"
)]
pub async fn create_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewHoliday>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::ManageHolidays, None)?;

    let holiday = payload.into_inner();
    if holiday.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }

    let holiday = match state.store.insert_holiday(holiday).await {
        Err(AppError::Duplicate(_)) => {
            return Err(AppError::conflict("Holiday already exists for this date"));
        }
        other => other?,
    };
    state.holidays.invalidate();

    tracing::info!(holiday_id = holiday.id, date = %holiday.date, "Holiday added");

    Ok(HttpResponse::Created().json(holiday))
}

#[utoipa::path(
    delete,
    path = "/api/holidays/{id}",
    params(
        ("id" = u64, Path, description = "Holiday id")
    ),
    responses(
        (status = 204, description = "Holiday removed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holidays"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    authorize(&auth, Action::DeleteHolidays, None)?;
    let id = path.into_inner();

    if !state.store.delete_holiday(id).await? {
        return Err(AppError::not_found("Holiday"));
    }
    state.holidays.invalidate();

    tracing::info!(holiday_id = id, "Holiday removed");

    Ok(HttpResponse::NoContent().finish())
}
