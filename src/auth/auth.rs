use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::authenticate;
use crate::config::Config;
use crate::error::AppError;
use crate::model::{employee::EmployeeId, role::Role};

/// Caller identity, taken from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already verified by `auth_middleware`.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(token) = bearer_token(req) else {
            return ready(Err(AppError::Unauthorized("Missing token".into())));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            tracing::error!("Config missing from app data");
            return ready(Err(AppError::Unauthorized("Cannot verify token".into())));
        };

        ready(authenticate(token, &config.jwt_secret))
    }
}

impl AuthUser {
    /// The employee record this account acts as.
    pub fn employee(&self) -> Result<EmployeeId, AppError> {
        self.employee_id
            .ok_or_else(|| AppError::forbidden("No employee profile linked to this account"))
    }

    /// Returns true if the user is an employee
    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}
