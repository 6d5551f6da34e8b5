use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::error::AppError;
use crate::model::role::Role;
use crate::models::{Claims, TokenType};

use super::auth::AuthUser;

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Verifies an access token and turns its claims into the caller identity.
pub fn authenticate(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let claims = verify_token(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized("Access token required".into()));
    }

    let role = Role::from_id(claims.role)
        .ok_or_else(|| AppError::Unauthorized("Invalid role".into()))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    })
}

/// Signs tokens the way the identity service does, for handler tests.
#[cfg(test)]
pub fn test_token(role: Role, employee_id: Option<u64>, secret: &str) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let claims = Claims {
        user_id: employee_id.unwrap_or(0) + 10_000,
        sub: format!("user{}", employee_id.unwrap_or(0)),
        role: role as u8,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        token_type: TokenType::Access,
        employee_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
