use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

use crate::auth::jwt::authenticate;
use crate::config::Config;

/// Rejects requests without a valid access token and stores the caller's
/// `AuthUser` in the request extensions.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v,
            Err(_) => {
                let resp = HttpResponse::Unauthorized()
                    .json(json!({"message": "Invalid Authorization header encoding"}));
                return Ok(req.into_response(resp.map_into_boxed_body()));
            }
        },
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"message": "Missing Authorization header"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let Some(token) = header_value.strip_prefix("Bearer ") else {
        let resp = HttpResponse::Unauthorized()
            .json(json!({"message": "Authorization header must start with Bearer"}));
        return Ok(req.into_response(resp.map_into_boxed_body()));
    };

    let auth_user = match authenticate(token, &config.jwt_secret) {
        Ok(user) => user,
        Err(e) => {
            let resp = HttpResponse::Unauthorized().json(json!({"message": e.to_string()}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
