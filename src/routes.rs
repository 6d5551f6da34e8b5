use crate::{
    api::{attendance, holiday, leave_request, permission, regularization, reports},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            tracing::warn!(requests_per_min, "Rejected limiter settings, using defaults");
            GovernorConfig::default()
        });
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let punch_limiter = Arc::new(build_limiter(config.rate_punch_per_min));

    // Everything is behind a bearer token
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/attendance")
                    // /attendance/check-in, /attendance/check-out
                    .service(
                        web::resource("/check-in")
                            .wrap(punch_limiter.clone())
                            .route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out")
                            .wrap(punch_limiter)
                            .route(web::post().to(attendance::check_out)),
                    )
                    .service(web::resource("/me").route(web::get().to(attendance::my_attendance)))
                    .service(
                        web::resource("/query").route(web::post().to(attendance::raise_query)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(
                        web::resource("/attendance-grid")
                            .route(web::get().to(reports::attendance_grid)),
                    )
                    .service(
                        web::resource("/attendance")
                            .route(web::get().to(reports::attendance_summary)),
                    )
                    .service(web::resource("/leaves").route(web::get().to(reports::leave_report))),
            )
            .service(
                web::scope("/regularization")
                    .service(
                        web::resource("")
                            .route(web::post().to(regularization::create_regularization))
                            .route(web::get().to(regularization::list_regularizations)),
                    )
                    .service(
                        web::resource("/me")
                            .route(web::get().to(regularization::my_regularizations)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(regularization::decide_regularization)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::list_leaves))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // registered before /{id} so it is not read as an id
                    .service(
                        web::resource("/balance")
                            .route(web::get().to(leave_request::leave_balance)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::put().to(leave_request::update_leave_status)),
                    ),
            )
            .service(
                web::scope("/permissions")
                    .service(
                        web::resource("")
                            .route(web::post().to(permission::apply_permission))
                            .route(web::get().to(permission::list_permissions)),
                    )
                    .service(web::resource("/me").route(web::get().to(permission::my_permissions)))
                    .service(
                        web::resource("/{id}").route(web::put().to(permission::decide_permission)),
                    ),
            )
            .service(
                web::scope("/holidays")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(holiday::delete_holiday)),
                    ),
            ),
    );
}
