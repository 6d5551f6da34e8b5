use std::sync::Arc;

use actix_web::test::TestRequest;

use crate::auth::jwt::test_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::state::AppState;
use crate::store::memory::MemoryStore;

pub fn config() -> Config {
    Config::for_tests()
}

/// App state over a fresh in-memory store. The store handle is returned for
/// seeding and inspection.
pub fn state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (AppState::new(store.clone(), &config()), store)
}

pub fn bearer(role: Role, employee_id: Option<u64>) -> (&'static str, String) {
    (
        "Authorization",
        format!("Bearer {}", test_token(role, employee_id, &config().jwt_secret)),
    )
}

/// A request from a fixed peer, so the per-IP limiters can key it.
pub fn request() -> TestRequest {
    TestRequest::default().peer_addr("127.0.0.1:40000".parse().unwrap())
}

/// Builds the full application around `state`.
macro_rules! test_app {
    ($state:expr) => {{
        let config = $crate::api::test_support::config();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(config.clone()))
                .app_data(actix_web::web::Data::new($state))
                .configure(|cfg| $crate::routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

pub(crate) use test_app;
