use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::service::status::AttendancePolicy;
use crate::store::Store;
use crate::utils::holiday_cache::HolidayCache;

/// Shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub holidays: HolidayCache,
    pub policy: AttendancePolicy,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            store,
            holidays: HolidayCache::new(Duration::from_secs(config.holiday_cache_ttl_secs)),
            policy: config.attendance_policy(),
        }
    }
}
