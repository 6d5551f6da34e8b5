use anyhow::Result;
use chrono::NaiveDate;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::error::AppError;
use crate::store::CalendarStore;

/// true  => date is a HOLIDAY
/// false => date is a regular calendar day
///
/// Check-ins consult this instead of the holiday table. Every change to the
/// calendar must call [`HolidayCache::invalidate`].
#[derive(Clone)]
pub struct HolidayCache {
    days: Cache<NaiveDate, bool>,
}

impl HolidayCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            days: Cache::builder()
                .max_capacity(10_000) // a few decades of calendar days
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn is_holiday<S>(&self, store: &S, date: NaiveDate) -> Result<bool, AppError>
    where
        S: CalendarStore + ?Sized,
    {
        if let Some(hit) = self.days.get(&date).await {
            return Ok(hit);
        }

        let holiday = store.holiday_on(date).await?.is_some();
        self.days.insert(date, holiday).await;
        Ok(holiday)
    }

    pub fn invalidate(&self) {
        self.days.invalidate_all();
    }

    /// Batch mark dates as holidays
    async fn batch_mark(&self, dates: &[NaiveDate]) {
        let futures: Vec<_> = dates.iter().map(|d| self.days.insert(*d, true)).collect();

        futures::future::join_all(futures).await;
    }

    /// Load upcoming holidays into the cache (batched)
    pub async fn warmup(&self, pool: &MySqlPool, from: NaiveDate, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (NaiveDate,)>(
            r#"
            SELECT date
            FROM holidays
            WHERE date >= ?
            ORDER BY date
            "#,
        )
        .bind(from)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            let (date,) = row?;
            batch.push(date);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_mark(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.batch_mark(&batch).await;
        }

        tracing::info!(total_count, %from, "Holiday cache warmup complete");

        Ok(())
    }
}
