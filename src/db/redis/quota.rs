use chrono::{DateTime, Utc};
use redis::Client;

use crate::error::{AppError, AppResult};

const MONTH_KEY_TTL: i64 = 60 * 60 * 24 * 32;
const DAY_KEY_TTL: i64 = 60 * 60 * 24 * 7;
const WARN_RATIO: f32 = 0.8;

/// Creates a Redis client for usage bookkeeping
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Key under which monthly outbound calls are counted
pub fn month_key(provider: &str, now: DateTime<Utc>) -> String {
    format!("api_usage:{}:{}", provider, now.format("%Y-%m"))
}

/// Key under which daily outbound calls are counted
pub fn day_key(provider: &str, now: DateTime<Utc>) -> String {
    format!("api_usage:{}:daily:{}", provider, now.format("%Y-%m-%d"))
}

/// Monthly budget of calls against a rate-limited provider
///
/// Counters live in Redis so several server instances share one budget.
#[derive(Clone)]
pub struct ApiQuota {
    redis_client: Client,
    provider: &'static str,
    monthly_limit: u32,
}

impl ApiQuota {
    pub fn new(redis_client: Client, provider: &'static str, monthly_limit: u32) -> Self {
        Self {
            redis_client,
            provider,
            monthly_limit,
        }
    }

    /// Claims one call from this month's budget
    ///
    /// The monthly and daily counters are bumped and read back in one atomic
    /// pipeline, so concurrent callers can never overshoot the limit. A refused
    /// claim is handed back before `QuotaExceeded` is returned.
    pub async fn reserve(&self) -> AppResult<()> {
        let now = Utc::now();
        let month = month_key(self.provider, now);
        let day = day_key(self.provider, now);

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let (count, daily): (u32, u32) = redis::pipe()
            .atomic()
            .incr(&month, 1)
            .expire(&month, MONTH_KEY_TTL)
            .ignore()
            .incr(&day, 1)
            .expire(&day, DAY_KEY_TTL)
            .ignore()
            .query_async(&mut conn)
            .await?;

        if count > self.monthly_limit {
            let _: () = redis::pipe()
                .atomic()
                .decr(&month, 1)
                .ignore()
                .decr(&day, 1)
                .ignore()
                .query_async(&mut conn)
                .await?;

            tracing::error!(
                provider = self.provider,
                quota = self.monthly_limit,
                "Monthly API quota exceeded"
            );
            return Err(AppError::QuotaExceeded(format!(
                "{} quota of {} calls exhausted for this month",
                self.provider, self.monthly_limit
            )));
        }

        if count as f32 / self.monthly_limit as f32 > WARN_RATIO {
            tracing::warn!(
                provider = self.provider,
                current = count,
                quota = self.monthly_limit,
                remaining = self.monthly_limit - count,
                "API quota above 80%"
            );
        }

        tracing::debug!(
            provider = self.provider,
            monthly_count = count,
            daily_count = daily,
            "API call reserved"
        );

        Ok(())
    }
}
