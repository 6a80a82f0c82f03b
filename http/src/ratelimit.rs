use dashmap::DashMap;
use harmony_models::{id::GuildId, stats::Stats};
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// What a call does when its bucket has no tokens left
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RatelimitMode {
    /// Sleep until the bucket refills, bounded by the maximum wait
    Wait,
    /// Fail immediately with [`Ratelimited`]
    FailFast,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BucketKey {
    pub route: &'static str,
    pub major: Option<GuildId>,
}

impl Display for BucketKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.major {
            Some(major) => write!(f, "{}:{}", self.route, major),
            None => f.write_str(self.route),
        }
    }
}

/// Bucket state reported by the service alongside a response
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RatelimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ratelimited {
    pub retry_after: Option<Duration>,
}

impl Display for Ratelimited {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.retry_after {
            Some(d) => write!(f, "Rate limited, retry after {}ms", d.as_millis()),
            None => f.write_str("Rate limited"),
        }
    }
}

impl StdError for Ratelimited {}

#[derive(Debug)]
struct Bucket {
    limit: u32,
    remaining: u32,
    window: Duration,
    reset_at: Instant,
}

impl Bucket {
    fn new(limit: u32, window: Duration, now: Instant) -> Self {
        Self {
            limit,
            remaining: limit,
            window,
            reset_at: now + window,
        }
    }

    fn refill(&mut self, now: Instant) {
        if now >= self.reset_at {
            self.remaining = self.limit;
            self.reset_at = now + self.window;
        }
    }
}

pub struct RatelimiterRef {
    buckets: DashMap<BucketKey, Bucket>,
    global: Mutex<Option<Instant>>,
    capacity: u32,
    window: Duration,
    stats: Option<Arc<Stats>>,
}

/// Token buckets shared by every call of one authenticated session.
///
/// Each [`BucketKey`] owns one bucket. A bucket is only mutated while its map
/// entry is locked, so concurrent callers sharing a key take tokens one at a time.
/// Buckets start with `capacity` tokens and a `window` long refill period until
/// the service reports its own limits through [`Ratelimiter::update`].
#[derive(Clone)]
pub struct Ratelimiter(Arc<RatelimiterRef>);

impl Ratelimiter {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self(Arc::new(RatelimiterRef {
            buckets: DashMap::new(),
            global: Mutex::new(None),
            capacity,
            window,
            stats: None,
        }))
    }

    pub fn with_stats(capacity: u32, window: Duration, stats: Arc<Stats>) -> Self {
        Self(Arc::new(RatelimiterRef {
            buckets: DashMap::new(),
            global: Mutex::new(None),
            capacity,
            window,
            stats: Some(stats),
        }))
    }

    /// Take a token from the bucket, or return how long until one is available
    fn try_take(&self, key: &BucketKey) -> Result<(), Duration> {
        let now = Instant::now();
        {
            let mut global = self.0.global.lock().expect("global ratelimit poisoned");
            match *global {
                Some(until) if until > now => return Err(until - now),
                Some(_) => *global = None,
                None => {}
            }
        }

        let mut bucket = self
            .0
            .buckets
            .entry(key.clone())
            .or_insert_with(|| Bucket::new(self.0.capacity, self.0.window, now));
        bucket.refill(now);
        if bucket.remaining > 0 {
            bucket.remaining -= 1;
            Ok(())
        } else {
            Err(bucket.reset_at.saturating_duration_since(now))
        }
    }

    /// Admit one call against the bucket.
    ///
    /// In [`RatelimitMode::Wait`] this sleeps until a token is free as long as the
    /// total time slept stays within `max_wait`.
    pub async fn acquire(
        &self,
        key: &BucketKey,
        mode: RatelimitMode,
        max_wait: Duration,
    ) -> Result<(), Ratelimited> {
        let mut waited = Duration::ZERO;
        loop {
            let retry_after = match self.try_take(key) {
                Ok(()) => return Ok(()),
                Err(retry_after) => retry_after,
            };
            if let Some(stats) = &self.0.stats {
                stats.ratelimited.inc();
            }

            // A zero wait with no token means the bucket can never refill
            if mode == RatelimitMode::FailFast
                || retry_after.is_zero()
                || waited + retry_after > max_wait
            {
                warn!(bucket = %key, retry_after = ?retry_after, "Bucket exhausted");
                return Err(Ratelimited {
                    retry_after: Some(retry_after),
                });
            }

            debug!(bucket = %key, retry_after = ?retry_after, "Waiting for bucket to refill");
            sleep(retry_after).await;
            waited += retry_after;
        }
    }

    /// Replace the local view of a bucket with what the service reported
    pub fn update(&self, key: &BucketKey, info: RatelimitInfo) {
        let now = Instant::now();
        let mut bucket = self
            .0
            .buckets
            .entry(key.clone())
            .or_insert_with(|| Bucket::new(info.limit, info.reset_after, now));
        bucket.limit = info.limit;
        bucket.remaining = info.remaining;
        bucket.window = info.reset_after;
        bucket.reset_at = now + info.reset_after;
    }

    /// Drain a bucket after the service rejected a call with 429
    pub fn exhaust(&self, key: &BucketKey, retry_after: Duration, global: bool) {
        let now = Instant::now();
        if global {
            let mut until = self.0.global.lock().expect("global ratelimit poisoned");
            *until = Some(now + retry_after);
            return;
        }

        let mut bucket = self
            .0
            .buckets
            .entry(key.clone())
            .or_insert_with(|| Bucket::new(self.0.capacity, self.0.window, now));
        bucket.remaining = 0;
        bucket.reset_at = now + retry_after;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(major: &str) -> BucketKey {
        BucketKey {
            route: "guilds/{guild_id}/roles",
            major: Some(GuildId::from(major)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_rejects_call_past_capacity() {
        let limiter = Ratelimiter::new(3, Duration::from_secs(10));
        for _ in 0..3 {
            limiter
                .acquire(&key("1"), RatelimitMode::FailFast, Duration::ZERO)
                .await
                .unwrap();
        }
        let err = limiter
            .acquire(&key("1"), RatelimitMode::FailFast, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err.retry_after, Some(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_blocks_until_refill() {
        let limiter = Ratelimiter::new(2, Duration::from_secs(5));
        let start = Instant::now();
        for _ in 0..2 {
            limiter
                .acquire(&key("1"), RatelimitMode::Wait, Duration::from_secs(30))
                .await
                .unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter
            .acquire(&key("1"), RatelimitMode::Wait, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_bounded() {
        let limiter = Ratelimiter::new(1, Duration::from_secs(5));
        limiter
            .acquire(&key("1"), RatelimitMode::Wait, Duration::from_secs(1))
            .await
            .unwrap();
        let start = Instant::now();
        let err = limiter
            .acquire(&key("1"), RatelimitMode::Wait, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.retry_after, Some(Duration::from_secs(5)));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let limiter = Ratelimiter::new(1, Duration::from_secs(5));
        limiter
            .acquire(&key("1"), RatelimitMode::FailFast, Duration::ZERO)
            .await
            .unwrap();
        limiter
            .acquire(&key("2"), RatelimitMode::FailFast, Duration::ZERO)
            .await
            .unwrap();
        assert!(limiter
            .acquire(&key("1"), RatelimitMode::FailFast, Duration::ZERO)
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn server_reported_window_replaces_local_one() {
        let limiter = Ratelimiter::new(5, Duration::from_secs(1));
        limiter.update(
            &key("1"),
            RatelimitInfo {
                limit: 5,
                remaining: 0,
                reset_after: Duration::from_secs(3),
            },
        );
        let err = limiter
            .acquire(&key("1"), RatelimitMode::FailFast, Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.retry_after, Some(Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn global_exhaustion_blocks_every_bucket() {
        let limiter = Ratelimiter::new(5, Duration::from_secs(1));
        limiter.exhaust(&key("1"), Duration::from_secs(2), true);
        assert!(limiter
            .acquire(&key("2"), RatelimitMode::FailFast, Duration::ZERO)
            .await
            .is_err());
        let start = Instant::now();
        limiter
            .acquire(&key("2"), RatelimitMode::Wait, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_bucket_without_window_fails_instead_of_spinning() {
        let limiter = Ratelimiter::new(0, Duration::ZERO);
        let err = limiter
            .acquire(&key("1"), RatelimitMode::Wait, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.retry_after, Some(Duration::ZERO));
    }
}
