use harmony_cache::{Cache, CacheError};
use harmony_http::{
    Client as HttpClient, Error as HttpError, RatelimitMode, Ratelimiter, Request, Route, Transport,
};
use harmony_models::{
    events::Event,
    guild::Region,
    id::GuildId,
    stats::Stats,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{config::Config, error::Error, guild::Guild};

pub struct SessionRef {
    cache: Cache,
    ratelimiter: Ratelimiter,
    transport: Arc<dyn Transport>,
    config: Config,
}

/// One authenticated session: the entity cache, the rate-limit gate and the
/// transport shared by every guild handle created from it.
///
/// The gate lives exactly as long as the session. Clones share all state.
#[derive(Clone)]
pub struct Session(Arc<SessionRef>);

impl Session {
    pub fn new(config: Config, transport: Arc<dyn Transport>, stats: Arc<Stats>) -> Self {
        let ratelimiter = Ratelimiter::with_stats(
            config.bucket_capacity,
            config.bucket_window,
            Arc::clone(&stats),
        );
        Self(Arc::new(SessionRef {
            cache: Cache::new(stats),
            ratelimiter,
            transport,
            config,
        }))
    }

    /// A session talking to the service over HTTPS
    pub fn with_http(config: Config, stats: Arc<Stats>) -> Self {
        let http = HttpClient::new(config.token.clone(), config.api_base.clone());
        Self::new(config, Arc::new(http), stats)
    }

    pub fn cache(&self) -> &Cache {
        &self.0.cache
    }

    pub fn ratelimiter(&self) -> &Ratelimiter {
        &self.0.ratelimiter
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    /// Apply a push notification from the event dispatcher
    pub fn update(&self, event: &Event) -> Result<(), CacheError> {
        self.0.cache.update(event)
    }

    /// A handle on a guild using the session's default rate-limit mode
    pub fn guild(&self, guild_id: impl Into<GuildId>) -> Guild {
        Guild::new(self.clone(), guild_id.into(), self.0.config.ratelimit_mode)
    }

    /// Fetch the voice regions offered by the service and cache them
    pub async fn fetch_regions(&self) -> Result<Vec<Region>, Error> {
        let regions = self
            .execute_as::<Vec<Region>>(Route::GetVoiceRegions, None, self.0.config.ratelimit_mode)
            .await?;
        self.0.cache.cache_regions(regions.iter().cloned());
        Ok(regions)
    }

    pub(crate) async fn execute_as<T: DeserializeOwned>(
        &self,
        route: Route<'_>,
        body: Option<Value>,
        mode: RatelimitMode,
    ) -> Result<T, Error> {
        let payload = self.execute(route, body, mode).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Send a call through the rate-limit gate and the transport.
    ///
    /// A 429 drains the bucket. In [`RatelimitMode::Wait`] the call is then
    /// admitted again up to `max_retries` times, every other failure surfaces as is.
    pub(crate) async fn execute(
        &self,
        route: Route<'_>,
        body: Option<Value>,
        mode: RatelimitMode,
    ) -> Result<Value, Error> {
        let config = &self.0.config;
        let bucket = route.bucket();
        let request = Request {
            method: route.method(),
            path: route.to_string(),
            body,
        };

        let mut retries = 0;
        loop {
            self.0
                .ratelimiter
                .acquire(&bucket, mode, config.max_wait)
                .await?;

            debug!(method = %request.method, path = %request.path, "Issuing request");
            let fut = self.0.transport.request(request.clone());
            let result = match config.request_timeout {
                Some(duration) => match timeout(duration, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(HttpError::Timeout),
                },
                None => fut.await,
            };

            match result {
                Ok(response) => {
                    if let Some(info) = response.ratelimit {
                        self.0.ratelimiter.update(&bucket, info);
                    }
                    return Ok(response.payload);
                }
                Err(HttpError::RateLimited {
                    retry_after,
                    global,
                }) => {
                    self.0.ratelimiter.exhaust(
                        &bucket,
                        retry_after.unwrap_or(config.bucket_window),
                        global,
                    );
                    if mode == RatelimitMode::Wait && retries < config.max_retries {
                        retries += 1;
                        warn!(bucket = %bucket, retry_after = ?retry_after, retries, "Rejected with 429, retrying");
                        continue;
                    }
                    return Err(HttpError::RateLimited {
                        retry_after,
                        global,
                    }
                    .into());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
