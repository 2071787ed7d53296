//! Redis client shared by the code cache and the sliding window limiter
//!
//! Plain commands are idempotent and retried on transient failures. Lua
//! scripts are not: a script whose reply was lost may already have been
//! applied, so [`RedisClient::eval_script`] runs it exactly once.

use redis::{
    aio::MultiplexedConnection, AsyncCommands, Client, FromRedisValue, RedisError, RedisResult,
    ScriptInvocation,
};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use vk_shared::CacheConfig;

use crate::InfrastructureError;

/// Upper bound of the exponential backoff between retries
const MAX_RETRY_DELAY_MS: u64 = 5000;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Doubling delay capped at [`MAX_RETRY_DELAY_MS`]
struct Backoff {
    delay_ms: u64,
}

impl Backoff {
    fn new(initial_ms: u64) -> Self {
        Self {
            delay_ms: initial_ms,
        }
    }

    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        self.delay_ms = (self.delay_ms * 2).min(MAX_RETRY_DELAY_MS);
    }
}

/// Redis client over one multiplexed connection
///
/// Cloning is cheap; every clone shares the same connection.
#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
    config: CacheConfig,
}

impl RedisClient {
    /// Connect to `config.url`
    ///
    /// Connection attempts follow `config.max_retries` and
    /// `config.retry_delay_ms` with exponential backoff.
    ///
    /// # Example
    /// ```no_run
    /// use vk_shared::CacheConfig;
    /// use vk_infra::cache::RedisClient;
    ///
    /// async fn create_client() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let config = CacheConfig::new("redis://localhost:6379").with_prefix("verifykit");
    ///     Ok(RedisClient::new(config).await?)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!(url = %mask_url(&config.url), "Connecting to Redis");

        let client = Client::open(config.url.as_str())
            .map_err(|e| InfrastructureError::Config(format!("Invalid Redis URL: {}", e)))?;

        let max_attempts = config.max_retries.max(1);
        let mut backoff = Backoff::new(config.retry_delay_ms);
        let mut attempt = 0;

        let connection = loop {
            attempt += 1;
            match client.get_multiplexed_async_connection().await {
                Ok(connection) => break connection,
                Err(e) if attempt < max_attempts => {
                    warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Redis connection failed, retrying"
                    );
                    backoff.wait().await;
                }
                Err(e) => {
                    error!(attempts = attempt, error = %e, "Giving up connecting to Redis");
                    return Err(InfrastructureError::Cache(e));
                }
            }
        };

        info!("Redis client connected");
        Ok(Self { connection, config })
    }

    /// Prefix a key with the configured deployment prefix
    pub fn make_key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    /// Execute a prepared Lua script invocation exactly once
    ///
    /// `redis::Script` sends EVALSHA first and falls back to EVAL when the
    /// server has not cached the script yet.
    pub async fn eval_script<T: FromRedisValue>(
        &self,
        invocation: &ScriptInvocation<'_>,
    ) -> Result<T, InfrastructureError> {
        let mut conn = self.connection.clone();
        invocation.invoke_async(&mut conn).await.map_err(|e| {
            error!(error = %e, "Redis script execution failed");
            InfrastructureError::Cache(e)
        })
    }

    /// Delete a key; true if it existed
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        let owned = key.to_string();
        let removed: u32 = self
            .query("DEL", key, move |mut conn| {
                let key = owned.clone();
                Box::pin(async move { conn.del(key).await })
            })
            .await?;
        Ok(removed > 0)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, InfrastructureError> {
        let owned = key.to_string();
        self.query("EXISTS", key, move |mut conn| {
            let key = owned.clone();
            Box::pin(async move { conn.exists(key).await })
        })
        .await
    }

    /// Remaining lifetime in milliseconds; `None` when the key is missing or
    /// never expires
    pub async fn pttl(&self, key: &str) -> Result<Option<i64>, InfrastructureError> {
        let owned = key.to_string();
        let ttl: i64 = self
            .query("PTTL", key, move |mut conn| {
                let key = owned.clone();
                Box::pin(async move { conn.pttl(key).await })
            })
            .await?;
        Ok((ttl >= 0).then_some(ttl))
    }

    /// PING the server
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let reply: String = self
            .query("PING", "", |mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async(&mut conn).await })
            })
            .await?;

        if reply != "PONG" {
            warn!(reply = %reply, "Unexpected Redis health check reply");
        }
        Ok(reply == "PONG")
    }

    /// Run an idempotent command, retrying transient failures
    async fn query<T, F>(&self, command: &str, key: &str, op: F) -> Result<T, InfrastructureError>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let max_attempts = self.config.max_retries.max(1);
        let mut backoff = Backoff::new(self.config.retry_delay_ms);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(command = command, key = key, attempt = attempt, "Redis command");

            match op(self.connection.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts && is_retriable_error(&e) => {
                    warn!(
                        command = command,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Redis command failed, retrying"
                    );
                    backoff.wait().await;
                }
                Err(e) => {
                    error!(command = command, key = key, error = %e, "Redis command failed");
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }
}

/// Whether a Redis error is transient and an idempotent command may be retried
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    error.is_io_error()
        || error.is_timeout()
        || error.is_connection_dropped()
        || matches!(
            error.kind(),
            redis::ErrorKind::BusyLoadingError | redis::ErrorKind::TryAgain
        )
}

/// Hide credentials in a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}****{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
