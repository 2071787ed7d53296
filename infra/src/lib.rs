//! # Infrastructure Layer
//!
//! Concrete implementations of the collaborator traits declared in `vk_core`:
//!
//! ## Architecture
//!
//! - **Cache**: Redis client and the verification code store, with an
//!   in-process fallback for development
//! - **Rate limiting**: sliding window limiters over Redis or in process
//! - **SMS**: providers (Twilio, AWS SNS, mock) and failover dispatchers
//!
//! ## Features
//!
//! - `redis-cache`: Enable Redis support (default)
//! - `twilio-sms`: Enable Twilio SMS service (default)
//! - `aws-sns`: Enable AWS SNS SMS service (default)
//! - `mock-services`: Enable mock implementations for testing

use std::sync::Arc;

use vk_core::domain::CodePolicy;
use vk_core::errors::StoreError;
use vk_core::services::{
    CodeCacheTrait, RateLimiterTrait, SmsServiceTrait, VerificationService,
    VerificationServiceConfig,
};
use vk_shared::{AppConfig, CacheType};

/// Cache module - Redis client and verification code store
pub mod cache;

/// Sliding window rate limiters
pub mod ratelimit;

/// SMS service module - providers and dispatchers
pub mod sms;

use cache::{MemoryCodeCache, RedisClient, RedisCodeCache};
use ratelimit::{MemorySlidingWindowLimiter, RedisSlidingWindowLimiter};

/// Verification service wired to the infrastructure implementations
pub type DynVerificationService = VerificationService<dyn SmsServiceTrait, dyn CodeCacheTrait>;

/// Infrastructure service container
#[derive(Clone)]
pub struct InfrastructureServices {
    /// Verification code store
    pub code_cache: Arc<dyn CodeCacheTrait>,
    /// Dispatcher delivering codes
    pub sms_service: Arc<dyn SmsServiceTrait>,
    /// Redis client, when the shared store is Redis
    pub redis_client: Option<RedisClient>,
    verification: VerificationServiceConfig,
}

impl InfrastructureServices {
    /// Build the verification service over these implementations
    pub fn verification_service(&self) -> DynVerificationService {
        VerificationService::new(
            self.sms_service.clone(),
            self.code_cache.clone(),
            self.verification.clone(),
        )
    }
}

/// Initialize infrastructure services
///
/// This function sets up:
/// - The verification code store (Redis or in-process)
/// - Dispatch and per-destination rate limiters
/// - SMS providers and the configured dispatcher
pub async fn initialize(config: &AppConfig) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!(
        environment = %config.environment,
        cache_type = ?config.cache.cache_type,
        "Initializing infrastructure services..."
    );

    let policy = CodePolicy::from(&config.verification);
    let windows = &config.rate_limit;

    let (code_cache, dispatch_limiter, destination_limiter, redis_client): (
        Arc<dyn CodeCacheTrait>,
        Arc<dyn RateLimiterTrait>,
        Option<Arc<dyn RateLimiterTrait>>,
        Option<RedisClient>,
    ) = match config.cache.cache_type {
        CacheType::Redis => {
            let client = RedisClient::new(config.cache.clone()).await?;
            (
                Arc::new(RedisCodeCache::new(client.clone(), policy)),
                Arc::new(RedisSlidingWindowLimiter::from_config(
                    client.clone(),
                    &windows.dispatch,
                )),
                windows.per_destination.as_ref().map(|window| {
                    Arc::new(RedisSlidingWindowLimiter::from_config(client.clone(), window))
                        as Arc<dyn RateLimiterTrait>
                }),
                Some(client),
            )
        }
        CacheType::Memory => {
            if config.environment.is_production() {
                tracing::warn!("In-process store selected in production; records are not shared");
            }
            (
                Arc::new(MemoryCodeCache::new(policy)),
                Arc::new(MemorySlidingWindowLimiter::from_config(&windows.dispatch)),
                windows.per_destination.as_ref().map(|window| {
                    Arc::new(MemorySlidingWindowLimiter::from_config(window))
                        as Arc<dyn RateLimiterTrait>
                }),
                None,
            )
        }
    };

    let sms_service = sms::create_dispatcher(config, dispatch_limiter, destination_limiter).await?;

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices {
        code_cache,
        sms_service,
        redis_client,
        verification: VerificationServiceConfig::from(&config.verification),
    })
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for StoreError {
    fn from(error: InfrastructureError) -> Self {
        StoreError::Unavailable(error.to_string())
    }
}
