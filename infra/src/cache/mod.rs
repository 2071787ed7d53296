//! Cache module for verification code storage
//!
//! This module provides the Redis client and the two verification code
//! caches: the Redis-backed one shared by every instance, and an in-process
//! one for development and tests.

pub mod code_cache;
pub mod memory_code_cache;
pub mod redis_client;

#[cfg(test)]
mod tests;

pub use code_cache::RedisCodeCache;
pub use memory_code_cache::MemoryCodeCache;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use vk_shared::CacheConfig;
