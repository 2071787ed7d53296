//! Sliding window rate limiters
//!
//! Both limiters admit at most `rate` requests per key within any trailing
//! `interval`. The Redis limiter is shared by every service instance; the
//! in-process one serves development setups and tests.

pub mod memory_sliding_window;
pub mod redis_sliding_window;

#[cfg(test)]
mod tests;

pub use memory_sliding_window::MemorySlidingWindowLimiter;
pub use redis_sliding_window::RedisSlidingWindowLimiter;
