pub mod error;
pub mod logger;
pub mod notification;
pub mod rate_limit;
pub mod redis;
