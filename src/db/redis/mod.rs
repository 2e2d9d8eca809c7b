pub mod quota;

pub use quota::create_redis_client;
pub use quota::ApiQuota;
