pub mod memory;
pub mod postgres;
pub mod redis;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgArtistStore};
pub use redis::{create_redis_client, ApiQuota};
pub use store::ArtistStore;

#[cfg(test)]
pub use store::MockArtistStore;
