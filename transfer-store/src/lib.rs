pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod memory_repo;
pub mod redis_repo;
#[cfg(feature = "kafka")]
pub mod events;

pub use booking_repo::PgBookingStore;
pub use database::DbClient;
pub use memory_repo::InMemoryBookingStore;
pub use redis_repo::{RedisClient, RedisLedger};
#[cfg(feature = "kafka")]
pub use events::{EventProducer, KafkaEventPublisher};
