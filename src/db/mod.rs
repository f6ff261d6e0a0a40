pub mod redis;

pub use self::redis::CacheStore;
pub use self::redis::RedisConnection;
pub use self::redis::RedisService;
pub use self::redis::Role;
