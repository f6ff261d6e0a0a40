pub mod cache;
pub mod connection;
pub mod store;

mod macros;

pub use cache::RedisService;
pub use connection::connection_info;
pub use connection::RedisConnection;
pub use store::CacheStore;
pub use store::Role;
