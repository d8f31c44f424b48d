//! Caching - the bounded LRU/TTL cache used by the authorization layer.

mod lru;

pub use lru::LruTtlCache;
