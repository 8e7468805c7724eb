mod model;
mod repository;
mod store;

pub use model::CacheEntry;
pub use repository::FileCacheRepository;
pub use store::FileCacheStore;
