pub mod error;
pub mod identity_store;
pub mod memory_store;
pub mod models;
pub mod sqlite_store;

pub use error::{Result, StoreError};
pub use identity_store::IdentityStore;
pub use memory_store::MemoryStore;
pub use models::{StoredGroup, StoredUser, UserBasics};
pub use sqlite_store::SqliteStore;
