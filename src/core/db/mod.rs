//! Database module for the calorie tracker
//!
//! Connection pool setup, entity models, the [`UserStore`] seam and its
//! PostgreSQL and in-memory implementations.

pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod store;

// Re-export commonly used items
pub use memory::MemoryUserStore;
pub use models::*;
pub use pool::{DbError, create_pool_with_migrations, health_check};
pub use repositories::UserRepository;
pub use store::{UserStore, UserStoreError};
