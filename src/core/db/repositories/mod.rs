//! Database repositories
//!
//! Repositories encapsulate SQL access behind the storage traits the
//! services consume.

pub mod user;

pub use user::UserRepository;
