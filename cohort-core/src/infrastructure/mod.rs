//! Adapters implementing the persistence ports.

pub mod memory;

#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub mod postgres;

pub use memory::InMemoryStore;
#[cfg(feature = "database")]
pub use postgres::{PostgresGroupDirectory, PostgresUsersRepository};
