//! Persistence seams consumed by the identity workflow.

pub mod groups;
pub mod users;

pub use groups::GroupDirectory;
pub use users::{USERS_GROUP_EMAIL_KEY, UsersRepository};
