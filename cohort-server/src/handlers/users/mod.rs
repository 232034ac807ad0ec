pub mod handlers;
pub mod metadata;

pub use metadata::Metadata;
