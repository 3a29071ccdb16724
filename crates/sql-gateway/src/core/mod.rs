pub mod executor;
pub mod guard;
pub mod limits;
pub mod query;
pub mod types;
