pub mod manager;
pub mod migrations;
pub mod models;
pub mod query;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{ListQuery, OwnedEntity, Page, Repository, UpdateOutcome};
