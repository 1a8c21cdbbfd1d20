pub mod audit;
pub mod reports;
pub mod roles;
pub mod settings;
