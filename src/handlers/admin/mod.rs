pub mod logs;
pub mod messages;
pub mod reports;
pub mod settings;
pub mod users;
