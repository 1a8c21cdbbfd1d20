pub mod animal;
pub mod contact_message;
pub mod employee;
pub mod farm;
pub mod health_record;
pub mod role;
pub mod setting;
pub mod system_log;
pub mod user;

pub use animal::Animal;
pub use contact_message::ContactMessage;
pub use employee::Employee;
pub use farm::Farm;
pub use health_record::HealthRecord;
pub use role::Role;
pub use setting::SystemSetting;
pub use system_log::SystemLog;
pub use user::{User, UserWithRole};
