pub mod backup_exchange;
pub mod core;
pub mod mentor;
pub mod records;
pub mod students;
