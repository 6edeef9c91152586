pub mod config;
pub mod expansion;
pub mod fs_store;
pub mod hierarchy;
pub mod message;
pub mod sidebar;
pub mod store;
