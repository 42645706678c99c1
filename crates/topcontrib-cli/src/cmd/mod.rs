pub mod show_config;
pub mod top;
