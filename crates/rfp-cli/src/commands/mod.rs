//! Command implementations.

pub mod extract;
pub mod match_records;
pub mod show_config;

pub use self::extract::execute_extract;
pub use self::match_records::execute_match;
pub use self::show_config::execute_show_config;
