// Migration run configuration.
//
// Filled in incrementally by the early wizard pages and treated as
// read-only once execution starts.

use super::records::PhoneSystemFormat;

#[derive(Debug, Clone, PartialEq)]
pub struct MigrationConfig {
    pub source_file: String,
    pub source_format: PhoneSystemFormat,
    pub target_file: String,
    pub target_format: PhoneSystemFormat,
    pub use_planner: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            source_file: String::new(),
            source_format: PhoneSystemFormat::Twilio,
            target_file: String::new(),
            target_format: PhoneSystemFormat::Twilio,
            use_planner: false,
        }
    }
}
