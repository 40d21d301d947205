pub mod settings;

pub use settings::{LoggingConfig, OutputConfig, OutputFormat, Settings, ValidationConfig};
