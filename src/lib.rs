pub mod batch;
pub mod config;
pub mod error;
pub mod input;
pub mod report;
pub mod rules;

pub use error::{Result, RuleCheckError};
pub use rules::{process_rule, RuleReport, Verdict};
