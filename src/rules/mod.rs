// Rule checker - Snort/Suricata rule option validation and policy analysis
pub mod analyzer;
pub mod checkers;
pub mod options;
pub mod parser;
pub mod rule;

pub use analyzer::analyze_rule;
pub use checkers::{grammar_matches, ArgChecker, GRAMMARS};
pub use options::{lookup_option, OptionDescriptor, RULE_OPTIONS};
pub use parser::{parse_option_entry, parse_options, process_rule, split_rule_line};
pub use rule::{
    ConfiguredKeywords, Diagnostics, ParsedOption, RuleFields, RuleReport, Verdict,
};
