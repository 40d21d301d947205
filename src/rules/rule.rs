/// Core value types shared by the option parser and the policy analyzer
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of checking a single rule
///
/// Ordering follows severity: `HasErrors` dominates `HasWarnings`, which
/// dominates `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Rule is clean
    Ok,
    /// Rule parses but ignores a best practice
    #[serde(rename = "warnings")]
    HasWarnings,
    /// Rule is structurally broken or has an invalid option argument
    #[serde(rename = "errors")]
    HasErrors,
}

impl Verdict {
    /// Numeric code used by the classic dumbpig-style output (0, 1, -1)
    pub fn code(self) -> i32 {
        match self {
            Verdict::Ok => 0,
            Verdict::HasWarnings => 1,
            Verdict::HasErrors => -1,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => write!(f, "ok"),
            Verdict::HasWarnings => write!(f, "warnings"),
            Verdict::HasErrors => write!(f, "errors"),
        }
    }
}

/// Rule-scoped accumulator of diagnostic lines
///
/// A fresh instance is created for every rule, so nothing leaks from one
/// rule's analysis into the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    lines: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Fold a checker outcome into the buffer, returning whether it passed
    pub fn record(&mut self, outcome: std::result::Result<(), String>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(line) => {
                self.push(line);
                false
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Newline-joined message, without a trailing newline
    pub fn into_message(self) -> String {
        self.lines.join("\n")
    }
}

/// Verdict plus the human readable findings for one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub verdict: Verdict,
    pub message: String,
}

impl RuleReport {
    pub fn new(verdict: Verdict, diagnostics: Diagnostics) -> Self {
        Self {
            verdict,
            message: diagnostics.into_message(),
        }
    }

    /// Report with no findings
    pub fn ok() -> Self {
        Self {
            verdict: Verdict::Ok,
            message: String::new(),
        }
    }

    /// Individual diagnostic lines of the message
    pub fn diagnostics(&self) -> impl Iterator<Item = &str> {
        self.message.lines().filter(|l| !l.is_empty())
    }

    pub fn is_ok(&self) -> bool {
        self.verdict == Verdict::Ok
    }
}

/// One `name[:argument]` entry of a rule option clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOption {
    pub name: String,
    pub argument: Option<String>,
}

/// Option keywords seen while parsing one rule, in order, as written
///
/// Duplicates are kept; once-only enforcement relies on them. Membership is
/// exact and case-sensitive, so `SID` does not count as `sid`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredKeywords {
    names: Vec<String>,
}

impl ConfiguredKeywords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn contains_any(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.contains(n))
    }
}

impl<S: AsRef<str>> FromIterator<S> for ConfiguredKeywords {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(|n| n.as_ref().to_string()).collect(),
        }
    }
}

/// Positional fields of a rule line
///
/// Only the protocol, the two ports and the option clause are inspected;
/// addresses, action and direction are carried along untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFields {
    pub action: String,
    pub protocol: String,
    pub src_addr: String,
    pub src_port: String,
    pub direction: String,
    pub dst_addr: String,
    pub dst_port: String,
    pub options: String,
}
