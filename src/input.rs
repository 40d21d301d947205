/// Rule sources: a rules file or standard input
use crate::error::{Result, RuleCheckError};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Where rule lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Stdin,
    File(PathBuf),
}

impl RuleSource {
    /// `-` selects standard input, anything else is a file path
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            RuleSource::Stdin
        } else {
            RuleSource::File(PathBuf::from(arg))
        }
    }

    /// Open the source for line reading
    ///
    /// Fails with `InputError` when a file cannot be opened.
    pub fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            RuleSource::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            RuleSource::File(path) => {
                let file = File::open(path).map_err(|e| {
                    RuleCheckError::InputError(format!(
                        "Failed to open file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleSource::Stdin => write!(f, "<stdin>"),
            RuleSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A rule line together with its 1-based position in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLine {
    pub number: usize,
    pub text: String,
}

/// Which lines to drop before checking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineFilter {
    pub skip_comments: bool,
    pub skip_blank: bool,
}

impl LineFilter {
    pub fn keeps(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        if self.skip_blank && trimmed.is_empty() {
            return false;
        }
        if self.skip_comments && trimmed.starts_with('#') {
            return false;
        }
        true
    }
}

/// Read every line of `reader`, line terminators stripped
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD so the line is
/// still checked on its own instead of ending the read.
pub fn read_lines<R: BufRead>(mut reader: R, filter: LineFilter) -> Result<Vec<RuleLine>> {
    let mut lines = Vec::new();
    let mut skipped = 0usize;
    let mut buf = Vec::new();
    let mut number = 0usize;

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|e| {
            RuleCheckError::InputError(format!("Failed to read line {}: {}", number + 1, e))
        })?;
        if read == 0 {
            break;
        }
        number += 1;

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        let text = match std::str::from_utf8(&buf) {
            Ok(text) => text.to_string(),
            Err(_) => {
                warn!(line = number, "Line is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(&buf).into_owned()
            }
        };

        if !filter.keeps(&text) {
            skipped += 1;
            continue;
        }

        lines.push(RuleLine { number, text });
    }

    debug!("Read {} lines ({} skipped)", lines.len(), skipped);
    Ok(lines)
}

/// Open `source` and read all of its rule lines
pub fn load_rules(source: &RuleSource, filter: LineFilter) -> Result<Vec<RuleLine>> {
    info!("Reading rules from {}", source);
    let reader = source.open()?;
    read_lines(reader, filter)
}
