/// Rendering of check results and run statistics
use crate::batch::CheckedRule;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::rules::Verdict;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// JSON shape of one checked rule
#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    line: usize,
    rule: &'a str,
    verdict: Verdict,
    code: i32,
    diagnostics: Vec<&'a str>,
}

/// Writes checked rules in the configured format
pub struct ReportWriter<W: Write> {
    out: W,
    format: OutputFormat,
    quiet_ok: bool,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, format: OutputFormat, quiet_ok: bool) -> Self {
        Self {
            out,
            format,
            quiet_ok,
        }
    }

    pub fn write(&mut self, checked: &CheckedRule) -> Result<()> {
        if self.quiet_ok && checked.report.verdict == Verdict::Ok {
            return Ok(());
        }

        match self.format {
            OutputFormat::Text => {
                writeln!(self.out, "Rule: {}", checked.line.text)?;
                writeln!(self.out, "{}\n", checked.report.message)?;
            }
            OutputFormat::Json => {
                let record = JsonRecord {
                    line: checked.line.number,
                    rule: &checked.line.text,
                    verdict: checked.report.verdict,
                    code: checked.report.verdict.code(),
                    diagnostics: checked.report.diagnostics().collect(),
                };
                serde_json::to_writer(&mut self.out, &record)?;
                writeln!(self.out)?;
            }
        }

        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, checked: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a CheckedRule>,
    {
        for rule in checked {
            self.write(rule)?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Verdict counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub total: usize,
    pub ok: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl ValidationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, verdict: Verdict) {
        self.total += 1;
        match verdict {
            Verdict::Ok => self.ok += 1,
            Verdict::HasWarnings => self.warnings += 1,
            Verdict::HasErrors => self.errors += 1,
        }
    }

    pub fn from_results<'a, I>(checked: I) -> Self
    where
        I: IntoIterator<Item = &'a CheckedRule>,
    {
        let mut stats = Self::new();
        for rule in checked {
            stats.record(rule.report.verdict);
        }
        stats
    }

    /// Most severe verdict seen
    pub fn worst(&self) -> Verdict {
        if self.errors > 0 {
            Verdict::HasErrors
        } else if self.warnings > 0 {
            Verdict::HasWarnings
        } else {
            Verdict::Ok
        }
    }
}

impl fmt::Display for ValidationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rule Check Summary:")?;
        writeln!(f, "  Total rules: {}", self.total)?;
        writeln!(f, "  OK: {}", self.ok)?;
        writeln!(f, "  With warnings: {}", self.warnings)?;
        writeln!(f, "  With errors: {}", self.errors)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RuleLine;
    use crate::rules::process_rule;

    fn checked(number: usize, text: &str) -> CheckedRule {
        CheckedRule {
            line: RuleLine {
                number,
                text: text.to_string(),
            },
            report: process_rule(text),
        }
    }

    const OK_RULE: &str = "alert tcp any any -> any 80 (msg:\"x\"; flow:to_server; content:\"x\"; classtype:misc; sid:1; rev:1;)";
    const BAD_RULE: &str = "alert tcp any any -> any 80 (msg:\"x\";)";

    #[test]
    fn test_text_output() {
        let mut writer = ReportWriter::new(Vec::new(), OutputFormat::Text, false);
        writer.write(&checked(1, OK_RULE)).unwrap();
        writer.write(&checked(2, "bad")).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let expected = format!(
            "Rule: {}\n\n\nRule: bad\n- Bad rule: expected 8 fields, found 1\n\n",
            OK_RULE
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_quiet_ok_skips_clean_rules() {
        let mut writer = ReportWriter::new(Vec::new(), OutputFormat::Text, true);
        writer
            .write_all(&[checked(1, OK_RULE), checked(2, BAD_RULE)])
            .unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert!(!out.contains("flow:to_server"));
        assert!(out.starts_with("Rule: alert tcp any any -> any 80 (msg:\"x\";)\n- No SID number"));
    }

    #[test]
    fn test_json_output() {
        let mut writer = ReportWriter::new(Vec::new(), OutputFormat::Json, false);
        writer.write(&checked(7, BAD_RULE)).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert!(out.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["line"], 7);
        assert_eq!(value["verdict"], "errors");
        assert_eq!(value["code"], -1);
        assert_eq!(value["diagnostics"].as_array().unwrap().len(), 3);
        assert_eq!(value["diagnostics"][0], "- No SID number. Please add 'sid' keyword");
    }

    #[test]
    fn test_stats() {
        let results = vec![
            checked(1, OK_RULE),
            checked(2, BAD_RULE),
            checked(3, "alert tcp any any -> any any (sid:1; rev:1; classtype:misc;)"),
        ];
        let stats = ValidationStats::from_results(&results);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.ok, 1);
        assert_eq!(stats.warnings, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.worst(), Verdict::HasErrors);
        assert!(stats.to_string().contains("With errors: 1"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = ValidationStats::new();
        assert_eq!(stats.worst(), Verdict::Ok);
        assert_eq!(stats.total, 0);
    }
}
