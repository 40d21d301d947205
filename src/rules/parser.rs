/// Rule line splitter and rule option parser using nom combinators
use super::analyzer::analyze_rule;
use super::options::lookup_option;
use super::rule::{ConfiguredKeywords, Diagnostics, ParsedOption, RuleFields, RuleReport, Verdict};
use nom::{
    bytes::complete::{take_till, take_while, take_while1},
    character::complete::char,
    combinator::{opt, rest},
    multi::separated_list0,
    sequence::{pair, preceded},
    IResult,
};
use tracing::{debug, trace, warn};

/// Number of positional fields in a rule line, the option clause included
pub const RULE_FIELDS: usize = 8;

/// Split `text` on separator characters, compressing separator runs
///
/// A run of separators yields a single split. Leading or trailing
/// separators still produce an empty token at that edge, and an empty input
/// yields one empty token.
pub fn split_compressed<F>(text: &str, is_separator: F) -> Vec<&str>
where
    F: Fn(char) -> bool,
{
    let tokens: IResult<&str, Vec<&str>> = separated_list0(
        take_while1(|c: char| is_separator(c)),
        take_while(|c: char| !is_separator(c)),
    )(text);

    // Tokens may be empty and separators always consume, so the list
    // parser never fails and always reaches the end of input.
    match tokens {
        Ok((_, tokens)) => tokens,
        Err(_) => vec![text],
    }
}

fn is_field_separator(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Split a rule line into its eight positional fields
///
/// Tokens past the eighth are joined back into the option clause with a
/// single space. Returns `None` when the line has fewer than eight fields.
pub fn split_rule_line(line: &str) -> Option<RuleFields> {
    let tokens = split_compressed(line, is_field_separator);
    if tokens.len() < RULE_FIELDS {
        return None;
    }

    let options = tokens[RULE_FIELDS - 1..].join(" ");

    Some(RuleFields {
        action: tokens[0].to_string(),
        protocol: tokens[1].to_string(),
        src_addr: tokens[2].to_string(),
        src_port: tokens[3].to_string(),
        direction: tokens[4].to_string(),
        dst_addr: tokens[5].to_string(),
        dst_port: tokens[6].to_string(),
        options,
    })
}

/// `name[:argument]`, splitting on the first `:` only
fn option_entry(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    pair(take_till(|c: char| c == ':'), opt(preceded(char(':'), rest)))(input)
}

/// Split one option clause entry into keyword and argument
///
/// Only the first `:` separates; later ones stay in the argument. Both parts
/// are trimmed. Returns `None` for an entry with an empty keyword.
pub fn parse_option_entry(entry: &str) -> Option<ParsedOption> {
    let (_, (name, argument)) = option_entry(entry).ok()?;
    let name = name.trim();

    if name.is_empty() {
        return None;
    }

    Some(ParsedOption {
        name: name.to_string(),
        argument: argument.map(|a| a.trim().to_string()),
    })
}

/// Parse and check the option clause of a rule
///
/// Every option is checked even after a failure, so one pass collects all
/// problems. Any diagnostic at all makes the rule an error; only a clean
/// parse is handed to the policy analyzer.
pub fn parse_options(protocol: &str, src_port: &str, dst_port: &str, clause: &str) -> RuleReport {
    if clause.is_empty() {
        return RuleReport::ok();
    }

    let mut diags = Diagnostics::new();

    let body = match clause
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(body) => body,
        None => {
            diags.push("- Rule options must be enclosed in '(' and ')'");
            return RuleReport::new(Verdict::HasErrors, diags);
        }
    };

    let mut configured = ConfiguredKeywords::new();

    for entry in split_compressed(body, |c| c == ';') {
        let Some(option) = parse_option_entry(entry) else {
            continue;
        };

        let Some(desc) = lookup_option(&option.name) else {
            diags.push(format!("- Unknown option: {}", option.name));
            continue;
        };

        trace!(option = %option.name, argument = ?option.argument, "Dispatching option");

        if desc.once_only && configured.contains(&option.name) {
            diags.push(format!(
                "- Option '{}' may be specified only once",
                option.name
            ));
        }

        match (&option.argument, desc.checker) {
            (None, _) if desc.requires_argument => {
                diags.push(format!("- Option '{}' requires an argument", option.name));
            }
            (Some(argument), Some(checker)) => {
                checker.check(&option.name, argument, &mut diags);
            }
            _ => {}
        }

        configured.record(&option.name);
    }

    if protocol.eq_ignore_ascii_case("ip")
        && (!src_port.eq_ignore_ascii_case("any") || !dst_port.eq_ignore_ascii_case("any"))
    {
        diags.push(
            "- IP protocol with port numbers - invalid syntax. IP protocol has no port numbers, \
             consider using TCP or UDP",
        );
    }

    if !configured.contains("sid") {
        diags.push("- No SID number. Please add 'sid' keyword");
    }

    if !configured.contains("rev") {
        diags.push("- No revision number. Please add 'rev' keyword");
    }

    if !configured.contains("classtype") {
        diags.push(
            "- No classification specified. Please add 'classtype' keyword for correct \
             classification and priority rating",
        );
    }

    if !protocol.eq_ignore_ascii_case("icmp") && configured.contains("icode") {
        diags.push("- ICMP options on non-ICMP rule");
    }

    if !diags.is_empty() {
        return RuleReport::new(Verdict::HasErrors, diags);
    }

    analyze_rule(protocol, src_port, dst_port, &configured)
}

/// Check one raw rule line
///
/// Each call works on fresh state; the same line always yields the same
/// report.
pub fn process_rule(line: &str) -> RuleReport {
    if line.is_empty() {
        return RuleReport {
            verdict: Verdict::HasErrors,
            message: String::new(),
        };
    }

    let Some(fields) = split_rule_line(line) else {
        let found = split_compressed(line, is_field_separator).len();
        warn!(found, "Bad rule: {}", line);

        let mut diags = Diagnostics::new();
        diags.push(format!(
            "- Bad rule: expected {} fields, found {}",
            RULE_FIELDS, found
        ));
        return RuleReport::new(Verdict::HasErrors, diags);
    };

    let report = parse_options(
        &fields.protocol,
        &fields.src_port,
        &fields.dst_port,
        &fields.options,
    );

    debug!(
        protocol = %fields.protocol,
        verdict = %report.verdict,
        "Checked rule"
    );

    report
}
