/// Argument grammar checkers for rule options
///
/// Every checker takes the option name and its trimmed argument, appends
/// its findings to the rule's diagnostics and reports whether the argument
/// passed. Malformed input is the expected case here, so nothing in this
/// module panics or propagates an error for a bad argument.
use super::rule::Diagnostics;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fmt;
use tracing::trace;

/// Named argument grammars, one per option
///
/// Each pattern is matched against the whole argument (it is wrapped in
/// `^(?:...)$` at compile time), so a pattern only needs its own leading or
/// trailing `\s*` where whitespace is tolerated. Matching works on bytes with
/// Unicode disabled: `\d`, `\s` and `\w` are ASCII classes.
pub const GRAMMARS: &[(&str, &str)] = &[
    (
        "reference",
        r#"^\s*([A-Za-z0-9]+)\s*,"?\s*"?\s*([a-zA-Z0-9_./?=-]+)"?\s*"?"#,
    ),
    ("fragoffset", r"^\s*(?:(<|>))?\s*([0-9]+)"),
    ("fragbits", r"^\s*(?:([+*!]))?\s*([MDR]+)"),
    ("classtype", r"^\s*([a-zA-Z][_a-zA-Z0-9-]*)\s*$"),
    (
        "isdataat",
        r"^\s*!?([^\s,]+)\s*(,\s*relative)?\s*(,\s*rawbytes\s*)?\s*$",
    ),
    ("ttl", r"^\s*([0-9]*)?\s*([-<>=]+)?\s*([0-9]+)?\s*$"),
    (
        "detection_filter",
        concat!(
            r"^\s*(track|count|seconds)\s+(by_src|by_dst|\d+)\s*,",
            r"\s*(track|count|seconds)\s+(by_src|by_dst|\d+)\s*,",
            r"\s*(track|count|seconds)\s+(by_src|by_dst|\d+)\s*$",
        ),
    ),
    (
        "threshold",
        concat!(
            r"^\s*(track|type|count|seconds)\s+(limit|both|threshold|by_dst|by_src|\d+)\s*,\s*",
            r"(track|type|count|seconds)\s+(limit|both|threshold|by_dst|by_src|\d+)\s*,\s*",
            r"(track|type|count|seconds)\s+(limit|both|threshold|by_dst|by_src|\d+)\s*,\s*",
            r"(track|type|count|seconds)\s+(limit|both|threshold|by_dst|by_src|\d+)\s*",
        ),
    ),
    (
        "tag",
        r"^\s*(host|session)\s*(,\s*(\d+)\s*,\s*(packets|bytes|seconds)\s*(,\s*(src|dst))?\s*)?$",
    ),
    (
        "flow",
        r"^\s*([A-z_]+)\s*(?:,\s*([A-z_]+))?\s*(?:,\s*([A-z_]+))?\s*$",
    ),
    (
        "dce_iface",
        concat!(
            r"^\s*([0-9a-zA-Z]{8}-[0-9a-zA-Z]{4}-[0-9a-zA-Z]{4}-[0-9a-zA-Z]{4}-[0-9a-zA-Z]{12})",
            r"(?:\s*,(<|>|=|!)([0-9]{1,5}))?(?:\s*,(any_frag))?\s*$",
        ),
    ),
    (
        "dce_opnum",
        r"^\s*([0-9]{1,5}(\s*-\s*[0-9]{1,5}\s*)?)(,\s*[0-9]{1,5}(\s*-\s*[0-9]{1,5})?\s*)*$",
    ),
    (
        "ssl_version",
        concat!(
            r"^\s*(!?[A-z0-9.]+)\s*,?\s*(!?[A-z0-9.]+)?\s*,?\s*",
            r"(!?[A-z0-9.]+)?\s*,?\s*(!?[A-z0-9.]+)?\s*,?\s*(!?[A-z0-9.]+)?\s*$",
        ),
    ),
    ("ssl_state", r"^\s*([_a-zA-Z0-9]+)(.*)$"),
    ("ssl_state_chained", r"^(?:\s*[|]\s*([_a-zA-Z0-9]+))(.*)$"),
    (
        "tos",
        r"^\s*(!?\s*[0-9]{1,3}|!?\s*[xX][0-9a-fA-F]{1,2})\s*$",
    ),
    ("flowbits", r"([a-z]+)(?:,(.*))?"),
    (
        "dsize",
        r"^\s*(<|>)?\s*([0-9]{1,5})\s*(?:(<>)\s*([0-9]{1,5}))?\s*$",
    ),
    ("ip_proto", r"^\s*([!<>]?)\s*(\S+)\s*$"),
    (
        "byte_jump",
        concat!(
            r"^\s*",
            r"([^\s,]+\s*,\s*[^\s,]+)",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"(?:\s*,\s*((?:multiplier|post_offset)\s+[^\s,]+|[^\s,]+))?",
            r"\s*$",
        ),
    ),
    (
        "byte_test",
        concat!(
            r"^\s*",
            r"([^\s,]+)",
            r"\s*,\s*(!?)\s*([^\s,]*)",
            r"\s*,\s*([^\s,]+)",
            r"\s*,\s*([^\s,]+)",
            r"(?:\s*,\s*([^\s,]+))?",
            r"(?:\s*,\s*([^\s,]+))?",
            r"(?:\s*,\s*([^\s,]+))?",
            r"(?:\s*,\s*([^\s,]+))?",
            r"(?:\s*,\s*([^\s,]+))?",
            r"\s*$",
        ),
    ),
    // Deliberately loose: any non-space followed by a letter anywhere.
    ("ipopts", r".*\S[A-z].*"),
    (
        "urilen",
        concat!(
            r"^(?:\s*)(<|>)?(?:\s*)([0-9]{1,5})(?:\s*)(?:(<>)(?:\s*)",
            r"([0-9]{1,5}))?\s*(?:,\s*(norm|raw))?\s*$",
        ),
    ),
    ("icode", r"^\s*(<|>)?\s*([0-9]+)\s*(?:<>\s*([0-9]+))?\s*$"),
    ("itype", r"^\s*(<|>)?\s*([0-9]+)\s*(?:<>\s*([0-9]+))?\s*$"),
    (
        "flags",
        r"^\s*(?:([+*!]))?\s*([SAPRFU120CE+*!]+)(?:\s*,\s*([SAPRFU12CE]+))?\s*$",
    ),
    (
        "iprep",
        r"\s*(any|src|dst|both)\s*,\s*([\w-]+)\s*,\s*(<|>|=)\s*,\s*(12[0-7]|1[01][0-9]|[1-9][0-9]|[1-9])\s*",
    ),
];

static COMPILED_GRAMMARS: Lazy<AHashMap<&'static str, Regex>> = Lazy::new(|| {
    GRAMMARS
        .iter()
        .map(|(name, pattern)| {
            let anchored = format!("(?-u)^(?:{})$", pattern);
            let regex = Regex::new(&anchored)
                .unwrap_or_else(|e| panic!("built-in grammar '{}' is invalid: {}", name, e));
            (*name, regex)
        })
        .collect()
});

/// Full-string match of `argument` against the named grammar
///
/// Unknown grammar names never match.
pub fn grammar_matches(grammar: &str, argument: &str) -> bool {
    COMPILED_GRAMMARS
        .get(grammar)
        .map(|re| re.is_match(argument.as_bytes()))
        .unwrap_or(false)
}

/// How an option's argument is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgChecker {
    /// `"..."` with a non-empty body (content, uricontent, logto)
    QuotedString,
    /// Quoted regular expression that must compile
    Pcre,
    /// ASCII digits only, at least one
    UnsignedInt,
    /// Named entry of [`GRAMMARS`]
    Grammar(&'static str),
    /// Bare state name, or a `|`-prefixed one
    SslState,
}

impl ArgChecker {
    /// Validate `argument` for option `option`
    ///
    /// Failures are appended to `diags` as `- `-prefixed lines. Returns
    /// whether the argument was accepted.
    pub fn check(self, option: &str, argument: &str, diags: &mut Diagnostics) -> bool {
        trace!(option, argument, checker = ?self, "Checking option argument");

        match self {
            ArgChecker::QuotedString => diags.record(check_quoted_string(option, argument)),
            ArgChecker::Pcre => diags.record(check_pcre(argument)),
            ArgChecker::UnsignedInt => diags.record(check_unsigned_int(option, argument)),
            ArgChecker::Grammar(name) => diags.record(check_grammar(option, argument, name)),
            ArgChecker::SslState => check_ssl_state(option, argument, diags),
        }
    }
}

/// The bare form is tried first and reports its own failure even when the
/// `|`-prefixed form then matches; both failing yields two lines.
fn check_ssl_state(option: &str, argument: &str, diags: &mut Diagnostics) -> bool {
    diags.record(check_grammar(option, argument, "ssl_state"))
        || diags.record(check_grammar(option, argument, "ssl_state_chained"))
}

/// Strip exactly one leading and one trailing `"`
///
/// Returns `None` when the argument is not enclosed in quotes.
fn strip_quotes(argument: &str) -> Option<&str> {
    if !argument.starts_with('"') || !argument.ends_with('"') {
        return None;
    }

    // A lone `"` both starts and ends the argument and leaves nothing behind.
    if argument.len() < 2 {
        return Some("");
    }

    Some(&argument[1..argument.len() - 1])
}

fn check_quoted_string(option: &str, argument: &str) -> Result<(), String> {
    match strip_quotes(argument) {
        None => Err(format!(
            "- Value of option '{}' must be enclosed in '\"'",
            option
        )),
        Some("") => Err(format!("- Value of option '{}' is empty", option)),
        Some(_) => Ok(()),
    }
}

fn check_pcre(argument: &str) -> Result<(), String> {
    let body = match strip_quotes(argument) {
        None => return Err("- Regular expression must be enclosed in '\"'".to_string()),
        Some("") => return Err("- Regular expression is empty".to_string()),
        Some(body) => body,
    };

    match fancy_regex::Regex::new(body) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!(
            "- Invalid regular expression: {} ({})",
            body,
            single_line_error(&e)
        )),
    }
}

/// Regex syntax errors may render over several lines with a caret diagram;
/// the last line carries the actual reason.
fn single_line_error(err: &impl fmt::Display) -> String {
    let text = err.to_string();
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("invalid pattern")
        .to_string()
}

fn check_unsigned_int(option: &str, argument: &str) -> Result<(), String> {
    if !argument.is_empty() && argument.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(format!(
            "- Invalid argument to '{}' option: {}. Must be a positive integer",
            option, argument
        ))
    }
}

fn check_grammar(option: &str, argument: &str, grammar: &str) -> Result<(), String> {
    if grammar_matches(grammar, argument) {
        Ok(())
    } else {
        Err(invalid_argument(option))
    }
}

fn invalid_argument(option: &str) -> String {
    format!("- Invalid argument to '{}'", option)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(name: &'static str) -> ArgChecker {
        ArgChecker::Grammar(name)
    }

    fn run(checker: ArgChecker, option: &str, argument: &str) -> Result<(), String> {
        let mut diags = Diagnostics::new();
        if checker.check(option, argument, &mut diags) {
            assert!(diags.is_empty());
            Ok(())
        } else {
            Err(diags.into_message())
        }
    }

    #[test]
    fn test_all_grammars_compile() {
        assert_eq!(COMPILED_GRAMMARS.len(), GRAMMARS.len());
    }

    #[test]
    fn test_unknown_grammar_never_matches() {
        assert!(!grammar_matches("no_such_option", "anything"));
    }

    #[test]
    fn test_quoted_string() {
        let c = ArgChecker::QuotedString;
        assert!(run(c, "content", "\"abc\"").is_ok());
        assert!(run(c, "content", "\"|0D 0A|\"").is_ok());

        assert_eq!(
            run(c, "content", "abc"),
            Err("- Value of option 'content' must be enclosed in '\"'".to_string())
        );
        assert_eq!(
            run(c, "content", "\"abc"),
            Err("- Value of option 'content' must be enclosed in '\"'".to_string())
        );
        assert_eq!(
            run(c, "content", "\"\""),
            Err("- Value of option 'content' is empty".to_string())
        );
        assert_eq!(
            run(c, "logto", "\""),
            Err("- Value of option 'logto' is empty".to_string())
        );
        assert!(run(c, "content", "").is_err());
    }

    #[test]
    fn test_pcre() {
        let c = ArgChecker::Pcre;
        assert!(run(c, "pcre", "\"/^GET\\s+admin/i\"").is_ok());
        assert!(run(c, "pcre", "\"foo(bar)?\"").is_ok());

        assert_eq!(
            run(c, "pcre", "/foo/"),
            Err("- Regular expression must be enclosed in '\"'".to_string())
        );
        assert_eq!(
            run(c, "pcre", "\"\""),
            Err("- Regular expression is empty".to_string())
        );

        let err = run(c, "pcre", "\"/foo(/\"").unwrap_err();
        assert!(err.starts_with("- Invalid regular expression: /foo(/ ("));
        assert!(err.ends_with(')'));
        assert!(!err.contains('\n'));
    }

    #[test]
    fn test_pcre_accepts_perl_syntax() {
        let c = ArgChecker::Pcre;
        assert!(run(c, "pcre", "\"/foo(?!bar)/i\"").is_ok());
        assert!(run(c, "pcre", "\"/(?<=GET )admin/\"").is_ok());
        assert!(run(c, "pcre", "\"/(a)\\1/\"").is_ok());
        assert!(run(c, "pcre", "\"/^GET\\s+(?!index)/smi\"").is_ok());

        assert!(run(c, "pcre", "\"/(?!bar/\"").is_err());
    }

    #[test]
    fn test_unsigned_int() {
        let c = ArgChecker::UnsignedInt;
        assert!(run(c, "sid", "12345").is_ok());
        assert!(run(c, "rev", "0").is_ok());

        assert_eq!(
            run(c, "sid", "12a45"),
            Err("- Invalid argument to 'sid' option: 12a45. Must be a positive integer".to_string())
        );
        assert!(run(c, "sid", "-1").is_err());
        assert!(run(c, "sid", "1 2").is_err());
        assert!(run(c, "sid", "").is_err());
    }

    #[test]
    fn test_reference() {
        let c = grammar("reference");
        assert!(run(c, "reference", "cve,2019-0708").is_ok());
        assert!(run(c, "reference", "url,www.example.com/path?x=1").is_ok());
        assert!(run(c, "reference", "bugtraq, \"1234\"").is_ok());
        assert!(run(c, "reference", "nocomma").is_err());
        assert!(run(c, "reference", "url,").is_err());
    }

    #[test]
    fn test_classtype() {
        let c = grammar("classtype");
        assert!(run(c, "classtype", "trojan-activity").is_ok());
        assert!(run(c, "classtype", "not_set").is_ok());
        assert_eq!(
            run(c, "classtype", "1bad"),
            Err("- Invalid argument to 'classtype'".to_string())
        );
        assert!(run(c, "classtype", "two words").is_err());
    }

    #[test]
    fn test_frag_options() {
        assert!(run(grammar("fragoffset"), "fragoffset", "0").is_ok());
        assert!(run(grammar("fragoffset"), "fragoffset", ">100").is_ok());
        assert!(run(grammar("fragoffset"), "fragoffset", "!0").is_err());

        assert!(run(grammar("fragbits"), "fragbits", "M").is_ok());
        assert!(run(grammar("fragbits"), "fragbits", "+MD").is_ok());
        assert!(run(grammar("fragbits"), "fragbits", "X").is_err());
    }

    #[test]
    fn test_isdataat() {
        let c = grammar("isdataat");
        assert!(run(c, "isdataat", "50").is_ok());
        assert!(run(c, "isdataat", "!1,relative").is_ok());
        assert!(run(c, "isdataat", "4, relative, rawbytes").is_ok());
        assert!(run(c, "isdataat", "4,absolute").is_err());
    }

    #[test]
    fn test_ttl() {
        let c = grammar("ttl");
        assert!(run(c, "ttl", "<3").is_ok());
        assert!(run(c, "ttl", "64").is_ok());
        assert!(run(c, "ttl", "1-3").is_ok());
        assert!(run(c, "ttl", "abc").is_err());
    }

    #[test]
    fn test_detection_filter() {
        let c = grammar("detection_filter");
        assert!(run(c, "detection_filter", "track by_src, count 30, seconds 60").is_ok());
        assert!(run(c, "detection_filter", "track by_src, count 30").is_err());
        assert!(run(c, "detection_filter", "track by_rule, count 30, seconds 60").is_err());
    }

    #[test]
    fn test_grammars_use_ascii_classes() {
        let c = grammar("detection_filter");
        let arabic_digits = "track by_src, count \u{663}\u{660}, seconds 60";
        let no_break_space = "track by_src,\u{a0}count 30, seconds 60";
        assert!(run(c, "detection_filter", arabic_digits).is_err());
        assert!(run(c, "detection_filter", no_break_space).is_err());

        assert!(run(grammar("iprep"), "iprep", "src,B\u{e4}dHosts,>,100").is_err());
    }

    #[test]
    fn test_threshold() {
        let c = grammar("threshold");
        assert!(run(c, "threshold", "type limit, track by_src, count 1, seconds 60").is_ok());
        assert!(run(c, "threshold", "type both, track by_dst, count 5, seconds 120").is_ok());
        assert!(run(c, "threshold", "type limit, track by_src, count 1").is_err());
    }

    #[test]
    fn test_tag() {
        let c = grammar("tag");
        assert!(run(c, "tag", "session").is_ok());
        assert!(run(c, "tag", "host, 300, seconds, src").is_ok());
        assert!(run(c, "tag", "session,10,packets").is_ok());
        assert!(run(c, "tag", "flow").is_err());
    }

    #[test]
    fn test_flow() {
        let c = grammar("flow");
        assert!(run(c, "flow", "established,to_server").is_ok());
        assert!(run(c, "flow", "to_client, established, no_stream").is_ok());
        assert!(run(c, "flow", "a,b,c,d").is_err());
        assert!(run(c, "flow", "established,").is_err());
    }

    #[test]
    fn test_dce_options() {
        let iface = grammar("dce_iface");
        assert!(run(iface, "dce_iface", "4b324fc8-1670-01d3-1278-5a47bf6ee188").is_ok());
        assert!(run(iface, "dce_iface", "4b324fc8-1670-01d3-1278-5a47bf6ee188,<2,any_frag").is_ok());
        assert!(run(iface, "dce_iface", "4b324fc8-1670").is_err());

        let opnum = grammar("dce_opnum");
        assert!(run(opnum, "dce_opnum", "15").is_ok());
        assert!(run(opnum, "dce_opnum", "15-18, 20").is_ok());
        assert!(run(opnum, "dce_opnum", "15,").is_err());
    }

    #[test]
    fn test_ssl_version() {
        let c = grammar("ssl_version");
        assert!(run(c, "ssl_version", "sslv3").is_ok());
        assert!(run(c, "ssl_version", "tls1.0,tls1.1,!tls1.2").is_ok());
        assert!(run(c, "ssl_version", "tls1.0;x").is_err());
    }

    #[test]
    fn test_ssl_state() {
        let c = ArgChecker::SslState;
        assert!(run(c, "ssl_state", "client_hello").is_ok());
        // Only the leading state name is anchored; the rest of the chain rides along.
        assert!(run(c, "ssl_state", "client_hello|%%%").is_ok());
        assert_eq!(
            run(c, "ssl_state", "!client_hello"),
            Err("- Invalid argument to 'ssl_state'\n- Invalid argument to 'ssl_state'".to_string())
        );
    }

    #[test]
    fn test_ssl_state_chained_form_still_reports_bare_failure() {
        let mut diags = Diagnostics::new();
        assert!(ArgChecker::SslState.check("ssl_state", "|server_hello", &mut diags));
        assert_eq!(diags.into_message(), "- Invalid argument to 'ssl_state'");
    }

    #[test]
    fn test_tos() {
        let c = grammar("tos");
        assert!(run(c, "tos", "8").is_ok());
        assert!(run(c, "tos", "!x1f").is_ok());
        assert!(run(c, "tos", "1234").is_err());
    }

    #[test]
    fn test_flowbits() {
        let c = grammar("flowbits");
        assert!(run(c, "flowbits", "set,http.login").is_ok());
        assert!(run(c, "flowbits", "noalert").is_ok());
        assert!(run(c, "flowbits", "Set,x").is_err());
        assert!(run(c, "flowbits", " set,x").is_err());
    }

    #[test]
    fn test_size_options() {
        let dsize = grammar("dsize");
        assert!(run(dsize, "dsize", ">300").is_ok());
        assert!(run(dsize, "dsize", "300<>400").is_ok());
        assert!(run(dsize, "dsize", "123456").is_err());

        let urilen = grammar("urilen");
        assert!(run(urilen, "urilen", "<10").is_ok());
        assert!(run(urilen, "urilen", "5<>10, norm").is_ok());
        assert!(run(urilen, "urilen", "5, cooked").is_err());
    }

    #[test]
    fn test_ip_proto() {
        let c = grammar("ip_proto");
        assert!(run(c, "ip_proto", "igmp").is_ok());
        assert!(run(c, "ip_proto", "!6").is_ok());
        assert!(run(c, "ip_proto", "6 17").is_err());
    }

    #[test]
    fn test_byte_jump() {
        let c = grammar("byte_jump");
        assert!(run(c, "byte_jump", "4,12").is_ok());
        assert!(run(c, "byte_jump", "4, 12, relative, little, multiplier 2, post_offset -1").is_ok());
        assert!(run(c, "byte_jump", "4").is_err());
    }

    #[test]
    fn test_byte_test() {
        let c = grammar("byte_test");
        assert!(run(c, "byte_test", "4,>,1000,20").is_ok());
        assert!(run(c, "byte_test", "2, !&, 0x8000, 0, relative, big").is_ok());
        assert!(run(c, "byte_test", "4,>,1000").is_err());
    }

    #[test]
    fn test_ipopts_is_loose() {
        let c = grammar("ipopts");
        assert!(run(c, "ipopts", "rr").is_ok());
        assert!(run(c, "ipopts", "lsrr").is_ok());
        assert!(run(c, "ipopts", "1x").is_ok());
        assert!(run(c, "ipopts", "a").is_err());
        assert!(run(c, "ipopts", "12").is_err());
    }

    #[test]
    fn test_icmp_options() {
        for option in ["icode", "itype"] {
            let c = grammar(option);
            assert!(run(c, option, "8").is_ok());
            assert!(run(c, option, ">3").is_ok());
            assert!(run(c, option, "0<>5").is_ok());
            assert!(run(c, option, "echo").is_err());
        }
    }

    #[test]
    fn test_flags() {
        let c = grammar("flags");
        assert!(run(c, "flags", "S").is_ok());
        assert!(run(c, "flags", "SA,12").is_ok());
        assert!(run(c, "flags", "!FPU").is_ok());
        assert!(run(c, "flags", "SX").is_err());
    }

    #[test]
    fn test_iprep() {
        let c = grammar("iprep");
        assert!(run(c, "iprep", "src,BadHosts,>,100").is_ok());
        assert!(run(c, "iprep", "any, CnC, =, 127").is_ok());
        assert!(run(c, "iprep", "any,CnC,>,128").is_err());
        assert!(run(c, "iprep", "any,CnC,>,0").is_err());
        assert!(run(c, "iprep", "both,CnC,!,10").is_err());
    }
}
