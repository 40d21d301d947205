/// Best-practice analysis of a rule that parsed cleanly
use super::rule::{ConfiguredKeywords, Diagnostics, RuleReport, Verdict};

/// Keywords that give an IP rule something to inspect beyond the header
const IP_INSPECTION_KEYWORDS: &[&str] = &["content", "uricontent", "pcre", "ip_proto"];

/// Keywords that count as deep inspection for TCP/UDP rules
const TRANSPORT_INSPECTION_KEYWORDS: &[&str] =
    &["content", "uricontent", "byte_test", "dsize", "flags"];

/// Keywords that make a `pcre` match cheap to pre-filter
///
/// This list names `pcre` itself, so the pcre-without-content warning below
/// is inert: a rule with `pcre` always "has" a companion.
const PCRE_COMPANION_KEYWORDS: &[&str] = &["pcre", "pcre"];

fn is_transport(protocol: &str) -> bool {
    protocol.eq_ignore_ascii_case("tcp") || protocol.eq_ignore_ascii_case("udp")
}

/// Emit best-practice warnings for a rule
///
/// All checks run; any finding downgrades the verdict to `HasWarnings`.
/// This stage never produces errors.
pub fn analyze_rule(
    protocol: &str,
    src_port: &str,
    dst_port: &str,
    configured: &ConfiguredKeywords,
) -> RuleReport {
    let mut diags = Diagnostics::new();

    if is_transport(protocol)
        && src_port.eq_ignore_ascii_case("any")
        && dst_port.eq_ignore_ascii_case("any")
    {
        // First finding of this stage, printed without the "- " prefix.
        diags.push("Rule without port numbers - it'll be really slow");
    }

    if protocol.eq_ignore_ascii_case("ip") && !configured.contains_any(IP_INSPECTION_KEYWORDS) {
        diags.push("- IP rule without content match - it's better to use firewall for this");
    }

    if is_transport(protocol) && !configured.contains_any(TRANSPORT_INSPECTION_KEYWORDS) {
        diags.push(
            "- TCP/UDP rule without deep packet checks - it's better to use firewall for this",
        );
    }

    if protocol.eq_ignore_ascii_case("tcp") && !configured.contains("flow") {
        diags.push(
            "- TCP protocol without flow checking. Consider adding 'flow' keyword to provide \
             better state tracking",
        );
    }

    if protocol.eq_ignore_ascii_case("ip") && configured.contains("flow") {
        diags.push("- IP protocol with flow checking - consider changing protocol to TCP or UDP");
    }

    if configured.contains("pcre") && !configured.contains_any(PCRE_COMPANION_KEYWORDS) {
        diags.push(
            "- PCRE matching without 'content' or 'uricontent' keywords - it'll cause a \
             performance hit",
        );
    }

    let verdict = if diags.is_empty() {
        Verdict::Ok
    } else {
        Verdict::HasWarnings
    };

    RuleReport::new(verdict, diags)
}
