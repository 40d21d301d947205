/// Rule option dispatch table
use super::checkers::ArgChecker;
use super::checkers::ArgChecker::{Grammar, Pcre, QuotedString, SslState, UnsignedInt};
use ahash::AHashMap;
use once_cell::sync::Lazy;

/// What the parser needs to know about one option keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDescriptor {
    /// Canonical (lowercase) keyword
    pub name: &'static str,
    /// Option must be followed by `:argument`
    pub requires_argument: bool,
    /// Option may appear at most once per rule
    pub once_only: bool,
    /// Argument validation, if any
    pub checker: Option<ArgChecker>,
}

const fn opt(
    name: &'static str,
    requires_argument: bool,
    once_only: bool,
    checker: Option<ArgChecker>,
) -> OptionDescriptor {
    OptionDescriptor {
        name,
        requires_argument,
        once_only,
        checker,
    }
}

/// Every option keyword the checker understands, in lookup order
pub static RULE_OPTIONS: &[OptionDescriptor] = &[
    // Options with arguments
    opt("activated_by", true, true, Some(UnsignedInt)),
    opt("activates", true, true, Some(UnsignedInt)),
    opt("classtype", true, true, Some(Grammar("classtype"))),
    opt("count", true, true, Some(UnsignedInt)),
    opt("detection_filter", true, true, Some(Grammar("detection_filter"))),
    opt("gid", true, true, Some(UnsignedInt)),
    opt("logto", true, true, Some(QuotedString)),
    opt("metadata", true, false, None),
    opt("msg", true, true, None),
    opt("priority", true, true, Some(UnsignedInt)),
    opt("reference", true, false, Some(Grammar("reference"))),
    opt("rev", true, true, Some(UnsignedInt)),
    opt("sid", true, true, Some(UnsignedInt)),
    opt("tag", true, true, Some(Grammar("tag"))),
    opt("threshold", true, true, Some(Grammar("threshold"))),
    opt("content", true, false, Some(QuotedString)),
    opt("ttl", true, true, Some(Grammar("ttl"))),
    opt("uricontent", true, true, Some(QuotedString)),
    opt("pcre", true, true, Some(Pcre)),
    opt("flow", true, true, Some(Grammar("flow"))),
    opt("flowbits", true, false, Some(Grammar("flowbits"))),
    opt("flowint", true, false, None),
    opt("distance", true, false, None),
    opt("within", true, false, None),
    opt("offset", true, false, None),
    opt("depth", true, false, Some(UnsignedInt)),
    opt("dsize", true, true, Some(Grammar("dsize"))),
    opt("byte_test", true, false, Some(Grammar("byte_test"))),
    opt("byte_jump", true, true, Some(Grammar("byte_jump"))),
    opt("isdataat", true, true, Some(Grammar("isdataat"))),
    opt("ipopts", true, true, Some(Grammar("ipopts"))),
    opt("itype", true, true, Some(Grammar("itype"))),
    opt("icode", true, true, Some(Grammar("icode"))),
    opt("flags", true, true, Some(Grammar("flags"))),
    opt("urilen", true, true, Some(Grammar("urilen"))),
    opt("fragbits", true, true, Some(Grammar("fragbits"))),
    opt("fragoffset", true, true, Some(Grammar("fragoffset"))),
    opt("seq", true, true, Some(UnsignedInt)),
    opt("ack", true, true, Some(UnsignedInt)),
    opt("window", true, true, Some(UnsignedInt)),
    opt("id", true, true, Some(UnsignedInt)),
    opt("ip_proto", true, true, Some(Grammar("ip_proto"))),
    opt("asn1", true, true, None),
    opt("dce_iface", true, true, Some(Grammar("dce_iface"))),
    opt("dce_opnum", true, true, Some(Grammar("dce_opnum"))),
    opt("icmp_id", true, true, Some(UnsignedInt)),
    opt("icmp_seq", true, true, Some(UnsignedInt)),
    opt("http_encode", true, true, None),
    opt("ssl_version", true, true, Some(Grammar("ssl_version"))),
    opt("ssl_state", true, true, Some(SslState)),
    opt("tos", true, true, Some(Grammar("tos"))),
    opt("iprep", true, false, Some(Grammar("iprep"))),
    // Argless options
    opt("http_method", false, true, None),
    opt("ftpbounce", false, true, None),
    opt("file_data", false, true, None),
    opt("nocase", false, false, None),
    opt("rawbytes", false, true, None),
    opt("dce_stub_data", false, true, None),
    opt("fast_pattern", false, true, None),
    opt("http_client_body", false, false, None),
    opt("http_header", false, false, None),
    opt("http_raw_cookie", false, true, None),
    opt("http_raw_header", false, true, None),
    opt("http_uri", false, false, None),
    opt("http_stat_code", false, true, None),
    opt("http_stat_msg", false, true, None),
    opt("http_cookie", false, true, None),
    opt("sameip", false, true, None),
];

/// Lowercase keyword -> position of its first descriptor in `RULE_OPTIONS`
static OPTION_INDEX: Lazy<AHashMap<String, usize>> = Lazy::new(|| {
    let mut index = AHashMap::with_capacity(RULE_OPTIONS.len());
    for (pos, desc) in RULE_OPTIONS.iter().enumerate() {
        index.entry(desc.name.to_ascii_lowercase()).or_insert(pos);
    }
    index
});

/// Case-insensitive lookup of an option keyword
///
/// First match in table order wins; `None` means the option is unknown.
pub fn lookup_option(name: &str) -> Option<&'static OptionDescriptor> {
    OPTION_INDEX
        .get(&name.to_ascii_lowercase())
        .map(|&pos| &RULE_OPTIONS[pos])
}
