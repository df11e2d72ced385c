// ABOUTME: Bidirectional translation between surface names and host-legal identifiers

//! Every surface name (arbitrary UTF-8 text used as a Lissp symbol) has a
//! host-legal image. Characters that cannot appear in a host identifier are
//! replaced by an escape sequence `Qz<TAG>_`; characters that can appear
//! (letters, digits-not-in-leading-position, underscore) pass through
//! unchanged. The table below is closed: it is never extended at run time,
//! so `demunge` can invert it with a single regex pass.

use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// One fixed escape tag per punctuation character that cannot appear in a
/// host identifier. Order doesn't matter for encoding; `demunge`'s regex
/// alternation is built from this table plus the two parametric rules
/// below (leading-digit, generic unicode fallback).
const TAG_TABLE: &[(char, &str)] = &[
    ('-', ""),
    ('+', "PLUS"),
    ('*', "STAR"),
    ('/', "SOL"),
    ('%', "PCENT"),
    ('<', "LT"),
    ('>', "GT"),
    ('=', "EQ"),
    ('!', "BANG"),
    ('?', "QUEST"),
    ('.', "FULLxSTOP"),
    (',', "COMMA"),
    (':', "COLON"),
    (';', "SEMI"),
    ('\'', "APOS"),
    ('"', "QUOTE"),
    ('`', "GRAVE"),
    ('^', "CARET"),
    ('~', "TILDE"),
    ('@', "AT"),
    ('&', "ET"),
    ('|', "BAR"),
    ('#', "HASH"),
    ('$', "DOLR"),
    ('(', "LPAR"),
    (')', "RPAR"),
    ('[', "LBRACK"),
    (']', "RBRACK"),
    ('{', "LBRACE"),
    ('}', "RBRACE"),
    ('\\', "BSOL"),
    (' ', "SPACE"),
    ('\t', "TAB"),
    ('\n', "NEWLINE"),
];

const DIGIT_NAMES: [&str; 10] = [
    "ZERO", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE",
];

fn tag_for(c: char) -> Option<&'static str> {
    TAG_TABLE.iter().find(|(ch, _)| *ch == c).map(|(_, t)| *t)
}

fn char_for_tag(tag: &str) -> Option<char> {
    TAG_TABLE.iter().find(|(_, t)| *t == tag).map(|(c, _)| *c)
}

/// A char is allowed to stand unescaped in a host identifier at a
/// non-leading position: letters, digits, underscore, and any other
/// alphabetic Unicode scalar not already claimed by the tag table.
fn is_continue_char(c: char) -> bool {
    (c.is_alphanumeric() || c == '_') && tag_for(c).is_none()
}

fn is_start_char(c: char) -> bool {
    is_continue_char(c) && !c.is_ascii_digit() && !c.is_numeric()
}

/// Replaces each character that cannot appear in a host identifier (at its
/// position) with `Qz<TAG>_`. Applies NFKC normalization first. Total: every
/// surface name has a host-legal image, so this never fails.
pub fn munge(name: &str) -> String {
    let normalized: String = name.nfkc().collect();
    let mut out = String::with_capacity(normalized.len() * 2);
    for (i, c) in normalized.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            out.push_str("QzDIGITx");
            out.push_str(DIGIT_NAMES[c.to_digit(10).unwrap() as usize]);
            out.push('_');
        } else if (i == 0 && is_start_char(c)) || (i > 0 && is_continue_char(c)) {
            out.push(c);
        } else if let Some(tag) = tag_for(c) {
            out.push_str("Qz");
            out.push_str(tag);
            out.push('_');
        } else {
            // Not in the fixed punctuation table: a generic Unicode escape,
            // still part of the closed table (one rule, not an open one).
            out.push_str("QzU");
            out.push_str(&format!("{:x}", c as u32));
            out.push('_');
        }
    }
    out
}

fn escape_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let mut alts: Vec<String> = TAG_TABLE
            .iter()
            .map(|(_, t)| t.to_string())
            .filter(|t| !t.is_empty())
            .collect();
        // Longest-tag-first so e.g. "FULLxSTOP" isn't shadowed by a shorter
        // accidental prefix match; none currently collide but keep the
        // invariant explicit for future table entries.
        alts.sort_by_key(|b| std::cmp::Reverse(b.len()));
        alts.push("DIGITx(?:ZERO|ONE|TWO|THREE|FOUR|FIVE|SIX|SEVEN|EIGHT|NINE)".to_string());
        alts.push("U[0-9a-f]+".to_string());
        // The hyphen's tag is the empty string: "Qz_" with nothing between.
        alts.push(String::new());
        let pattern = format!("Qz(?P<tag>{})_", alts.join("|"));
        regex::Regex::new(&pattern).expect("munger escape table compiles to a valid regex")
    })
}

/// Inverts `munge`. Demunging is unambiguous by construction: the escape
/// tags are themselves composed only of characters that `munge` never
/// escapes, so a regex scan recovers the original text exactly for any
/// identifier actually produced by `munge`. (A surface name that happens to
/// spell out a `Qz..._` sequence literally is, by the same token, accepted
/// unchanged by `munge` and will round-trip through `demunge` too — this
/// mirrors the accepted ambiguity of the scheme this crate implements.)
pub fn demunge(identifier: &str) -> String {
    let re = escape_regex();
    let mut out = String::with_capacity(identifier.len());
    let mut last = 0;
    for caps in re.captures_iter(identifier) {
        let m = caps.get(0).unwrap();
        out.push_str(&identifier[last..m.start()]);
        let tag = &caps["tag"];
        if let Some(rest) = tag.strip_prefix("DIGITx") {
            let idx = DIGIT_NAMES.iter().position(|n| *n == rest).unwrap();
            out.push(std::char::from_digit(idx as u32, 10).unwrap());
        } else if let Some(hex) = tag.strip_prefix('U') {
            if let Ok(cp) = u32::from_str_radix(hex, 16) {
                if let Some(c) = char::from_u32(cp) {
                    out.push(c);
                }
            }
        } else if let Some(c) = char_for_tag(tag) {
            out.push(c);
        }
        last = m.end();
    }
    out.push_str(&identifier[last..]);
    out
}
