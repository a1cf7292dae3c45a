//! Java properties format parser
//!
//! Property-file sources are stored in the classic `.properties` format:
//! ISO-8859-1 bytes, `key=value` / `key:value` / whitespace-separated
//! pairs, `#` and `!` line comments, backslash line continuation and the
//! standard escape sequences including `\uXXXX`.

use std::collections::BTreeMap;

/// Reserved key that sets the ordinal of the declaring source.
pub const ORDINAL_KEY: &str = "config_ordinal";

/// Parse a property file from its raw bytes.
///
/// The bytes are decoded as ISO-8859-1, so every byte maps to exactly one
/// character and parsing cannot fail. Malformed `\u` escapes are kept
/// literally with the backslash dropped rather than rejected.
pub fn parse(bytes: &[u8]) -> BTreeMap<String, String> {
    let text = decode_latin1(bytes);
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut properties = BTreeMap::new();
    let mut lines = normalized.split('\n');
    while let Some(line) = lines.next() {
        let line = line.trim_start_matches(is_ws);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let mut logical = String::from(line);
        // A logical line ends only when the trailing backslash count is
        // even; continuation lines lose their leading whitespace.
        while ends_with_odd_backslashes(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start_matches(is_ws)),
                None => break,
            }
        }
        let (key, value) = parse_logical_line(&logical);
        properties.insert(key, value);
    }
    properties
}

/// The ordinal a parsed property set declares through [`ORDINAL_KEY`],
/// if any. An unparseable declaration is ignored with a warning.
pub fn declared_ordinal(properties: &BTreeMap<String, String>) -> Option<i32> {
    let raw = properties.get(ORDINAL_KEY)?;
    match raw.parse::<i32>() {
        Ok(ordinal) => Some(ordinal),
        Err(_) => {
            tracing::warn!(value = %raw, "ignoring unparseable {} declaration", ORDINAL_KEY);
            None
        }
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    // ISO-8859-1 maps byte n to code point n.
    bytes.iter().map(|&b| b as char).collect()
}

fn is_ws(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

fn ends_with_odd_backslashes(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn parse_logical_line(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();
    let mut key = String::new();
    let mut i = 0;
    let mut separated = false;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 1;
            push_escaped(&chars, &mut i, &mut key);
        } else if c == '=' || c == ':' {
            separated = true;
            i += 1;
            break;
        } else if is_ws(c) {
            break;
        } else {
            key.push(c);
            i += 1;
        }
    }

    while i < chars.len() && is_ws(chars[i]) {
        i += 1;
    }
    if !separated && i < chars.len() && (chars[i] == '=' || chars[i] == ':') {
        i += 1;
        while i < chars.len() && is_ws(chars[i]) {
            i += 1;
        }
    }

    let mut value = String::new();
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 1;
            push_escaped(&chars, &mut i, &mut value);
        } else {
            value.push(c);
            i += 1;
        }
    }

    (key, value)
}

/// Append the character named by the escape at `chars[*i]`, advancing the
/// index past the escape. A backslash at end of line is dropped.
fn push_escaped(chars: &[char], i: &mut usize, out: &mut String) {
    let Some(&c) = chars.get(*i) else {
        return;
    };
    *i += 1;
    match c {
        't' => out.push('\t'),
        'n' => out.push('\n'),
        'r' => out.push('\r'),
        'f' => out.push('\x0c'),
        'u' => {
            let hex: String = chars.iter().skip(*i).take(4).collect();
            match (hex.len() == 4)
                .then(|| u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32))
                .flatten()
            {
                Some(decoded) => {
                    *i += 4;
                    out.push(decoded);
                }
                None => out.push('u'),
            }
        }
        // Every other escaped character stands for itself: \\, \=, \:,
        // \#, \! and escaped whitespace.
        other => out.push(other),
    }
}
