//! Raw line splitting and CTCP unwrapping.
//!
//! A wire line looks like
//! `@tag1=val1;tag2=val2 :nick!user@host PRIVMSG #channel :message text`.
//! The first two occurrences of the two-character delimiter `" :"` frame
//! the line: tags before the first, prefix/command/params between them,
//! trailing text after the second.

use std::collections::HashMap;

use crate::WireError;

/// CTCP framing marker byte.
const CTCP_MARKER: char = '\u{1}';

/// A split wire line before normalization.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub tags: HashMap<String, String>,
    pub prefix: String,
    pub command: String,
    pub trailing: String,
    /// Set when the trailing text was CTCP ACTION framed.
    pub is_action: bool,
}

/// Split one raw wire line into tags, prefix, command and trailing text.
///
/// Lines without both `" :"` delimiters or with CTCP framing other than
/// ACTION are rejected; the caller logs and drops them.
pub fn parse_line(raw: &str) -> Result<RawLine, WireError> {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);

    let first = raw.find(" :").ok_or(WireError::MissingDelimiter)?;
    let middle_start = first + 2;
    let second = raw[middle_start..]
        .find(" :")
        .map(|off| middle_start + off)
        .ok_or(WireError::MissingDelimiter)?;

    let tags = parse_tag_block(&raw[..first]);
    let (prefix, command) = split_prefix_command(&raw[middle_start..second])?;
    let (trailing, is_action) = unwrap_ctcp(&raw[second + 2..])?;

    Ok(RawLine {
        tags,
        prefix: prefix.to_string(),
        command: command.to_string(),
        trailing,
        is_action,
    })
}

/// Parse the `@key=value;key=value` block before the first `" :"`.
///
/// Values are split on the first `=` only, so a value containing `=`
/// survives intact. `key=` yields an empty string value, as does a bare
/// `key` fragment.
fn parse_tag_block(block: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    let Some(block) = block.strip_prefix('@') else {
        return tags;
    };

    for fragment in block.split(';') {
        if fragment.is_empty() {
            continue;
        }
        match fragment.split_once('=') {
            Some((key, value)) => tags.insert(key.to_string(), value.to_string()),
            None => tags.insert(fragment.to_string(), String::new()),
        };
    }
    tags
}

/// Split `prefix COMMAND params...` into prefix and command.
fn split_prefix_command(middle: &str) -> Result<(&str, &str), WireError> {
    let middle = middle.trim();
    let mut words = middle.split_whitespace();
    let prefix = words.next().ok_or(WireError::MissingCommand)?;
    let command = words.next().ok_or(WireError::MissingCommand)?;
    Ok((prefix, command))
}

/// Strip CTCP framing from the trailing text.
///
/// `\x01ACTION waves\x01` becomes `("waves", true)`. Plain text passes
/// through unchanged. CTCP commands other than ACTION are rejected.
fn unwrap_ctcp(trailing: &str) -> Result<(String, bool), WireError> {
    let Some(inner) = trailing.strip_prefix(CTCP_MARKER) else {
        return Ok((trailing.to_string(), false));
    };
    let inner = inner.strip_suffix(CTCP_MARKER).unwrap_or(inner);

    let (command, text) = match inner.split_once(' ') {
        Some((command, text)) => (command, text),
        None => (inner, ""),
    };

    if command.is_empty() {
        return Err(WireError::MalformedCtcp);
    }
    if command != "ACTION" {
        return Err(WireError::UnsupportedCtcp(command.to_string()));
    }
    Ok((text.to_string(), true))
}
