//! Rejects request paths whose classification could differ from routing.
//!
//! Percent-escapes of unreserved characters are decoded before the checks,
//! so `/%72oles/5` classifies as `/roles/5` whether or not the downstream
//! router decodes paths. Other escapes stay encoded, except separators and
//! NUL, which are refused.

use std::borrow::Cow;

use crate::error::GateError;

fn rejected(reason: &str) -> GateError {
    GateError::PathRejected {
        reason: reason.to_string(),
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn decode_unreserved(path: &str) -> Result<Cow<'_, str>, GateError> {
    if !path.contains('%') {
        return Ok(Cow::Borrowed(path));
    }

    let bytes = path.as_bytes();
    let mut out = String::with_capacity(path.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            let ch_len = path[i..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&path[i..i + ch_len]);
            i += ch_len;
            continue;
        }

        let decoded = bytes
            .get(i + 1)
            .copied()
            .and_then(hex_value)
            .zip(bytes.get(i + 2).copied().and_then(hex_value))
            .map(|(hi, lo)| hi << 4 | lo)
            .ok_or_else(|| rejected("malformed percent-encoding"))?;

        match decoded {
            b'/' | b'\\' | 0 => return Err(rejected("path contains a forbidden encoded character")),
            b if is_unreserved(b) => out.push(char::from(b)),
            _ => out.push_str(&path[i..i + 3]),
        }
        i += 3;
    }
    Ok(Cow::Owned(out))
}

/// Screen a raw request path and return the form to classify.
pub fn normalize_path(path: &str) -> Result<Cow<'_, str>, GateError> {
    if !path.starts_with('/') {
        return Err(rejected("path must be absolute"));
    }

    let path = decode_unreserved(path)?;

    if path.contains('\\') || path.contains('\0') {
        return Err(rejected("path contains a forbidden character"));
    }
    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(rejected("path is not normalized"));
    }

    Ok(path)
}
