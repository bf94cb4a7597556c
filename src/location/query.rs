//! Query-string encoding.
//!
//! # Responsibilities
//! - Parse `a=1&b=2` into a flat key → value mapping
//! - Serialise a mapping back into `?a=1&b=2`
//!
//! # Design Decisions
//! - Escaping matches `encodeURIComponent`, so hosts that decode with the
//!   browser rules see the same values
//! - Decoding is as strict as `decodeURIComponent`: a `%` not followed by
//!   two hex digits, or bytes that are not UTF-8, are errors
//! - Later duplicate keys overwrite earlier ones

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::location::LocationError;

/// Query parameters of a location.
pub type Query = BTreeMap<String, String>;

/// Everything `encodeURIComponent` escapes: all but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single key or value.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Percent-decode a single key or value.
pub fn decode_component(raw: &str) -> Result<String, LocationError> {
    if has_malformed_escape(raw) {
        return Err(LocationError::MalformedEscape {
            component: raw.to_string(),
        });
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|source| LocationError::Decode {
            component: raw.to_string(),
            source,
        })
}

fn has_malformed_escape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().any(|(i, &byte)| {
        byte == b'%'
            && !matches!(
                (bytes.get(i + 1), bytes.get(i + 2)),
                (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
    })
}

/// Parse a query substring (without the leading `?`).
pub fn parse_query(raw: &str) -> Result<Query, LocationError> {
    let mut query = Query::new();
    for pair in raw.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, value),
            None => (pair, ""),
        };
        if key.is_empty() {
            continue;
        }
        query.insert(decode_component(key)?, decode_component(value)?);
    }
    Ok(query)
}

/// Serialise a mapping into `?k=v&…`, or an empty string for an empty mapping.
pub fn serialize_query(query: &Query) -> String {
    if query.is_empty() {
        return String::new();
    }
    let joined = query
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{joined}")
}

/// The query substring of a URL, if any.
pub fn extract_query(url: &str) -> Result<Query, LocationError> {
    match url.split_once('?') {
        Some((_, raw)) if !raw.is_empty() => parse_query(raw),
        _ => Ok(Query::new()),
    }
}
