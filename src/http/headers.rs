//! Case-insensitive header table.
//!
//! Names are stored lower-cased. Values are kept as the raw bytes received,
//! so obs-text (e.g. Latin-1) survives parsing unchanged. Setting a name that
//! is already present appends the new value with `", "`;
//! [`Headers::replace`] overwrites.

use std::fmt;

const CRLF: &[u8] = b"\r\n";

/// Errors produced while parsing or setting a header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The line has no `:` separating name and value.
    MissingColon(String),
    /// Whitespace between the field name and the colon.
    WhitespaceBeforeColon(String),
    /// The name is empty or contains a byte outside the token set.
    InvalidName(String),
    /// The value contains CR or LF.
    InvalidValue(String),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::MissingColon(line) => {
                write!(f, "malformed header line (missing ':'): {}", line)
            }
            HeaderError::WhitespaceBeforeColon(name) => {
                write!(f, "invalid header name (whitespace before ':'): {:?}", name)
            }
            HeaderError::InvalidName(name) => write!(f, "invalid character in header name: {:?}", name),
            HeaderError::InvalidValue(value) => write!(f, "invalid header value: {:?}", value),
        }
    }
}

impl std::error::Error for HeaderError {}

/// Outcome of a single [`Headers::parse_line`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedLine {
    /// No CRLF yet; call again once more bytes have arrived.
    Incomplete,
    /// A header field was merged into the table.
    Field { consumed: usize },
    /// The blank line ending the header section.
    End { consumed: usize },
}

/// Returns true for RFC 9110 `tchar` bytes.
pub fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}

/// Returns true when `s` is a non-empty token.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_byte)
}

pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|w| w == CRLF)
}

/// Header fields of a request, response, or trailer section.
///
/// Iteration yields fields in the order their names were first inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, Vec<u8>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Parses one header line from the front of `data`.
    ///
    /// `data` must start at a line boundary inside the header section.
    pub fn parse_line(&mut self, data: &[u8]) -> Result<ParsedLine, HeaderError> {
        let idx = match find_crlf(data) {
            Some(idx) => idx,
            None => return Ok(ParsedLine::Incomplete),
        };

        if idx == 0 {
            return Ok(ParsedLine::End { consumed: CRLF.len() });
        }

        let line = &data[..idx];
        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| HeaderError::MissingColon(String::from_utf8_lossy(line).into_owned()))?;

        let raw_name = &line[..colon];
        if raw_name.last().is_some_and(|b| *b == b' ' || *b == b'\t') {
            return Err(HeaderError::WhitespaceBeforeColon(
                String::from_utf8_lossy(raw_name).into_owned(),
            ));
        }

        let name = String::from_utf8_lossy(raw_name).trim().to_ascii_lowercase();
        if !is_token(&name) {
            return Err(HeaderError::InvalidName(name));
        }

        let value = line[colon + 1..].trim_ascii();

        self.merge(name, value);
        Ok(ParsedLine::Field { consumed: idx + CRLF.len() })
    }

    /// Adds a value, joining it onto any existing value with `", "`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let name = validate(name, value)?;
        self.merge(name, value.trim().as_bytes());
        Ok(())
    }

    /// Replaces any existing value outright.
    pub fn replace(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let name = validate(name, value)?;
        self.put(name, value.trim().as_bytes().to_vec());
        Ok(())
    }

    /// Returns the value as text.
    ///
    /// `None` when the field is absent or its value is not UTF-8; use
    /// [`Headers::get_bytes`] for the raw value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_bytes(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.position(name).map(|i| self.fields[i].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes a field, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.position(name).map(|i| self.fields.remove(i).1)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over names and raw values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Serializes every field as `name: value\r\n`, without the blank line.
    pub(crate) fn write_fields(&self, buf: &mut Vec<u8>) {
        for (name, value) in self.iter() {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value);
            buf.extend_from_slice(CRLF);
        }
    }

    /// Inserts a known-good lower-case name without validation.
    pub(crate) fn put(&mut self, name: String, value: Vec<u8>) {
        match self.position(&name) {
            Some(i) => self.fields[i].1 = value,
            None => self.fields.push((name, value)),
        }
    }

    fn merge(&mut self, name: String, value: &[u8]) {
        match self.position(&name) {
            Some(i) => {
                let existing = &mut self.fields[i].1;
                existing.extend_from_slice(b", ");
                existing.extend_from_slice(value);
            }
            None => self.fields.push((name, value.to_vec())),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

fn validate(name: &str, value: &str) -> Result<String, HeaderError> {
    if !is_token(name) {
        return Err(HeaderError::InvalidName(name.to_string()));
    }
    if value.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(HeaderError::InvalidValue(value.to_string()));
    }
    Ok(name.to_ascii_lowercase())
}
