//! Keyset pagination cursor utilities.

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine,
};
use thiserror::Error;

/// URL-safe engine that writes no padding but accepts cursors with or without it.
const CURSOR_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Error type for cursor operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("Invalid cursor format")]
    InvalidFormat,
    #[error("Invalid cursor encoding")]
    InvalidEncoding,
    #[error("Invalid number in cursor")]
    InvalidNumber,
}

/// Encodes a cursor from the last seen id and the page size.
///
/// The cursor format is: base64("<page_token> <page_size>")
pub fn encode_page_cursor(page_token: i64, page_size: i64) -> String {
    let raw = format!("{} {}", page_token, page_size);
    CURSOR_ENGINE.encode(raw.as_bytes())
}

/// Decodes a cursor into `(page_token, page_size)`.
///
/// Both parts must be non-negative decimal integers separated by exactly one space.
pub fn decode_page_cursor(cursor: &str) -> Result<(i64, i64), CursorError> {
    let decoded = CURSOR_ENGINE
        .decode(cursor)
        .map_err(|_| CursorError::InvalidEncoding)?;

    let s = String::from_utf8(decoded).map_err(|_| CursorError::InvalidFormat)?;

    let (token_str, size_str) = s.split_once(' ').ok_or(CursorError::InvalidFormat)?;

    Ok((parse_part(token_str)?, parse_part(size_str)?))
}

fn parse_part(part: &str) -> Result<i64, CursorError> {
    // Plain digits only, so signs and inner whitespace are rejected.
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CursorError::InvalidFormat);
    }
    part.parse().map_err(|_| CursorError::InvalidNumber)
}
