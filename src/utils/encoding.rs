//! Character set decoding for statement sources

use encoding_rs::WINDOWS_1251;

use crate::types::{StatementError, StatementResult};

/// Decode bytes as strict UTF-8
///
/// A leading BOM is left in place; callers that compare header cells strip it
/// themselves.
pub fn decode_utf8(bytes: &[u8]) -> StatementResult<&str> {
    std::str::from_utf8(bytes).map_err(|err| {
        StatementError::Encoding(format!(
            "content is not valid UTF-8 (failed at byte {})",
            err.valid_up_to()
        ))
    })
}

/// Decode bytes as windows-1251, the charset of the legacy CSV exports
pub fn decode_windows_1251(bytes: &[u8]) -> StatementResult<String> {
    let (text, _, had_errors) = WINDOWS_1251.decode(bytes);
    if had_errors {
        return Err(StatementError::Encoding(
            "content cannot be decoded as windows-1251".to_string(),
        ));
    }
    Ok(text.into_owned())
}
