//! Callback token wire format
//!
//! Inline category buttons carry `"<operation>_<label>"`, e.g.
//! `income_Salary`. The operation names contain no underscore, so the token
//! is split at the first one and the label may contain underscores itself.
//! Tokens come back from the client and are treated as untrusted.

use crate::state_machine::OperationType;
use thiserror::Error;

/// Chat platforms cap callback data at 64 bytes
pub const MAX_TOKEN_LEN: usize = 64;

const SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Callback token exceeds {MAX_TOKEN_LEN} bytes")]
    TooLong,
    #[error("Callback token has no separator")]
    MissingSeparator,
    #[error("Callback token names unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Callback token has an empty label")]
    EmptyLabel,
}

/// Build the token for a category button
pub fn encode(operation_type: OperationType, label: &str) -> String {
    format!("{}{SEPARATOR}{label}", operation_type.as_str())
}

/// Decode a token into the operation the button list was built for and the label
pub fn decode(token: &str) -> Result<(OperationType, String), TokenError> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(TokenError::TooLong);
    }
    let (operation, label) = token
        .split_once(SEPARATOR)
        .ok_or(TokenError::MissingSeparator)?;
    let operation_type = operation
        .parse::<OperationType>()
        .map_err(|e| TokenError::UnknownOperation(e.0))?;
    if label.is_empty() {
        return Err(TokenError::EmptyLabel);
    }
    Ok((operation_type, label.to_string()))
}
