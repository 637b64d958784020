//! Identifier validation for table and column names that are interpolated into SQL.
//!
//! Values are always bound parameters, but table and column names come from
//! configuration and have to be spliced into the statement text. They are
//! validated here and then double-quoted with [`quote_identifier`].

use ponto_core::{defaults, Error, Result};

/// Validate a table or column name.
///
/// A valid identifier:
/// - is not empty
/// - is at most 63 characters
/// - contains only ASCII letters, digits and underscores
/// - does not start with a digit
/// - does not name an SQLite internal object (`sqlite_` prefix)
///
/// SQL keywords are accepted since every identifier is quoted; `groups` is
/// a keyword in recent SQLite versions.
///
/// # Examples
///
/// ```
/// use ponto_db::validate_identifier;
///
/// assert!(validate_identifier("time_entries").is_ok());
/// assert!(validate_identifier("groups").is_ok());
/// assert!(validate_identifier("1users").is_err());
/// assert!(validate_identifier("users; DROP TABLE users").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.len() > defaults::MAX_IDENTIFIER_LEN {
        return Err(Error::InvalidInput(format!(
            "Identifier exceeds {} character limit: {} characters",
            defaults::MAX_IDENTIFIER_LEN,
            name.len()
        )));
    }

    if let Some(first) = name.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::InvalidInput(format!(
                "Identifier must start with a letter or underscore, found: '{}'",
                first
            )));
        }
    }

    if let Some(ch) = name
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_')
    {
        return Err(Error::InvalidInput(format!(
            "Identifier '{}' contains invalid character: '{}'",
            name, ch
        )));
    }

    if name.to_ascii_lowercase().starts_with("sqlite_") {
        return Err(Error::InvalidInput(format!(
            "Identifier '{}' refers to an SQLite internal object",
            name
        )));
    }

    Ok(())
}

/// Validate and double-quote an identifier for interpolation.
pub fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name))
}
