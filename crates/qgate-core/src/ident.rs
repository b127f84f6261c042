//! SQL identifier and literal helpers shared by every crate that renders SQL.

use thiserror::Error;

/// Rejected identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentError {
    #[error("empty identifier")]
    Empty,

    #[error("invalid identifier '{0}'")]
    Invalid(String),
}

/// Returns true for plain identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_plain_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Double-quote an identifier for use in generated DDL.
///
/// Strict: only plain identifiers are accepted, everything the gateway renders
/// comes from introspection or operator config.
pub fn quote_ident(ident: &str) -> Result<String, IdentError> {
    if ident.is_empty() {
        return Err(IdentError::Empty);
    }
    if !is_plain_identifier(ident) {
        return Err(IdentError::Invalid(ident.to_string()));
    }
    Ok(format!("\"{}\"", ident))
}

/// `schema.name`, both parts quoted.
pub fn quote_qualified(schema: &str, name: &str) -> Result<String, IdentError> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(name)?))
}

/// Render a string as a single-quoted SQL literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Postgres folds unquoted identifiers to lower case.
pub fn fold_identifier(ident: &str) -> String {
    ident.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("candidates").unwrap(), "\"candidates\"");
        assert_eq!(quote_ident("_x1").unwrap(), "\"_x1\"");
        assert_eq!(quote_ident(""), Err(IdentError::Empty));
        assert!(quote_ident("1abc").is_err());
        assert!(quote_ident("users; drop").is_err());
        assert!(quote_ident("a\"b").is_err());
    }

    #[test]
    fn test_quote_literal_escapes_quotes() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn test_quote_qualified() {
        assert_eq!(
            quote_qualified("gateway_safe", "candidates_safe").unwrap(),
            "\"gateway_safe\".\"candidates_safe\""
        );
    }
}
