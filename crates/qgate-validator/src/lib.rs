//! # qgate-validator
//!
//! Validates and rewrites candidate SQL before it reaches the database.
//!
//! A candidate passes through an ordered pipeline of checks:
//!
//! 1. **Statement shape**: exactly one statement, leading keyword `SELECT`.
//! 2. **Object scope**: every referenced relation is a view in the safe
//!    schema catalog.
//! 3. **Keyword denylist**: no write, DDL, privilege or session keywords and
//!    no side-effecting functions anywhere in the text.
//! 4. **Limit enforcement**: a row ceiling is appended or clamped.
//!
//! Rejections are returned as verdicts, never as errors.
//!
//! ```ignore
//! let validator = QueryValidator::new(config.limits);
//! let verdict = validator.validate(&CandidateQuery::new("SELECT name FROM candidates"), &catalog);
//! assert_eq!(verdict.normalized_sql(), Some("SELECT name FROM candidates LIMIT 100"));
//! ```

pub mod lexer;
pub mod stages;
pub mod validator;

pub use lexer::{LexError, Token, TokenKind, tokenize};
pub use stages::{
    FORBIDDEN_FUNCTIONS, FORBIDDEN_KEYWORDS, KeywordDenylist, LimitEnforcement, ObjectScope,
    QueryCheck, RelationRef, RowLimits, StatementShape,
};
pub use validator::{QueryValidator, strip_code_fence};
