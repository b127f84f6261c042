//! A small Postgres-flavoured lexer producing byte-spanned tokens.
//!
//! Only as much of the grammar as the validation stages need: it must agree
//! with the server on where literals, quoted identifiers and comments begin
//! and end, so that statement separators and keywords are only ever seen
//! outside of them. Comments are separators, so `DR/**/OP` lexes as the two
//! words `DR` and `OP`, exactly as the server reads it.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Unquoted identifier or keyword.
    Word,
    /// `"..."` identifier.
    QuotedIdent,
    /// `'...'`, `E'...'`, `B'...'`, `X'...'`, `N'...'`, `$tag$...$tag$`.
    String,
    Number,
    /// Positional parameter (`$1`).
    Param,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Period,
    /// Any other operator character.
    Punct,
    Comment,
    Whitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Token<'_> {
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Case-insensitive keyword match; quoted identifiers never match.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Identifier value as the server resolves it: unquoted words fold to
    /// lower case, quoted identifiers keep their exact spelling.
    pub fn identifier(&self) -> Option<String> {
        match self.kind {
            TokenKind::Word => Some(self.text.to_lowercase()),
            TokenKind::QuotedIdent => {
                let inner = &self.text[1..self.text.len() - 1];
                Some(inner.replace("\"\"", "\""))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated {what} starting at offset {offset}")]
    Unterminated { what: &'static str, offset: usize },
}

/// Split `src` into tokens, trivia included.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut lexer = Lexer { src, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, LexError> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            c if c.is_whitespace() => {
                while self.peek().is_some_and(char::is_whitespace) {
                    self.bump();
                }
                TokenKind::Whitespace
            }
            '-' if self.peek_at(1) == Some('-') => {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
                TokenKind::Comment
            }
            '/' if self.peek_at(1) == Some('*') => {
                self.block_comment(start)?;
                TokenKind::Comment
            }
            '\'' => {
                self.bump();
                self.quoted('\'', false, "string literal", start)?;
                TokenKind::String
            }
            'e' | 'E' if self.peek_at(1) == Some('\'') => {
                self.bump();
                self.bump();
                self.quoted('\'', true, "string literal", start)?;
                TokenKind::String
            }
            'b' | 'B' | 'x' | 'X' | 'n' | 'N' if self.peek_at(1) == Some('\'') => {
                self.bump();
                self.bump();
                self.quoted('\'', false, "string literal", start)?;
                TokenKind::String
            }
            '"' => {
                self.bump();
                self.quoted('"', false, "quoted identifier", start)?;
                TokenKind::QuotedIdent
            }
            '$' => self.dollar(start)?,
            c if c.is_ascii_digit() => {
                self.number();
                TokenKind::Number
            }
            '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.number();
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' => {
                self.bump();
                while self
                    .peek()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
                {
                    self.bump();
                }
                TokenKind::Word
            }
            _ => {
                self.bump();
                match c {
                    ';' => TokenKind::Semicolon,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Period,
                    _ => TokenKind::Punct,
                }
            }
        };

        Ok(Some(Token {
            kind,
            text: &self.src[start..self.pos],
            start,
            end: self.pos,
        }))
    }

    /// Consume up to the closing quote. The opening quote is already consumed.
    /// A doubled quote is an escaped quote.
    fn quoted(
        &mut self,
        quote: char,
        backslash_escapes: bool,
        what: &'static str,
        start: usize,
    ) -> Result<(), LexError> {
        loop {
            match self.bump() {
                None => return Err(LexError::Unterminated { what, offset: start }),
                Some('\\') if backslash_escapes => {
                    self.bump();
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.bump();
                    } else {
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Block comments nest in Postgres.
    fn block_comment(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 2;
        let mut depth = 1usize;
        while depth > 0 {
            let rest = &self.src[self.pos..];
            if rest.starts_with("/*") {
                depth += 1;
                self.pos += 2;
            } else if rest.starts_with("*/") {
                depth -= 1;
                self.pos += 2;
            } else if self.bump().is_none() {
                return Err(LexError::Unterminated {
                    what: "block comment",
                    offset: start,
                });
            }
        }
        Ok(())
    }

    /// `$1` parameter, `$tag$ ... $tag$` / `$$ ... $$` string, or a lone `$`.
    fn dollar(&mut self, start: usize) -> Result<TokenKind, LexError> {
        if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            return Ok(TokenKind::Param);
        }

        let after = &self.src[self.pos + 1..];
        let tag_len: usize = after
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .map(char::len_utf8)
            .sum();
        let first_is_digit = after.chars().next().is_some_and(|c| c.is_ascii_digit());

        if !first_is_digit && after[tag_len..].starts_with('$') {
            let delimiter = &self.src[self.pos..self.pos + tag_len + 2];
            self.pos += delimiter.len();
            return match self.src[self.pos..].find(delimiter) {
                Some(idx) => {
                    self.pos += idx + delimiter.len();
                    Ok(TokenKind::String)
                }
                None => Err(LexError::Unterminated {
                    what: "dollar-quoted string",
                    offset: start,
                }),
            };
        }

        self.bump();
        Ok(TokenKind::Punct)
    }

    fn number(&mut self) {
        let digits = |lexer: &mut Self| {
            while lexer
                .peek()
                .is_some_and(|c| c.is_ascii_digit() || c == '_')
            {
                lexer.bump();
            }
        };

        if self.peek() == Some('0')
            && self
                .peek_at(1)
                .is_some_and(|c| matches!(c, 'x' | 'X' | 'o' | 'O' | 'b' | 'B'))
        {
            self.bump();
            self.bump();
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_hexdigit() || c == '_')
            {
                self.bump();
            }
            return;
        }

        digits(self);
        if self.peek() == Some('.') && self.peek_at(1) != Some('.') {
            self.bump();
            digits(self);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let next = self.peek_at(1);
            let signed_digit = matches!(next, Some('+' | '-'))
                && self.peek_at(2).is_some_and(|c| c.is_ascii_digit());
            if next.is_some_and(|c| c.is_ascii_digit()) || signed_digit {
                self.bump();
                if signed_digit {
                    self.bump();
                }
                digits(self);
            }
        }
    }
}

/// Tokens that are not whitespace or comments.
pub fn significant<'a>(tokens: &[Token<'a>]) -> Vec<Token<'a>> {
    tokens.iter().filter(|t| !t.is_trivia()).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(sql: &str) -> Vec<(TokenKind, &str)> {
        tokenize(sql)
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            kinds("SELECT name FROM candidates;"),
            vec![
                (TokenKind::Word, "SELECT"),
                (TokenKind::Word, "name"),
                (TokenKind::Word, "FROM"),
                (TokenKind::Word, "candidates"),
                (TokenKind::Semicolon, ";"),
            ]
        );
    }

    #[test]
    fn test_semicolon_inside_literals_is_not_a_separator() {
        let toks = kinds("SELECT 'a;b', \"c;d\", $$e;f$$, $x$g;h$x$, E'i\\';j'");
        assert!(toks.iter().all(|(k, _)| *k != TokenKind::Semicolon));
        assert_eq!(toks[1], (TokenKind::String, "'a;b'"));
        assert_eq!(toks[3], (TokenKind::QuotedIdent, "\"c;d\""));
        assert_eq!(toks[5], (TokenKind::String, "$$e;f$$"));
        assert_eq!(toks[7], (TokenKind::String, "$x$g;h$x$"));
        assert_eq!(toks[9], (TokenKind::String, "E'i\\';j'"));
    }

    #[test]
    fn test_doubled_quote_escape() {
        assert_eq!(
            kinds("SELECT 'O''Brien'"),
            vec![(TokenKind::Word, "SELECT"), (TokenKind::String, "'O''Brien'")]
        );
    }

    #[test]
    fn test_comments_split_words() {
        let toks = kinds("SELECT 1 /* x */ -- DROP\n; DR/**/OP");
        assert_eq!(
            toks,
            vec![
                (TokenKind::Word, "SELECT"),
                (TokenKind::Number, "1"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::Word, "DR"),
                (TokenKind::Word, "OP"),
            ]
        );
    }

    #[test]
    fn test_nested_block_comment() {
        let toks = kinds("SELECT /* a /* b */ ; */ 1");
        assert_eq!(toks, vec![(TokenKind::Word, "SELECT"), (TokenKind::Number, "1")]);
    }

    #[test]
    fn test_unterminated_literals() {
        assert!(matches!(
            tokenize("SELECT 'abc"),
            Err(LexError::Unterminated { what: "string literal", .. })
        ));
        assert!(tokenize("SELECT \"abc").is_err());
        assert!(tokenize("SELECT /* abc").is_err());
        assert!(tokenize("SELECT $$abc").is_err());
    }

    #[test]
    fn test_params_numbers_and_qualified_names() {
        assert_eq!(
            kinds("SELECT s.t, 1.5e3, .5, $1 FROM s.t"),
            vec![
                (TokenKind::Word, "SELECT"),
                (TokenKind::Word, "s"),
                (TokenKind::Period, "."),
                (TokenKind::Word, "t"),
                (TokenKind::Comma, ","),
                (TokenKind::Number, "1.5e3"),
                (TokenKind::Comma, ","),
                (TokenKind::Number, ".5"),
                (TokenKind::Comma, ","),
                (TokenKind::Param, "$1"),
                (TokenKind::Word, "FROM"),
                (TokenKind::Word, "s"),
                (TokenKind::Period, "."),
                (TokenKind::Word, "t"),
            ]
        );
    }

    #[test]
    fn test_identifier_folding() {
        let toks = tokenize("Candidates \"MixedCase\" \"a\"\"b\"").unwrap();
        let idents: Vec<_> = toks.iter().filter_map(|t| t.identifier()).collect();
        assert_eq!(idents, vec!["candidates", "MixedCase", "a\"b"]);
    }

    #[test]
    fn test_spans_cover_source() {
        let sql = "SELECT  'x' -- c\n FROM t";
        let toks = tokenize(sql).unwrap();
        let rebuilt: String = toks.iter().map(|t| &sql[t.start..t.end]).collect();
        assert_eq!(rebuilt, sql);
    }
}
