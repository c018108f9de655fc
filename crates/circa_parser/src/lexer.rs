//! Lexical analyzer for circuit source text.
//!
//! Produces just enough structure for declaration scanning: identifiers,
//! integer literals, string literals and single-character punctuation.
//! Whitespace and comments are skipped. Errors are reported to the
//! [`DiagnosticSink`] and lexing continues.

use circa_diagnostics::{Diagnostic, DiagnosticSink, Location};

/// The kind of a lexed token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(i64),
    Str(String),
    Punct(char),
    Eof,
}

/// A token with the byte range it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s == name)
    }
}

/// Lexes `source` into tokens. The result always ends with an `Eof` token.
pub(crate) fn lex(source: &str, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        sink,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    sink: &'a DiagnosticSink,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.bytes.len() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    start: self.pos,
                    end: self.pos,
                });
                break;
            }
            tokens.push(self.next_token());
        }
        tokens
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn error(&self, msg: &str, offset: usize) {
        self.sink.emit(Diagnostic::error(
            msg,
            Location::of_offset(self.source, offset),
        ));
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'/' {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos >= self.bytes.len() {
                        self.error("unterminated block comment", start);
                        break;
                    }
                    if self.bytes[self.pos] == b'*' && self.peek_at(1) == b'/' {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();
        let kind = if b.is_ascii_alphabetic() || b == b'_' || b == b'$' {
            self.lex_ident()
        } else if b.is_ascii_digit() {
            self.lex_number(start)
        } else if b == b'"' {
            self.lex_string(start)
        } else {
            // Multi-byte characters become a single punctuation token.
            let c = self.source[start..].chars().next().unwrap_or('\0');
            self.pos += c.len_utf8().max(1);
            TokenKind::Punct(c)
        };
        Token {
            kind,
            start,
            end: self.pos,
        }
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.pos += 1;
            } else {
                break;
            }
        }
        TokenKind::Ident(self.source[start..self.pos].to_string())
    }

    fn lex_number(&mut self, start: usize) -> TokenKind {
        let (radix, digits_start) =
            if self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X') {
                self.pos += 2;
                (16, self.pos)
            } else {
                (10, self.pos)
            };
        while self.pos < self.bytes.len() && (self.bytes[self.pos] as char).is_digit(radix) {
            self.pos += 1;
        }
        match i64::from_str_radix(&self.source[digits_start..self.pos], radix) {
            Ok(value) => TokenKind::Number(value),
            Err(_) => {
                self.error("integer literal is too large", start);
                TokenKind::Number(0)
            }
        }
    }

    fn lex_string(&mut self, start: usize) -> TokenKind {
        self.pos += 1;
        let mut value = String::new();
        loop {
            if self.pos >= self.bytes.len() || self.bytes[self.pos] == b'\n' {
                self.error("unterminated string literal", start);
                break;
            }
            match self.bytes[self.pos] {
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\\' if self.pos + 1 < self.bytes.len() => {
                    let escaped = self.bytes[self.pos + 1];
                    value.push(match escaped {
                        b'n' => '\n',
                        b't' => '\t',
                        other => other as char,
                    });
                    self.pos += 2;
                }
                _ => {
                    let c = self.source[self.pos..].chars().next().unwrap_or('\0');
                    value.push(c);
                    self.pos += c.len_utf8().max(1);
                }
            }
        }
        TokenKind::Str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let sink = DiagnosticSink::new();
        lex(src, &sink).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn include_statement() {
        assert_eq!(
            kinds("include \"lib/a.circom\";"),
            vec![
                TokenKind::Ident("include".into()),
                TokenKind::Str("lib/a.circom".into()),
                TokenKind::Punct(';'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_skipped() {
        let src = "// line\n/* block\n include \"x\"; */ template";
        assert_eq!(
            kinds(src),
            vec![TokenKind::Ident("template".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn numbers_decimal_and_hex() {
        assert_eq!(
            kinds("42 0x1F"),
            vec![TokenKind::Number(42), TokenKind::Number(31), TokenKind::Eof]
        );
    }

    #[test]
    fn token_ranges() {
        let sink = DiagnosticSink::new();
        let tokens = lex("a  bc", &sink);
        assert_eq!((tokens[1].start, tokens[1].end), (3, 5));
    }

    #[test]
    fn unterminated_string_reported() {
        let sink = DiagnosticSink::new();
        lex("include \"oops;\ntemplate", &sink);
        let diags = sink.into_diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unterminated string"));
        assert_eq!(diags[0].location, Some(Location::new(1, 9)));
    }

    #[test]
    fn unterminated_block_comment_reported() {
        let sink = DiagnosticSink::new();
        let tokens = lex("a /* never closed", &sink);
        assert_eq!(tokens.len(), 2);
        assert!(sink.has_errors());
    }

    #[test]
    fn oversized_literal_reported() {
        let sink = DiagnosticSink::new();
        lex("99999999999999999999999", &sink);
        assert_eq!(sink.into_diagnostics().len(), 1);
    }
}
