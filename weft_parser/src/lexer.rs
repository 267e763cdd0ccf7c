//! Two-mode template lexer.
//!
//! Template source alternates between raw text and code blocks, so the lexer
//! exposes two entry points: [`Lexer::scan_text`] consumes raw text up to the
//! next delimiter, and [`Lexer::next_token`] tokenizes block contents. The
//! parser drives the mode switches; the lexer only tracks position.
//!
//! Delimiters are configurable strings matched by lookahead; a backslash
//! escapes any delimiter (or another backslash) inside raw text.

use crate::settings::Settings;
use crate::token::{Token, TokenKind};
use weft_core::{ParseError, Span};

/// Delimiter that ended a raw text scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStop {
    /// Block-begin sequence reached (and consumed).
    BlockBegin,
    /// Block-continue sequence reached (and consumed).
    BlockContinue,
    /// Block-end sequence reached (and consumed).
    BlockEnd,
    /// End of source.
    Eof,
}

/// Template lexer.
pub struct Lexer<'a> {
    source: &'a str,
    settings: &'a Settings,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over template source.
    pub fn new(source: &'a str, settings: &'a Settings) -> Self {
        Self {
            source,
            settings,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    // =========================================================================
    // Raw Text Mode
    // =========================================================================

    /// Consume raw text up to the next delimiter.
    ///
    /// Inside a block body (`in_body`) the continue and end sequences also
    /// terminate text; at the top level they are plain characters.
    pub fn scan_text(&mut self, in_body: bool) -> (String, TextStop) {
        let mut text = String::new();

        loop {
            if self.at_end() {
                return (text, TextStop::Eof);
            }
            if self.at_sequence(&self.settings.block_begin) {
                self.advance_bytes(self.settings.block_begin.len());
                return (text, TextStop::BlockBegin);
            }
            if in_body {
                if self.at_sequence(&self.settings.block_continue) {
                    self.advance_bytes(self.settings.block_continue.len());
                    return (text, TextStop::BlockContinue);
                }
                if self.at_sequence(&self.settings.block_end) {
                    self.advance_bytes(self.settings.block_end.len());
                    return (text, TextStop::BlockEnd);
                }
            }

            let c = self.current_char();
            if c == '\\' {
                self.advance_char();
                if self.at_end() {
                    text.push('\\');
                    return (text, TextStop::Eof);
                }
                if let Some(delimiter) = self.delimiter_at_cursor() {
                    self.advance_bytes(delimiter.len());
                    text.push_str(&delimiter);
                } else if self.current_char() == '\\' {
                    self.advance_char();
                    text.push('\\');
                } else {
                    // Not an escape; the backslash stands for itself.
                    text.push('\\');
                }
            } else {
                text.push(c);
                self.advance_char();
            }
        }
    }

    fn delimiter_at_cursor(&self) -> Option<String> {
        [
            &self.settings.block_begin,
            &self.settings.block_continue,
            &self.settings.block_end,
        ]
        .into_iter()
        .find(|delimiter| self.at_sequence(delimiter))
        .cloned()
    }

    // =========================================================================
    // Block Token Mode
    // =========================================================================

    /// Lex the next token inside a code block.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        while !self.at_end() && self.current_char().is_whitespace() {
            self.advance_char();
        }

        let start = self.pos;
        let line = self.line;
        let column = self.column;
        let token = |kind, lexer: &Self| Token {
            kind,
            span: Span::new(start as u32, lexer.pos as u32),
            line,
            column,
        };

        if self.at_end() {
            return Ok(token(TokenKind::Eof, self));
        }

        if self.at_sequence(&self.settings.block_begin) {
            self.advance_bytes(self.settings.block_begin.len());
            return Ok(token(TokenKind::BlockBegin, self));
        }
        if self.at_sequence(&self.settings.block_continue) {
            self.advance_bytes(self.settings.block_continue.len());
            return Ok(token(TokenKind::BlockContinue, self));
        }
        if self.at_sequence(&self.settings.block_end) {
            self.advance_bytes(self.settings.block_end.len());
            return Ok(token(TokenKind::BlockEnd, self));
        }

        let c = self.current_char();
        let kind = match c {
            ',' => {
                self.advance_char();
                TokenKind::Comma
            }
            ':' => {
                self.advance_char();
                TokenKind::Colon
            }
            '.' => {
                self.advance_char();
                TokenKind::Dot
            }
            '(' => {
                self.advance_char();
                TokenKind::LeftParen
            }
            ')' => {
                self.advance_char();
                TokenKind::RightParen
            }
            '[' => {
                self.advance_char();
                TokenKind::LeftBracket
            }
            ']' => {
                self.advance_char();
                TokenKind::RightBracket
            }
            '"' | '\'' => self.lex_string(c)?,
            c if c.is_ascii_digit() => self.lex_number()?,
            c if c.is_alphabetic() || c == '_' => self.lex_symbol(),
            c => {
                return Err(self.error(format!("unexpected character '{}'", c)));
            }
        };

        Ok(token(kind, self))
    }

    fn lex_string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        self.advance_char();
        let mut text = String::new();
        loop {
            if self.at_end() {
                return Err(self.error("unterminated string literal"));
            }
            let c = self.current_char();
            self.advance_char();
            if c == quote {
                return Ok(TokenKind::String(text));
            }
            if c == '\\' {
                if self.at_end() {
                    return Err(self.error("unterminated string literal"));
                }
                let escaped = self.current_char();
                self.advance_char();
                match escaped {
                    'n' => text.push('\n'),
                    'r' => text.push('\r'),
                    't' => text.push('\t'),
                    c => text.push(c),
                }
            } else {
                text.push(c);
            }
        }
    }

    fn lex_number(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        while !self.at_end() && self.current_char().is_ascii_digit() {
            self.advance_char();
        }
        if !self.at_end() && self.current_char() == '.' {
            let mut fraction = self.rest().chars();
            fraction.next();
            if fraction.next().is_some_and(|c| c.is_ascii_digit()) {
                self.advance_char();
                while !self.at_end() && self.current_char().is_ascii_digit() {
                    self.advance_char();
                }
            }
        }
        let text = &self.source[start..self.pos];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(format!("invalid number literal '{}'", text)))
    }

    fn lex_symbol(&mut self) -> TokenKind {
        let start = self.pos;
        while !self.at_end() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }
        TokenKind::Symbol(self.source[start..self.pos].to_string())
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    /// Current line (1-indexed).
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current column (1-indexed).
    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line, self.column)
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    #[inline]
    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn current_char(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.rest().chars().next() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn at_sequence(&self, sequence: &str) -> bool {
        !sequence.is_empty() && self.rest().starts_with(sequence)
    }

    fn advance_bytes(&mut self, count: usize) {
        let end = self.pos + count;
        while self.pos < end {
            self.advance_char();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer_with<'a>(source: &'a str, settings: &'a Settings) -> Lexer<'a> {
        Lexer::new(source, settings)
    }

    #[test]
    fn test_scan_text_top_level() {
        let settings = Settings::default();
        let mut lexer = lexer_with("plain | text }", &settings);
        let (text, stop) = lexer.scan_text(false);
        assert_eq!(text, "plain | text }");
        assert_eq!(stop, TextStop::Eof);
    }

    #[test]
    fn test_scan_text_finds_block() {
        let settings = Settings::default();
        let mut lexer = lexer_with("before{after", &settings);
        let (text, stop) = lexer.scan_text(false);
        assert_eq!(text, "before");
        assert_eq!(stop, TextStop::BlockBegin);
    }

    #[test]
    fn test_scan_text_escapes() {
        let settings = Settings::default();
        let mut lexer = lexer_with(r"a \{ b \\ c", &settings);
        let (text, stop) = lexer.scan_text(false);
        assert_eq!(text, r"a { b \ c");
        assert_eq!(stop, TextStop::Eof);
    }

    #[test]
    fn test_scan_text_in_body() {
        let settings = Settings::default();
        let mut lexer = lexer_with("x|y", &settings);
        let (text, stop) = lexer.scan_text(true);
        assert_eq!(text, "x");
        assert_eq!(stop, TextStop::BlockContinue);
    }

    #[test]
    fn test_block_tokens() {
        let settings = Settings::default();
        let mut lexer = lexer_with("for key, value in data.items:", &settings);
        let kinds: Vec<TokenKind> = std::iter::from_fn(|| {
            let token = lexer.next_token().unwrap();
            (token.kind != TokenKind::Eof).then_some(token.kind)
        })
        .collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Symbol("for".to_string()),
                TokenKind::Symbol("key".to_string()),
                TokenKind::Comma,
                TokenKind::Symbol("value".to_string()),
                TokenKind::Symbol("in".to_string()),
                TokenKind::Symbol("data".to_string()),
                TokenKind::Dot,
                TokenKind::Symbol("items".to_string()),
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn test_number_and_string_literals() {
        let settings = Settings::default();
        let mut lexer = lexer_with("42 1.5 \"a\\\"b\"", &settings);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number(42.0));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number(1.5));
        assert_eq!(
            lexer.next_token().unwrap().kind,
            TokenKind::String("a\"b".to_string())
        );
    }

    #[test]
    fn test_custom_delimiters() {
        let settings = Settings {
            block_begin: "{{".to_string(),
            block_continue: "||".to_string(),
            block_end: "}}".to_string(),
            ..Settings::default()
        };
        let mut lexer = lexer_with("a{b{{c", &settings);
        let (text, stop) = lexer.scan_text(false);
        assert_eq!(text, "a{b");
        assert_eq!(stop, TextStop::BlockBegin);
    }

    #[test]
    fn test_line_tracking() {
        let settings = Settings::default();
        let mut lexer = lexer_with("a\nb{", &settings);
        let (_, stop) = lexer.scan_text(false);
        assert_eq!(stop, TextStop::BlockBegin);
        assert_eq!(lexer.line(), 2);
    }
}
