//! Recursive descent template parser.
//!
//! The parser alternates between the lexer's raw-text and block-token modes:
//! bodies are scanned as text (with nested blocks parsed recursively) and
//! block contents are tokenized. Inside a block the first symbol selects the
//! command; anything else parses as an expression and echoes its value.

use crate::ast::{Branch, Command, Expression};
use crate::lexer::{Lexer, TextStop};
use crate::settings::Settings;
use crate::token::{Token, TokenKind};
use std::sync::Arc;
use weft_core::{ParseError, Value};

/// Parse template source into its root command.
pub fn parse(source: &str, settings: &Settings) -> Result<Command, ParseError> {
    Parser::new(source, settings).parse()
}

/// Template parser.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a parser over template source.
    pub fn new(source: &'a str, settings: &'a Settings) -> Self {
        Self {
            lexer: Lexer::new(source, settings),
            // Placeholder until the first block switches to token mode.
            current: Token {
                kind: TokenKind::Eof,
                span: weft_core::Span::new(0, 0),
                line: 1,
                column: 1,
            },
        }
    }

    /// Parse the whole template.
    pub fn parse(mut self) -> Result<Command, ParseError> {
        let (command, stop) = self.parse_body(false)?;
        debug_assert_eq!(stop, TextStop::Eof);
        Ok(command)
    }

    // =========================================================================
    // Text Mode
    // =========================================================================

    /// Parse literals and blocks until a terminating delimiter.
    ///
    /// At the top level (`in_body == false`) only end-of-source terminates;
    /// inside a body the continue/end sequences do too.
    fn parse_body(&mut self, in_body: bool) -> Result<(Command, TextStop), ParseError> {
        let mut commands = Vec::new();

        loop {
            let (text, stop) = self.lexer.scan_text(in_body);
            if !text.is_empty() {
                commands.push(Command::Literal { text: text.into() });
            }
            match stop {
                TextStop::BlockBegin => {
                    self.advance()?;
                    commands.push(self.parse_block()?);
                }
                stop => return Ok((Command::sequence(commands), stop)),
            }
        }
    }

    /// Parse a body that must run to the block end (no continuations).
    fn parse_terminal_body(&mut self, construct: &str) -> Result<Command, ParseError> {
        let (body, stop) = self.parse_body(true)?;
        match stop {
            TextStop::BlockEnd => Ok(body),
            TextStop::BlockContinue => {
                Err(self.error(format!("unexpected section in '{}' block", construct)))
            }
            _ => Err(self.error(format!("unterminated '{}' block", construct))),
        }
    }

    // =========================================================================
    // Block Commands
    // =========================================================================

    /// Parse one block; the leading delimiter is consumed and `current` holds
    /// the block's first token. On return the block-end has been consumed.
    fn parse_block(&mut self) -> Result<Command, ParseError> {
        let keyword = match &self.current.kind {
            TokenKind::Symbol(name) => Some(name.clone()),
            _ => None,
        };
        if let Some(keyword) = keyword {
            match keyword.as_str() {
                "if" => return self.parse_if(),
                "for" => return self.parse_for(),
                "while" => return self.parse_while(),
                "set" => return self.parse_set(),
                "return" => {
                    self.advance()?;
                    let source = self.parse_expression()?;
                    self.finish_block()?;
                    return Ok(Command::Return { source });
                }
                "echo" => {
                    self.advance()?;
                    let source = self.parse_expression()?;
                    self.finish_block()?;
                    return Ok(Command::Echo { source });
                }
                "dump" => {
                    self.advance()?;
                    let source = self.parse_expression()?;
                    self.finish_block()?;
                    return Ok(Command::Dump { source });
                }
                _ => {}
            }
        }

        // Bare expression blocks echo their value.
        let source = self.parse_expression()?;
        self.finish_block()?;
        Ok(Command::Echo { source })
    }

    fn parse_if(&mut self) -> Result<Command, ParseError> {
        self.advance()?;
        let condition = self.parse_expression()?;
        self.expect_section_colon()?;
        let (body, mut stop) = self.parse_body(true)?;

        let mut branches = vec![Branch { condition, body }];
        let mut fallback = None;

        loop {
            match stop {
                TextStop::BlockEnd => break,
                TextStop::BlockContinue => {
                    self.advance()?;
                    match self.expect_symbol("'elif' or 'else'")?.as_str() {
                        "elif" => {
                            let condition = self.parse_expression()?;
                            self.expect_section_colon()?;
                            let (body, next) = self.parse_body(true)?;
                            branches.push(Branch { condition, body });
                            stop = next;
                        }
                        "else" => {
                            self.expect_section_colon()?;
                            let (body, next) = self.parse_body(true)?;
                            fallback = Some(Box::new(body));
                            match next {
                                TextStop::BlockEnd => break,
                                _ => {
                                    return Err(
                                        self.error("'else' must be the last section of 'if'")
                                    );
                                }
                            }
                        }
                        other => {
                            return Err(self.error(format!(
                                "expected 'elif' or 'else', found '{}'",
                                other
                            )));
                        }
                    }
                }
                _ => return Err(self.error("unterminated 'if' block")),
            }
        }

        Ok(Command::If {
            branches: branches.into_boxed_slice(),
            fallback,
        })
    }

    fn parse_for(&mut self) -> Result<Command, ParseError> {
        self.advance()?;
        let key: Arc<str> = self.expect_symbol("loop variable")?.into();
        let value: Option<Arc<str>> = if self.eat(&TokenKind::Comma)? {
            Some(self.expect_symbol("loop value variable")?.into())
        } else {
            None
        };
        self.expect_keyword("in")?;
        let source = self.parse_expression()?;
        self.expect_section_colon()?;
        let (body, stop) = self.parse_body(true)?;

        let empty = match stop {
            TextStop::BlockEnd => None,
            TextStop::BlockContinue => {
                self.advance()?;
                self.expect_keyword("empty")?;
                self.expect_section_colon()?;
                let (body, stop) = self.parse_body(true)?;
                if stop != TextStop::BlockEnd {
                    return Err(self.error("'empty' must be the last section of 'for'"));
                }
                Some(Box::new(body))
            }
            _ => return Err(self.error("unterminated 'for' block")),
        };

        Ok(Command::For {
            key,
            value,
            source,
            body: Box::new(body),
            empty,
        })
    }

    fn parse_while(&mut self) -> Result<Command, ParseError> {
        self.advance()?;
        let condition = self.parse_expression()?;
        self.expect_section_colon()?;
        let body = self.parse_terminal_body("while")?;
        Ok(Command::While {
            condition,
            body: Box::new(body),
        })
    }

    fn parse_set(&mut self) -> Result<Command, ParseError> {
        self.advance()?;
        let name: Arc<str> = self.expect_symbol("assignment target")?.into();

        if self.eat(&TokenKind::LeftParen)? {
            let mut parameters: Vec<Arc<str>> = Vec::new();
            if !self.check(&TokenKind::RightParen) {
                loop {
                    parameters.push(self.expect_symbol("parameter name")?.into());
                    if !self.eat(&TokenKind::Comma)? {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RightParen)?;
            self.expect_keyword("to")?;
            self.expect_section_colon()?;
            let body = self.parse_terminal_body("set")?;
            return Ok(Command::AssignFunction {
                name,
                parameters: parameters.into_boxed_slice(),
                body: Box::new(body),
            });
        }

        self.expect_keyword("to")?;
        let source = self.parse_expression()?;
        self.finish_block()?;
        Ok(Command::AssignValue { name, source })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_primary()?;

        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let name = self.expect_symbol("field name")?;
                    expression = Expression::Access {
                        source: Box::new(expression),
                        subscript: Box::new(Expression::Constant(Value::string(name))),
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let subscript = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expression = Expression::Access {
                        source: Box::new(expression),
                        subscript: Box::new(subscript),
                    };
                }
                TokenKind::LeftParen => {
                    self.advance()?;
                    let mut arguments = Vec::new();
                    if !self.check(&TokenKind::RightParen) {
                        loop {
                            arguments.push(self.parse_expression()?);
                            if !self.eat(&TokenKind::Comma)? {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RightParen)?;
                    expression = Expression::Invoke {
                        source: Box::new(expression),
                        arguments: arguments.into_boxed_slice(),
                    };
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Number(value) => {
                self.advance()?;
                Ok(Expression::Constant(Value::number(value)))
            }
            TokenKind::String(text) => {
                self.advance()?;
                Ok(Expression::Constant(Value::string(text)))
            }
            TokenKind::Symbol(name) => {
                self.advance()?;
                if name == "void" {
                    Ok(Expression::Void)
                } else {
                    Ok(Expression::Symbol(name.into()))
                }
            }
            TokenKind::LeftBracket => {
                self.advance()?;
                self.parse_map()
            }
            other => Err(self.error(format!("expected expression, found {}", other.describe()))),
        }
    }

    /// Parse a map literal; positional elements get ascending numeric keys.
    fn parse_map(&mut self) -> Result<Expression, ParseError> {
        let mut elements = Vec::new();
        let mut auto_index = 0.0;

        if !self.check(&TokenKind::RightBracket) {
            loop {
                let first = self.parse_expression()?;
                if self.eat(&TokenKind::Colon)? {
                    let value = self.parse_expression()?;
                    elements.push((first, value));
                } else {
                    let key = Expression::Constant(Value::number(auto_index));
                    auto_index += 1.0;
                    elements.push((key, first));
                }
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightBracket)?;

        Ok(Expression::Map {
            elements: elements.into_boxed_slice(),
        })
    }

    // =========================================================================
    // Token Management
    // =========================================================================

    /// Pull the next block-mode token into `current`.
    ///
    /// Only valid while the cursor is inside a block: raw body text must be
    /// consumed with [`Self::parse_body`] instead.
    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                kind.describe(),
                self.current.kind.describe()
            )))
        }
    }

    fn expect_symbol(&mut self, what: &str) -> Result<String, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Symbol(name) => {
                self.advance()?;
                Ok(name)
            }
            other => Err(self.error(format!(
                "expected {}, found {}",
                what,
                other.describe()
            ))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        let matched = matches!(&self.current.kind, TokenKind::Symbol(name) if name == keyword);
        if matched {
            self.advance()
        } else {
            Err(self.error(format!(
                "expected '{}', found {}",
                keyword,
                self.current.kind.describe()
            )))
        }
    }

    /// Consume the `:` introducing a raw body without pulling the body's
    /// text as a token.
    fn expect_section_colon(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Colon) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected ':', found {}",
                self.current.kind.describe()
            )))
        }
    }

    /// Verify the block ends here; the end token is already consumed from
    /// the lexer, so raw scanning resumes right after it.
    fn finish_block(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::BlockEnd) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected block end, found {}",
                self.current.kind.describe()
            )))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current.line, self.current.column)
    }
}
