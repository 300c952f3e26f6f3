//! f-string bodies
//!
//! The lexer hands over the text between the quotes untouched. Here it is
//! split into literal text and `{...}` replacement fields, and each field's
//! expression is parsed from its own token stream.

use crate::parser::ast::*;
use crate::parser::lexer::{decode_escapes, Lexer, TokenKind};
use crate::parser::parse::{Parser, SyntaxError, MAX_EXPRESSION_DEPTH};

/// Format specs nested deeper than this may not hold replacement fields
const MAX_SPEC_NESTING: usize = 2;

impl Parser {
    /// Split one f-string body into parts
    pub(crate) fn parse_fstring(
        &self,
        content: &str,
        raw: bool,
        location: SourceLocation,
    ) -> Result<Vec<FStringPart>, SyntaxError> {
        let mut scanner = FStringScanner {
            chars: content.chars().collect(),
            position: 0,
            raw,
            location,
            depth: self.depth,
            spec_nesting: 0,
        };
        scanner.parts(false)
    }
}

/// Append literal text, merging it into a preceding literal
pub(crate) fn push_literal(parts: &mut Vec<FStringPart>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(FStringPart::Literal(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(FStringPart::Literal(text.to_string()));
    }
}

struct FStringScanner {
    chars: Vec<char>,
    position: usize,
    raw: bool,
    location: SourceLocation,
    /// Expression depth of the enclosing parser
    depth: usize,
    spec_nesting: usize,
}

impl FStringScanner {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.chars.get(self.position + n).copied()
    }

    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError::new(format!("f-string: {}", message), self.location)
    }

    /// Literal text and fields up to the end of the body, or up to the `}`
    /// closing a format spec (left unconsumed)
    fn parts(&mut self, in_spec: bool) -> Result<Vec<FStringPart>, SyntaxError> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        loop {
            match self.peek() {
                None if in_spec => return Err(self.error("expecting '}'")),
                None => break,
                Some('{') if self.peek_ahead(1) == Some('{') => {
                    literal.push('{');
                    self.position += 2;
                }
                Some('{') => {
                    self.flush(&mut literal, &mut parts)?;
                    self.position += 1;
                    for part in self.field()? {
                        match part {
                            FStringPart::Literal(text) => push_literal(&mut parts, &text),
                            field => parts.push(field),
                        }
                    }
                }
                Some('}') if in_spec => break,
                Some('}') if self.peek_ahead(1) == Some('}') => {
                    literal.push('}');
                    self.position += 2;
                }
                Some('}') => return Err(self.error("single '}' is not allowed")),
                Some('\\') if !self.raw => {
                    literal.push('\\');
                    self.position += 1;
                    match self.peek() {
                        None | Some('{') | Some('}') => {}
                        Some('N') if self.peek_ahead(1) == Some('{') => {
                            // `\N{NAME}` owns its braces
                            while let Some(ch) = self.peek() {
                                literal.push(ch);
                                self.position += 1;
                                if ch == '}' {
                                    break;
                                }
                            }
                        }
                        Some(ch) => {
                            literal.push(ch);
                            self.position += 1;
                        }
                    }
                }
                Some(ch) => {
                    literal.push(ch);
                    self.position += 1;
                }
            }
        }

        self.flush(&mut literal, &mut parts)?;
        Ok(parts)
    }

    fn flush(
        &self,
        literal: &mut String,
        parts: &mut Vec<FStringPart>,
    ) -> Result<(), SyntaxError> {
        if literal.is_empty() {
            return Ok(());
        }
        let text: String = if self.raw {
            literal.clone()
        } else {
            decode_escapes(literal, false)
                .map_err(|message| SyntaxError::new(message, self.location))?
                .into_iter()
                .map(|unit| char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        };
        push_literal(parts, &text);
        literal.clear();
        Ok(())
    }

    /// One replacement field; the opening `{` has been consumed. A `{x=}`
    /// field also yields its debug text as a literal.
    fn field(&mut self) -> Result<Vec<FStringPart>, SyntaxError> {
        if self.spec_nesting >= MAX_SPEC_NESTING {
            return Err(self.error("expressions nested too deeply"));
        }
        let start = self.position;
        let mut brackets = 0usize;
        let mut debug_end = None;

        let expr_end = loop {
            let Some(ch) = self.peek() else {
                return Err(self.error("expecting '}'"));
            };
            match ch {
                '(' | '[' | '{' => brackets += 1,
                ')' | ']' | '}' if brackets > 0 => brackets -= 1,
                '}' => break self.position,
                ')' | ']' => return Err(self.error(&format!("unmatched '{}'", ch))),
                '\'' | '"' => {
                    self.skip_string(ch)?;
                    continue;
                }
                '#' => return Err(self.error("expression part cannot include '#'")),
                '!' if brackets == 0 && self.peek_ahead(1) != Some('=') => break self.position,
                ':' if brackets == 0 => break self.position,
                '=' if brackets == 0
                    && self.peek_ahead(1) != Some('=')
                    && !matches!(
                        self.chars[start..self.position].last().copied(),
                        Some('=' | '!' | '<' | '>')
                    ) =>
                {
                    let end = self.position;
                    self.position += 1;
                    while self.peek().is_some_and(char::is_whitespace) {
                        self.position += 1;
                    }
                    debug_end = Some(self.position);
                    break end;
                }
                _ => {}
            }
            self.position += 1;
        };

        let text: String = self.chars[start..expr_end].iter().collect();
        let value = self.expression(&text)?;

        let mut conversion = None;
        if self.peek() == Some('!') {
            self.position += 1;
            match self.peek() {
                Some(ch @ ('s' | 'r' | 'a')) => {
                    conversion = Some(ch);
                    self.position += 1;
                }
                _ => {
                    return Err(
                        self.error("invalid conversion character: expected 's', 'r', or 'a'")
                    )
                }
            }
        }

        let mut format_spec = None;
        if self.peek() == Some(':') {
            self.position += 1;
            self.spec_nesting += 1;
            let spec = self.parts(true);
            self.spec_nesting -= 1;
            let spec = spec?;
            if !spec.is_empty() {
                format_spec = Some(spec);
            }
        }

        if self.peek() != Some('}') {
            return Err(self.error("expecting '}'"));
        }
        self.position += 1;

        let mut parts = Vec::new();
        if let Some(end) = debug_end {
            let debug_text: String = self.chars[start..end].iter().collect();
            parts.push(FStringPart::Literal(debug_text));
            if conversion.is_none() && format_spec.is_none() {
                conversion = Some('r');
            }
        }
        parts.push(FStringPart::Field(FormattedValue {
            value: Box::new(value),
            conversion,
            format_spec,
        }));
        Ok(parts)
    }

    /// Step over a string literal inside a field expression
    fn skip_string(&mut self, quote: char) -> Result<(), SyntaxError> {
        let triple = self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote);
        self.position += if triple { 3 } else { 1 };

        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => self.position += 2,
                Some(ch) if ch == quote => {
                    if !triple {
                        self.position += 1;
                        return Ok(());
                    }
                    if self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote) {
                        self.position += 3;
                        return Ok(());
                    }
                    self.position += 1;
                }
                Some(_) => self.position += 1,
            }
        }
    }

    /// Parse a field's expression text on its own
    fn expression(&self, text: &str) -> Result<Expr, SyntaxError> {
        if text.trim().is_empty() {
            return Err(self.error("valid expression required before '}'"));
        }
        if self.depth >= MAX_EXPRESSION_DEPTH {
            return Err(SyntaxError::new("too many nested expressions", self.location));
        }

        let wrapped = format!("({})", text);
        let tokens = Lexer::new(&wrapped)
            .tokenize()
            .map_err(|err| self.error(&err.message))?;
        let mut parser = Parser {
            tokens,
            position: 0,
            depth: self.depth + 1,
        };

        let value = parser
            .parse_expression()
            .map_err(|err| self.nested_error(err))?;
        parser.match_token(&TokenKind::Newline);
        if !parser.is_at_end() {
            return Err(self.error("invalid syntax"));
        }
        Ok(value)
    }

    /// Errors from a field expression point at the f-string itself
    fn nested_error(&self, err: SyntaxError) -> SyntaxError {
        if err.message.starts_with("f-string: ") || err.message == "too many nested expressions" {
            SyntaxError::new(err.message, self.location)
        } else {
            self.error(&err.message)
        }
    }
}
