//! Lexer (tokenizer) for Python source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Indentation is resolved here rather than in the grammar: the lexer
//! synthesizes `Newline`, `Indent` and `Dedent` tokens, joins lines inside
//! brackets and after a trailing `\`, and drops blank and comment-only lines.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Deepest block nesting accepted, matching CPython's tokenizer
pub const MAX_INDENT_LEVELS: usize = 100;

/// Deepest bracket nesting accepted, matching CPython's tokenizer
pub const MAX_BRACKET_DEPTH: usize = 200;

const TAB_SIZE: usize = 8;

/// A string literal as it appeared in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum StringLiteral {
    /// `'...'`, `"..."`, `r'...'` and friends, with escapes decoded
    Text { value: String, source: String },
    /// `b'...'` literals
    Bytes { value: Vec<u8>, source: String },
    /// f-strings: the text between the quotes, escapes still undecoded
    Formatted { content: String, raw: bool },
}

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Name(String),
    /// Normalized decimal digits (or the cleaned literal for huge radix values)
    Int(String),
    Float(f64),
    Imaginary(f64),
    Str(StringLiteral),

    // Layout
    Newline,
    Indent,
    Dedent,

    // Keywords
    False,
    None,
    True,
    And,
    As,
    Assert,
    Async,
    Await,
    Break,
    Class,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    Except,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    Nonlocal,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    Try,
    While,
    With,
    Yield,

    // Arithmetic
    Plus,        // +
    Minus,       // -
    Star,        // *
    DoubleStar,  // **
    Slash,       // /
    DoubleSlash, // //
    Percent,     // %
    At,          // @

    // Bitwise
    LeftShift,  // <<
    RightShift, // >>
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~

    // Comparison
    Less,         // <
    Greater,      // >
    LessEqual,    // <=
    GreaterEqual, // >=
    EqEqual,      // ==
    NotEqual,     // !=

    // Assignment
    Equal,            // =
    ColonEqual,       // :=
    PlusEqual,        // +=
    MinusEqual,       // -=
    StarEqual,        // *=
    DoubleStarEqual,  // **=
    SlashEqual,       // /=
    DoubleSlashEqual, // //=
    PercentEqual,     // %=
    AtEqual,          // @=
    AmpEqual,         // &=
    PipeEqual,        // |=
    CaretEqual,       // ^=
    LeftShiftEqual,   // <<=
    RightShiftEqual,  // >>=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
    Dot,       // .
    Ellipsis,  // ...
    Arrow,     // ->

    // End of file
    Eof,
}

impl TokenKind {
    fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            "True" => TokenKind::True,
            "and" => TokenKind::And,
            "as" => TokenKind::As,
            "assert" => TokenKind::Assert,
            "async" => TokenKind::Async,
            "await" => TokenKind::Await,
            "break" => TokenKind::Break,
            "class" => TokenKind::Class,
            "continue" => TokenKind::Continue,
            "def" => TokenKind::Def,
            "del" => TokenKind::Del,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "except" => TokenKind::Except,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "from" => TokenKind::From,
            "global" => TokenKind::Global,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "in" => TokenKind::In,
            "is" => TokenKind::Is,
            "lambda" => TokenKind::Lambda,
            "nonlocal" => TokenKind::Nonlocal,
            "not" => TokenKind::Not,
            "or" => TokenKind::Or,
            "pass" => TokenKind::Pass,
            "raise" => TokenKind::Raise,
            "return" => TokenKind::Return,
            "try" => TokenKind::Try,
            "while" => TokenKind::While,
            "with" => TokenKind::With,
            "yield" => TokenKind::Yield,
            _ => return None,
        };
        Some(kind)
    }

    /// Source spelling of keyword and operator tokens
    fn spelling(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::False => "False",
            TokenKind::None => "None",
            TokenKind::True => "True",
            TokenKind::And => "and",
            TokenKind::As => "as",
            TokenKind::Assert => "assert",
            TokenKind::Async => "async",
            TokenKind::Await => "await",
            TokenKind::Break => "break",
            TokenKind::Class => "class",
            TokenKind::Continue => "continue",
            TokenKind::Def => "def",
            TokenKind::Del => "del",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::Except => "except",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::From => "from",
            TokenKind::Global => "global",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::Is => "is",
            TokenKind::Lambda => "lambda",
            TokenKind::Nonlocal => "nonlocal",
            TokenKind::Not => "not",
            TokenKind::Or => "or",
            TokenKind::Pass => "pass",
            TokenKind::Raise => "raise",
            TokenKind::Return => "return",
            TokenKind::Try => "try",
            TokenKind::While => "while",
            TokenKind::With => "with",
            TokenKind::Yield => "yield",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::DoubleStar => "**",
            TokenKind::Slash => "/",
            TokenKind::DoubleSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::At => "@",
            TokenKind::LeftShift => "<<",
            TokenKind::RightShift => ">>",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEqual => "<=",
            TokenKind::GreaterEqual => ">=",
            TokenKind::EqEqual => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Equal => "=",
            TokenKind::ColonEqual => ":=",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::StarEqual => "*=",
            TokenKind::DoubleStarEqual => "**=",
            TokenKind::SlashEqual => "/=",
            TokenKind::DoubleSlashEqual => "//=",
            TokenKind::PercentEqual => "%=",
            TokenKind::AtEqual => "@=",
            TokenKind::AmpEqual => "&=",
            TokenKind::PipeEqual => "|=",
            TokenKind::CaretEqual => "^=",
            TokenKind::LeftShiftEqual => "<<=",
            TokenKind::RightShiftEqual => ">>=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Ellipsis => "...",
            TokenKind::Arrow => "->",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Name(name) => write!(f, "name '{}'", name),
            TokenKind::Int(digits) => write!(f, "number {}", digits),
            TokenKind::Float(value) => write!(f, "number {}", value),
            TokenKind::Imaginary(value) => write!(f, "number {}j", value),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Indent => write!(f, "indent"),
            TokenKind::Dedent => write!(f, "dedent"),
            TokenKind::Eof => write!(f, "end of file"),
            other => match other.spelling() {
                Some(text) => write!(f, "'{}'", text),
                None => write!(f, "{:?}", other),
            },
        }
    }
}

/// A token with the location of its first character
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Lexer error at line {}, column {}: {}", .location.line, .location.column, .message)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl LexError {
    fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        LexError {
            message: message.into(),
            location,
        }
    }
}

/// Lexer for Python source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Indentation of the enclosing blocks as (width, width with tabs as one
    /// column); always starts with (0, 0)
    indents: Vec<(usize, usize)>,
    /// Open brackets with their locations, for implicit line joining
    brackets: Vec<(char, SourceLocation)>,
    at_line_start: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    ///
    /// `\r\n` and lone `\r` line endings are read as `\n`.
    pub fn new(input: &str) -> Self {
        let mut chars = Vec::with_capacity(input.len());
        let mut source = input.chars().peekable();
        while let Some(ch) = source.next() {
            if ch == '\r' {
                source.next_if_eq(&'\n');
                chars.push('\n');
            } else {
                chars.push(ch);
            }
        }

        Self {
            input: chars,
            position: 0,
            line: 1,
            column: 1,
            indents: vec![(0, 0)],
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            if self.at_line_start && self.brackets.is_empty() && !self.indentation(&mut tokens)? {
                // Blank or comment-only line, already consumed
                continue;
            }

            self.skip_whitespace_and_comments()?;

            match self.peek() {
                None => break,
                Some('\n') => {
                    let loc = self.current_location();
                    self.consume_newline();
                    if self.brackets.is_empty() {
                        tokens.push(Token::new(TokenKind::Newline, loc));
                        self.at_line_start = true;
                    }
                }
                Some(_) => tokens.push(self.next_token()?),
            }
        }

        self.finish(&mut tokens)?;
        Ok(tokens)
    }

    /// Measure the indentation of a new logical line and emit Indent/Dedent
    /// tokens. Returns `false` when the line turned out to be blank.
    fn indentation(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        let mut width = 0;
        let mut alt_width = 0;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => {
                    width += 1;
                    alt_width += 1;
                }
                '\t' => {
                    width = (width / TAB_SIZE + 1) * TAB_SIZE;
                    alt_width += 1;
                }
                '\x0c' => {
                    width = 0;
                    alt_width = 0;
                }
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            None => {
                self.at_line_start = false;
                return Ok(true);
            }
            Some('#') => {
                self.skip_line_comment();
                self.consume_newline();
                return Ok(false);
            }
            Some('\n') => {
                self.consume_newline();
                return Ok(false);
            }
            Some(_) => {}
        }

        self.at_line_start = false;
        let loc = self.current_location();
        let (current, alt_current) = self.indents.last().copied().unwrap_or((0, 0));
        let inconsistent =
            || LexError::new("inconsistent use of tabs and spaces in indentation", loc);

        if width > current {
            if alt_width <= alt_current {
                return Err(inconsistent());
            }
            if self.indents.len() > MAX_INDENT_LEVELS {
                return Err(LexError::new("too many levels of indentation", loc));
            }
            self.indents.push((width, alt_width));
            tokens.push(Token::new(TokenKind::Indent, loc));
        } else {
            while self.indents.last().is_some_and(|&(level, _)| level > width) {
                self.indents.pop();
                tokens.push(Token::new(TokenKind::Dedent, loc));
            }
            let (level, alt_level) = self.indents.last().copied().unwrap_or((0, 0));
            if level != width {
                return Err(LexError::new(
                    "unindent does not match any outer indentation level",
                    loc,
                ));
            }
            if alt_level != alt_width {
                return Err(inconsistent());
            }
        }

        Ok(true)
    }

    /// Close the token stream: unclosed brackets are an error, the last
    /// logical line gets its Newline and every open block its Dedent.
    fn finish(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        if let Some((open, loc)) = self.brackets.first().copied() {
            return Err(LexError::new(format!("'{}' was never closed", open), loc));
        }

        let loc = self.current_location();
        if tokens
            .last()
            .is_some_and(|token| !matches!(token.kind, TokenKind::Newline))
        {
            tokens.push(Token::new(TokenKind::Newline, loc));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            tokens.push(Token::new(TokenKind::Dedent, loc));
        }
        tokens.push(Token::new(TokenKind::Eof, loc));
        Ok(())
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let start = self.position;
        let ch = self
            .advance()
            .ok_or_else(|| LexError::new("unexpected end of file", loc))?;

        match ch {
            // String literals without prefix
            '"' | '\'' => self.string_literal(start, "", loc),

            // Numeric literals
            '0'..='9' => self.number_literal(start, loc),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(start, loc)
            }

            // Identifiers, keywords and prefixed strings
            c if is_identifier_start(c) => self.identifier_or_keyword(start, loc),

            '+' => Ok(self.operator(loc, TokenKind::Plus, &[('=', TokenKind::PlusEqual)])),
            '-' => Ok(self.operator(
                loc,
                TokenKind::Minus,
                &[('=', TokenKind::MinusEqual), ('>', TokenKind::Arrow)],
            )),
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    Ok(self.operator(loc, TokenKind::DoubleStar, &[('=', TokenKind::DoubleStarEqual)]))
                } else {
                    Ok(self.operator(loc, TokenKind::Star, &[('=', TokenKind::StarEqual)]))
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    Ok(self.operator(loc, TokenKind::DoubleSlash, &[('=', TokenKind::DoubleSlashEqual)]))
                } else {
                    Ok(self.operator(loc, TokenKind::Slash, &[('=', TokenKind::SlashEqual)]))
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    Ok(self.operator(loc, TokenKind::LeftShift, &[('=', TokenKind::LeftShiftEqual)]))
                } else {
                    Ok(self.operator(loc, TokenKind::Less, &[('=', TokenKind::LessEqual)]))
                }
            }
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Ok(self.operator(loc, TokenKind::RightShift, &[('=', TokenKind::RightShiftEqual)]))
                } else {
                    Ok(self.operator(loc, TokenKind::Greater, &[('=', TokenKind::GreaterEqual)]))
                }
            }
            '%' => Ok(self.operator(loc, TokenKind::Percent, &[('=', TokenKind::PercentEqual)])),
            '@' => Ok(self.operator(loc, TokenKind::At, &[('=', TokenKind::AtEqual)])),
            '&' => Ok(self.operator(loc, TokenKind::Amp, &[('=', TokenKind::AmpEqual)])),
            '|' => Ok(self.operator(loc, TokenKind::Pipe, &[('=', TokenKind::PipeEqual)])),
            '^' => Ok(self.operator(loc, TokenKind::Caret, &[('=', TokenKind::CaretEqual)])),
            '=' => Ok(self.operator(loc, TokenKind::Equal, &[('=', TokenKind::EqEqual)])),
            ':' => Ok(self.operator(loc, TokenKind::Colon, &[('=', TokenKind::ColonEqual)])),
            '~' => Ok(Token::new(TokenKind::Tilde, loc)),
            ',' => Ok(Token::new(TokenKind::Comma, loc)),
            ';' => Ok(Token::new(TokenKind::Semicolon, loc)),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::new(TokenKind::NotEqual, loc))
                } else {
                    Err(LexError::new("invalid syntax", loc))
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_ahead(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Ok(Token::new(TokenKind::Ellipsis, loc))
                } else {
                    Ok(Token::new(TokenKind::Dot, loc))
                }
            }

            '(' | '[' | '{' => {
                if self.brackets.len() >= MAX_BRACKET_DEPTH {
                    return Err(LexError::new("too many nested parentheses", loc));
                }
                self.brackets.push((ch, loc));
                let kind = match ch {
                    '(' => TokenKind::LParen,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                };
                Ok(Token::new(kind, loc))
            }
            ')' | ']' | '}' => self.closing_bracket(ch, loc),

            _ => Err(LexError::new(
                format!("invalid character '{}' (U+{:04X})", ch, ch as u32),
                loc,
            )),
        }
    }

    /// Single-character operator, optionally extended by one more character
    fn operator(
        &mut self,
        loc: SourceLocation,
        single: TokenKind,
        extended: &[(char, TokenKind)],
    ) -> Token {
        for (next, kind) in extended {
            if self.peek() == Some(*next) {
                self.advance();
                return Token::new(kind.clone(), loc);
            }
        }
        Token::new(single, loc)
    }

    fn closing_bracket(&mut self, ch: char, loc: SourceLocation) -> Result<Token, LexError> {
        let expected = match ch {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.brackets.pop() {
            None => Err(LexError::new(format!("unmatched '{}'", ch), loc)),
            Some((open, open_loc)) if open != expected => {
                let message = if open_loc.line == loc.line {
                    format!(
                        "closing parenthesis '{}' does not match opening parenthesis '{}'",
                        ch, open
                    )
                } else {
                    format!(
                        "closing parenthesis '{}' does not match opening parenthesis '{}' on line {}",
                        ch, open, open_loc.line
                    )
                };
                Err(LexError::new(message, loc))
            }
            Some(_) => {
                let kind = match ch {
                    ')' => TokenKind::RParen,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                };
                Ok(Token::new(kind, loc))
            }
        }
    }

    /// Parse identifier, keyword, or a prefixed string such as `rb"..."`
    fn identifier_or_keyword(
        &mut self,
        start: usize,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        while let Some(ch) = self.peek() {
            if is_identifier_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }

        let ident: String = self.input[start..self.position].iter().collect();

        if matches!(self.peek(), Some('"') | Some('\'')) && is_string_prefix(&ident) {
            self.advance(); // opening quote
            return self.string_literal(start, &ident, loc);
        }

        let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Name(ident));
        Ok(Token::new(kind, loc))
    }

    /// Parse a string literal. The opening quote has been consumed; `start`
    /// points at the prefix (or the quote when there is none).
    fn string_literal(
        &mut self,
        start: usize,
        prefix: &str,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let quote = self.input[self.position - 1];
        let triple = self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut content = String::new();
        loop {
            match self.peek() {
                None => {
                    let message = if triple {
                        format!(
                            "unterminated triple-quoted string literal (detected at line {})",
                            self.line
                        )
                    } else {
                        format!("unterminated string literal (detected at line {})", self.line)
                    };
                    return Err(LexError::new(message, loc));
                }
                Some('\\') => {
                    content.push('\\');
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        content.push(escaped);
                    }
                }
                Some('\n') if !triple => {
                    return Err(LexError::new(
                        format!("unterminated string literal (detected at line {})", self.line),
                        loc,
                    ));
                }
                Some(ch) if ch == quote => {
                    if !triple {
                        self.advance();
                        break;
                    }
                    if self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote) {
                        self.advance();
                        self.advance();
                        self.advance();
                        break;
                    }
                    content.push(ch);
                    self.advance();
                }
                Some(ch) => {
                    content.push(ch);
                    self.advance();
                }
            }
        }

        let source: String = self.input[start..self.position].iter().collect();
        let lowered = prefix.to_ascii_lowercase();
        let raw = lowered.contains('r');

        let literal = if lowered.contains('f') {
            StringLiteral::Formatted { content, raw }
        } else if lowered.contains('b') {
            if let Some(bad) = content.chars().find(|c| !c.is_ascii()) {
                return Err(LexError::new(
                    format!("bytes can only contain ASCII literal characters, found '{}'", bad),
                    loc,
                ));
            }
            let units = if raw {
                content.chars().map(|c| c as u32).collect()
            } else {
                decode_escapes(&content, true).map_err(|message| LexError::new(message, loc))?
            };
            let value = units
                .into_iter()
                .map(|unit| u8::try_from(unit).unwrap_or(u8::MAX))
                .collect();
            StringLiteral::Bytes { value, source }
        } else {
            let value = if raw {
                content
            } else {
                decode_escapes(&content, false)
                    .map_err(|message| LexError::new(message, loc))?
                    .into_iter()
                    .map(|unit| char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            };
            StringLiteral::Text { value, source }
        };

        Ok(Token::new(TokenKind::Str(literal), loc))
    }

    /// Parse numeric literal. The first character has been consumed.
    fn number_literal(&mut self, start: usize, loc: SourceLocation) -> Result<Token, LexError> {
        let first = self.input[start];

        // Radix-prefixed integers: 0x.., 0o.., 0b..
        if first == '0' {
            if let Some(marker) = self.peek() {
                let radix = match marker.to_ascii_lowercase() {
                    'x' => Some((16, "hexadecimal")),
                    'o' => Some((8, "octal")),
                    'b' => Some((2, "binary")),
                    _ => None,
                };
                if let Some((radix, name)) = radix {
                    self.advance();
                    return self.radix_literal(radix, name, loc);
                }
            }
        }

        let mut is_float = first == '.';
        self.consume_digits();

        if !is_float && self.peek() == Some('.') {
            is_float = true;
            self.advance();
            self.consume_digits();
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let exponent_follows = match self.peek_ahead(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+') | Some('-') => self.peek_ahead(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                is_float = true;
                self.advance();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                self.consume_digits();
            }
        }

        let imaginary = matches!(self.peek(), Some('j') | Some('J'));
        if imaginary {
            self.advance();
        }

        if self.peek().is_some_and(is_identifier_continue) {
            return Err(LexError::new("invalid decimal literal", loc));
        }

        let text: String = self.input[start..self.position].iter().collect();
        if !valid_underscores(&text) {
            return Err(LexError::new("invalid decimal literal", loc));
        }
        let cleaned: String = text
            .chars()
            .filter(|&c| c != '_' && c != 'j' && c != 'J')
            .collect();

        if imaginary || is_float {
            let value = cleaned
                .parse::<f64>()
                .map_err(|_| LexError::new("invalid decimal literal", loc))?;
            let kind = if imaginary {
                TokenKind::Imaginary(value)
            } else {
                TokenKind::Float(value)
            };
            return Ok(Token::new(kind, loc));
        }

        let trimmed = cleaned.trim_start_matches('0');
        if trimmed.len() < cleaned.len() && !trimmed.is_empty() {
            return Err(LexError::new(
                "leading zeros in decimal integer literals are not permitted; use an 0o prefix for octal integers",
                loc,
            ));
        }
        let digits = if trimmed.is_empty() { "0" } else { trimmed };
        Ok(Token::new(TokenKind::Int(digits.to_string()), loc))
    }

    fn radix_literal(
        &mut self,
        radix: u32,
        name: &str,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut digits = String::new();
        let mut last_was_underscore = true;
        while let Some(ch) = self.peek() {
            if ch == '_' {
                if last_was_underscore {
                    return Err(LexError::new(format!("invalid {} literal", name), loc));
                }
                last_was_underscore = true;
                self.advance();
            } else if ch.is_digit(radix) {
                digits.push(ch);
                last_was_underscore = false;
                self.advance();
            } else if ch.is_ascii_alphanumeric() {
                return Err(LexError::new(format!("invalid {} literal", name), loc));
            } else {
                break;
            }
        }
        if digits.is_empty() || last_was_underscore {
            return Err(LexError::new(format!("invalid {} literal", name), loc));
        }

        let normalized = match u128::from_str_radix(&digits, radix) {
            Ok(value) => value.to_string(),
            Err(_) => {
                let marker = match radix {
                    16 => 'x',
                    8 => 'o',
                    _ => 'b',
                };
                format!("0{}{}", marker, digits.to_ascii_lowercase())
            }
        };
        Ok(Token::new(TokenKind::Int(normalized), loc))
    }

    fn consume_digits(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip spaces, comments and `\` line continuations inside a line
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\x0c') => {
                    self.advance();
                }
                Some('#') => self.skip_line_comment(),
                Some('\\') => {
                    let loc = self.current_location();
                    match self.peek_ahead(1) {
                        Some('\n') => {
                            self.advance();
                            self.consume_newline();
                        }
                        None => {
                            return Err(LexError::new("unexpected EOF while parsing", loc));
                        }
                        Some(_) => {
                            return Err(LexError::new(
                                "unexpected character after line continuation character",
                                loc,
                            ));
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip a comment up to (not including) the line break
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Consume one line break, if present
    fn consume_newline(&mut self) {
        if self.peek() == Some('\n') {
            self.advance();
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch == '_' || unicode_ident::is_xid_start(ch)
}

fn is_identifier_continue(ch: char) -> bool {
    unicode_ident::is_xid_continue(ch)
}

fn is_string_prefix(ident: &str) -> bool {
    matches!(
        ident.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

/// Underscores in a numeric literal must sit between two digits
fn valid_underscores(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.iter().enumerate().all(|(i, &c)| {
        c != '_'
            || (i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
    })
}

/// Decode backslash escapes into code units. Bytes literals reject the
/// unicode-only escapes.
pub(crate) fn decode_escapes(content: &str, bytes: bool) -> Result<Vec<u32>, String> {
    let chars: Vec<char> = content.chars().collect();
    let mut units = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        i += 1;
        if ch != '\\' || i >= chars.len() {
            units.push(ch as u32);
            continue;
        }

        let escaped = chars[i];
        i += 1;
        match escaped {
            '\n' => {}
            '\\' => units.push('\\' as u32),
            '\'' => units.push('\'' as u32),
            '"' => units.push('"' as u32),
            'a' => units.push(0x07),
            'b' => units.push(0x08),
            'f' => units.push(0x0c),
            'n' => units.push('\n' as u32),
            'r' => units.push('\r' as u32),
            't' => units.push('\t' as u32),
            'v' => units.push(0x0b),
            '0'..='7' => {
                let mut value = escaped.to_digit(8).unwrap_or(0);
                let mut taken = 1;
                while taken < 3 {
                    match chars.get(i).and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            i += 1;
                            taken += 1;
                        }
                        None => break,
                    }
                }
                units.push(value);
            }
            'x' => {
                units.push(hex_escape(&chars, &mut i, 2).ok_or("truncated \\xXX escape")?);
            }
            'u' if !bytes => {
                units.push(hex_escape(&chars, &mut i, 4).ok_or("truncated \\uXXXX escape")?);
            }
            'U' if !bytes => {
                let value = hex_escape(&chars, &mut i, 8).ok_or("truncated \\UXXXXXXXX escape")?;
                if char::from_u32(value).is_none() {
                    return Err("illegal Unicode character".to_string());
                }
                units.push(value);
            }
            other => {
                // Unknown escapes (and \N{...}) are kept verbatim
                units.push('\\' as u32);
                units.push(other as u32);
            }
        }
    }

    Ok(units)
}

fn hex_escape(chars: &[char], i: &mut usize, len: usize) -> Option<u32> {
    let digits: String = chars.get(*i..*i + len)?.iter().collect();
    let value = u32::from_str_radix(&digits, 16).ok()?;
    *i += len;
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("x = 1\n");

        assert_eq!(
            tokens,
            vec![
                TokenKind::Name("x".to_string()),
                TokenKind::Equal,
                TokenKind::Int("1".to_string()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("\n\n   \n# just a comment\n"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = kinds("if x:\n    y\nz\n");

        assert_eq!(
            tokens,
            vec![
                TokenKind::If,
                TokenKind::Name("x".to_string()),
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Name("y".to_string()),
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Name("z".to_string()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dedents_closed_at_eof() {
        let tokens = kinds("def f():\n    if x:\n        pass");
        let dedents = tokens.iter().filter(|k| **k == TokenKind::Dedent).count();

        assert_eq!(dedents, 2);
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_blank_lines_and_comments_do_not_indent() {
        let tokens = kinds("if x:\n\n        # comment\n    y\n");

        assert!(tokens.contains(&TokenKind::Indent));
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Newline).count(), 2);
    }

    #[test]
    fn test_bracket_joining() {
        let tokens = kinds("f(a,\n  b)\n");

        assert!(!tokens.contains(&TokenKind::Indent));
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn test_backslash_continuation() {
        let tokens = kinds("x = 1 + \\\n    2\n");

        assert!(!tokens.contains(&TokenKind::Indent));
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("** //= -> := != <<= ...");

        assert_eq!(tokens[0], TokenKind::DoubleStar);
        assert_eq!(tokens[1], TokenKind::DoubleSlashEqual);
        assert_eq!(tokens[2], TokenKind::Arrow);
        assert_eq!(tokens[3], TokenKind::ColonEqual);
        assert_eq!(tokens[4], TokenKind::NotEqual);
        assert_eq!(tokens[5], TokenKind::LeftShiftEqual);
        assert_eq!(tokens[6], TokenKind::Ellipsis);
    }

    #[test]
    fn test_number_literals() {
        let tokens = kinds("0x1F 1_000 0o17 0b101 3.5 1e3 2j 007.5");

        assert_eq!(tokens[0], TokenKind::Int("31".to_string()));
        assert_eq!(tokens[1], TokenKind::Int("1000".to_string()));
        assert_eq!(tokens[2], TokenKind::Int("15".to_string()));
        assert_eq!(tokens[3], TokenKind::Int("5".to_string()));
        assert_eq!(tokens[4], TokenKind::Float(3.5));
        assert_eq!(tokens[5], TokenKind::Float(1000.0));
        assert_eq!(tokens[6], TokenKind::Imaginary(2.0));
        assert_eq!(tokens[7], TokenKind::Float(7.5));
    }

    #[test]
    fn test_string_literals() {
        let tokens = kinds(r#"'a\nb' r'a\nb' b'\x41' f'{x}' """tri"ple""""#);

        match &tokens[0] {
            TokenKind::Str(StringLiteral::Text { value, .. }) => assert_eq!(value, "a\nb"),
            other => panic!("Expected string literal, got {:?}", other),
        }
        match &tokens[1] {
            TokenKind::Str(StringLiteral::Text { value, .. }) => assert_eq!(value, "a\\nb"),
            other => panic!("Expected raw string literal, got {:?}", other),
        }
        match &tokens[2] {
            TokenKind::Str(StringLiteral::Bytes { value, .. }) => assert_eq!(value, b"A"),
            other => panic!("Expected bytes literal, got {:?}", other),
        }
        match &tokens[3] {
            TokenKind::Str(StringLiteral::Formatted { content, raw }) => {
                assert_eq!(content, "{x}");
                assert!(!raw);
            }
            other => panic!("Expected f-string, got {:?}", other),
        }
        match &tokens[4] {
            TokenKind::Str(StringLiteral::Text { value, .. }) => assert_eq!(value, "tri\"ple"),
            other => panic!("Expected triple-quoted string, got {:?}", other),
        }
    }

    #[test]
    fn test_token_locations() {
        let tokens = Lexer::new("a = 1\nif a:\n    b\n").tokenize().unwrap();

        let if_token = tokens.iter().find(|t| t.kind == TokenKind::If).unwrap();
        assert_eq!(if_token.location, SourceLocation::new(2, 1));
        let b_token = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Name("b".to_string()))
            .unwrap();
        assert_eq!(b_token.location, SourceLocation::new(3, 5));
    }

    #[test]
    fn test_bad_dedent() {
        let err = Lexer::new("if x:\n        a\n    b\n").tokenize().unwrap_err();

        assert!(err.message.contains("unindent does not match"));
        assert_eq!(err.location.line, 3);
    }

    #[test]
    fn test_inconsistent_tabs_and_spaces() {
        for source in ["if x:\n        pass\n\tx = 1\n", "if x:\n\tif y:\n        pass\n"] {
            let err = Lexer::new(source).tokenize().unwrap_err();
            assert_eq!(err.message, "inconsistent use of tabs and spaces in indentation");
            assert_eq!(err.location.line, 3);
        }

        assert!(Lexer::new("if x:\n\ty = 1\n\tz = 2\n").tokenize().is_ok());
    }

    #[test]
    fn test_crlf_and_cr_line_endings() {
        let tokens = kinds("s = 'abc\\\r\ndef'\r\nt = \'\'\'a\r\nb\'\'\'\r\n");
        match &tokens[2] {
            TokenKind::Str(StringLiteral::Text { value, .. }) => assert_eq!(value, "abcdef"),
            other => panic!("Expected string literal, got {:?}", other),
        }
        match &tokens[6] {
            TokenKind::Str(StringLiteral::Text { value, .. }) => assert_eq!(value, "a\nb"),
            other => panic!("Expected triple-quoted string, got {:?}", other),
        }

        let tokens = kinds("x = 1\ry = 2\r");
        let newlines = tokens.iter().filter(|k| **k == TokenKind::Newline).count();
        assert_eq!(newlines, 2);
    }

    #[test]
    fn test_unicode_identifiers() {
        // Combining grave accent and middle dot may continue an identifier
        assert_eq!(kinds("a\u{300}")[0], TokenKind::Name("a\u{300}".to_string()));
        assert_eq!(kinds("_\u{b7}")[0], TokenKind::Name("_\u{b7}".to_string()));
        assert_eq!(kinds("\u{3c0}r")[0], TokenKind::Name("\u{3c0}r".to_string()));

        let err = Lexer::new("x = a\u{2081}\n").tokenize().unwrap_err();
        assert_eq!(err.message, "invalid character '\u{2081}' (U+2081)");

        assert!(Lexer::new("\u{300}a = 1\n").tokenize().is_err());
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("x = 'abc\n").tokenize().unwrap_err();

        assert!(err.message.starts_with("unterminated string literal"));
        assert_eq!(err.location, SourceLocation::new(1, 5));
    }

    #[test]
    fn test_unclosed_and_mismatched_brackets() {
        let err = Lexer::new("f(1, 2\n").tokenize().unwrap_err();
        assert_eq!(err.message, "'(' was never closed");

        let err = Lexer::new("f(1]").tokenize().unwrap_err();
        assert!(err.message.contains("does not match"));

        let err = Lexer::new("x)").tokenize().unwrap_err();
        assert_eq!(err.message, "unmatched ')'");
    }

    #[test]
    fn test_invalid_literals() {
        assert!(Lexer::new("012").tokenize().is_err());
        assert!(Lexer::new("1__0").tokenize().is_err());
        assert!(Lexer::new("0x").tokenize().is_err());
        assert!(Lexer::new("1abc").tokenize().is_err());
        assert!(Lexer::new("$").tokenize().is_err());
    }
}
